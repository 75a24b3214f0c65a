//! CLI entry point for the listings normalization and ward metrics tool.

use anyhow::{Result, anyhow};
use clap::Parser;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};
use wardstay_processing::{DataContext, ProcessConfig, RawTables};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Normalize short-stay listing exports and report ward metrics",
    long_about = "Normalizes the raw listings, reviews, and ward reference exports\n\
                  into per-entity relations and reports listing, host, and sentiment\n\
                  metrics, globally or scoped to one ward.\n\n\
                  EXAMPLES:\n  \
                  # Global metrics\n  \
                  wardstay-processing --listings listings.csv --reviews reviews.csv --wards wards.csv\n\n  \
                  # Metrics for one ward, as JSON\n  \
                  wardstay-processing --listings listings.csv --reviews reviews.csv \\\n      \
                  --wards wards.csv --ward \"Ward 3\" --json"
)]
struct Args {
    /// Path to the raw listings CSV export
    #[arg(long)]
    listings: String,

    /// Path to the raw reviews CSV export
    #[arg(long)]
    reviews: String,

    /// Path to the ward reference CSV
    #[arg(long)]
    wards: String,

    /// Path to a JSON contraction dictionary for text cleaning
    ///
    /// If not specified, contractions are left unexpanded
    #[arg(long)]
    contractions: Option<String>,

    /// Ward label to scope metrics to (e.g. "Ward 3")
    ///
    /// If not specified, metrics cover the full data set
    #[arg(short, long)]
    ward: Option<String>,

    /// Column sparsity threshold (0.0 - 1.0)
    ///
    /// Columns with a lower share of non-null values will be dropped
    #[arg(long, default_value = "0.1")]
    sparsity_threshold: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    for path in [&args.listings, &args.reviews, &args.wards] {
        if !Path::new(path).exists() {
            return Err(anyhow!("Input file not found: {}", path));
        }
    }

    info!("Loading listings export from: {}", args.listings);
    let listings = load_csv_with_fallbacks(&args.listings)?;
    info!("Listings loaded: {:?}", listings.shape());

    info!("Loading reviews export from: {}", args.reviews);
    let reviews = load_csv_with_fallbacks(&args.reviews)?;
    info!("Reviews loaded: {:?}", reviews.shape());

    info!("Loading ward reference from: {}", args.wards);
    let wards = load_csv_with_fallbacks(&args.wards)?;

    let contractions = match args.contractions.as_deref() {
        Some(path) => load_contractions(path)?,
        None => HashMap::new(),
    };

    let config = ProcessConfig::builder()
        .sparsity_threshold(args.sparsity_threshold)
        .build()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    let raw = RawTables {
        listings,
        reviews,
        wards,
        contractions,
    };
    let context = DataContext::build(raw, config)?;

    let report = context.report(args.ward.as_deref())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&context, &report)?;
    Ok(())
}

/// Print a human-readable summary of the scoped metrics.
///
/// This uses `println!` intentionally for user-facing CLI output; unlike
/// logging it should always be visible regardless of log level.
fn print_summary(
    context: &DataContext,
    report: &wardstay_processing::WardReport,
) -> Result<()> {
    println!();
    println!("{}", "=".repeat(80));
    match &report.ward {
        Some(ward) => println!("WARD METRICS - {}", ward),
        None => println!("GLOBAL METRICS"),
    }
    println!("{}", "=".repeat(80));
    println!();

    let listing = &report.listing_metrics;
    println!("Listings:");
    println!("  Total listings: {}", listing.total_listings);
    println!("  Total hosts: {}", listing.total_hosts);
    println!(
        "  Price (USD): min {:.2} / avg {:.2} / max {:.2}",
        listing.min_price, listing.average_price, listing.max_price
    );
    println!(
        "  Rating: min {:.2} / avg {:.2} / max {:.2}",
        listing.min_rating, listing.average_rating, listing.max_rating
    );
    println!(
        "  Avg occupancy (nights/yr): {:.1}",
        listing.average_occupancy
    );
    println!(
        "  Avg monthly revenue (USD): {:.2}",
        listing.average_monthly_revenue
    );
    println!();

    let host = &report.host_metrics;
    println!("Hosts:");
    println!("  Total hosts: {}", host.total_hosts);
    println!("  Mean response rate: {:.1}%", host.mean_response_rate);
    println!("  Mean acceptance rate: {:.1}%", host.mean_acceptance_rate);
    println!(
        "  Superhosts: {} ({:.1}%)",
        host.superhost_count, host.superhost_percent
    );
    println!(
        "  Verified: {} ({:.1}%)",
        host.verified_count, host.verified_percent
    );
    println!();

    let sentiment = &report.sentiment_metrics;
    println!("Overview sentiment:");
    println!("  Overall score: {:.3}", sentiment.overall_score);
    println!(
        "  Shares: {:.0}% positive / {:.0}% negative / {:.0}% neutral",
        sentiment.positive_share * 100.0,
        sentiment.negative_share * 100.0,
        sentiment.neutral_share * 100.0
    );
    if let Some(mode) = &sentiment.mode_sentiment {
        println!("  Mode: {}", mode.as_str());
    }
    println!();

    if let Some(delta) = &report.listing_delta {
        println!("Delta vs. global (listings):");
        for (key, value) in delta {
            println!("  {:<26} {:+.3}", key, value);
        }
        println!();
    }

    println!("Wards: {}", context.sorted_wards()?.join(", "));
    println!();
    println!("Per-ward summary:");
    println!("{}", context.ward_summary()?);
    println!();
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Load a JSON contraction dictionary.
fn load_contractions(path: &str) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Could not read contractions file {}: {}", path, e))?;
    let map: HashMap<String, String> = serde_json::from_str(&content)
        .map_err(|e| anyhow!("Invalid contractions JSON in {}: {}", path, e))?;
    debug!(entries = map.len(), "Loaded contraction dictionary");
    Ok(map)
}

/// Load one raw export, tolerating the messy quoting the listing scrapes
/// ship with.
///
/// A quoted parse is tried first, then a quote-agnostic one, and as a
/// last resort the content is scrubbed in memory and reparsed. Overview
/// text in particular carries embedded quotes and blank lines that break
/// the strict parse.
fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    use std::io::Cursor;
    use std::path::PathBuf;

    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Quoted parse of {} failed: {}", path, e);
        }
    }

    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Quote-agnostic parse of {} failed: {}", path, e);
        }
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Could not read export {}: {}", path, e))?;
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(scrub_csv_content(&content)))
        .finish()?;
    Ok(df)
}

/// Collapse doubled quote escapes and drop blank lines so the strict
/// parser sees well-formed rows.
fn scrub_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
