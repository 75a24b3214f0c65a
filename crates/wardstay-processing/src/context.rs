//! The assembled processing context.
//!
//! [`DataContext::build`] runs the whole pipeline once over the raw
//! exports and holds the resulting relations. All ward-scoped queries are
//! answered from these cached frames; an unknown or unparsable ward label
//! scopes to the full data set rather than failing.

use crate::config::ProcessConfig;
use crate::error::{ProcessingError, Result};
use crate::geo::{extract_ward_num, reconcile_wards, sort_ward_labels};
use crate::metrics::{HostMetrics, ListingMetrics, SentimentMetrics, delta};
use crate::normalize::{ListingsNormalizer, ReviewsNormalizer};
use crate::text::ContractionMap;
use crate::text::sentiment::{SentimentAnalyzer, score_overviews};
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::info;

/// The raw inputs to the pipeline.
#[derive(Debug, Clone)]
pub struct RawTables {
    pub listings: DataFrame,
    pub reviews: DataFrame,
    pub wards: DataFrame,
    pub contractions: HashMap<String, String>,
}

/// Metrics for one scope, with deltas against the global scope when the
/// report is ward-scoped.
#[derive(Debug, Clone, Serialize)]
pub struct WardReport {
    pub ward: Option<String>,
    pub listing_metrics: ListingMetrics,
    pub host_metrics: HostMetrics,
    pub sentiment_metrics: SentimentMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_delta: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_delta: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_delta: Option<BTreeMap<String, f64>>,
}

/// Normalized relations plus the scoped metric queries over them.
#[derive(Debug, Clone)]
pub struct DataContext {
    config: ProcessConfig,
    listings: DataFrame,
    hosts: DataFrame,
    wards: DataFrame,
    overviews: DataFrame,
    reviews: DataFrame,
    reviewers: DataFrame,
    availabilities: DataFrame,
    night_data: DataFrame,
    scrape_details: DataFrame,
}

impl DataContext {
    /// Run the full pipeline over the raw exports.
    pub fn build(raw: RawTables, config: ProcessConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|err| ProcessingError::InvalidConfig(err.to_string()))?;

        let listings_normalizer = ListingsNormalizer::new(&raw.listings, &config)?;
        let reviews_normalizer = ReviewsNormalizer::new(&raw.reviews)?;

        let hosts = listings_normalizer.hosts()?;
        let neighbourhoods = listings_normalizer.neighbourhoods()?;
        let base_listings = listings_normalizer.listings()?;
        let listing_reviews = listings_normalizer.listing_reviews()?;

        let wards = reconcile_wards(&neighbourhoods, &raw.wards, &base_listings)?;

        let contractions = ContractionMap::from_map(raw.contractions);
        let analyzer = SentimentAnalyzer::new();
        let overviews = score_overviews(
            &listings_normalizer.neighbourhood_overviews()?,
            &contractions,
            &analyzer,
            &config,
        )?;

        let listings = join_listings_with_ratings(&base_listings, &listing_reviews)?;

        info!(
            listings = listings.height(),
            hosts = hosts.height(),
            wards = wards.height(),
            overviews = overviews.height(),
            "Built processing context"
        );

        Ok(Self {
            config,
            listings,
            hosts,
            wards,
            overviews,
            reviews: reviews_normalizer.reviews()?,
            reviewers: reviews_normalizer.reviewers()?,
            availabilities: listings_normalizer.availabilities()?,
            night_data: listings_normalizer.night_data()?,
            scrape_details: listings_normalizer.scrape_details()?,
        })
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    pub fn listings(&self) -> &DataFrame {
        &self.listings
    }

    pub fn hosts(&self) -> &DataFrame {
        &self.hosts
    }

    pub fn wards(&self) -> &DataFrame {
        &self.wards
    }

    pub fn overviews(&self) -> &DataFrame {
        &self.overviews
    }

    pub fn reviews(&self) -> &DataFrame {
        &self.reviews
    }

    pub fn reviewers(&self) -> &DataFrame {
        &self.reviewers
    }

    pub fn availabilities(&self) -> &DataFrame {
        &self.availabilities
    }

    pub fn night_data(&self) -> &DataFrame {
        &self.night_data
    }

    pub fn scrape_details(&self) -> &DataFrame {
        &self.scrape_details
    }

    /// Listings in the given ward; `None` or an unparsable label scopes to
    /// the full frame.
    pub fn listings_for_ward(&self, ward: Option<&str>) -> Result<DataFrame> {
        scope_by_ward(&self.listings, ward)
    }

    /// Hosts with at least one listing in the given ward.
    pub fn hosts_for_ward(&self, ward: Option<&str>) -> Result<DataFrame> {
        let scoped = self.listings_for_ward(ward)?;
        if scoped.height() == self.listings.height() {
            return Ok(self.hosts.clone());
        }

        let host_ids: HashSet<i64> = scoped
            .column("host_id")?
            .i64()?
            .into_iter()
            .flatten()
            .collect();

        let mask: BooleanChunked = self
            .hosts
            .column("host_id")?
            .i64()?
            .into_iter()
            .map(|opt| opt.is_some_and(|id| host_ids.contains(&id)))
            .collect();
        Ok(self.hosts.filter(&mask)?)
    }

    /// Scored overview documents for the given ward.
    pub fn overviews_for_ward(&self, ward: Option<&str>) -> Result<DataFrame> {
        scope_by_ward(&self.overviews, ward)
    }

    pub fn listing_metrics(&self, ward: Option<&str>) -> Result<ListingMetrics> {
        ListingMetrics::compute(&self.listings_for_ward(ward)?)
    }

    pub fn host_metrics(&self, ward: Option<&str>) -> Result<HostMetrics> {
        HostMetrics::compute(&self.hosts_for_ward(ward)?)
    }

    pub fn sentiment_metrics(&self, ward: Option<&str>) -> Result<SentimentMetrics> {
        SentimentMetrics::compute(&self.overviews_for_ward(ward)?)
    }

    pub fn listing_metrics_delta(&self, ward: &str) -> Result<BTreeMap<String, f64>> {
        let scoped = self.listing_metrics(Some(ward))?.to_map();
        let global = self.listing_metrics(None)?.to_map();
        Ok(delta(&scoped, &global))
    }

    pub fn host_metrics_delta(&self, ward: &str) -> Result<BTreeMap<String, f64>> {
        let scoped = self.host_metrics(Some(ward))?.to_map();
        let global = self.host_metrics(None)?.to_map();
        Ok(delta(&scoped, &global))
    }

    pub fn sentiment_metrics_delta(&self, ward: &str) -> Result<BTreeMap<String, f64>> {
        let scoped = self.sentiment_metrics(Some(ward))?.to_map();
        let global = self.sentiment_metrics(None)?.to_map();
        Ok(delta(&scoped, &global))
    }

    /// All metric bundles for one scope, with deltas when ward-scoped.
    pub fn report(&self, ward: Option<&str>) -> Result<WardReport> {
        Ok(WardReport {
            ward: ward.map(|label| label.to_string()),
            listing_metrics: self.listing_metrics(ward)?,
            host_metrics: self.host_metrics(ward)?,
            sentiment_metrics: self.sentiment_metrics(ward)?,
            listing_delta: ward.map(|label| self.listing_metrics_delta(label)).transpose()?,
            host_delta: ward.map(|label| self.host_metrics_delta(label)).transpose()?,
            sentiment_delta: ward
                .map(|label| self.sentiment_metrics_delta(label))
                .transpose()?,
        })
    }

    /// Ward names in numeric ward order.
    pub fn sorted_wards(&self) -> Result<Vec<String>> {
        let names: Vec<String> = self
            .wards
            .column("name")?
            .str()?
            .into_iter()
            .flatten()
            .map(|name| name.to_string())
            .collect();
        Ok(sort_ward_labels(names))
    }

    /// Per-ward price, rating, and volume summary over complete listings.
    pub fn ward_summary(&self) -> Result<DataFrame> {
        let summary = self
            .listings
            .clone()
            .lazy()
            .filter(
                col("price_usd")
                    .is_not_null()
                    .and(col("review_scores_rating").is_not_null()),
            )
            .group_by([col("neighbourhood_id")])
            .agg([
                col("price_usd").mean().alias("average_price"),
                col("review_scores_rating").mean().alias("average_rating"),
                col("listing_id").count().alias("listing_count"),
            ])
            .sort(["neighbourhood_id"], SortMultipleOptions::default())
            .collect()?;
        Ok(summary)
    }
}

/// Left-join review aggregates onto the base listings, keeping only rows
/// with both a price and a rating.
fn join_listings_with_ratings(
    base_listings: &DataFrame,
    listing_reviews: &DataFrame,
) -> Result<DataFrame> {
    // Keep left order so the pipeline output is reproducible run to run.
    let join_args = JoinArgs {
        maintain_order: MaintainOrderJoin::Left,
        ..JoinArgs::new(JoinType::Left)
    };
    let joined = base_listings
        .clone()
        .lazy()
        .join(
            listing_reviews.clone().lazy(),
            [col("listing_id")],
            [col("listing_id")],
            join_args,
        )
        .collect()?;

    let price_mask = joined
        .column("price_usd")?
        .as_materialized_series()
        .is_not_null();
    let rating_mask = joined
        .column("review_scores_rating")?
        .as_materialized_series()
        .is_not_null();
    Ok(joined.filter(&(&price_mask & &rating_mask))?)
}

/// Filter a frame by ward label over its `neighbourhood_id` column.
///
/// `None` and labels without a parsable ward number return the full frame.
fn scope_by_ward(df: &DataFrame, ward: Option<&str>) -> Result<DataFrame> {
    let Some(label) = ward else {
        return Ok(df.clone());
    };
    let Some(ward_id) = extract_ward_num(label) else {
        return Ok(df.clone());
    };

    let mask: BooleanChunked = df
        .column("neighbourhood_id")?
        .i64()?
        .into_iter()
        .map(|opt| opt == Some(ward_id))
        .collect();
    Ok(df.filter(&mask)?)
}
