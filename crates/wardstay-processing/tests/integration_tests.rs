//! Integration tests for the normalization pipeline and ward metrics.
//!
//! These tests verify end-to-end behavior over in-memory raw exports that
//! mirror the real ones: currency-encoded prices, `'t'`/`'f'` flags, and
//! `"Ward {n}"` neighbourhood labels.

use polars::prelude::*;
use std::collections::HashMap;
use wardstay_processing::{
    DataContext, ListingMetrics, ProcessConfig, RawTables, SentimentLabel,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn raw_listings() -> DataFrame {
    df!(
        "id" => ["101", "102", "103", "104", "105"],
        "price" => ["$1,200.00", "$85.50", "$200.00", "$150.00", "$95.00"],
        "room_type" => [
            "Entire home/apt", "Private room", "Entire home/apt",
            "Private room", "Entire home/apt",
        ],
        "property_type" => [
            "Entire rental unit", "Private room in home", "Boat",
            "Private room in condo", "Entire loft",
        ],
        "neighbourhood_cleansed" => ["Ward 3", "Ward 1", "Ward 3", "Ward 1", "Ward 2"],
        "neighborhood_overview" => [
            Some("A beautiful, lovely and quiet area with great parks."),
            Some("Noisy, dirty and unsafe at night. Avoid."),
            Some("Plain building on a plain street."),
            None,
            Some("Charming cafes and a vibrant, friendly market."),
        ],
        "latitude" => [43.60, 43.70, 43.61, 43.71, 43.80],
        "longitude" => [-79.30, -79.40, -79.31, -79.41, -79.50],
        "host_id" => ["7", "8", "7", "9", "8"],
        "host_name" => ["Ana", "Ben", "Ana", "Cleo", "Ben"],
        "host_is_superhost" => ["t", "f", "t", "t", "f"],
        "host_identity_verified" => ["t", "t", "t", "f", "t"],
        "host_response_rate" => ["90%", "80%", "90%", "100%", "80%"],
        "host_acceptance_rate" => ["50%", "75%", "50%", "100%", "75%"],
        "minimum_nights" => [Some(1i64), Some(2), Some(3), None, Some(1)],
        "maximum_nights" => [Some(30i64), Some(14), Some(60), Some(10), Some(28)],
        "availability_365" => [200i64, 100, 300, 50, 250],
        "has_availability" => ["t", "t", "f", "t", "t"],
        "review_scores_rating" => [4.8f64, 4.2, 4.9, 3.9, 4.5],
        "number_of_reviews" => [12i64, 4, 30, 1, 8],
        "estimated_occupancy_l365d" => [120.0f64, 200.0, 90.0, 10.0, 150.0],
        "estimated_revenue_l365d" => [144000.0f64, 17100.0, 18000.0, 1500.0, 14250.0],
        "instant_bookable" => ["f", "t", "f", "t", "f"],
        "picture_url" => ["http://a", "http://b", "http://c", "http://d", "http://e"],
    )
    .unwrap()
}

fn raw_reviews() -> DataFrame {
    df!(
        "id" => [Some("501"), Some("502"), Some("502"), None],
        "listing_id" => [Some("101"), Some("102"), Some("102"), None],
        "reviewer_id" => [Some("9"), Some("10"), Some("10"), None],
        "reviewer_name" => [Some("Kim"), Some("Lee"), Some("Lee"), None],
        "date" => [Some("2026-01-10"), Some("2026-02-01"), Some("2026-02-01"), None],
        "comments" => [Some("Great stay"), Some("Fine"), Some("Fine"), None],
    )
    .unwrap()
}

fn raw_wards() -> DataFrame {
    df!(
        "Name" => ["Ward 1", "Ward 2", "Harbour Lands"],
        "Latitude" => [Some(43.68), None, Some(0.0)],
        "Longitude" => [Some(-79.42), None, Some(0.0)],
    )
    .unwrap()
}

fn contractions() -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("don't".to_string(), "do not".to_string());
    map.insert("it's".to_string(), "it is".to_string());
    map.insert("can't".to_string(), "cannot".to_string());
    map
}

fn build_context() -> DataContext {
    let raw = RawTables {
        listings: raw_listings(),
        reviews: raw_reviews(),
        wards: raw_wards(),
        contractions: contractions(),
    };
    DataContext::build(raw, ProcessConfig::default()).expect("pipeline should build")
}

// ============================================================================
// End-to-End Pipeline Tests
// ============================================================================

#[test]
fn test_pipeline_coerces_raw_encodings() {
    let context = build_context();
    let listings = context.listings();

    // The nights-incomplete row (104) is gone, all others survive.
    assert_eq!(listings.height(), 4);

    assert_eq!(listings.column("listing_id").unwrap().dtype(), &DataType::Int64);
    assert_eq!(listings.column("host_id").unwrap().dtype(), &DataType::Int64);
    assert_eq!(listings.column("price_usd").unwrap().dtype(), &DataType::Float64);

    let prices = listings.column("price_usd").unwrap().f64().unwrap();
    assert_eq!(prices.get(0), Some(1200.0));

    let wards: Vec<i64> = listings
        .column("neighbourhood_id")
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(wards, vec![3, 1, 3, 2]);
}

#[test]
fn test_pipeline_splits_entities() {
    let context = build_context();

    // Two distinct hosts survive; the nights-incomplete row took its host
    // with it.
    assert_eq!(context.hosts().height(), 2);

    // Identity text stays out of the hosts relation, the key and the
    // rate and flag attributes stay in.
    assert!(context.hosts().column("host_name").is_err());
    assert!(context.hosts().column("host_id").is_ok());
    assert!(context.hosts().column("host_is_superhost").is_ok());

    // Entity columns left the listings relation.
    assert!(context.listings().column("host_name").is_err());
    assert!(context.listings().column("availability_365").is_err());
    assert!(context.listings().column("picture_url").is_err());

    // The split relations stay joinable by listing id.
    assert!(context.availabilities().column("listing_id").is_ok());
    assert!(context.night_data().column("listing_id").is_ok());

    // Reviews split into reviewers and complete review rows.
    assert_eq!(context.reviewers().height(), 2);
    assert_eq!(context.reviews().height(), 2);
}

#[test]
fn test_pipeline_is_deterministic() {
    let first = build_context();
    let second = build_context();

    assert_eq!(first.listings(), second.listings());
    assert_eq!(first.hosts(), second.hosts());
    assert_eq!(first.wards(), second.wards());
    assert_eq!(
        first.listing_metrics(None).unwrap(),
        second.listing_metrics(None).unwrap()
    );
}

// ============================================================================
// Ward Reconciliation Tests
// ============================================================================

#[test]
fn test_ward_table_reconciliation() {
    let context = build_context();
    let wards = context.wards();

    // One row per ward present in the listings, in numeric order.
    assert_eq!(wards.height(), 3);
    let ids: Vec<i64> = wards
        .column("neighbourhood_id")
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);

    // Ward 2 coordinates come from its listing; Ward 1 from the reference.
    let lats = wards.column("latitude").unwrap().f64().unwrap();
    assert!((lats.get(0).unwrap() - 43.68).abs() < 1e-9);
    assert!((lats.get(1).unwrap() - 43.80).abs() < 1e-9);

    // Ward 3 has no reference row; its name is synthesized.
    let names = wards.column("name").unwrap().str().unwrap();
    assert_eq!(names.get(2), Some("Ward 3"));

    assert_eq!(
        context.sorted_wards().unwrap(),
        vec!["Ward 1", "Ward 2", "Ward 3"]
    );
}

// ============================================================================
// Scoped Metrics Tests
// ============================================================================

#[test]
fn test_metric_ordering_invariants() {
    let context = build_context();

    for ward in [None, Some("Ward 1"), Some("Ward 3")] {
        let metrics = context.listing_metrics(ward).unwrap();
        assert!(metrics.min_price <= metrics.average_price);
        assert!(metrics.average_price <= metrics.max_price);
        assert!(metrics.min_rating <= metrics.average_rating);
        assert!(metrics.average_rating <= metrics.max_rating);
    }
}

#[test]
fn test_ward_scoped_metrics() {
    let context = build_context();

    let ward_three = context.listing_metrics(Some("Ward 3")).unwrap();
    assert_eq!(ward_three.total_listings, 2);
    assert_eq!(ward_three.total_hosts, 1);
    assert_eq!(ward_three.min_price, 200.0);
    assert_eq!(ward_three.max_price, 1200.0);

    // Both Ward 3 listings belong to host 7, a verified superhost.
    let hosts = context.host_metrics(Some("Ward 3")).unwrap();
    assert_eq!(hosts.total_hosts, 1);
    assert_eq!(hosts.superhost_percent, 100.0);
}

#[test]
fn test_empty_ward_yields_zero_metrics() {
    let context = build_context();
    let metrics = context.listing_metrics(Some("Ward 99")).unwrap();
    assert_eq!(metrics, ListingMetrics::default());

    let sentiment = context.sentiment_metrics(Some("Ward 99")).unwrap();
    assert_eq!(sentiment.mode_sentiment, None);
    assert_eq!(sentiment.overall_score, 0.0);
}

#[test]
fn test_unparsable_ward_scopes_to_global() {
    let context = build_context();

    let scoped = context.listing_metrics(Some("Harbour Lands")).unwrap();
    let global = context.listing_metrics(None).unwrap();
    assert_eq!(scoped, global);
}

#[test]
fn test_delta_round_trip() {
    let context = build_context();

    let scoped = context.listing_metrics(Some("Ward 1")).unwrap().to_map();
    let global = context.listing_metrics(None).unwrap().to_map();
    let delta = context.listing_metrics_delta("Ward 1").unwrap();

    // Global plus delta recovers the scoped value for every key.
    for (key, diff) in &delta {
        let recovered = global[key] + diff;
        assert!(
            (recovered - scoped[key]).abs() < 1e-9,
            "round trip failed for {key}"
        );
    }
}

// ============================================================================
// Sentiment Tests
// ============================================================================

#[test]
fn test_overview_sentiment_labels() {
    let context = build_context();
    let overviews = context.overviews();

    // The null-overview row is excluded; four documents are scored.
    assert_eq!(overviews.height(), 4);

    let labels = overviews.column("sentiment_label").unwrap().str().unwrap();
    assert_eq!(labels.get(0), Some("positive"));
    assert_eq!(labels.get(1), Some("negative"));
    // No lexicon hits scores exactly zero, which is neutral.
    assert_eq!(labels.get(2), Some("neutral"));

    let scores = overviews.column("compound_sentiment").unwrap().f64().unwrap();
    assert!(scores.get(0).unwrap() >= 0.05);
    assert!(scores.get(1).unwrap() <= -0.05);
    assert_eq!(scores.get(2), Some(0.0));
}

#[test]
fn test_ward_scoped_sentiment() {
    let context = build_context();

    // Ward 1's only scored overview is the negative one.
    let ward_one = context.sentiment_metrics(Some("Ward 1")).unwrap();
    assert_eq!(ward_one.mode_sentiment, Some(SentimentLabel::Negative));
    assert_eq!(ward_one.negative_share, 1.0);

    let global = context.sentiment_metrics(None).unwrap();
    assert!(global.positive_share > 0.0);
    assert!(global.neutral_share > 0.0);
}

// ============================================================================
// Ward Summary Tests
// ============================================================================

#[test]
fn test_ward_summary_table() {
    let context = build_context();
    let summary = context.ward_summary().unwrap();

    assert_eq!(summary.height(), 3);
    assert!(summary.column("average_price").is_ok());
    assert!(summary.column("average_rating").is_ok());

    let counts: Vec<u32> = summary
        .column("listing_count")
        .unwrap()
        .u32()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    // Wards 1, 2, 3 have 1, 1, 2 complete listings respectively.
    assert_eq!(counts, vec![1, 1, 2]);
}

// ============================================================================
// Report Tests
// ============================================================================

#[test]
fn test_report_serializes_with_deltas() {
    let context = build_context();

    let scoped = context.report(Some("Ward 3")).unwrap();
    assert!(scoped.listing_delta.is_some());
    let json = serde_json::to_string(&scoped).unwrap();
    assert!(json.contains("\"ward\":\"Ward 3\""));
    assert!(json.contains("listing_delta"));

    let global = context.report(None).unwrap();
    assert!(global.listing_delta.is_none());
    let json = serde_json::to_string(&global).unwrap();
    assert!(!json.contains("listing_delta"));
}
