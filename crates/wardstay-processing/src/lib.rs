//! Short-Stay Listings Normalization and Ward Metrics Library
//!
//! A data processing library built with Rust and Polars for municipal
//! short-stay listing exports.
//!
//! # Overview
//!
//! This library turns the wide raw listings and reviews exports into
//! normalized per-entity relations and answers ward-scoped metric queries
//! over them:
//!
//! - **Column Classification**: Keyword-driven routing of columns to host,
//!   neighbourhood, availability, stay-length, review, and scrape entities
//! - **Type Coercion**: Currency, percentage, flag, and identifier
//!   conversions from the export's string encodings
//! - **Entity Normalization**: Deduplicated host, reviewer, review, and
//!   per-listing relations
//! - **Ward Reconciliation**: Joining listing neighbourhoods with the
//!   municipal ward reference, with coordinate and name imputation
//! - **Sentiment Scoring**: Lexicon-based polarity of neighbourhood
//!   overview documents
//! - **Scoped Metrics**: Listing, host, and sentiment bundles per ward,
//!   with deltas against the global scope
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use wardstay_processing::{DataContext, ProcessConfig, RawTables};
//!
//! let raw = RawTables {
//!     listings: load_csv("listings.csv")?,
//!     reviews: load_csv("reviews.csv")?,
//!     wards: load_csv("wards.csv")?,
//!     contractions: load_contractions("contractions.json")?,
//! };
//!
//! let context = DataContext::build(raw, ProcessConfig::default())?;
//!
//! let report = context.report(Some("Ward 3"))?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

pub mod classify;
pub mod coerce;
pub mod config;
pub mod context;
pub mod error;
pub mod geo;
pub mod metrics;
pub mod normalize;
pub mod text;

pub use config::{ConfigValidationError, ProcessConfig, ProcessConfigBuilder};
pub use context::{DataContext, RawTables, WardReport};
pub use error::{ProcessingError, Result, ResultExt};
pub use metrics::{HostMetrics, ListingMetrics, SentimentMetrics};
pub use normalize::{ListingsNormalizer, ReviewsNormalizer};
pub use text::ContractionMap;
pub use text::sentiment::{SentimentAnalyzer, SentimentLabel};
