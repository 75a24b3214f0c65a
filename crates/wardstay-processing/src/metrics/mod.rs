//! Scoped metric bundles computed over normalized relations.
//!
//! Every bundle follows the same contract: computing over an empty frame
//! yields the all-zero bundle rather than an error, so a ward with no
//! listings still produces a complete, comparable row. Bundles flatten to
//! ordered maps so scoped results can be diffed against the global ones.

use crate::error::Result;
use crate::text::sentiment::SentimentLabel;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Price, rating, occupancy, and volume metrics over a listings frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ListingMetrics {
    pub min_price: f64,
    pub max_price: f64,
    pub average_price: f64,
    pub min_rating: f64,
    pub max_rating: f64,
    pub average_rating: f64,
    pub average_occupancy: f64,
    pub average_monthly_revenue: f64,
    pub total_listings: u32,
    pub total_hosts: u32,
}

impl ListingMetrics {
    /// Compute over a (possibly ward-scoped) listings frame.
    pub fn compute(listings: &DataFrame) -> Result<Self> {
        if listings.height() == 0 {
            return Ok(Self::default());
        }

        Ok(Self {
            min_price: min_or_zero(listings, "price_usd")?,
            max_price: max_or_zero(listings, "price_usd")?,
            average_price: mean_or_zero(listings, "price_usd")?,
            min_rating: min_or_zero(listings, "review_scores_rating")?,
            max_rating: max_or_zero(listings, "review_scores_rating")?,
            average_rating: mean_or_zero(listings, "review_scores_rating")?,
            average_occupancy: mean_or_zero(listings, "estimated_occupancy_l365d")?,
            average_monthly_revenue: mean_or_zero(listings, "estimated_revenue_l365d")?
                / MONTHS_PER_YEAR,
            total_listings: listings.height() as u32,
            total_hosts: distinct_count(listings, "host_id")? as u32,
        })
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("min_price".to_string(), self.min_price),
            ("max_price".to_string(), self.max_price),
            ("average_price".to_string(), self.average_price),
            ("min_rating".to_string(), self.min_rating),
            ("max_rating".to_string(), self.max_rating),
            ("average_rating".to_string(), self.average_rating),
            ("average_occupancy".to_string(), self.average_occupancy),
            (
                "average_monthly_revenue".to_string(),
                self.average_monthly_revenue,
            ),
            ("total_listings".to_string(), self.total_listings as f64),
            ("total_hosts".to_string(), self.total_hosts as f64),
        ])
    }
}

/// Host population metrics over a hosts frame.
///
/// Percentage denominators use the distinct host count, so hosts that
/// appear multiple times in the frame are not double counted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HostMetrics {
    pub total_hosts: u32,
    pub mean_response_rate: f64,
    pub mean_acceptance_rate: f64,
    pub superhost_count: u32,
    pub verified_count: u32,
    pub superhost_percent: f64,
    pub verified_percent: f64,
}

impl HostMetrics {
    pub fn compute(hosts: &DataFrame) -> Result<Self> {
        if hosts.height() == 0 {
            return Ok(Self::default());
        }

        let total_hosts = distinct_count(hosts, "host_id")?;
        let superhost_count = true_count(hosts, "host_is_superhost")?;
        let verified_count = true_count(hosts, "host_identity_verified")?;

        let as_percent = |count: usize| {
            if total_hosts == 0 {
                0.0
            } else {
                count as f64 / total_hosts as f64 * 100.0
            }
        };

        Ok(Self {
            total_hosts: total_hosts as u32,
            mean_response_rate: mean_or_zero(hosts, "host_response_rate")?,
            mean_acceptance_rate: mean_or_zero(hosts, "host_acceptance_rate")?,
            superhost_count: superhost_count as u32,
            verified_count: verified_count as u32,
            superhost_percent: as_percent(superhost_count),
            verified_percent: as_percent(verified_count),
        })
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("total_hosts".to_string(), self.total_hosts as f64),
            ("mean_response_rate".to_string(), self.mean_response_rate),
            (
                "mean_acceptance_rate".to_string(),
                self.mean_acceptance_rate,
            ),
            ("superhost_count".to_string(), self.superhost_count as f64),
            ("verified_count".to_string(), self.verified_count as f64),
            ("superhost_percent".to_string(), self.superhost_percent),
            ("verified_percent".to_string(), self.verified_percent),
        ])
    }
}

/// Polarity distribution over a scored overviews frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SentimentMetrics {
    pub overall_score: f64,
    pub positive_share: f64,
    pub negative_share: f64,
    pub neutral_share: f64,
    pub mode_sentiment: Option<SentimentLabel>,
}

impl SentimentMetrics {
    pub fn compute(overviews: &DataFrame) -> Result<Self> {
        if overviews.height() == 0 {
            return Ok(Self::default());
        }

        let labels = overviews.column("sentiment_label")?.str()?;
        let mut positive = 0usize;
        let mut negative = 0usize;
        let mut neutral = 0usize;
        for opt_label in labels.into_iter() {
            match opt_label {
                Some("positive") => positive += 1,
                Some("negative") => negative += 1,
                _ => neutral += 1,
            }
        }

        let total = (positive + negative + neutral) as f64;
        // Ties resolve in label order: negative, then neutral, then
        // positive.
        let top = positive.max(negative).max(neutral);
        let mode_sentiment = if negative == top {
            Some(SentimentLabel::Negative)
        } else if neutral == top {
            Some(SentimentLabel::Neutral)
        } else {
            Some(SentimentLabel::Positive)
        };

        Ok(Self {
            overall_score: mean_or_zero(overviews, "compound_sentiment")?,
            positive_share: positive as f64 / total,
            negative_share: negative as f64 / total,
            neutral_share: neutral as f64 / total,
            mode_sentiment,
        })
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("overall_score".to_string(), self.overall_score),
            ("positive_share".to_string(), self.positive_share),
            ("negative_share".to_string(), self.negative_share),
            ("neutral_share".to_string(), self.neutral_share),
        ])
    }
}

/// Pointwise difference `scoped - global` over the keys both maps share.
pub fn delta(
    scoped: &BTreeMap<String, f64>,
    global: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    scoped
        .iter()
        .filter_map(|(key, value)| global.get(key).map(|base| (key.clone(), value - base)))
        .collect()
}

/// Mean of a column cast to Float64, 0.0 when the column is missing or
/// has no non-null values.
fn mean_or_zero(df: &DataFrame, name: &str) -> Result<f64> {
    let Ok(column) = df.column(name) else {
        return Ok(0.0);
    };
    let cast = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(cast.f64()?.mean().unwrap_or(0.0))
}

fn min_or_zero(df: &DataFrame, name: &str) -> Result<f64> {
    let Ok(column) = df.column(name) else {
        return Ok(0.0);
    };
    let cast = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(cast.f64()?.min().unwrap_or(0.0))
}

fn max_or_zero(df: &DataFrame, name: &str) -> Result<f64> {
    let Ok(column) = df.column(name) else {
        return Ok(0.0);
    };
    let cast = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(cast.f64()?.max().unwrap_or(0.0))
}

fn distinct_count(df: &DataFrame, name: &str) -> Result<usize> {
    let Ok(column) = df.column(name) else {
        return Ok(0);
    };
    Ok(column.as_materialized_series().n_unique()?)
}

fn true_count(df: &DataFrame, name: &str) -> Result<usize> {
    let Ok(column) = df.column(name) else {
        return Ok(0);
    };
    let flags = column.as_materialized_series().bool()?;
    Ok(flags.into_iter().flatten().filter(|flag| *flag).count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_listings() -> DataFrame {
        df!(
            "listing_id" => [1i64, 2, 3],
            "host_id" => [7i64, 8, 7],
            "price_usd" => [100.0f64, 200.0, 300.0],
            "review_scores_rating" => [4.0f64, 4.5, 5.0],
            "estimated_occupancy_l365d" => [100.0f64, 200.0, 300.0],
            "estimated_revenue_l365d" => [12000.0f64, 24000.0, 36000.0],
        )
        .unwrap()
    }

    #[test]
    fn test_listing_metrics() {
        let metrics = ListingMetrics::compute(&sample_listings()).unwrap();

        assert_eq!(metrics.min_price, 100.0);
        assert_eq!(metrics.max_price, 300.0);
        assert_eq!(metrics.average_price, 200.0);
        assert_eq!(metrics.total_listings, 3);
        assert_eq!(metrics.total_hosts, 2);
        assert_eq!(metrics.average_monthly_revenue, 2000.0);
    }

    #[test]
    fn test_listing_metrics_ordering_invariant() {
        let metrics = ListingMetrics::compute(&sample_listings()).unwrap();
        assert!(metrics.min_price <= metrics.average_price);
        assert!(metrics.average_price <= metrics.max_price);
        assert!(metrics.min_rating <= metrics.average_rating);
        assert!(metrics.average_rating <= metrics.max_rating);
    }

    #[test]
    fn test_listing_metrics_empty_is_all_zero() {
        let empty = sample_listings().head(Some(0));
        let metrics = ListingMetrics::compute(&empty).unwrap();
        assert_eq!(metrics, ListingMetrics::default());
    }

    #[test]
    fn test_host_metrics_distinct_denominator() {
        let hosts = df!(
            "host_id" => [7i64, 7, 8, 9],
            "host_is_superhost" => [true, true, false, true],
            "host_identity_verified" => [true, true, true, false],
            "host_response_rate" => [90.0f64, 90.0, 80.0, 70.0],
            "host_acceptance_rate" => [50.0f64, 50.0, 100.0, 75.0],
        )
        .unwrap();

        let metrics = HostMetrics::compute(&hosts).unwrap();
        assert_eq!(metrics.total_hosts, 3);
        // Counts come from rows, percentages from distinct hosts.
        assert_eq!(metrics.superhost_count, 3);
        assert_eq!(metrics.superhost_percent, 100.0);
        assert_eq!(metrics.verified_count, 3);
        assert_eq!(metrics.verified_percent, 100.0);
    }

    #[test]
    fn test_host_metrics_empty_is_all_zero() {
        let empty = df!("host_id" => Vec::<i64>::new()).unwrap();
        let metrics = HostMetrics::compute(&empty).unwrap();
        assert_eq!(metrics, HostMetrics::default());
    }

    #[test]
    fn test_sentiment_metrics_shares_and_mode() {
        let overviews = df!(
            "compound_sentiment" => [0.5f64, 0.3, -0.2, 0.0],
            "sentiment_label" => ["positive", "positive", "negative", "neutral"],
        )
        .unwrap();

        let metrics = SentimentMetrics::compute(&overviews).unwrap();
        assert_eq!(metrics.positive_share, 0.5);
        assert_eq!(metrics.negative_share, 0.25);
        assert_eq!(metrics.neutral_share, 0.25);
        assert_eq!(metrics.mode_sentiment, Some(SentimentLabel::Positive));
        assert!((metrics.overall_score - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_sentiment_metrics_mode_tie_breaks_by_label_order() {
        let overviews = df!(
            "compound_sentiment" => [0.5f64, -0.5],
            "sentiment_label" => ["positive", "negative"],
        )
        .unwrap();

        let metrics = SentimentMetrics::compute(&overviews).unwrap();
        assert_eq!(metrics.mode_sentiment, Some(SentimentLabel::Negative));
    }

    #[test]
    fn test_sentiment_metrics_empty_has_no_mode() {
        let empty = df!(
            "compound_sentiment" => Vec::<f64>::new(),
            "sentiment_label" => Vec::<String>::new(),
        )
        .unwrap();
        let metrics = SentimentMetrics::compute(&empty).unwrap();
        assert_eq!(metrics.mode_sentiment, None);
        assert_eq!(metrics.overall_score, 0.0);
    }

    #[test]
    fn test_delta_subtraction() {
        let scoped = ListingMetrics {
            average_price: 250.0,
            total_listings: 2,
            ..Default::default()
        }
        .to_map();
        let global = ListingMetrics {
            average_price: 200.0,
            total_listings: 3,
            ..Default::default()
        }
        .to_map();

        let diff = delta(&scoped, &global);
        assert_eq!(diff["average_price"], 50.0);
        assert_eq!(diff["total_listings"], -1.0);
    }

    #[test]
    fn test_delta_against_self_is_zero() {
        let map = ListingMetrics::compute(&sample_listings()).unwrap().to_map();
        let diff = delta(&map, &map);
        assert!(diff.values().all(|value| *value == 0.0));
    }
}
