//! Lexicon-based polarity scoring for cleaned overview documents.
//!
//! Scoring sums per-token valences from a fixed lexicon and squashes the
//! sum into [-1, 1] with the usual `s / sqrt(s^2 + 15)` normalization, so
//! scores from documents of different lengths stay comparable.

use crate::config::ProcessConfig;
use crate::error::{ProcessingError, Result};
use crate::text::{ContractionMap, clean_document};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

const NORMALIZATION_ALPHA: f64 = 15.0;

/// Token valences in [-3.5, 3.5]. Entries are lemmatized forms so they
/// match the output of the cleaning pipeline.
const LEXICON: &[(&str, f64)] = &[
    // Positive.
    ("amazing", 2.8),
    ("attractive", 1.9),
    ("authentic", 1.4),
    ("beautiful", 2.9),
    ("best", 3.2),
    ("bustling", 1.1),
    ("calm", 1.3),
    ("central", 0.9),
    ("charming", 2.2),
    ("cheap", 0.8),
    ("clean", 1.7),
    ("comfortable", 1.9),
    ("convenient", 1.8),
    ("cozy", 2.0),
    ("delicious", 2.3),
    ("delightful", 2.5),
    ("desirable", 1.8),
    ("easy", 1.4),
    ("enjoy", 1.9),
    ("excellent", 3.0),
    ("exciting", 2.2),
    ("family", 0.6),
    ("famous", 1.2),
    ("fantastic", 2.9),
    ("favorite", 2.0),
    ("friendly", 2.2),
    ("fun", 2.3),
    ("good", 1.9),
    ("gorgeous", 2.7),
    ("great", 2.4),
    ("green", 0.8),
    ("happy", 2.4),
    ("historic", 1.0),
    ("ideal", 2.1),
    ("lively", 1.6),
    ("love", 2.7),
    ("lovely", 2.5),
    ("modern", 1.0),
    ("nice", 1.8),
    ("peaceful", 2.0),
    ("perfect", 2.7),
    ("picturesque", 2.1),
    ("pleasant", 1.9),
    ("popular", 1.3),
    ("pretty", 1.6),
    ("quaint", 1.3),
    ("quiet", 1.4),
    ("recommend", 1.7),
    ("relaxing", 1.9),
    ("safe", 1.8),
    ("scenic", 1.9),
    ("special", 1.5),
    ("spacious", 1.6),
    ("stunning", 2.8),
    ("stylish", 1.7),
    ("sunny", 1.4),
    ("superb", 2.8),
    ("thriving", 1.6),
    ("tranquil", 1.9),
    ("trendy", 1.2),
    ("vibrant", 1.8),
    ("walkable", 1.5),
    ("welcoming", 2.1),
    ("wonderful", 2.7),
    // Negative.
    ("avoid", -1.6),
    ("awful", -2.7),
    ("bad", -2.1),
    ("boring", -1.6),
    ("broken", -1.7),
    ("cramped", -1.5),
    ("crime", -2.5),
    ("crowded", -1.2),
    ("dangerous", -2.6),
    ("dark", -0.9),
    ("dirty", -2.0),
    ("disappointing", -2.2),
    ("dodgy", -1.9),
    ("expensive", -1.1),
    ("far", -0.6),
    ("gritty", -1.0),
    ("homeless", -1.4),
    ("horrible", -2.8),
    ("loud", -1.3),
    ("noisy", -1.7),
    ("poor", -1.9),
    ("problem", -1.6),
    ("rough", -1.4),
    ("rundown", -1.8),
    ("sketchy", -2.0),
    ("smell", -1.3),
    ("terrible", -2.7),
    ("traffic", -1.0),
    ("trash", -1.8),
    ("ugly", -2.1),
    ("unsafe", -2.4),
    ("worst", -3.1),
];

/// Polarity class assigned from a compound score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

/// Classify a compound score against the configured thresholds.
///
/// At or above `positive` is positive, at or below `negative` is negative,
/// everything strictly between is neutral. A score of exactly 0.0 is
/// therefore neutral under the default thresholds.
pub fn label_for(score: f64, positive: f64, negative: f64) -> SentimentLabel {
    if score >= positive {
        SentimentLabel::Positive
    } else if score <= negative {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Polarity scorer backed by the built-in valence lexicon.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    valences: HashMap<&'static str, f64>,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            valences: LEXICON.iter().copied().collect(),
        }
    }

    /// Compound polarity of a cleaned document in [-1, 1].
    ///
    /// Unknown tokens contribute nothing, so a document with no lexicon
    /// hits scores exactly 0.0.
    pub fn compound(&self, cleaned: &str) -> f64 {
        let sum: f64 = cleaned
            .split_whitespace()
            .filter_map(|token| self.valences.get(token))
            .sum();

        if sum == 0.0 {
            return 0.0;
        }

        let compound = sum / (sum * sum + NORMALIZATION_ALPHA).sqrt();
        compound.clamp(-1.0, 1.0)
    }
}

/// Score every overview document and append sentiment columns.
///
/// Rows with a null `neighbourhood_id` or null `neighbourhood_overview`
/// are removed first; the surviving frame gains `cleaned_overview`,
/// `compound_sentiment`, and `sentiment_label` columns.
pub fn score_overviews(
    df: &DataFrame,
    contractions: &ContractionMap,
    analyzer: &SentimentAnalyzer,
    config: &ProcessConfig,
) -> Result<DataFrame> {
    for required in ["neighbourhood_id", "neighbourhood_overview"] {
        if df.column(required).is_err() {
            return Err(ProcessingError::ColumnNotFound(required.to_string()));
        }
    }

    let id_mask = df.column("neighbourhood_id")?.as_materialized_series().is_not_null();
    let overview_mask = df
        .column("neighbourhood_overview")?
        .as_materialized_series()
        .is_not_null();
    let mut scored = df.filter(&(&id_mask & &overview_mask))?;

    let overviews = scored.column("neighbourhood_overview")?.str()?.clone();

    let mut cleaned_vec: Vec<String> = Vec::with_capacity(overviews.len());
    let mut compound_vec: Vec<f64> = Vec::with_capacity(overviews.len());
    let mut label_vec: Vec<&'static str> = Vec::with_capacity(overviews.len());

    for opt_text in overviews.into_iter() {
        // Nulls were filtered above; guard anyway for chunked edge cases.
        let text = opt_text.unwrap_or("");
        let cleaned = clean_document(text, contractions, config.min_token_len);
        let compound = analyzer.compound(&cleaned);
        let label = label_for(
            compound,
            config.positive_threshold,
            config.negative_threshold,
        );

        cleaned_vec.push(cleaned);
        compound_vec.push(compound);
        label_vec.push(label.as_str());
    }

    scored.with_column(Series::new("cleaned_overview".into(), cleaned_vec))?;
    scored.with_column(Series::new("compound_sentiment".into(), compound_vec))?;
    scored.with_column(Series::new("sentiment_label".into(), label_vec))?;

    debug!(rows = scored.height(), "Scored overview documents");
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compound_positive() {
        let analyzer = SentimentAnalyzer::new();
        let score = analyzer.compound("beautiful quiet park lovely cafe");
        assert!(score > 0.05);
        assert!(score <= 1.0);
    }

    #[test]
    fn test_compound_negative() {
        let analyzer = SentimentAnalyzer::new();
        let score = analyzer.compound("noisy dirty street unsafe night");
        assert!(score < -0.05);
        assert!(score >= -1.0);
    }

    #[test]
    fn test_compound_no_hits_is_zero() {
        let analyzer = SentimentAnalyzer::new();
        assert_eq!(analyzer.compound("building street corner"), 0.0);
        assert_eq!(analyzer.compound(""), 0.0);
    }

    #[test]
    fn test_label_boundaries() {
        assert_eq!(label_for(0.05, 0.05, -0.05), SentimentLabel::Positive);
        assert_eq!(label_for(-0.05, 0.05, -0.05), SentimentLabel::Negative);
        assert_eq!(label_for(0.0, 0.05, -0.05), SentimentLabel::Neutral);
        assert_eq!(label_for(0.049, 0.05, -0.05), SentimentLabel::Neutral);
        assert_eq!(label_for(-0.049, 0.05, -0.05), SentimentLabel::Neutral);
    }

    #[test]
    fn test_score_overviews_filters_and_labels() {
        let df = df!(
            "neighbourhood_id" => [Some(1i64), Some(2), None],
            "neighbourhood_overview" => [
                Some("A beautiful and lovely area with great parks."),
                Some("Noisy, dirty and unsafe at night."),
                Some("Unreachable row."),
            ],
        )
        .unwrap();

        let config = ProcessConfig::default();
        let scored = score_overviews(
            &df,
            &ContractionMap::default(),
            &SentimentAnalyzer::new(),
            &config,
        )
        .unwrap();

        // The null-id row is gone.
        assert_eq!(scored.height(), 2);

        let labels = scored.column("sentiment_label").unwrap().str().unwrap();
        assert_eq!(labels.get(0), Some("positive"));
        assert_eq!(labels.get(1), Some("negative"));
    }

    #[test]
    fn test_score_overviews_missing_column() {
        let df = df!("price" => [1.0, 2.0]).unwrap();
        let result = score_overviews(
            &df,
            &ContractionMap::default(),
            &SentimentAnalyzer::new(),
            &ProcessConfig::default(),
        );
        assert!(matches!(
            result.unwrap_err(),
            ProcessingError::ColumnNotFound(_)
        ));
    }
}
