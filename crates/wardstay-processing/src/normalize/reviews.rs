//! Normalizer for the raw reviews export.

use crate::classify::{column_names, id_columns};
use crate::coerce::ids_to_i64;
use crate::error::Result;
use crate::normalize::{drop_all_null_rows, drop_any_null_rows};
use polars::prelude::*;
use tracing::info;

/// Raw reviews export preprocessed into reviewer and review relations.
#[derive(Debug, Clone)]
pub struct ReviewsNormalizer {
    preprocessed: DataFrame,
}

impl ReviewsNormalizer {
    pub fn new(raw: &DataFrame) -> Result<Self> {
        let df = drop_all_null_rows(raw)?;
        let mut df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;

        for name in id_columns(&column_names(&df)) {
            let converted = ids_to_i64(df.column(&name)?.as_materialized_series())?;
            df.with_column(converted)?;
        }

        info!(
            rows_in = raw.height(),
            rows_out = df.height(),
            "Preprocessed reviews export"
        );

        Ok(Self { preprocessed: df })
    }

    pub fn preprocessed(&self) -> &DataFrame {
        &self.preprocessed
    }

    /// One row per reviewer.
    pub fn reviewers(&self) -> Result<DataFrame> {
        let selected = self.preprocessed.select(["reviewer_id", "reviewer_name"])?;
        Ok(selected.unique_stable(None, UniqueKeepStrategy::First, None)?)
    }

    /// Complete review rows keyed by `review_id`.
    ///
    /// Rows with any null are dropped; only the review attributes survive,
    /// reviewer names live in the reviewers relation.
    pub fn reviews(&self) -> Result<DataFrame> {
        let df = drop_any_null_rows(&self.preprocessed)?;
        let mut df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;

        if df.column("id").is_ok() && df.column("review_id").is_err() {
            df.rename("id", "review_id".into())?;
        }

        let keep: Vec<String> = ["review_id", "reviewer_id", "listing_id", "comments", "date"]
            .iter()
            .filter(|name| df.column(name).is_ok())
            .map(|name| name.to_string())
            .collect();
        Ok(df.select(keep)?)
    }
}
