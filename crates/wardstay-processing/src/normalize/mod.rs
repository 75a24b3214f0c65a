//! Normalization of the raw exports into per-entity relations.
//!
//! Each raw table gets a normalizer that runs table-wide preprocessing
//! once (row completeness, sparsity pruning, renames, coercions) and then
//! derives the individual entity relations from the preprocessed frame.

pub mod listings;
pub mod reviews;

pub use listings::ListingsNormalizer;
pub use reviews::ReviewsNormalizer;

use crate::error::Result;
use polars::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Drop rows where every value is null.
pub fn drop_all_null_rows(df: &DataFrame) -> Result<DataFrame> {
    if df.width() == 0 {
        return Ok(df.clone());
    }

    let mut mask = BooleanChunked::full("mask".into(), false, df.height());
    for column in df.get_columns() {
        mask = &mask | &column.as_materialized_series().is_not_null();
    }
    Ok(df.filter(&mask)?)
}

/// Drop rows where any value is null.
pub fn drop_any_null_rows(df: &DataFrame) -> Result<DataFrame> {
    let mut mask = BooleanChunked::full("mask".into(), true, df.height());
    for column in df.get_columns() {
        mask = &mask & &column.as_materialized_series().is_not_null();
    }
    Ok(df.filter(&mask)?)
}

/// Drop rows that are null in any of the named columns.
///
/// Columns absent from the frame are ignored.
pub fn drop_rows_null_in(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    let mut mask = BooleanChunked::full("mask".into(), true, df.height());
    for name in columns {
        if let Ok(column) = df.column(name) {
            mask = &mask & &column.as_materialized_series().is_not_null();
        }
    }
    Ok(df.filter(&mask)?)
}

/// Keep the first row for each distinct value of an integer key column.
pub fn dedup_by_key(df: &DataFrame, key: &str) -> Result<DataFrame> {
    let keys = df.column(key)?.i64()?;
    let mut seen: HashSet<Option<i64>> = HashSet::new();
    let mask: BooleanChunked = keys.into_iter().map(|opt| seen.insert(opt)).collect();
    Ok(df.filter(&mask)?)
}

/// Drop columns whose share of non-null values falls below `threshold`.
///
/// An empty frame is returned unchanged; with zero rows there is no
/// evidence to prune on.
pub fn drop_sparse_columns(df: &DataFrame, threshold: f64) -> Result<DataFrame> {
    let height = df.height();
    if height == 0 {
        return Ok(df.clone());
    }

    let mut sparse: Vec<String> = Vec::new();
    for column in df.get_columns() {
        let non_null_share = (height - column.null_count()) as f64 / height as f64;
        if non_null_share < threshold {
            sparse.push(column.name().to_string());
        }
    }

    if sparse.is_empty() {
        return Ok(df.clone());
    }

    debug!(columns = ?sparse, "Dropping sparse columns");
    let mut result = df.clone();
    for name in &sparse {
        result = result.drop(name)?;
    }
    Ok(result)
}
