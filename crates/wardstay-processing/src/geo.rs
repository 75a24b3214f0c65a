//! Ward reconciliation between listing neighbourhoods and the municipal
//! ward reference table.
//!
//! Listings carry ward labels of the form `"Ward 3"`; the reference table
//! names wards the same way but with its own casing and extra geographic
//! attributes. Reconciliation keys both sides on the numeric ward id and
//! patches holes in the reference data (missing coordinates, missing
//! names) from the listings themselves.

use crate::classify::column_names;
use crate::error::{ProcessingError, Result};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

static WARD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Ward (\d+)").unwrap());

/// Extract the numeric ward id from a `"Ward {n}"` label.
pub fn extract_ward_num(label: &str) -> Option<i64> {
    WARD_RE
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Sort ward labels by their numeric id, unparsable labels last.
pub fn sort_ward_labels(mut labels: Vec<String>) -> Vec<String> {
    labels.sort_by_key(|label| extract_ward_num(label).unwrap_or(i64::MAX));
    labels
}

/// Merge the neighbourhood relation with the ward reference table.
///
/// Reference rows whose `Name` does not contain a parsable ward number are
/// dropped with a warning. After the left join from neighbourhoods, null
/// coordinates are imputed from the per-ward mean of listing coordinates
/// and null names are synthesized as `"Ward {id}"`. The result is one row
/// per ward, sorted by ward id.
pub fn reconcile_wards(
    neighbourhoods: &DataFrame,
    ward_reference: &DataFrame,
    listings: &DataFrame,
) -> Result<DataFrame> {
    let name_column = ward_reference
        .column("Name")
        .or_else(|_| ward_reference.column("name"))
        .map_err(|_| ProcessingError::ColumnNotFound("Name".to_string()))?;

    let names = name_column.str()?;
    let ids: Vec<Option<i64>> = names
        .into_iter()
        .map(|opt| opt.and_then(extract_ward_num))
        .collect();

    let unparsable = ids.iter().filter(|id| id.is_none()).count();
    if unparsable > 0 {
        warn!(
            rows = unparsable,
            "Dropping ward reference rows without a parsable ward number"
        );
    }

    let mut reference = ward_reference.clone();
    reference.with_column(Series::new("neighbourhood_id".into(), ids))?;
    let id_mask = reference
        .column("neighbourhood_id")?
        .as_materialized_series()
        .is_not_null();
    let mut reference = reference.filter(&id_mask)?;

    for name in column_names(&reference) {
        let lower = name.to_lowercase();
        if lower != name {
            reference.rename(&name, lower.into())?;
        }
    }

    let mut wards = neighbourhoods
        .clone()
        .lazy()
        .join(
            reference.lazy(),
            [col("neighbourhood_id")],
            [col("neighbourhood_id")],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    if wards.column("neighbourhood_cleansed").is_ok() {
        wards = wards.drop("neighbourhood_cleansed")?;
    }
    let wards = wards.unique_stable(None, UniqueKeepStrategy::First, None)?;
    let mut wards = wards;

    impute_coordinates(&mut wards, listings)?;
    fill_missing_names(&mut wards)?;

    let wards = wards.sort(["neighbourhood_id"], SortMultipleOptions::default())?;
    debug!(wards = wards.height(), "Reconciled ward table");
    Ok(wards)
}

/// Replace null ward coordinates with the mean coordinates of that ward's
/// listings. Wards with no listings keep their nulls.
fn impute_coordinates(wards: &mut DataFrame, listings: &DataFrame) -> Result<()> {
    let has_sources = listings.column("neighbourhood_id").is_ok()
        && listings.column("latitude").is_ok()
        && listings.column("longitude").is_ok();
    let has_targets = wards.column("latitude").is_ok() && wards.column("longitude").is_ok();
    if !has_sources || !has_targets {
        return Ok(());
    }

    let means = listings
        .clone()
        .lazy()
        .group_by([col("neighbourhood_id")])
        .agg([
            col("latitude").mean().alias("latitude"),
            col("longitude").mean().alias("longitude"),
        ])
        .collect()?;

    let mut by_ward: HashMap<i64, (Option<f64>, Option<f64>)> = HashMap::new();
    let mean_ids = means.column("neighbourhood_id")?.i64()?;
    let mean_lats = means.column("latitude")?.f64()?;
    let mean_longs = means.column("longitude")?.f64()?;
    for ((opt_id, lat), long) in mean_ids
        .into_iter()
        .zip(mean_lats.into_iter())
        .zip(mean_longs.into_iter())
    {
        if let Some(id) = opt_id {
            by_ward.insert(id, (lat, long));
        }
    }

    let ward_ids: Vec<Option<i64>> = wards.column("neighbourhood_id")?.i64()?.into_iter().collect();

    for (coord, pick) in [
        ("latitude", 0usize),
        ("longitude", 1usize),
    ] {
        let cast = wards
            .column(coord)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let values = cast.f64()?;
        let filled: Vec<Option<f64>> = ward_ids
            .iter()
            .zip(values.into_iter())
            .map(|(opt_id, value)| {
                value.or_else(|| {
                    opt_id
                        .and_then(|id| by_ward.get(&id))
                        .and_then(|coords| if pick == 0 { coords.0 } else { coords.1 })
                })
            })
            .collect();
        wards.with_column(Series::new(coord.into(), filled))?;
    }

    Ok(())
}

/// Synthesize `"Ward {id}"` names for reference rows that joined as null.
fn fill_missing_names(wards: &mut DataFrame) -> Result<()> {
    if wards.column("name").is_err() {
        return Ok(());
    }

    let ids: Vec<Option<i64>> = wards.column("neighbourhood_id")?.i64()?.into_iter().collect();
    let names = wards.column("name")?.str()?;
    let filled: Vec<Option<String>> = ids
        .iter()
        .zip(names.into_iter())
        .map(|(opt_id, opt_name)| match opt_name {
            Some(name) => Some(name.to_string()),
            None => opt_id.map(|id| format!("Ward {id}")),
        })
        .collect();

    wards.with_column(Series::new("name".into(), filled))?;
    Ok(())
}
