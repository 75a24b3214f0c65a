//! Normalizer for the wide raw listings export.

use crate::classify::{
    BOOL_FLAG_COLUMNS, Entity, HOST_PROFILE_COLUMNS, build_droplist, column_names, columns_for,
    id_columns, url_columns,
};
use crate::coerce::{
    canonicalize_property_type, canonicalize_room_type, currency_to_f64, flags_to_bool,
    ids_to_i64, percent_to_f64,
};
use crate::config::ProcessConfig;
use crate::error::Result;
use crate::geo::extract_ward_num;
use crate::normalize::{dedup_by_key, drop_all_null_rows, drop_rows_null_in, drop_sparse_columns};
use polars::prelude::*;
use tracing::info;

/// Raw listings export preprocessed once, then split into entity relations.
///
/// Preprocessing drops rows that are incomplete in any stay-length column,
/// prunes sparse columns, applies the canonical renames, derives the ward
/// id from the cleansed neighbourhood label, and coerces flag and
/// identifier columns. The accessors below each derive one relation from
/// the shared preprocessed frame, so repeated calls are consistent.
#[derive(Debug, Clone)]
pub struct ListingsNormalizer {
    preprocessed: DataFrame,
    droplist: Vec<String>,
}

impl ListingsNormalizer {
    pub fn new(raw: &DataFrame, config: &ProcessConfig) -> Result<Self> {
        let preprocessed = preprocess(raw, config)?;
        let droplist = build_droplist(&column_names(&preprocessed));

        info!(
            rows_in = raw.height(),
            rows_out = preprocessed.height(),
            dropped_columns = droplist.len(),
            "Preprocessed listings export"
        );

        Ok(Self {
            preprocessed,
            droplist,
        })
    }

    /// The shared preprocessed frame.
    pub fn preprocessed(&self) -> &DataFrame {
        &self.preprocessed
    }

    /// One row per host with converted rate columns and the flag
    /// attributes. Identity and profile columns are dropped along with
    /// urls.
    pub fn hosts(&self) -> Result<DataFrame> {
        let cols = column_names(&self.preprocessed);
        let host_cols: Vec<String> = columns_for(&cols, Entity::Host)
            .into_iter()
            .filter(|name| !name.contains("url"))
            .filter(|name| !HOST_PROFILE_COLUMNS.contains(&name.as_str()))
            .collect();

        let selected = self.preprocessed.select(host_cols)?;
        let mut hosts = dedup_by_key(&selected, "host_id")?;

        for name in column_names(&hosts) {
            if name.contains("rate") {
                let converted =
                    percent_to_f64(hosts.column(&name)?.as_materialized_series())?;
                hosts.with_column(converted)?;
            }
        }

        Ok(hosts)
    }

    /// Distinct ward-id to raw-label pairs.
    pub fn neighbourhoods(&self) -> Result<DataFrame> {
        let selected = self
            .preprocessed
            .select(["neighbourhood_id", "neighbourhood_cleansed"])?;
        Ok(selected.unique_stable(None, UniqueKeepStrategy::First, None)?)
    }

    /// Overview documents keyed by listing, ready for sentiment scoring.
    pub fn neighbourhood_overviews(&self) -> Result<DataFrame> {
        let cols = column_names(&self.preprocessed);
        let mut select: Vec<String> =
            vec!["listing_id".to_string(), "neighbourhood_id".to_string()];
        if cols.contains(&"neighbourhood".to_string()) {
            select.push("neighbourhood".to_string());
        }
        select.push("neighbourhood_overview".to_string());

        let selected = self.preprocessed.select(select)?;
        Ok(selected.unique_stable(None, UniqueKeepStrategy::First, None)?)
    }

    /// Availability windows keyed by listing.
    pub fn availabilities(&self) -> Result<DataFrame> {
        self.entity_slice(Entity::Availability)
    }

    /// Stay-length bounds keyed by listing.
    pub fn night_data(&self) -> Result<DataFrame> {
        self.entity_slice(Entity::Nights)
    }

    /// Review aggregates keyed by listing.
    pub fn listing_reviews(&self) -> Result<DataFrame> {
        self.entity_slice(Entity::Review)
    }

    /// Distinct scrape provenance rows.
    ///
    /// Provenance describes the scrape runs, not individual listings, so
    /// the listing key is left out and the rows deduplicate to one per
    /// run.
    pub fn scrape_details(&self) -> Result<DataFrame> {
        let cols = column_names(&self.preprocessed);
        let selected = self.preprocessed.select(columns_for(&cols, Entity::Scrape))?;
        Ok(selected.unique_stable(None, UniqueKeepStrategy::First, None)?)
    }

    /// The base listings relation: entity columns dropped, price converted
    /// to `price_usd`, categorical labels canonicalized.
    pub fn listings(&self) -> Result<DataFrame> {
        let mut listings = self.preprocessed.clone();

        let mut to_drop = self.droplist.clone();
        to_drop.extend(url_columns(&column_names(&listings)));
        for name in &to_drop {
            if listings.column(name).is_ok() {
                listings = listings.drop(name)?;
            }
        }

        if listings.column("price").is_ok() {
            listings.rename("price", "price_usd".into())?;
            let converted =
                currency_to_f64(listings.column("price_usd")?.as_materialized_series())?;
            listings.with_column(converted)?;
        }

        if listings.column("room_type").is_ok() {
            let canonical =
                canonicalize_room_type(listings.column("room_type")?.as_materialized_series())?;
            listings.with_column(canonical)?;
        }
        if listings.column("property_type").is_ok() {
            let canonical = canonicalize_property_type(
                listings.column("property_type")?.as_materialized_series(),
            )?;
            listings.with_column(canonical)?;
        }

        Ok(listings)
    }

    fn entity_slice(&self, entity: Entity) -> Result<DataFrame> {
        let cols = column_names(&self.preprocessed);
        let mut select = vec!["listing_id".to_string()];
        select.extend(
            columns_for(&cols, entity)
                .into_iter()
                .filter(|name| name != "listing_id"),
        );
        Ok(self.preprocessed.select(select)?)
    }
}

fn preprocess(raw: &DataFrame, config: &ProcessConfig) -> Result<DataFrame> {
    let df = drop_all_null_rows(raw)?;
    let df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;

    let nights_cols = columns_for(&column_names(&df), Entity::Nights);
    let mut df = drop_rows_null_in(&df, &nights_cols)?;
    df = drop_sparse_columns(&df, config.sparsity_threshold)?;

    for (old, new) in [
        ("id", "listing_id"),
        ("source", "scrape_source"),
        ("neighborhood_overview", "neighbourhood_overview"),
    ] {
        if df.column(old).is_ok() && df.column(new).is_err() {
            df.rename(old, new.into())?;
        }
    }

    if df.column("neighbourhood_cleansed").is_ok() {
        let labels = df.column("neighbourhood_cleansed")?.str()?;
        let ids: Vec<Option<i64>> = labels
            .into_iter()
            .map(|opt| opt.and_then(extract_ward_num))
            .collect();
        df.with_column(Series::new("neighbourhood_id".into(), ids))?;
    }

    for flag in BOOL_FLAG_COLUMNS {
        if df.column(flag).is_ok() {
            let converted = flags_to_bool(df.column(flag)?.as_materialized_series())?;
            df.with_column(converted)?;
        }
    }

    for name in id_columns(&column_names(&df)) {
        let converted = ids_to_i64(df.column(&name)?.as_materialized_series())?;
        df.with_column(converted)?;
    }

    Ok(df)
}
