//! Column classification for splitting the wide raw export.
//!
//! The raw listings export mixes host, neighbourhood, availability, stay
//! length, review, and scrape-metadata attributes into one table. Columns
//! are routed to destination entities by an ordered keyword table evaluated
//! deterministically. Identifier columns are always retained in the base
//! listings relation so the split tables stay joinable.

use polars::prelude::*;

/// Destination entity for a classified column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Host,
    Neighbourhood,
    Availability,
    Nights,
    Review,
    Scrape,
}

impl Entity {
    /// The substring that routes a column to this entity.
    pub fn keyword(&self) -> &'static str {
        match self {
            Entity::Host => "host",
            Entity::Neighbourhood => "neighbourhood",
            Entity::Availability => "availability",
            Entity::Nights => "nights",
            Entity::Review => "review",
            Entity::Scrape => "scrape",
        }
    }
}

/// Ordered keyword-to-entity bindings, evaluated in this order.
pub const ENTITY_KEYWORDS: [Entity; 6] = [
    Entity::Neighbourhood,
    Entity::Host,
    Entity::Availability,
    Entity::Nights,
    Entity::Review,
    Entity::Scrape,
];

/// Flag columns that must not be treated as identifiers despite any name
/// overlap with the id-retention rule.
pub const BOOL_FLAG_COLUMNS: [&str; 5] = [
    "has_availability",
    "instant_bookable",
    "host_is_superhost",
    "host_has_profile_pic",
    "host_identity_verified",
];

/// Identity and profile columns excluded from the hosts relation.
///
/// These carry free text or picture metadata about the host rather than
/// anything the host metrics read.
pub const HOST_PROFILE_COLUMNS: [&str; 5] = [
    "host_name",
    "host_location",
    "host_about",
    "host_verifications",
    "host_has_profile_pic",
];

/// Collect the column names of a DataFrame as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Columns whose name contains the entity's keyword.
///
/// An entity with no matching columns yields an empty set; downstream
/// consumers treat that as "no attributes of that kind", not an error.
pub fn columns_for(columns: &[String], entity: Entity) -> Vec<String> {
    let keyword = entity.keyword();
    columns
        .iter()
        .filter(|col| col.contains(keyword))
        .cloned()
        .collect()
}

/// Columns whose name contains "url".
pub fn url_columns(columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .filter(|col| col.contains("url"))
        .cloned()
        .collect()
}

/// Columns whose name contains "id" and that are not boolean flags.
pub fn id_columns(columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .filter(|col| col.contains("id") && !BOOL_FLAG_COLUMNS.contains(&col.as_str()))
        .cloned()
        .collect()
}

/// Build the list of columns to drop from the flattened listings relation.
///
/// The droplist is the union of all keyword matches with the identifier
/// override applied: any matched column whose name contains "id" is removed
/// from the droplist so it stays in the listings relation and remains
/// joinable. `host_identity_verified` is dropped explicitly; as a flag it
/// belongs to the hosts table, and its name would otherwise trip the "id"
/// retention rule.
pub fn build_droplist(columns: &[String]) -> Vec<String> {
    let mut droplist: Vec<String> = Vec::new();
    for entity in ENTITY_KEYWORDS {
        for col in columns_for(columns, entity) {
            if !droplist.contains(&col) {
                droplist.push(col);
            }
        }
    }

    droplist.retain(|col| !col.contains("id"));

    if columns.iter().any(|c| c == "host_identity_verified") {
        droplist.push("host_identity_verified".to_string());
    }

    droplist
}
