//! Type coercion from the raw export's string encodings.
//!
//! The source export encodes prices as `"$1,234.00"`, rates as `"87%"`,
//! booleans as `'t'`/`'f'`, and categories with inconsistent casing and
//! qualifiers. Every conversion here is total: well-formed values are
//! coerced, malformed ones fall back to null (or [`TriState::Unknown`]),
//! with the single exception of identifier columns, which must be
//! integer-like or the whole coercion fails.

mod converters;

pub use converters::{
    canonicalize_property_type, canonicalize_room_type, currency_to_f64, flags_to_bool,
    ids_to_i64, percent_to_f64,
};

use serde::{Deserialize, Serialize};

/// Three-value boolean decoded from inconsistent string flags.
///
/// `'t'` and `'f'` are the only recognized literals; anything else is
/// `Unknown`, a first-class outcome rather than a silent null fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    True,
    False,
    Unknown,
}

impl TriState {
    /// Decode a raw flag literal.
    pub fn from_flag(raw: &str) -> Self {
        match raw.trim() {
            "t" => TriState::True,
            "f" => TriState::False,
            _ => TriState::Unknown,
        }
    }

    /// Decode an optional flag; a missing value is `Unknown`.
    pub fn from_opt(raw: Option<&str>) -> Self {
        raw.map(TriState::from_flag).unwrap_or(TriState::Unknown)
    }

    /// Collapse to an optional boolean for storage in a boolean column,
    /// where `Unknown` becomes null.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TriState::True => Some(true),
            TriState::False => Some(false),
            TriState::Unknown => None,
        }
    }
}

/// Parse a currency string (`"$1,234.00"`) into a float.
///
/// Strips `$` and `,` before parsing; returns `None` on anything that does
/// not parse afterwards.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(['$', ','], "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Parse a percentage string (`"87%"`) into a 0-100 float.
pub fn parse_percent(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace('%', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}
