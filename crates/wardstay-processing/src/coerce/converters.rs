//! Series-level conversion functions for the coercion layer.

use crate::coerce::{TriState, parse_currency, parse_percent};
use crate::error::{ProcessingError, Result};
use polars::prelude::*;

/// Check if a DataType is an integer type.
fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is numeric (integer or float).
fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Convert a currency-string series to Float64, null on unparsable values.
pub fn currency_to_f64(series: &Series) -> Result<Series> {
    if is_numeric_dtype(series.dtype()) {
        return Ok(series.cast(&DataType::Float64)?);
    }

    let str_series = series.str()?;
    let mut result_vec: Vec<Option<f64>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        result_vec.push(opt_val.and_then(parse_currency));
    }

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Convert a percentage-string series to Float64 in 0-100.
pub fn percent_to_f64(series: &Series) -> Result<Series> {
    if is_numeric_dtype(series.dtype()) {
        return Ok(series.cast(&DataType::Float64)?);
    }

    let str_series = series.str()?;
    let mut result_vec: Vec<Option<f64>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        result_vec.push(opt_val.and_then(parse_percent));
    }

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Convert a `'t'`/`'f'` flag series to Boolean.
///
/// Decoding goes through [`TriState`] so that unrecognized literals map to
/// `Unknown`, stored as null in the boolean column.
pub fn flags_to_bool(series: &Series) -> Result<Series> {
    if series.dtype() == &DataType::Boolean {
        return Ok(series.clone());
    }

    let str_series = series.str()?;
    let mut result_vec: Vec<Option<bool>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        result_vec.push(TriState::from_opt(opt_val).as_bool());
    }

    Ok(Series::new(series.name().clone(), result_vec))
}

/// Coerce an identifier series to Int64.
///
/// Unlike the soft conversions above this is strict: any non-null value
/// that is not integer-like fails with [`ProcessingError::IdCoercion`].
/// Nulls are preserved; rows carrying them are expected to have been
/// dropped (or to be droppable) by the caller's completeness rules.
pub fn ids_to_i64(series: &Series) -> Result<Series> {
    match series.dtype() {
        dt if is_integer_dtype(dt) => Ok(series.cast(&DataType::Int64)?),
        DataType::Float64 | DataType::Float32 => {
            let float_series = series.cast(&DataType::Float64)?;
            let ca = float_series.f64()?;
            let mut result_vec: Vec<Option<i64>> = Vec::with_capacity(ca.len());
            for opt_val in ca.into_iter() {
                match opt_val {
                    Some(val) if val.fract() == 0.0 => result_vec.push(Some(val as i64)),
                    Some(val) => {
                        return Err(ProcessingError::IdCoercion {
                            column: series.name().to_string(),
                            value: val.to_string(),
                        });
                    }
                    None => result_vec.push(None),
                }
            }
            Ok(Series::new(series.name().clone(), result_vec))
        }
        DataType::String => {
            let str_series = series.str()?;
            let mut result_vec: Vec<Option<i64>> = Vec::with_capacity(str_series.len());
            for opt_val in str_series.into_iter() {
                match opt_val {
                    Some(val) => {
                        let trimmed = val.trim();
                        if let Ok(id) = trimmed.parse::<i64>() {
                            result_vec.push(Some(id));
                        } else if let Ok(f) = trimmed.parse::<f64>() {
                            if f.fract() == 0.0 {
                                result_vec.push(Some(f as i64));
                            } else {
                                return Err(ProcessingError::IdCoercion {
                                    column: series.name().to_string(),
                                    value: trimmed.to_string(),
                                });
                            }
                        } else {
                            return Err(ProcessingError::IdCoercion {
                                column: series.name().to_string(),
                                value: trimmed.to_string(),
                            });
                        }
                    }
                    None => result_vec.push(None),
                }
            }
            Ok(Series::new(series.name().clone(), result_vec))
        }
        other => Err(ProcessingError::IdCoercion {
            column: series.name().to_string(),
            value: format!("dtype {other}"),
        }),
    }
}

/// Canonicalize room-type labels.
///
/// Folds the "home/apt" wording into the single token "residence", then
/// lowercases and trims.
pub fn canonicalize_room_type(series: &Series) -> Result<Series> {
    map_string_series(series, |val| {
        val.replace("home/apt", "residence").to_lowercase().trim().to_string()
    })
}

/// Canonicalize property-type labels.
///
/// Strips the leading "Entire"/"Private" qualifier, then lowercases and
/// trims.
pub fn canonicalize_property_type(series: &Series) -> Result<Series> {
    map_string_series(series, |val| {
        val.replace("Entire", "")
            .replace("Private", "")
            .to_lowercase()
            .trim()
            .to_string()
    })
}

fn map_string_series(series: &Series, f: impl Fn(&str) -> String) -> Result<Series> {
    let str_series = series.str()?;
    let mut result_vec: Vec<Option<String>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        result_vec.push(opt_val.map(&f));
    }

    Ok(Series::new(series.name().clone(), result_vec))
}
