//! Shared helpers for reading polars columns as plain Rust values.

use crate::error::{ProcessingError, Result};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
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
            | DataType::Float32
            | DataType::Float64
    )
}

/// Column names of a frame as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// Column Extraction
// =============================================================================

/// Read a column as `f64` values. Values that cannot be cast become `None`.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| ProcessingError::ColumnNotFound(name.to_string()))?;
    let float_series = column.as_materialized_series().cast(&DataType::Float64)?;
    let values = float_series.f64()?.into_iter().collect();
    Ok(values)
}

/// Read a column as strings. Numeric columns are formatted by polars' cast.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| ProcessingError::ColumnNotFound(name.to_string()))?;
    let str_series = column.as_materialized_series().cast(&DataType::String)?;
    let values = str_series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

/// Count distinct non-null values of a column.
pub fn distinct_count(df: &DataFrame, name: &str) -> Result<usize> {
    let column = df
        .column(name)
        .map_err(|_| ProcessingError::ColumnNotFound(name.to_string()))?;
    let non_null = column.as_materialized_series().drop_nulls();
    Ok(non_null.n_unique()?)
}

// =============================================================================
// Statistics
// =============================================================================

/// Quantile of an ascending slice with linear interpolation between ranks.
///
/// Returns `None` for an empty slice.
pub fn quantile_linear(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Mean and population standard deviation of the given values.
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 3] = [',', '_', ' '];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Try to parse a string as a finite `f64`.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_quantile_linear_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_linear(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile_linear(&sorted, 1.0), Some(4.0));
        assert_eq!(quantile_linear(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile_linear(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile_linear(&[], 0.5), None);
    }

    #[test]
    fn test_mean_and_std_population() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(mean, 5.0);
        assert_eq!(std, 2.0);
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string(" 1,200 "), Some(1200.0));
        assert_eq!(parse_numeric_string("18.9"), Some(18.9));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("abc"), None);
        assert_eq!(parse_numeric_string("NaN"), None);
    }

    #[test]
    fn test_numeric_and_string_values() {
        let df = df![
            "km_driven" => [Some(120000i64), None, Some(20000)],
            "fuel_type" => ["Petrol", "Diesel", "CNG"],
        ]
        .unwrap();

        let km = numeric_values(&df, "km_driven").unwrap();
        assert_eq!(km, vec![Some(120000.0), None, Some(20000.0)]);

        let fuel = string_values(&df, "fuel_type").unwrap();
        assert_eq!(fuel[1].as_deref(), Some("Diesel"));

        assert_eq!(distinct_count(&df, "fuel_type").unwrap(), 3);
        assert!(matches!(
            numeric_values(&df, "missing"),
            Err(ProcessingError::ColumnNotFound(_))
        ));
    }
}
