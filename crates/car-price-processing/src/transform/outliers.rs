//! Outlier capping for continuous numeric columns.

use crate::error::{ProcessingError, Result};
use crate::utils::{self, quantile_linear};
use polars::prelude::*;
use tracing::debug;

/// IQR fences of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fences {
    pub lower: f64,
    pub upper: f64,
}

/// Clamps outliers to the IQR fences instead of removing rows.
pub struct OutlierHandler;

impl OutlierHandler {
    /// Numerical columns with at least `min_unique` distinct values in `df`.
    pub fn continuous_columns(
        df: &DataFrame,
        numerical: &[String],
        min_unique: usize,
    ) -> Result<Vec<String>> {
        let mut continuous = Vec::new();
        for name in numerical {
            if utils::distinct_count(df, name)? >= min_unique {
                continuous.push(name.clone());
            }
        }
        Ok(continuous)
    }

    /// `Q1 - k*IQR` and `Q3 + k*IQR` over the non-null values of a column.
    pub fn fences(df: &DataFrame, column: &str, multiplier: f64) -> Result<Fences> {
        let mut values: Vec<f64> = utils::numeric_values(df, column)?
            .into_iter()
            .flatten()
            .collect();
        values.sort_by(f64::total_cmp);

        let (Some(q1), Some(q3)) = (quantile_linear(&values, 0.25), quantile_linear(&values, 0.75))
        else {
            return Err(ProcessingError::NoValidValues(column.to_string()));
        };
        let iqr = q3 - q1;
        Ok(Fences {
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    /// Clamp one column to its fences. Returns how many values changed.
    ///
    /// The column is rewritten as `Float64`; nulls stay null.
    pub fn cap_column(df: &mut DataFrame, column: &str, multiplier: f64) -> Result<usize> {
        let fences = Self::fences(df, column, multiplier)?;
        let values = utils::numeric_values(df, column)?;

        let mut capped_count = 0;
        let capped: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| {
                v.map(|val| {
                    let clamped = val.clamp(fences.lower, fences.upper);
                    if clamped != val {
                        capped_count += 1;
                    }
                    clamped
                })
            })
            .collect();

        df.replace(column, Series::new(column.into(), capped))?;
        debug!(
            "Capped {} values in {} to [{:.3}, {:.3}]",
            capped_count, column, fences.lower, fences.upper
        );
        Ok(capped_count)
    }

    /// Clamp every listed column of `df`.
    pub fn cap_outliers(df: &mut DataFrame, columns: &[String], multiplier: f64) -> Result<usize> {
        let mut total = 0;
        for column in columns {
            total += Self::cap_column(df, column, multiplier)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(df: &DataFrame, column: &str) -> Vec<Option<f64>> {
        utils::numeric_values(df, column).unwrap()
    }

    #[test]
    fn test_fences_linear_quantiles() {
        // Q1 = 3.25, Q3 = 7.75, IQR = 4.5
        let df = df!["value" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0]].unwrap();
        let fences = OutlierHandler::fences(&df, "value", 1.5).unwrap();
        assert_eq!(fences.lower, 3.25 - 6.75);
        assert_eq!(fences.upper, 7.75 + 6.75);
    }

    #[test]
    fn test_cap_column_clamps_without_removing_rows() {
        let mut df =
            df!["value" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0]].unwrap();

        let capped = OutlierHandler::cap_column(&mut df, "value", 1.5).unwrap();

        assert_eq!(capped, 1);
        assert_eq!(df.height(), 10);
        assert_eq!(values(&df, "value")[9], Some(14.5));
        assert_eq!(values(&df, "value")[0], Some(1.0));
    }

    #[test]
    fn test_capping_is_idempotent() {
        let mut df = df![
            "km_driven" => [
                -50_000.0, 12_000.0, 25_000.0, 31_000.0, 40_000.0, 42_000.0,
                55_000.0, 60_000.0, 71_000.0, 80_000.0, 95_000.0, 1_500_000.0,
            ],
        ]
        .unwrap();
        let columns = vec!["km_driven".to_string()];

        OutlierHandler::cap_outliers(&mut df, &columns, 1.5).unwrap();
        let once = df.clone();
        let changed = OutlierHandler::cap_outliers(&mut df, &columns, 1.5).unwrap();

        assert_eq!(changed, 0);
        assert!(df.equals(&once));
    }

    #[test]
    fn test_cap_preserves_nulls() {
        let mut df = df!["value" => [Some(1.0), None, Some(2.0), Some(3.0)]].unwrap();
        OutlierHandler::cap_column(&mut df, "value", 1.5).unwrap();
        assert_eq!(df.column("value").unwrap().null_count(), 1);
    }

    #[test]
    fn test_continuous_columns_threshold() {
        let df = df![
            "km_driven" => (0..30).map(|v| v as f64).collect::<Vec<_>>(),
            "seats" => (0..30).map(|v| (v % 3) as f64).collect::<Vec<_>>(),
        ]
        .unwrap();
        let numerical = vec!["km_driven".to_string(), "seats".to_string()];

        let continuous = OutlierHandler::continuous_columns(&df, &numerical, 25).unwrap();
        assert_eq!(continuous, vec!["km_driven"]);
    }

    #[test]
    fn test_cap_all_null_column() {
        let mut df = df!["value" => [None::<f64>, None]].unwrap();
        let result = OutlierHandler::cap_column(&mut df, "value", 1.5);
        assert!(matches!(result, Err(ProcessingError::NoValidValues(_))));
    }
}
