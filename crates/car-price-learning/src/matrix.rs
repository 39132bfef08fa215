//! Feature matrices and the (features, target) pairs read from transformed
//! arrays.

use crate::error::{LearningError, Result};
use car_price_processing::io::read_array;
use car_price_processing::utils::numeric_values;
use ndarray::{Array2, Axis};
use polars::prelude::DataFrame;
use std::path::Path;

/// Dense feature matrix, one row per sample.
pub type Matrix = Array2<f64>;

/// Build a matrix from equally sized rows.
pub fn matrix_from_rows(rows: Vec<Vec<f64>>) -> Result<Matrix> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    let mut data = Vec::with_capacity(n_rows * n_cols);
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != n_cols {
            return Err(LearningError::InvalidData(format!(
                "row {i} has {} values, expected {n_cols}",
                row.len()
            )));
        }
        data.extend(row);
    }
    Array2::from_shape_vec((n_rows, n_cols), data)
        .map_err(|e| LearningError::InvalidData(format!("cannot shape matrix: {e}")))
}

/// Features and target of one split.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub x: Matrix,
    pub y: Vec<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Split a frame whose last column is the target.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let Some((target, features)) = names.split_last() else {
            return Err(LearningError::InvalidData("array has no columns".to_string()));
        };
        if features.is_empty() {
            return Err(LearningError::InvalidData(
                "array has no feature columns".to_string(),
            ));
        }

        let mut rows = vec![Vec::with_capacity(features.len()); df.height()];
        for name in features {
            for (row, value) in rows.iter_mut().zip(numeric_values(df, name)?) {
                row.push(finite(value, name)?);
            }
        }
        let y = numeric_values(df, target)?
            .into_iter()
            .map(|v| finite(v, target))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            x: matrix_from_rows(rows)?,
            y,
        })
    }

    /// Load a transformed Arrow IPC array.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_frame(&read_array(path)?)
    }

    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            x: self.x.select(Axis(0), indices),
            y: indices.iter().map(|&i| self.y[i]).collect(),
        }
    }
}

fn finite(value: Option<f64>, column: &str) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(LearningError::InvalidData(format!(
            "column '{column}' has a missing or non-finite value"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, aview1};
    use polars::prelude::*;

    #[test]
    fn test_from_frame_last_column_is_target() {
        let df = df![
            "a" => [1.0, 2.0, 3.0],
            "b" => [4.0, 5.0, 6.0],
            "selling_price" => [10.0, 20.0, 30.0],
        ]
        .unwrap();
        let data = Dataset::from_frame(&df).unwrap();

        assert_eq!(data.x.dim(), (3, 2));
        assert_eq!(data.x.row(1), aview1(&[2.0, 5.0]));
        assert_eq!(data.y, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_from_frame_rejects_nulls() {
        let df = df!["a" => [Some(1.0), None], "y" => [1.0, 2.0]].unwrap();
        assert!(matches!(
            Dataset::from_frame(&df),
            Err(LearningError::InvalidData(_))
        ));
    }

    #[test]
    fn test_subset_picks_rows_in_order() {
        let data = Dataset {
            x: matrix_from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap(),
            y: vec![10.0, 20.0, 30.0],
        };
        let picked = data.subset(&[2, 0]);
        assert_eq!(picked.x, array![[5.0, 6.0], [1.0, 2.0]]);
        assert_eq!(picked.y, vec![30.0, 10.0]);
    }

    #[test]
    fn test_ragged_rows() {
        let result = matrix_from_rows(vec![vec![1.0], vec![1.0, 2.0]]);
        assert!(result.is_err());
    }
}
