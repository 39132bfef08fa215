//! Ordinary least squares and ridge regression via the normal equations.

use super::Regressor;
use crate::error::{LearningError, Result};
use crate::matrix::Matrix;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Diagonal jitter keeping plain least squares solvable when one-hot blocks
/// make the design rank deficient.
const JITTER: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub coefficients: Array1<f64>,
    pub intercept: f64,
}

impl LinearModel {
    /// Fit on centered data so the intercept is not penalized.
    pub fn fit(x: &Matrix, y: &[f64], alpha: f64) -> Result<Self> {
        let y = ArrayView1::from(y);
        let (Some(x_mean), Some(y_mean)) = (x.mean_axis(Axis(0)), y.mean()) else {
            return Err(LearningError::InvalidData(
                "cannot fit a linear model on zero rows".to_string(),
            ));
        };

        // gram = Xc'Xc + alpha*I, rhs = Xc'yc
        let centered = x - &x_mean;
        let mut gram = centered.t().dot(&centered);
        gram.diag_mut().mapv_inplace(|v| v + alpha.max(JITTER));
        let rhs = centered.t().dot(&(&y - y_mean));

        let coefficients = solve(gram, rhs)?;
        let intercept = y_mean - coefficients.dot(&x_mean);
        Ok(Self {
            coefficients,
            intercept,
        })
    }
}

impl Regressor for LinearModel {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.intercept + self.coefficients.dot(&row)
    }
}

/// Gaussian elimination with partial pivoting. Columns whose pivot vanishes
/// get a zero coefficient.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    let scale = a.diag().iter().map(|v| v.abs()).fold(0.0, f64::max).max(1.0);
    let tolerance = scale * 1e-12;
    let mut pivot_of_column = vec![None; n];
    let mut row = 0;

    for col in 0..n {
        let Some(pivot) =
            (row..n).max_by(|&r1, &r2| a[[r1, col]].abs().total_cmp(&a[[r2, col]].abs()))
        else {
            break;
        };
        if a[[pivot, col]].abs() <= tolerance {
            continue;
        }
        if pivot != row {
            for c in 0..n {
                a.swap([row, c], [pivot, c]);
            }
            b.swap(row, pivot);
        }
        for r in 0..n {
            if r != row {
                let factor = a[[r, col]] / a[[row, col]];
                if factor != 0.0 {
                    for c in col..n {
                        a[[r, c]] -= factor * a[[row, c]];
                    }
                    b[r] -= factor * b[row];
                }
            }
        }
        pivot_of_column[col] = Some(row);
        row += 1;
    }

    let solution: Array1<f64> = pivot_of_column
        .iter()
        .enumerate()
        .map(|(col, pivot)| pivot.map_or(0.0, |r| b[r] / a[[r, col]]))
        .collect();
    if solution.iter().any(|v| !v.is_finite()) {
        return Err(LearningError::TrainingFailed(
            "linear system produced non-finite coefficients".to_string(),
        ));
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::matrix_from_rows;

    #[test]
    fn test_recovers_exact_coefficients() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i * i % 11) as f64]).collect();
        let y: Vec<f64> = rows.iter().map(|r| 2.0 * r[0] + 0.5 * r[1] - 3.0).collect();
        let x = matrix_from_rows(rows).unwrap();

        let model = LinearModel::fit(&x, &y, 0.0).unwrap();
        assert!((model.coefficients[0] - 2.0).abs() < 1e-6);
        assert!((model.coefficients[1] - 0.5).abs() < 1e-6);
        assert!((model.intercept + 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_handles_collinear_columns() {
        // one-hot pair always sums to one
        let rows: Vec<Vec<f64>> = (0..10)
            .map(|i| {
                let flag = (i % 2) as f64;
                vec![flag, 1.0 - flag, i as f64]
            })
            .collect();
        let y: Vec<f64> = rows.iter().map(|r| 4.0 * r[0] + r[2]).collect();
        let x = matrix_from_rows(rows).unwrap();

        let model = LinearModel::fit(&x, &y, 0.0).unwrap();
        for (row, target) in x.outer_iter().zip(&y) {
            assert!((model.predict_row(row) - target).abs() < 1e-4);
        }
    }

    #[test]
    fn test_ridge_shrinks_coefficients() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| 2.0 * i as f64).collect();
        let x = matrix_from_rows(rows).unwrap();

        let ols = LinearModel::fit(&x, &y, 0.0).unwrap();
        let ridge = LinearModel::fit(&x, &y, 100.0).unwrap();
        assert!(ridge.coefficients[0].abs() < ols.coefficients[0].abs());
    }
}
