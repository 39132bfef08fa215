//! Gradient boosting with squared loss: each stage fits a shallow tree to the
//! current residuals.

use super::Regressor;
use super::tree::{DecisionTreeRegressor, TreeParams};
use crate::matrix::Matrix;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    init: f64,
    learning_rate: f64,
    stages: Vec<DecisionTreeRegressor>,
}

impl GradientBoostingRegressor {
    pub fn fit(
        x: &Matrix,
        y: &[f64],
        n_estimators: usize,
        learning_rate: f64,
        params: &TreeParams,
    ) -> Self {
        let init = y.iter().sum::<f64>() / y.len() as f64;
        let mut current = vec![init; y.len()];
        let mut stages = Vec::with_capacity(n_estimators);

        for _ in 0..n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(t, p)| t - p).collect();
            let tree = DecisionTreeRegressor::fit(x, &residuals, params);
            for (i, row) in x.outer_iter().enumerate() {
                current[i] += learning_rate * tree.predict_row(row);
            }
            stages.push(tree);
        }

        Self {
            init,
            learning_rate,
            stages,
        }
    }
}

impl Regressor for GradientBoostingRegressor {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.init
            + self.learning_rate * self.stages.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }
}
