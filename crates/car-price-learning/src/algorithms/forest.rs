//! Bagged regression trees.

use super::Regressor;
use super::tree::{DecisionTreeRegressor, TreeParams};
use crate::matrix::Matrix;
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
}

impl RandomForestRegressor {
    /// Each tree is grown on a bootstrap sample drawn from `seed + tree index`.
    pub fn fit(x: &Matrix, y: &[f64], n_estimators: usize, params: &TreeParams, seed: u64) -> Self {
        let n = y.len();
        let trees = (0..n_estimators)
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTreeRegressor::fit_on(x, y, sample, params)
            })
            .collect();
        Self { trees }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForestRegressor {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / self.trees.len() as f64
    }
}
