//! Exhaustive grid search scored by mean R² over shuffled k folds.

use crate::algorithms::{Algorithm, FittedRegressor, Hyperparameters, Regressor};
use crate::config::{ParameterGrid, expand_grid};
use crate::error::{LearningError, Result};
use crate::matrix::Dataset;
use crate::metrics::r2_score;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

/// Best grid point of one algorithm, refit on the whole training set.
#[derive(Debug, Clone)]
pub struct TunedCandidate {
    pub algorithm: Algorithm,
    pub params: Hyperparameters,
    pub cv_score: f64,
    pub model: FittedRegressor,
}

#[derive(Debug, Clone, Copy)]
pub struct GridSearch {
    folds: usize,
    seed: u64,
}

impl GridSearch {
    pub fn new(folds: usize, seed: u64) -> Self {
        Self { folds, seed }
    }

    /// `(train, validation)` row indices for each fold.
    ///
    /// The first `n % k` folds hold one extra row.
    pub fn kfold_indices(&self, n: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.folds < 2 || n < self.folds {
            return Err(LearningError::InvalidData(format!(
                "cannot build {} folds from {n} rows",
                self.folds
            )));
        }
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut StdRng::seed_from_u64(self.seed));

        let base = n / self.folds;
        let extra = n % self.folds;
        let mut start = 0;
        let mut folds = Vec::with_capacity(self.folds);
        for k in 0..self.folds {
            let size = base + usize::from(k < extra);
            let validation = order[start..start + size].to_vec();
            let train = order[..start]
                .iter()
                .chain(&order[start + size..])
                .copied()
                .collect();
            folds.push((train, validation));
            start += size;
        }
        Ok(folds)
    }

    /// Mean validation R² of one parameter set.
    pub fn cross_validate(
        &self,
        algorithm: Algorithm,
        params: &Hyperparameters,
        data: &Dataset,
    ) -> Result<f64> {
        let folds = self.kfold_indices(data.len())?;
        let mut total = 0.0;
        for (train_idx, valid_idx) in &folds {
            let train = data.subset(train_idx);
            let valid = data.subset(valid_idx);
            let model = algorithm.fit(params, &train.x, &train.y, self.seed)?;
            total += r2_score(&valid.y, &model.predict(&valid.x));
        }
        Ok(total / folds.len() as f64)
    }

    /// Search the grid, then refit the best point on all of `data`.
    pub fn tune(
        &self,
        algorithm: Algorithm,
        grid: &ParameterGrid,
        data: &Dataset,
    ) -> Result<TunedCandidate> {
        let mut best: Option<(Hyperparameters, f64)> = None;
        for params in expand_grid(grid) {
            let score = self.cross_validate(algorithm, &params, data)?;
            debug!("{} {:?}: cv r2 = {:.4}", algorithm, params, score);
            if best.as_ref().is_none_or(|(_, s)| score > *s) {
                best = Some((params, score));
            }
        }

        let Some((params, cv_score)) = best else {
            return Err(LearningError::InvalidConfig(format!(
                "{algorithm} has an empty grid"
            )));
        };
        let model = algorithm.fit(&params, &data.x, &data.y, self.seed)?;
        Ok(TunedCandidate {
            algorithm,
            params,
            cv_score,
            model,
        })
    }
}
