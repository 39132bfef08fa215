//! Candidate regression algorithms.
//!
//! Each algorithm is named in `model.yaml` by its [`Algorithm::name`] and
//! tuned over a grid of numeric hyperparameters. Fitting returns a
//! [`FittedRegressor`], a serializable enum over the concrete models, so a
//! persisted [`CarPriceModel`](crate::CarPriceModel) can hold any of them.

mod boosting;
mod forest;
mod knn;
mod linear;
mod tree;

pub use boosting::GradientBoostingRegressor;
pub use forest::RandomForestRegressor;
pub use knn::KNeighborsRegressor;
pub use linear::LinearModel;
pub use tree::{DecisionTreeRegressor, TreeParams};

use crate::error::{LearningError, Result};
use crate::matrix::Matrix;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One point of a hyperparameter grid: parameter name to value.
pub type Hyperparameters = BTreeMap<String, f64>;

/// A fitted model that maps one feature row to a prediction.
pub trait Regressor {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64;

    fn predict(&self, x: &Matrix) -> Vec<f64> {
        x.outer_iter().map(|row| self.predict_row(row)).collect()
    }
}

/// Supported algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    LinearRegression,
    Ridge,
    Knn,
    DecisionTree,
    RandomForest,
    GradientBoosting,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::LinearRegression,
        Algorithm::Ridge,
        Algorithm::Knn,
        Algorithm::DecisionTree,
        Algorithm::RandomForest,
        Algorithm::GradientBoosting,
    ];

    /// Name used in `model.yaml`.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::LinearRegression => "linear_regression",
            Algorithm::Ridge => "ridge",
            Algorithm::Knn => "knn",
            Algorithm::DecisionTree => "decision_tree",
            Algorithm::RandomForest => "random_forest",
            Algorithm::GradientBoosting => "gradient_boosting",
        }
    }

    /// Hyperparameters this algorithm accepts.
    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            Algorithm::LinearRegression => &[],
            Algorithm::Ridge => &["alpha"],
            Algorithm::Knn => &["n_neighbors", "distance_weighted"],
            Algorithm::DecisionTree => &["max_depth", "min_samples_split"],
            Algorithm::RandomForest => &["n_estimators", "max_depth", "min_samples_split"],
            Algorithm::GradientBoosting => &["n_estimators", "learning_rate", "max_depth"],
        }
    }

    /// Reject parameters the algorithm does not know.
    pub fn check_parameters<'a>(self, names: impl IntoIterator<Item = &'a String>) -> Result<()> {
        let known = self.parameter_names();
        for name in names {
            if !known.contains(&name.as_str()) {
                return Err(LearningError::InvalidConfig(format!(
                    "unknown hyperparameter '{name}' for {self}"
                )));
            }
        }
        Ok(())
    }

    /// Fit with the given hyperparameters; missing ones take their defaults.
    pub fn fit(
        self,
        params: &Hyperparameters,
        x: &Matrix,
        y: &[f64],
        seed: u64,
    ) -> Result<FittedRegressor> {
        self.check_parameters(params.keys())?;
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(LearningError::InvalidData(format!(
                "cannot fit on {} rows with {} targets",
                x.nrows(),
                y.len()
            )));
        }

        let fitted = match self {
            Algorithm::LinearRegression => FittedRegressor::Linear(LinearModel::fit(x, y, 0.0)?),
            Algorithm::Ridge => {
                let alpha = param(params, "alpha", 1.0);
                if alpha < 0.0 {
                    return Err(LearningError::InvalidConfig(format!(
                        "ridge alpha must be non-negative, got {alpha}"
                    )));
                }
                FittedRegressor::Linear(LinearModel::fit(x, y, alpha)?)
            }
            Algorithm::Knn => FittedRegressor::Knn(KNeighborsRegressor::fit(
                x,
                y,
                count_param(params, "n_neighbors", 5)?,
                param(params, "distance_weighted", 0.0) != 0.0,
            )),
            Algorithm::DecisionTree => FittedRegressor::DecisionTree(DecisionTreeRegressor::fit(
                x,
                y,
                &tree_params(params)?,
            )),
            Algorithm::RandomForest => FittedRegressor::RandomForest(RandomForestRegressor::fit(
                x,
                y,
                count_param(params, "n_estimators", 100)?,
                &tree_params(params)?,
                seed,
            )),
            Algorithm::GradientBoosting => {
                let learning_rate = param(params, "learning_rate", 0.1);
                if learning_rate.is_nan() || learning_rate <= 0.0 {
                    return Err(LearningError::InvalidConfig(format!(
                        "learning_rate must be positive, got {learning_rate}"
                    )));
                }
                FittedRegressor::GradientBoosting(GradientBoostingRegressor::fit(
                    x,
                    y,
                    count_param(params, "n_estimators", 100)?,
                    learning_rate,
                    &TreeParams {
                        max_depth: depth_param(params, 3.0)?,
                        min_samples_split: 2,
                    },
                ))
            }
        };
        Ok(fitted)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = LearningError;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| LearningError::InvalidConfig(format!("unknown algorithm '{s}'")))
    }
}

fn param(params: &Hyperparameters, name: &str, default: f64) -> f64 {
    params.get(name).copied().unwrap_or(default)
}

/// A strictly positive integer parameter.
fn count_param(params: &Hyperparameters, name: &str, default: usize) -> Result<usize> {
    let value = param(params, name, default as f64);
    if value < 1.0 || value.fract() != 0.0 {
        return Err(LearningError::InvalidConfig(format!(
            "{name} must be a positive integer, got {value}"
        )));
    }
    Ok(value as usize)
}

/// `max_depth`; zero means unlimited.
fn depth_param(params: &Hyperparameters, default: f64) -> Result<Option<usize>> {
    let value = param(params, "max_depth", default);
    if value < 0.0 || value.fract() != 0.0 {
        return Err(LearningError::InvalidConfig(format!(
            "max_depth must be a non-negative integer, got {value}"
        )));
    }
    Ok((value > 0.0).then_some(value as usize))
}

fn tree_params(params: &Hyperparameters) -> Result<TreeParams> {
    let min_samples_split = count_param(params, "min_samples_split", 2)?.max(2);
    Ok(TreeParams {
        max_depth: depth_param(params, 0.0)?,
        min_samples_split,
    })
}

/// Any fitted candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FittedRegressor {
    Linear(LinearModel),
    Knn(KNeighborsRegressor),
    DecisionTree(DecisionTreeRegressor),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl Regressor for FittedRegressor {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        match self {
            FittedRegressor::Linear(m) => m.predict_row(row),
            FittedRegressor::Knn(m) => m.predict_row(row),
            FittedRegressor::DecisionTree(m) => m.predict_row(row),
            FittedRegressor::RandomForest(m) => m.predict_row(row),
            FittedRegressor::GradientBoosting(m) => m.predict_row(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::matrix_from_rows;
    use crate::metrics::r2_score;

    fn linear_data() -> (Matrix, Vec<f64>) {
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![i as f64, (i % 7) as f64])
            .collect();
        let y = rows.iter().map(|r| 3.0 * r[0] - 2.0 * r[1] + 5.0).collect();
        (matrix_from_rows(rows).unwrap(), y)
    }

    #[test]
    fn test_algorithm_names_round_trip() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.name().parse::<Algorithm>().unwrap(), algorithm);
        }
        assert!("xgboost".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let (x, y) = linear_data();
        let params = Hyperparameters::from([("depth".to_string(), 3.0)]);
        let result = Algorithm::DecisionTree.fit(&params, &x, &y, 0);
        assert!(matches!(result, Err(LearningError::InvalidConfig(_))));
    }

    #[test]
    fn test_every_algorithm_fits_training_data() {
        let (x, y) = linear_data();
        for algorithm in Algorithm::ALL {
            let model = algorithm.fit(&Hyperparameters::new(), &x, &y, 7).unwrap();
            let score = r2_score(&y, &model.predict(&x));
            assert!(score > 0.9, "{algorithm} scored {score}");
        }
    }

    #[test]
    fn test_invalid_count_parameter() {
        let (x, y) = linear_data();
        let params = Hyperparameters::from([("n_neighbors".to_string(), 0.0)]);
        assert!(Algorithm::Knn.fit(&params, &x, &y, 0).is_err());
    }
}
