//! The composite model: fitted preprocessor plus winning regressor.
//!
//! [`CarPriceModel`] is the unit that is persisted, published and served.
//! Its [`predict()`](CarPriceModel::predict) takes raw feature frames and
//! always runs the preprocessor first; the two halves are never exposed for
//! separate use.
//!
//! # Serialization Formats
//!
//! | Method | Use Case |
//! |--------|----------|
//! | [`save()`](CarPriceModel::save) / [`load()`](CarPriceModel::load) | Trainer artifacts |
//! | [`to_bytes()`](CarPriceModel::to_bytes) / [`from_bytes()`](CarPriceModel::from_bytes) | Object storage |

use crate::algorithms::{FittedRegressor, Hyperparameters, Regressor};
use crate::error::{LearningError, Result};
use crate::matrix::matrix_from_rows;
use crate::metrics::{Metrics, r2_score};
use car_price_processing::FittedPreprocessor;
use car_price_processing::transform::split_target;
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Metadata stored alongside the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub best_model_name: String,
    pub hyperparameters: Hyperparameters,
    pub cv_score: f64,
    pub test_metrics: Metrics,
    pub feature_names: Vec<String>,
    pub trained_at: DateTime<Utc>,
}

/// A predict-capable preprocessor and regressor pair.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CarPriceModel {
    preprocessor: FittedPreprocessor,
    regressor: FittedRegressor,
    info: ModelInfo,
}

impl fmt::Debug for CarPriceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarPriceModel")
            .field("best_model_name", &self.info.best_model_name)
            .field("test_r2", &self.info.test_metrics.r2)
            .field("n_features", &self.info.feature_names.len())
            .finish_non_exhaustive()
    }
}

impl CarPriceModel {
    pub fn new(preprocessor: FittedPreprocessor, regressor: FittedRegressor, info: ModelInfo) -> Self {
        Self {
            preprocessor,
            regressor,
            info,
        }
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn best_model_name(&self) -> &str {
        &self.info.best_model_name
    }

    /// Categories the preprocessor learned for a categorical column.
    pub fn known_categories(&self, column: &str) -> Option<&[String]> {
        self.preprocessor.known_categories(column)
    }

    /// Predict one price per row of a raw feature frame.
    pub fn predict(&self, df: &DataFrame) -> Result<Vec<f64>> {
        let rows = self.preprocessor.transform_rows(df)?;
        let x = matrix_from_rows(rows)?;
        let predictions = self.regressor.predict(&x);
        if predictions.len() != df.height() {
            return Err(LearningError::InferenceError(format!(
                "{} predictions for {} rows",
                predictions.len(),
                df.height()
            )));
        }
        Ok(predictions)
    }

    /// R² on a raw frame that still carries the `target` column.
    pub fn score(&self, df: &DataFrame, target: &str) -> Result<f64> {
        let (features, y) = split_target(df, target)?;
        let y_true: Vec<f64> = y
            .f64()?
            .into_iter()
            .map(|v| {
                v.ok_or_else(|| LearningError::InvalidData(format!("missing value in '{target}'")))
            })
            .collect::<Result<_>>()?;
        Ok(r2_score(&y_true, &self.predict(&features)?))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LearningError::ModelNotFound {
                path: path.display().to_string(),
            });
        }
        Self::from_bytes(&std::fs::read(path)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::algorithms::Algorithm;
    use car_price_processing::ColumnGroups;
    use polars::prelude::*;

    pub(crate) fn cars() -> DataFrame {
        df![
            "car_name" => ["Alto", "Swift", "City", "Alto", "Swift", "City"],
            "fuel_type" => ["Petrol", "Diesel", "Petrol", "CNG", "Diesel", "Petrol"],
            "km_driven" => [10_000.0, 20_000.0, 30_000.0, 40_000.0, 50_000.0, 60_000.0],
            "selling_price" => [300_000.0, 450_000.0, 600_000.0, 250_000.0, 420_000.0, 560_000.0],
        ]
        .unwrap()
    }

    /// Composite model fit on `cars()` with the given algorithm.
    pub(crate) fn fitted_model(algorithm: Algorithm) -> CarPriceModel {
        let df = cars();
        let (features, y) = split_target(&df, "selling_price").unwrap();
        let groups = ColumnGroups {
            onehot: vec!["fuel_type".to_string()],
            binary: vec!["car_name".to_string()],
            numerical: vec!["km_driven".to_string()],
        };
        let preprocessor = FittedPreprocessor::fit(&features, &groups).unwrap();
        let x = matrix_from_rows(preprocessor.transform_rows(&features).unwrap()).unwrap();
        let y: Vec<f64> = y.f64().unwrap().into_no_null_iter().collect();
        let regressor = algorithm.fit(&Hyperparameters::new(), &x, &y, 0).unwrap();
        let info = ModelInfo {
            best_model_name: algorithm.name().to_string(),
            hyperparameters: Hyperparameters::new(),
            cv_score: 0.0,
            test_metrics: Metrics::default(),
            feature_names: preprocessor.feature_names(),
            trained_at: Utc::now(),
        };
        CarPriceModel::new(preprocessor, regressor, info)
    }

    #[test]
    fn test_predict_length_matches_rows() {
        let model = fitted_model(Algorithm::DecisionTree);
        let predictions = model.predict(&cars()).unwrap();
        assert_eq!(predictions.len(), 6);

        let one = cars().slice(2, 1);
        assert_eq!(model.predict(&one).unwrap().len(), 1);
    }

    #[test]
    fn test_predict_applies_preprocessing() {
        let model = fitted_model(Algorithm::DecisionTree);
        // a fully grown tree reproduces training targets from raw rows
        let predictions = model.predict(&cars()).unwrap();
        assert_eq!(predictions[2], 600_000.0);
        assert_eq!(model.score(&cars(), "selling_price").unwrap(), 1.0);
    }

    #[test]
    fn test_bytes_round_trip_predicts_identically() {
        let model = fitted_model(Algorithm::RandomForest);
        let restored = CarPriceModel::from_bytes(&model.to_bytes().unwrap()).unwrap();
        assert_eq!(
            restored.predict(&cars()).unwrap(),
            model.predict(&cars()).unwrap()
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CarPriceModel::load(dir.path().join("car_price_model.bin")).unwrap_err();
        assert!(matches!(err, LearningError::ModelNotFound { .. }));
    }

    #[test]
    fn test_known_categories_from_binary_encoder() {
        let model = fitted_model(Algorithm::LinearRegression);
        assert_eq!(
            model.known_categories("car_name").unwrap(),
            &["Alto".to_string(), "Swift".to_string(), "City".to_string()]
        );
    }
}
