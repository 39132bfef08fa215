//! Error types for the car-price-learning crate.
//!
//! This module defines [`LearningError`], the main error type used throughout
//! the crate. All public API functions return `Result<T, LearningError>`.
//!
//! Two variants carry the outcome of the acceptance ratchet rather than a
//! malfunction:
//! - [`NoQualifyingModel`](LearningError::NoQualifyingModel): no candidate
//!   reached the stored baseline score
//! - [`BaselineConflict`](LearningError::BaselineConflict): another writer
//!   updated the baseline between our read and our write

use car_price_processing::ProcessingError;
use thiserror::Error;

/// The main error type for car-price-learning operations.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LearningError {
    /// Invalid configuration, e.g. an unknown algorithm name in `model.yaml`
    /// or an empty hyperparameter grid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data provided for training or inference.
    ///
    /// Common causes:
    /// - Transformed array has no feature columns
    /// - Fewer rows than cross-validation folds
    /// - Non-finite feature values
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Every candidate failed to train.
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// The best candidate scored below the stored baseline.
    #[error("No model reached the baseline score {baseline:.4} (best {best_score:.4})")]
    NoQualifyingModel {
        /// Score of the best candidate.
        best_score: f64,
        /// Baseline that had to be met.
        baseline: f64,
    },

    /// The baseline record changed since it was read.
    #[error("Baseline was updated concurrently (expected version {expected}, found {found})")]
    BaselineConflict {
        /// Version read before training.
        expected: u64,
        /// Version found at write time.
        found: u64,
    },

    /// The specified model file was not found.
    #[error("Model not found: {path}")]
    ModelNotFound {
        /// The path that was not found.
        path: String,
    },

    /// An error occurred during inference/prediction.
    #[error("Inference error: {0}")]
    InferenceError(String),

    /// Training was cancelled by the user.
    #[error("Training cancelled")]
    Cancelled,

    /// Failure in the data stages (reading arrays, applying the preprocessor).
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// Polars error while reading frames.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// YAML error reading or writing `model.yaml`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Model (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LearningError {
    /// Stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::TrainingFailed(_) => "TRAINING_FAILED",
            Self::NoQualifyingModel { .. } => "NO_QUALIFYING_MODEL",
            Self::BaselineConflict { .. } => "BASELINE_CONFLICT",
            Self::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            Self::InferenceError(_) => "INFERENCE_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::Processing(e) => e.error_code(),
            Self::Polars(_) => "POLARS_ERROR",
            Self::Yaml(_) => "YAML_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias for learning operations.
pub type Result<T> = std::result::Result<T, LearningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_qualifying_model_message() {
        let err = LearningError::NoQualifyingModel {
            best_score: 0.7712,
            baseline: 0.8,
        };
        assert_eq!(
            err.to_string(),
            "No model reached the baseline score 0.8000 (best 0.7712)"
        );
        assert_eq!(err.error_code(), "NO_QUALIFYING_MODEL");
    }

    #[test]
    fn test_processing_code_passes_through() {
        let err = LearningError::from(ProcessingError::ColumnNotFound("engine".to_string()));
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
        assert_eq!(err.to_string(), "Column 'engine' not found in dataset");
    }
}
