//! Records produced by the trainer and evaluation stages.

use crate::algorithms::{Algorithm, Hyperparameters};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one candidate algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelComparison {
    pub algorithm: Algorithm,
    pub params: Hyperparameters,
    /// Mean cross-validation R² of the chosen grid point.
    pub cv_score: f64,
    /// R² on the held-out test array.
    pub test_score: f64,
}

/// Output of the trainer stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTrainerArtifacts {
    pub trained_model_file_path: PathBuf,
    pub best_model_name: String,
    pub best_model_score: f64,
    /// Every candidate that trained, best first.
    pub model_comparison: Vec<ModelComparison>,
}

/// Scores compared by the evaluation stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluationResponse {
    pub trained_model_r2_score: f64,
    /// `None` when nothing is published yet.
    pub s3_model_r2_score: Option<f64>,
    pub is_model_accepted: bool,
    pub difference: f64,
}

/// Output of the evaluation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluationArtifact {
    pub is_model_accepted: bool,
    pub trained_model_path: PathBuf,
    /// Trained score minus the published score.
    pub changed_accuracy: f64,
    pub response: ModelEvaluationResponse,
}
