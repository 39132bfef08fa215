//! Artifact records produced by the data stages.
//!
//! Each stage returns one of these to the orchestrator; later stages take the
//! record of the stage they consume instead of re-deriving paths.

use crate::validation::{DriftReport, ValidationStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where ingestion persisted the two splits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIngestionArtifacts {
    pub train_data_file_path: PathBuf,
    pub test_data_file_path: PathBuf,
}

/// Outcome of data validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataValidationArtifacts {
    /// YAML drift report written by the drift check.
    pub data_drift_file_path: PathBuf,
    /// Every component check, plus the combined verdict.
    pub validation_status: ValidationStatus,
    pub report: DriftReport,
}

impl DataValidationArtifacts {
    /// Combined verdict of all checks.
    pub fn is_valid(&self) -> bool {
        self.validation_status.overall
    }
}

/// Where transformation persisted the arrays and the fitted preprocessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransformationArtifacts {
    pub transformed_object_file_path: PathBuf,
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
}
