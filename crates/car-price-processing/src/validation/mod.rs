//! Data validation stage.
//!
//! Runs the schema checks on both splits plus the drift test between them,
//! and returns every component flag together with their conjunction. The
//! caller decides whether a failed validation stops the run.

mod drift;
mod schema;
mod stats;

pub use drift::{
    CATEGORICAL_NUMERIC_LIMIT, DriftMetrics, DriftOutput, DriftReport, DriftSignal,
    DriftThresholds, FeatureDrift, compute_drift_report, detect_dataset_drift,
};
pub use schema::{
    SplitChecks, categorical_columns_exist, column_types_match, declared_columns_exist,
    numerical_columns_exist, validate_column_count,
};
pub use stats::{chi_square_two_sample, ks_two_sample};

use crate::config::{ProcessingConfig, SchemaConfig};
use crate::error::{Result, ResultExt};
use crate::io;
use crate::types::{DataIngestionArtifacts, DataValidationArtifacts};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Component results of validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStatus {
    pub train: SplitChecks,
    pub test: SplitChecks,
    pub drift_detected: bool,
    /// Every schema check passed on both splits and no dataset drift.
    pub overall: bool,
}

impl ValidationStatus {
    pub fn new(train: SplitChecks, test: SplitChecks, drift_detected: bool) -> Self {
        let overall = train.passed() && test.passed() && !drift_detected;
        Self {
            train,
            test,
            drift_detected,
            overall,
        }
    }

    /// Names of the checks that failed, for log lines and error messages.
    pub fn failures(&self) -> Vec<String> {
        let mut failures: Vec<String> = self
            .train
            .failures()
            .into_iter()
            .map(|name| format!("train {name}"))
            .chain(self.test.failures().into_iter().map(|name| format!("test {name}")))
            .collect();
        if self.drift_detected {
            failures.push("dataset drift".to_string());
        }
        failures
    }
}

/// The validation stage.
pub struct DataValidation<'a> {
    ingestion: &'a DataIngestionArtifacts,
    schema: &'a SchemaConfig,
    settings: &'a ProcessingConfig,
    data_drift_file_path: PathBuf,
}

impl<'a> DataValidation<'a> {
    pub fn new(
        ingestion: &'a DataIngestionArtifacts,
        schema: &'a SchemaConfig,
        settings: &'a ProcessingConfig,
        data_drift_file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ingestion,
            schema,
            settings,
            data_drift_file_path: data_drift_file_path.into(),
        }
    }

    pub fn initiate_data_validation(&self) -> Result<DataValidationArtifacts> {
        info!("Starting data validation");
        let train = io::read_csv(&self.ingestion.train_data_file_path)?;
        let test = io::read_csv(&self.ingestion.test_data_file_path)?;

        let thresholds = DriftThresholds {
            p_value: self.settings.drift_p_value,
            drift_share: self.settings.drift_share,
        };
        let (signal, report) = detect_dataset_drift(
            &train,
            &test,
            DriftOutput::Verdict,
            thresholds,
            &self.data_drift_file_path,
        )
        .context("Detecting dataset drift")?;
        let drift_detected = matches!(signal, DriftSignal::Verdict(true));

        let status = ValidationStatus::new(
            SplitChecks::run(&train, self.schema),
            SplitChecks::run(&test, self.schema),
            drift_detected,
        );

        if status.overall {
            info!("Dataset schema validation completed");
        } else {
            warn!("Data validation failed: {}", status.failures().join(", "));
        }

        Ok(DataValidationArtifacts {
            data_drift_file_path: self.data_drift_file_path.clone(),
            validation_status: status,
            report,
        })
    }
}
