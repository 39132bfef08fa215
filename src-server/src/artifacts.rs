//! Per-run artifact directory layout.
//!
//! ```text
//! <artifacts_dir>/<%m_%d_%Y_%H_%M_%S>/
//! ├── DataIngestionArtifacts/{Train/train.csv, Test/test.csv}
//! ├── DataValidationArtifacts/DataDriftReport.yaml
//! ├── DataTransformationArtifacts/
//! │   ├── TransformedTrain/transformed_train_data.arrow
//! │   ├── TransformedTest/transformed_test_data.arrow
//! │   └── car_price_preprocessor.bin
//! └── ModelTrainerArtifacts/car_price_model.bin
//! ```

use crate::config::MODEL_FILE_NAME;
use car_price_learning::ModelTrainerConfig;
use car_price_processing::{DataIngestionConfig, DataTransformationConfig};
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ARTIFACT_TIMESTAMP_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

const INGESTION_DIR: &str = "DataIngestionArtifacts";
const VALIDATION_DIR: &str = "DataValidationArtifacts";
const TRANSFORMATION_DIR: &str = "DataTransformationArtifacts";
const TRAINER_DIR: &str = "ModelTrainerArtifacts";

/// Paths of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactLayout {
    run_dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new<Tz: TimeZone>(artifacts_dir: &Path, timestamp: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            run_dir: artifacts_dir.join(timestamp.format(ARTIFACT_TIMESTAMP_FORMAT).to_string()),
        }
    }

    /// Layout for a run starting now, in local time.
    pub fn now(artifacts_dir: &Path) -> Self {
        Self::new(artifacts_dir, &Local::now())
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn ingestion_config(&self, database_name: &str, collection_name: &str) -> DataIngestionConfig {
        let dir = self.run_dir.join(INGESTION_DIR);
        DataIngestionConfig {
            database_name: database_name.to_string(),
            collection_name: collection_name.to_string(),
            train_data_file_path: dir.join("Train").join("train.csv"),
            test_data_file_path: dir.join("Test").join("test.csv"),
        }
    }

    pub fn drift_report_path(&self) -> PathBuf {
        self.run_dir.join(VALIDATION_DIR).join("DataDriftReport.yaml")
    }

    pub fn transformation_config(&self) -> DataTransformationConfig {
        let dir = self.run_dir.join(TRANSFORMATION_DIR);
        DataTransformationConfig {
            transformed_train_file_path: dir
                .join("TransformedTrain")
                .join("transformed_train_data.arrow"),
            transformed_test_file_path: dir
                .join("TransformedTest")
                .join("transformed_test_data.arrow"),
            preprocessor_file_path: dir.join("car_price_preprocessor.bin"),
        }
    }

    pub fn trainer_config(&self) -> ModelTrainerConfig {
        ModelTrainerConfig {
            trained_model_file_path: self.run_dir.join(TRAINER_DIR).join(MODEL_FILE_NAME),
        }
    }
}

/// Where the pusher uploaded the accepted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPusherArtifacts {
    pub bucket_name: String,
    pub s3_model_path: String,
}
