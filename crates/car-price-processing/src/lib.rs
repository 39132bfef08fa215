//! Data stages of the car price training pipeline.
//!
//! - **Ingestion**: fetch the raw collection from a [`DocumentSource`], drop
//!   configured columns, split into train/test and persist both as CSV.
//! - **Validation**: column checks against the [`SchemaConfig`] and a drift
//!   report between the splits.
//! - **Transformation**: outlier capping, a [`FittedPreprocessor`] fit on train
//!   features only, and Arrow IPC arrays with the target as the last column.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use car_price_processing::*;
//!
//! let schema = SchemaConfig::from_yaml_file("config/schema.yaml")?;
//! let settings = ProcessingConfig::builder().random_seed(42).build()?;
//! let source = JsonDocumentSource::new("data/documents");
//!
//! let ingestion = DataIngestion::new(ingestion_config, &schema, &settings, &source)
//!     .initiate_data_ingestion()?;
//! let validation = DataValidation::new(&ingestion, &schema, &settings, drift_path)
//!     .initiate_data_validation()?;
//! let transformed = DataTransformation::new(&ingestion, &schema, &settings, transform_config)
//!     .initiate_data_transformation()?;
//! ```

pub mod config;
pub mod error;
pub mod ingestion;
pub mod io;
pub mod source;
pub mod transform;
pub mod types;
pub mod utils;
pub mod validation;

pub use config::{ConfigValidationError, ProcessingConfig, ProcessingConfigBuilder, SchemaConfig};
pub use error::{ProcessingError, Result, ResultExt};
pub use ingestion::{DataIngestion, DataIngestionConfig, train_test_split};
pub use source::{DocumentSource, JsonDocumentSource};
pub use transform::{
    ColumnGroups, DataTransformation, DataTransformationConfig, FittedPreprocessor,
    OutlierHandler,
};
pub use types::{DataIngestionArtifacts, DataTransformationArtifacts, DataValidationArtifacts};
pub use validation::{
    DataValidation, DriftOutput, DriftReport, DriftSignal, SplitChecks, ValidationStatus,
    detect_dataset_drift,
};
