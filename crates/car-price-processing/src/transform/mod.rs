//! Data transformation stage.
//!
//! Caps outliers in continuous columns of each split independently, fits the
//! preprocessor on train features only, transforms both splits, and appends
//! the target as the last column of each persisted array.

mod encoders;
mod outliers;
mod preprocessor;

pub use encoders::{BinaryEncoder, OneHotEncoder, StandardScaler};
pub use outliers::{Fences, OutlierHandler};
pub use preprocessor::{ColumnGroups, FittedPreprocessor};

use crate::config::{ProcessingConfig, SchemaConfig};
use crate::error::{ProcessingError, Result, ResultExt};
use crate::io;
use crate::types::{DataIngestionArtifacts, DataTransformationArtifacts};
use polars::prelude::*;
use std::path::PathBuf;
use tracing::info;

/// Output locations of the transformation stage.
#[derive(Debug, Clone)]
pub struct DataTransformationConfig {
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
    pub preprocessor_file_path: PathBuf,
}

/// Split `df` into features (every column but the target) and the target as `f64`.
pub fn split_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Series)> {
    if df.get_column_index(target).is_none() {
        return Err(ProcessingError::ColumnNotFound(target.to_string()));
    }
    let features = df.drop(target)?;
    let y = df
        .column(target)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok((features, y))
}

/// Append `target` as the last column of a transformed feature frame.
pub fn append_target(mut features: DataFrame, target: Series) -> Result<DataFrame> {
    features.with_column(target)?;
    Ok(features)
}

/// The transformation stage.
pub struct DataTransformation<'a> {
    ingestion: &'a DataIngestionArtifacts,
    schema: &'a SchemaConfig,
    settings: &'a ProcessingConfig,
    config: DataTransformationConfig,
}

impl<'a> DataTransformation<'a> {
    pub fn new(
        ingestion: &'a DataIngestionArtifacts,
        schema: &'a SchemaConfig,
        settings: &'a ProcessingConfig,
        config: DataTransformationConfig,
    ) -> Self {
        Self {
            ingestion,
            schema,
            settings,
            config,
        }
    }

    pub fn initiate_data_transformation(&self) -> Result<DataTransformationArtifacts> {
        info!("Starting data transformation");
        let mut train = io::read_csv(&self.ingestion.train_data_file_path)?;
        let mut test = io::read_csv(&self.ingestion.test_data_file_path)?;

        let continuous = OutlierHandler::continuous_columns(
            &train,
            &self.schema.numerical_columns,
            self.settings.continuous_min_unique,
        )?;
        info!("Continuous columns: {:?}", continuous);
        let capped_train =
            OutlierHandler::cap_outliers(&mut train, &continuous, self.settings.iqr_multiplier)
                .context("Capping outliers in train")?;
        let capped_test =
            OutlierHandler::cap_outliers(&mut test, &continuous, self.settings.iqr_multiplier)
                .context("Capping outliers in test")?;
        info!(
            "Capped {} train values and {} test values",
            capped_train, capped_test
        );

        let target = &self.schema.target_column;
        let (train_features, train_target) = split_target(&train, target)?;
        let (test_features, test_target) = split_target(&test, target)?;

        let preprocessor =
            FittedPreprocessor::fit(&train_features, &ColumnGroups::from(self.schema))
                .context("Fitting preprocessor")?;
        let mut train_arr = append_target(preprocessor.transform(&train_features)?, train_target)?;
        let mut test_arr = append_target(preprocessor.transform(&test_features)?, test_target)?;

        io::write_array(&mut train_arr, &self.config.transformed_train_file_path)?;
        io::write_array(&mut test_arr, &self.config.transformed_test_file_path)?;
        preprocessor.save(&self.config.preprocessor_file_path)?;
        info!(
            "Saved transformed arrays {:?} / {:?} and preprocessor",
            train_arr.shape(),
            test_arr.shape()
        );

        Ok(DataTransformationArtifacts {
            transformed_object_file_path: self.config.preprocessor_file_path.clone(),
            transformed_train_file_path: self.config.transformed_train_file_path.clone(),
            transformed_test_file_path: self.config.transformed_test_file_path.clone(),
        })
    }
}
