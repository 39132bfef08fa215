//! Configuration types for the data stages.
//!
//! [`SchemaConfig`] is the externally supplied column description read from
//! `schema.yaml`. [`ProcessingConfig`] holds the tunables of ingestion,
//! validation and transformation and is built with the builder pattern.

use crate::error::{ProcessingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default fraction of rows held out for the test split.
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Numerical columns with at least this many distinct train values are capped.
pub const DEFAULT_CONTINUOUS_MIN_UNIQUE: usize = 25;

/// Column description shared by every data stage.
///
/// ```yaml
/// columns:
///   - car_name: category
///   - vehicle_age: int
/// numerical_columns: [vehicle_age, km_driven]
/// target_column: selling_price
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Expected post-drop columns, each a single `name: dtype` entry.
    pub columns: Vec<BTreeMap<String, String>>,
    pub numerical_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub onehot_columns: Vec<String>,
    pub binary_columns: Vec<String>,
    #[serde(default)]
    pub drop_columns: Vec<String>,
    pub target_column: String,
}

impl SchemaConfig {
    /// Read and validate a schema file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProcessingError::Io(e).with_context(format!("Reading schema {}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse and validate a schema document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let schema: SchemaConfig = serde_yaml::from_str(text)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Expected column names, in declaration order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|entry| entry.keys().cloned())
            .collect()
    }

    /// Number of declared columns.
    pub fn column_count(&self) -> usize {
        self.columns.iter().map(BTreeMap::len).sum()
    }

    /// Check that the groups are consistent with each other.
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(ProcessingError::InvalidConfig(
                "target_column must not be empty".to_string(),
            ));
        }
        if let Some(entry) = self.columns.iter().find(|entry| entry.len() != 1) {
            return Err(ProcessingError::InvalidConfig(format!(
                "each `columns` entry must hold exactly one name, found {}",
                entry.len()
            )));
        }
        for group in [&self.numerical_columns, &self.onehot_columns, &self.binary_columns] {
            if group.contains(&self.target_column) {
                return Err(ProcessingError::InvalidConfig(format!(
                    "target column '{}' cannot also be a feature",
                    self.target_column
                )));
            }
        }
        if let Some(dropped) = self
            .drop_columns
            .iter()
            .find(|c| **c == self.target_column)
        {
            return Err(ProcessingError::InvalidConfig(format!(
                "target column '{dropped}' cannot be dropped"
            )));
        }
        Ok(())
    }
}

/// Tunables for ingestion, validation and transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Fraction of rows in the test split (exclusive 0..1).
    pub test_size: f64,

    /// Seed for the train/test shuffle. `None` draws from OS entropy.
    pub random_seed: Option<u64>,

    /// A feature drifts when its test p-value falls below this.
    pub drift_p_value: f64,

    /// The dataset drifts when this share of features drifted.
    pub drift_share: f64,

    /// Minimum distinct train values for a numerical column to be capped.
    pub continuous_min_unique: usize,

    /// IQR multiplier for the capping fences.
    pub iqr_multiplier: f64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            test_size: DEFAULT_TEST_SIZE,
            random_seed: None,
            drift_p_value: 0.05,
            drift_share: 0.5,
            continuous_min_unique: DEFAULT_CONTINUOUS_MIN_UNIQUE,
            iqr_multiplier: 1.5,
        }
    }
}

impl ProcessingConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ConfigValidationError::InvalidFraction {
                field: "test_size".to_string(),
                value: self.test_size,
            });
        }
        if !(self.drift_p_value > 0.0 && self.drift_p_value < 1.0) {
            return Err(ConfigValidationError::InvalidFraction {
                field: "drift_p_value".to_string(),
                value: self.drift_p_value,
            });
        }
        if !(0.0..=1.0).contains(&self.drift_share) {
            return Err(ConfigValidationError::InvalidFraction {
                field: "drift_share".to_string(),
                value: self.drift_share,
            });
        }
        if self.iqr_multiplier.is_nan() || self.iqr_multiplier < 0.0 {
            return Err(ConfigValidationError::InvalidMultiplier(self.iqr_multiplier));
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid fraction for '{field}': {value}")]
    InvalidFraction { field: String, value: f64 },

    #[error("Invalid IQR multiplier: {0} (must be non-negative)")]
    InvalidMultiplier(f64),
}

impl From<ConfigValidationError> for ProcessingError {
    fn from(e: ConfigValidationError) -> Self {
        ProcessingError::InvalidConfig(e.to_string())
    }
}

/// Builder for [`ProcessingConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ProcessingConfigBuilder {
    test_size: Option<f64>,
    random_seed: Option<u64>,
    drift_p_value: Option<f64>,
    drift_share: Option<f64>,
    continuous_min_unique: Option<usize>,
    iqr_multiplier: Option<f64>,
}

impl ProcessingConfigBuilder {
    /// Set the test split fraction.
    pub fn test_size(mut self, fraction: f64) -> Self {
        self.test_size = Some(fraction);
        self
    }

    /// Fix the shuffle seed so splits are reproducible.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Set the per-feature drift p-value threshold.
    pub fn drift_p_value(mut self, threshold: f64) -> Self {
        self.drift_p_value = Some(threshold);
        self
    }

    /// Set the drifted-feature share that marks the dataset as drifted.
    pub fn drift_share(mut self, share: f64) -> Self {
        self.drift_share = Some(share);
        self
    }

    pub fn continuous_min_unique(mut self, n: usize) -> Self {
        self.continuous_min_unique = Some(n);
        self
    }

    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = Some(k);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ProcessingConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<ProcessingConfig, ConfigValidationError> {
        let defaults = ProcessingConfig::default();
        let config = ProcessingConfig {
            test_size: self.test_size.unwrap_or(defaults.test_size),
            random_seed: self.random_seed,
            drift_p_value: self.drift_p_value.unwrap_or(defaults.drift_p_value),
            drift_share: self.drift_share.unwrap_or(defaults.drift_share),
            continuous_min_unique: self
                .continuous_min_unique
                .unwrap_or(defaults.continuous_min_unique),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
columns:
  - car_name: category
  - vehicle_age: int
  - km_driven: int
  - selling_price: int
numerical_columns: [vehicle_age, km_driven]
categorical_columns: [car_name]
onehot_columns: []
binary_columns: [car_name]
drop_columns: [brand]
target_column: selling_price
"#;

    #[test]
    fn test_schema_from_yaml() {
        let schema = SchemaConfig::from_yaml_str(SCHEMA).unwrap();
        assert_eq!(schema.column_count(), 4);
        assert_eq!(
            schema.column_names(),
            vec!["car_name", "vehicle_age", "km_driven", "selling_price"]
        );
        assert_eq!(schema.drop_columns, vec!["brand"]);
        assert_eq!(schema.target_column, "selling_price");
    }

    #[test]
    fn test_schema_rejects_target_as_feature() {
        let text = SCHEMA.replace(
            "numerical_columns: [vehicle_age, km_driven]",
            "numerical_columns: [vehicle_age, selling_price]",
        );
        let err = SchemaConfig::from_yaml_str(&text).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_builder_defaults() {
        let config = ProcessingConfig::builder().build().unwrap();
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_seed, None);
        assert_eq!(config.continuous_min_unique, 25);
        assert_eq!(config.iqr_multiplier, 1.5);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ProcessingConfig::builder()
            .test_size(0.3)
            .random_seed(42)
            .drift_share(0.25)
            .build()
            .unwrap();
        assert_eq!(config.test_size, 0.3);
        assert_eq!(config.random_seed, Some(42));
        assert_eq!(config.drift_share, 0.25);
    }

    #[test]
    fn test_validation_invalid_test_size() {
        let result = ProcessingConfig::builder().test_size(1.0).build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::InvalidFraction { .. })
        ));
    }
}
