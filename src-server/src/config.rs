//! Application settings.
//!
//! Settings come from environment variables (a `.env` file is loaded first by
//! the binary) and fall back to the defaults below. The CLI can override the
//! HTTP address on top.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `ARTIFACTS_DIR` | `artifacts` |
//! | `SCHEMA_CONFIG` | `config/schema.yaml` |
//! | `MODEL_CONFIG` | `config/model.yaml` |
//! | `DOCUMENT_STORE_DIR` | `data/documents` |
//! | `DATABASE_NAME` | `ineuron` |
//! | `COLLECTION_NAME` | `car` |
//! | `OBJECT_STORE_DIR` | `data/objects` |
//! | `MODEL_BUCKET_NAME` | `car-price-io-files` |
//! | `MODEL_KEY` | `car_price_model.bin` |
//! | `TEST_SIZE` | `0.2` |
//! | `RANDOM_SEED` | unset |
//! | `VALIDATION_POLICY` | `warn` |
//! | `REMOVE_LOCAL_MODEL` | `false` |
//! | `APP_HOST` / `APP_PORT` | `0.0.0.0` / `8080` |

use crate::error::{CarPriceError, Result};
use car_price_processing::ProcessingConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DATABASE_NAME: &str = "ineuron";
pub const COLLECTION_NAME: &str = "car";
pub const MODEL_BUCKET_NAME: &str = "car-price-io-files";
pub const MODEL_FILE_NAME: &str = "car_price_model.bin";
pub const APP_HOST: &str = "0.0.0.0";
pub const APP_PORT: u16 = 8080;

/// What the pipeline does when data validation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Log the failed checks and continue.
    #[default]
    Warn,
    /// Abort the run.
    Fail,
}

impl FromStr for ValidationPolicy {
    type Err = CarPriceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(ValidationPolicy::Warn),
            "fail" => Ok(ValidationPolicy::Fail),
            other => Err(CarPriceError::InvalidConfig(format!(
                "validation policy must be 'warn' or 'fail', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationPolicy::Warn => f.write_str("warn"),
            ValidationPolicy::Fail => f.write_str("fail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Parent of the timestamped run directories.
    pub artifacts_dir: PathBuf,
    pub schema_config_path: PathBuf,
    /// Model search config; also holds the baseline record.
    pub model_config_path: PathBuf,
    pub document_store_dir: PathBuf,
    pub database_name: String,
    pub collection_name: String,
    pub object_store_dir: PathBuf,
    pub bucket_name: String,
    pub model_key: String,
    pub test_size: f64,
    pub random_seed: Option<u64>,
    pub validation_policy: ValidationPolicy,
    /// Delete the trainer's local model after a successful push.
    pub remove_local_model: bool,
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("artifacts"),
            schema_config_path: PathBuf::from("config/schema.yaml"),
            model_config_path: PathBuf::from("config/model.yaml"),
            document_store_dir: PathBuf::from("data/documents"),
            database_name: DATABASE_NAME.to_string(),
            collection_name: COLLECTION_NAME.to_string(),
            object_store_dir: PathBuf::from("data/objects"),
            bucket_name: MODEL_BUCKET_NAME.to_string(),
            model_key: MODEL_FILE_NAME.to_string(),
            test_size: car_price_processing::config::DEFAULT_TEST_SIZE,
            random_seed: None,
            validation_policy: ValidationPolicy::default(),
            remove_local_model: false,
            host: APP_HOST.to_string(),
            port: APP_PORT,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CarPriceError::InvalidConfig(format!("{name}: cannot parse '{value}'")))
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from a variable lookup, defaulting whatever it does not return.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let path = |name: &str, target: &mut PathBuf| {
            if let Some(value) = lookup(name) {
                *target = PathBuf::from(value);
            }
        };
        path("ARTIFACTS_DIR", &mut config.artifacts_dir);
        path("SCHEMA_CONFIG", &mut config.schema_config_path);
        path("MODEL_CONFIG", &mut config.model_config_path);
        path("DOCUMENT_STORE_DIR", &mut config.document_store_dir);
        path("OBJECT_STORE_DIR", &mut config.object_store_dir);

        if let Some(value) = lookup("DATABASE_NAME") {
            config.database_name = value;
        }
        if let Some(value) = lookup("COLLECTION_NAME") {
            config.collection_name = value;
        }
        if let Some(value) = lookup("MODEL_BUCKET_NAME") {
            config.bucket_name = value;
        }
        if let Some(value) = lookup("MODEL_KEY") {
            config.model_key = value;
        }
        if let Some(value) = lookup("TEST_SIZE") {
            config.test_size = parse_var("TEST_SIZE", &value)?;
        }
        if let Some(value) = lookup("RANDOM_SEED") {
            config.random_seed = Some(parse_var("RANDOM_SEED", &value)?);
        }
        if let Some(value) = lookup("VALIDATION_POLICY") {
            config.validation_policy = value.parse()?;
        }
        if let Some(value) = lookup("REMOVE_LOCAL_MODEL") {
            config.remove_local_model = parse_var("REMOVE_LOCAL_MODEL", &value)?;
        }
        if let Some(value) = lookup("APP_HOST") {
            config.host = value;
        }
        if let Some(value) = lookup("APP_PORT") {
            config.port = parse_var("APP_PORT", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_name.trim().is_empty() || self.model_key.trim().is_empty() {
            return Err(CarPriceError::InvalidConfig(
                "bucket and model key must not be empty".to_string(),
            ));
        }
        self.processing_config()?;
        Ok(())
    }

    /// Tunables handed to the data stages.
    pub fn processing_config(&self) -> Result<ProcessingConfig> {
        let mut builder = ProcessingConfig::builder().test_size(self.test_size);
        if let Some(seed) = self.random_seed {
            builder = builder.random_seed(seed);
        }
        builder
            .build()
            .map_err(|e| CarPriceError::InvalidConfig(e.to_string()))
    }
}
