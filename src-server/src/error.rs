//! Application error type.
//!
//! Stage errors from the two library crates pass through unchanged and keep
//! their codes; the variants defined here cover storage, configuration and
//! the prediction boundary. Errors serialize as `{code, message}`.

use car_price_learning::LearningError;
use car_price_processing::ProcessingError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarPriceError {
    /// A prediction form field is missing or malformed.
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Validation failed under the `fail` policy.
    #[error("Data validation failed: {0}")]
    ValidationFailed(String),

    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("No model has been published yet")]
    ModelNotPublished,

    #[error("Storage error: {0}")]
    Storage(String),

    /// The model ran but did not produce a usable price.
    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Learning(#[from] LearningError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CarPriceError>,
    },
}

impl CarPriceError {
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CarPriceError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CarPriceError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code; library errors keep their own.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::ObjectNotFound { .. } => "OBJECT_NOT_FOUND",
            Self::ModelNotPublished => "MODEL_NOT_PUBLISHED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Prediction(_) => "PREDICTION_ERROR",
            Self::Processing(e) => e.error_code(),
            Self::Learning(e) => e.error_code(),
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the run stopped because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Learning(LearningError::Cancelled) => true,
            Self::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

impl Serialize for CarPriceError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CarPriceError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type Result<T> = std::result::Result<T, CarPriceError>;

pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<CarPriceError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}
