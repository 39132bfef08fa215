//! The prediction service.
//!
//! [`CarData`] carries the ten raw form fields; [`CarPricePredictor`] turns
//! them into a one-row frame and runs the published [`CarPriceModel`] on it.
//! The model is read through a [`ModelCache`] that revalidates against the
//! object's ETag on every call, so a republished model is picked up on the
//! next request without refetching an unchanged one.

use crate::error::{CarPriceError, Result};
use crate::storage::ObjectStore;
use car_price_learning::CarPriceModel;
use car_price_processing::utils::parse_numeric_string;
use parking_lot::RwLock;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// One car as submitted by the prediction form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarData {
    pub car_name: String,
    pub vehicle_age: String,
    pub km_driven: String,
    pub seller_type: String,
    pub fuel_type: String,
    pub transmission_type: String,
    pub mileage: String,
    pub engine: String,
    pub max_power: String,
    pub seats: String,
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CarPriceError::invalid_input(field, "is required"));
    }
    Ok(value)
}

fn numeric(field: &str, value: &str) -> Result<f64> {
    let value = required(field, value)?;
    parse_numeric_string(value)
        .ok_or_else(|| CarPriceError::invalid_input(field, format!("'{value}' is not a number")))
}

impl CarData {
    /// One-row frame with the raw feature columns.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let df = df![
            "car_name" => [required("car_name", &self.car_name)?],
            "vehicle_age" => [numeric("vehicle_age", &self.vehicle_age)?],
            "km_driven" => [numeric("km_driven", &self.km_driven)?],
            "seller_type" => [required("seller_type", &self.seller_type)?],
            "fuel_type" => [required("fuel_type", &self.fuel_type)?],
            "transmission_type" => [required("transmission_type", &self.transmission_type)?],
            "mileage" => [numeric("mileage", &self.mileage)?],
            "engine" => [numeric("engine", &self.engine)?],
            "max_power" => [numeric("max_power", &self.max_power)?],
            "seats" => [numeric("seats", &self.seats)?],
        ]?;
        Ok(df)
    }
}

/// Round a price to cents.
pub fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug)]
struct CachedModel {
    etag: String,
    model: Arc<CarPriceModel>,
}

/// The published model, keyed by its ETag.
#[derive(Debug, Default)]
pub struct ModelCache {
    entry: RwLock<Option<CachedModel>>,
}

static_assertions::assert_impl_all!(ModelCache: Send, Sync);

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The published model, `None` when nothing is published.
    pub fn get_or_load(
        &self,
        store: &dyn ObjectStore,
        bucket: &str,
        key: &str,
    ) -> Result<Option<Arc<CarPriceModel>>> {
        let Some(meta) = store.head(bucket, key)? else {
            self.invalidate();
            return Ok(None);
        };

        if let Some(cached) = self.entry.read().as_ref() {
            if cached.etag == meta.etag {
                return Ok(Some(cached.model.clone()));
            }
        }

        debug!("Loading {bucket}/{key} (etag {})", meta.etag);
        let model = Arc::new(CarPriceModel::from_bytes(&store.get(bucket, key)?)?);
        *self.entry.write() = Some(CachedModel {
            etag: meta.etag.clone(),
            model: model.clone(),
        });
        info!("Loaded published model {} (etag {})", model.best_model_name(), meta.etag);
        Ok(Some(model))
    }

    /// Drop the cached model so the next request reloads it.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }

    pub fn cached_etag(&self) -> Option<String> {
        self.entry.read().as_ref().map(|c| c.etag.clone())
    }
}

/// Serves predictions from the published model.
pub struct CarPricePredictor {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    key: String,
    cache: Arc<ModelCache>,
}

impl CarPricePredictor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        key: impl Into<String>,
        cache: Arc<ModelCache>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            key: key.into(),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    fn model(&self) -> Result<Arc<CarPriceModel>> {
        self.cache
            .get_or_load(self.store.as_ref(), &self.bucket, &self.key)?
            .ok_or(CarPriceError::ModelNotPublished)
    }

    /// Predicted price for one car, rounded to 2 decimals.
    pub fn predict(&self, car: &CarData) -> Result<f64> {
        let df = car.to_dataframe()?;
        let prediction = self
            .model()?
            .predict(&df)?
            .first()
            .copied()
            .ok_or_else(|| CarPriceError::Prediction("model returned no prediction".to_string()))?;
        Ok(round_price(prediction))
    }

    /// Car names the published model knows; empty when nothing is published.
    pub fn car_names(&self) -> Result<Vec<String>> {
        let Some(model) = self
            .cache
            .get_or_load(self.store.as_ref(), &self.bucket, &self.key)?
        else {
            return Ok(Vec::new());
        };
        Ok(model
            .known_categories("car_name")
            .map(<[String]>::to_vec)
            .unwrap_or_default())
    }
}
