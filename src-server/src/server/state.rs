//! Shared server state

use crate::config::AppConfig;
use crate::predictor::{CarPricePredictor, ModelCache};
use crate::storage::{LocalObjectStore, ObjectStore};
use car_price_processing::{DocumentSource, JsonDocumentSource};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub source: Arc<dyn DocumentSource>,
    pub store: Arc<dyn ObjectStore>,
    /// Shared by the predictor and the training pipeline.
    pub model_cache: Arc<ModelCache>,
    pub predictor: Arc<CarPricePredictor>,
    /// Held for the duration of a training run.
    pub training: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        source: Arc<dyn DocumentSource>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        let model_cache = Arc::new(ModelCache::new());
        let predictor = Arc::new(CarPricePredictor::new(
            store.clone(),
            config.bucket_name.clone(),
            config.model_key.clone(),
            model_cache.clone(),
        ));
        Self {
            config: Arc::new(config),
            source,
            store,
            model_cache,
            predictor,
            training: Arc::new(Mutex::new(())),
        }
    }

    /// State over the directory-backed document and object stores.
    pub fn from_config(config: AppConfig) -> Self {
        let source = Arc::new(JsonDocumentSource::new(&config.document_store_dir));
        let store = Arc::new(LocalObjectStore::new(&config.object_store_dir));
        Self::new(config, source, store)
    }
}
