//! Model pusher: uploads the accepted model to the object store.

use crate::artifacts::ModelPusherArtifacts;
use crate::error::{CarPriceError, Result, ResultExt};
use crate::storage::{ObjectMeta, ObjectStore};
use car_price_learning::ModelEvaluationArtifact;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ModelPusherConfig {
    pub bucket_name: String,
    pub model_key: String,
    /// Delete the local model file once uploaded.
    pub remove_local: bool,
}

/// Upload `local` to `bucket/key`, optionally removing the local copy.
pub fn upload_file(
    store: &dyn ObjectStore,
    local: &Path,
    key: &str,
    bucket: &str,
    remove_local: bool,
) -> Result<ObjectMeta> {
    let bytes = fs::read(local).context(format!("Reading {}", local.display()))?;
    let meta = store.put(bucket, key, &bytes)?;
    info!(
        "Uploaded {} to {bucket}/{key} ({} bytes, etag {})",
        local.display(),
        meta.size,
        meta.etag
    );

    if remove_local {
        if let Err(e) = fs::remove_file(local) {
            warn!("Could not remove {}: {e}", local.display());
        }
    }
    Ok(meta)
}

pub struct ModelPusher<'a> {
    store: &'a dyn ObjectStore,
    config: ModelPusherConfig,
}

impl<'a> ModelPusher<'a> {
    pub fn new(store: &'a dyn ObjectStore, config: ModelPusherConfig) -> Self {
        Self { store, config }
    }

    pub fn initiate_model_pusher(
        &self,
        evaluation: &ModelEvaluationArtifact,
    ) -> Result<ModelPusherArtifacts> {
        info!("Entered the model pusher stage");
        if !evaluation.is_model_accepted {
            return Err(CarPriceError::Storage(
                "refusing to push a model that evaluation rejected".to_string(),
            ));
        }

        upload_file(
            self.store,
            &evaluation.trained_model_path,
            &self.config.model_key,
            &self.config.bucket_name,
            self.config.remove_local,
        )?;

        Ok(ModelPusherArtifacts {
            bucket_name: self.config.bucket_name.clone(),
            s3_model_path: self.config.model_key.clone(),
        })
    }
}
