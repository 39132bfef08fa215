//! The training pipeline orchestrator.
//!
//! Runs the stages strictly in order:
//!
//! 1. **Ingestion** - fetch the collection, drop columns, split train/test
//! 2. **Validation** - schema checks and drift report; gated by [`ValidationPolicy`]
//! 3. **Transformation** - cap outliers, fit the preprocessor, write arrays
//! 4. **Training** - tune every candidate, ratchet the baseline, save the model
//! 5. **Evaluation** - compare against the published model
//! 6. **Pushing** - upload the model, only when evaluation accepted it
//!
//! Any stage error aborts the run. A rerun starts over in a fresh timestamped
//! artifact directory.
//!
//! # Example
//!
//! ```rust,ignore
//! let pipeline = TrainPipeline::builder()
//!     .config(AppConfig::from_env()?)
//!     .document_source(Arc::new(JsonDocumentSource::new("data/documents")))
//!     .object_store(Arc::new(LocalObjectStore::new("data/objects")))
//!     .on_progress(|u| println!("[{}] {:.0}% {}", u.stage, u.progress * 100.0, u.message))
//!     .build()?;
//!
//! let run = pipeline.run()?;
//! ```

use crate::artifacts::{ArtifactLayout, ModelPusherArtifacts};
use crate::config::{AppConfig, ValidationPolicy};
use crate::error::{CarPriceError, Result};
use crate::pipeline::pusher::{ModelPusher, ModelPusherConfig};
use crate::predictor::ModelCache;
use crate::storage::ObjectStore;
use car_price_learning::{
    CancellationToken, ModelEvaluation, ModelEvaluationArtifact, ModelSearchConfig,
    ModelTrainer, ModelTrainerArtifacts, ProgressCallback, ProgressUpdate, TrainingStage,
    YamlBaselineStore,
};
use car_price_processing::{
    DataIngestion, DataTransformation, DataValidation, DataValidationArtifacts, DocumentSource,
    SchemaConfig,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingRun {
    pub run_dir: PathBuf,
    pub validation: DataValidationArtifacts,
    pub trainer: ModelTrainerArtifacts,
    pub evaluation: ModelEvaluationArtifact,
    /// `None` when evaluation rejected the model.
    pub pushed: Option<ModelPusherArtifacts>,
}

impl TrainingRun {
    pub fn is_published(&self) -> bool {
        self.pushed.is_some()
    }
}

pub struct TrainPipeline {
    config: AppConfig,
    source: Arc<dyn DocumentSource>,
    store: Arc<dyn ObjectStore>,
    cache: Arc<ModelCache>,
    progress_callback: Option<ProgressCallback>,
    cancellation_token: CancellationToken,
}

impl std::fmt::Debug for TrainPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainPipeline")
            .field("config", &self.config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field("cancelled", &self.cancellation_token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl TrainPipeline {
    #[must_use]
    pub fn builder() -> TrainPipelineBuilder {
        TrainPipelineBuilder::default()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    fn report(&self, stage: TrainingStage, message: impl Into<String>) {
        if let Some(callback) = &self.progress_callback {
            callback(ProgressUpdate::new(stage, message));
        }
    }

    /// Run every stage once.
    ///
    /// # Errors
    ///
    /// The first stage error, unchanged. A rejected model is not an error:
    /// the run returns with `pushed == None`.
    pub fn run(&self) -> Result<TrainingRun> {
        match self.run_stages() {
            Ok(run) => Ok(run),
            Err(e) if e.is_cancelled() => {
                warn!("Training pipeline cancelled");
                self.report(TrainingStage::Cancelled, "Training cancelled");
                Err(e)
            }
            Err(e) => {
                error!("Training pipeline failed: {e}");
                self.report(TrainingStage::Failed, e.to_string());
                Err(e)
            }
        }
    }

    fn run_stages(&self) -> Result<TrainingRun> {
        let config = &self.config;
        let token = &self.cancellation_token;
        self.report(TrainingStage::Initializing, "Loading configuration");
        token.check()?;

        let schema = SchemaConfig::from_yaml_file(&config.schema_config_path)?;
        let search = ModelSearchConfig::from_yaml_file(&config.model_config_path)?;
        let baseline = YamlBaselineStore::new(&config.model_config_path);
        let settings = config.processing_config()?;
        let layout = ArtifactLayout::now(&config.artifacts_dir);
        info!("Starting training run in {}", layout.run_dir().display());

        token.check()?;
        self.report(TrainingStage::Ingestion, "Fetching the collection");
        let ingestion = DataIngestion::new(
            layout.ingestion_config(&config.database_name, &config.collection_name),
            &schema,
            &settings,
            self.source.as_ref(),
        )
        .initiate_data_ingestion()?;

        token.check()?;
        self.report(TrainingStage::Validation, "Validating train and test data");
        let validation =
            DataValidation::new(&ingestion, &schema, &settings, layout.drift_report_path())
                .initiate_data_validation()?;
        if !validation.is_valid() {
            let failures = validation.validation_status.failures().join(", ");
            match config.validation_policy {
                ValidationPolicy::Fail => return Err(CarPriceError::ValidationFailed(failures)),
                ValidationPolicy::Warn => {
                    warn!("Data validation failed ({failures}); continuing")
                }
            }
        }

        token.check()?;
        self.report(TrainingStage::Transformation, "Fitting the preprocessor");
        let transformation =
            DataTransformation::new(&ingestion, &schema, &settings, layout.transformation_config())
                .initiate_data_transformation()?;

        token.check()?;
        self.report(TrainingStage::Training, "Tuning candidate models");
        let trainer = ModelTrainer::new(&transformation, &search, &baseline, layout.trainer_config())
            .with_progress(self.progress_callback.clone())
            .with_cancellation(token.clone())
            .initiate_model_trainer()?;

        token.check()?;
        self.report(TrainingStage::Evaluation, "Comparing with the published model");
        let published =
            self.cache
                .get_or_load(self.store.as_ref(), &config.bucket_name, &config.model_key)?;
        let evaluation = ModelEvaluation::new(&ingestion, &trainer, &schema.target_column)
            .initiate_model_evaluation(published.as_deref())?;

        if !evaluation.is_model_accepted {
            info!(
                "Trained model not better than the published one (difference {:.4})",
                evaluation.changed_accuracy
            );
            self.report(TrainingStage::Rejected, "Trained model rejected");
            return Ok(TrainingRun {
                run_dir: layout.run_dir().to_path_buf(),
                validation,
                trainer,
                evaluation,
                pushed: None,
            });
        }

        token.check()?;
        self.report(TrainingStage::Pushing, "Publishing the model");
        let pushed = ModelPusher::new(
            self.store.as_ref(),
            ModelPusherConfig {
                bucket_name: config.bucket_name.clone(),
                model_key: config.model_key.clone(),
                remove_local: config.remove_local_model,
            },
        )
        .initiate_model_pusher(&evaluation)?;
        self.cache.invalidate();

        self.report(
            TrainingStage::Complete,
            format!(
                "Published {} to {}/{}",
                trainer.best_model_name, pushed.bucket_name, pushed.s3_model_path
            ),
        );
        Ok(TrainingRun {
            run_dir: layout.run_dir().to_path_buf(),
            validation,
            trainer,
            evaluation,
            pushed: Some(pushed),
        })
    }
}

/// Builder for [`TrainPipeline`].
///
/// `config`, `document_source` and `object_store` are required.
#[derive(Default)]
pub struct TrainPipelineBuilder {
    config: Option<AppConfig>,
    source: Option<Arc<dyn DocumentSource>>,
    store: Option<Arc<dyn ObjectStore>>,
    cache: Option<Arc<ModelCache>>,
    progress_callback: Option<ProgressCallback>,
    cancellation_token: Option<CancellationToken>,
}

impl std::fmt::Debug for TrainPipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainPipelineBuilder")
            .field("config", &self.config)
            .field("has_source", &self.source.is_some())
            .field("has_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

impl TrainPipelineBuilder {
    #[must_use]
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn document_source(mut self, source: Arc<dyn DocumentSource>) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Cache shared with the predictor; invalidated after a publish.
    #[must_use]
    pub fn model_cache(mut self, cache: Arc<ModelCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        let callback: ProgressCallback = Arc::new(callback);
        self.progress_callback = Some(callback);
        self
    }

    #[must_use]
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn build(self) -> Result<TrainPipeline> {
        let missing = |what: &str| CarPriceError::InvalidConfig(format!("{what} is required"));
        let config = self.config.ok_or_else(|| missing("config"))?;
        config.validate()?;
        Ok(TrainPipeline {
            config,
            source: self.source.ok_or_else(|| missing("document source"))?,
            store: self.store.ok_or_else(|| missing("object store"))?,
            cache: self.cache.unwrap_or_default(),
            progress_callback: self.progress_callback,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
        })
    }
}
