//! car-price-learning: model search, baseline ratchet and evaluation for the
//! car price pipeline.
//!
//! This crate takes the transformed arrays written by
//! [`car_price_processing`] and turns them into a published-ready
//! [`CarPriceModel`]: a fitted preprocessor bound to the best regressor.
//!
//! # Features
//!
//! - **Candidate algorithms**: linear and ridge regression, k-nearest
//!   neighbours, decision tree, random forest, gradient boosting
//! - **Grid search**: exhaustive grids from `model.yaml`, scored by mean R²
//!   over shuffled k folds
//! - **Baseline ratchet**: a versioned, never-decreasing acceptance floor
//!   written with compare-and-swap
//! - **Evaluation**: trained model against the published one on the raw test split
//! - **Progress and cancellation**: per-candidate updates and a cooperative
//!   cancellation token
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use car_price_learning::{
//!     ModelSearchConfig, ModelTrainer, ModelTrainerConfig, YamlBaselineStore,
//! };
//!
//! let search = ModelSearchConfig::from_yaml_file("config/model.yaml")?;
//! let baseline = YamlBaselineStore::new("config/model.yaml");
//! let trainer = ModelTrainer::new(
//!     &transformation_artifacts,
//!     &search,
//!     &baseline,
//!     ModelTrainerConfig { trained_model_file_path: "artifacts/car_price_model.bin".into() },
//! );
//! let artifacts = trainer.initiate_model_trainer()?;
//! println!("{} scored {:.4}", artifacts.best_model_name, artifacts.best_model_score);
//! ```
//!
//! # Architecture
//!
//! ```text
//!  transformed arrays ──► GridSearch (per algorithm) ──► test R²
//!                                                          │
//!                              best ≥ baseline? ◄──────────┘
//!                                   │ yes: compare-and-swap baseline
//!                                   ▼
//!  FittedPreprocessor + FittedRegressor ──► CarPriceModel ──► ModelEvaluation
//! ```

pub mod algorithms;
pub mod baseline;
pub mod cancellation;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod matrix;
pub mod metrics;
pub mod model;
pub mod progress;
pub mod search;
pub mod trainer;
pub mod types;

pub use algorithms::{Algorithm, FittedRegressor, Hyperparameters, Regressor};
pub use baseline::{BaselineScore, BaselineStore, MemoryBaselineStore, YamlBaselineStore};
pub use cancellation::CancellationToken;
pub use config::{ModelSearchConfig, ModelSearchConfigBuilder, ModelSelection, ParameterGrid};
pub use error::{LearningError, Result};
pub use evaluation::{ModelEvaluation, compare_scores};
pub use matrix::{Dataset, Matrix, matrix_from_rows};
pub use metrics::Metrics;
pub use model::{CarPriceModel, ModelInfo};
pub use progress::{ProgressCallback, ProgressUpdate, TrainingStage};
pub use search::{GridSearch, TunedCandidate};
pub use trainer::{ModelTrainer, ModelTrainerConfig};
pub use types::{
    ModelComparison, ModelEvaluationArtifact, ModelEvaluationResponse, ModelTrainerArtifacts,
};
