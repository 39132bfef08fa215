//! Car price training pipeline and prediction service.
//!
//! This crate wires the data stages of `car_price_processing` and the model
//! stages of `car_price_learning` into one training run, publishes accepted
//! models to an object store, and serves predictions over HTTP.
//!
//! # Modules
//!
//! - [`config`]: application settings from the environment
//! - [`artifacts`]: timestamped per-run artifact layout
//! - [`storage`]: object store trait with directory and in-memory stores
//! - [`pipeline`]: model pusher and the [`TrainPipeline`] orchestrator
//! - [`predictor`]: form record, model cache and [`CarPricePredictor`]
//! - [`server`]: axum router and server startup

pub mod artifacts;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod predictor;
pub mod server;
pub mod storage;

pub use artifacts::{ArtifactLayout, ModelPusherArtifacts};
pub use config::{AppConfig, ValidationPolicy};
pub use error::{CarPriceError, Result, ResultExt};
pub use pipeline::{ModelPusher, ModelPusherConfig, TrainPipeline, TrainingRun};
pub use predictor::{CarData, CarPricePredictor, ModelCache};
pub use server::{AppState, create_app, start_server};
pub use storage::{LocalObjectStore, MemoryObjectStore, ObjectMeta, ObjectStore};
