//! Pipeline orchestration on top of the processing and learning stages.

pub mod pusher;
pub mod train;

pub use pusher::{ModelPusher, ModelPusherConfig, upload_file};
pub use train::{TrainPipeline, TrainPipelineBuilder, TrainingRun};
