//! Progress reporting for a training run.
//!
//! A run moves through [`TrainingStage`]s in pipeline order and reports each
//! step as a [`ProgressUpdate`] to an optional [`ProgressCallback`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use car_price_learning::{ProgressCallback, ProgressUpdate, TrainingStage};
//!
//! let callback: ProgressCallback = Arc::new(|update: ProgressUpdate| {
//!     println!("[{}] {:.0}% - {}", update.stage, update.progress * 100.0, update.message);
//! });
//! callback(ProgressUpdate::new(TrainingStage::Ingestion, "Fetching records"));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The current stage of a training run.
///
/// Terminal states: [`Complete`](Self::Complete), [`Rejected`](Self::Rejected),
/// [`Failed`](Self::Failed), [`Cancelled`](Self::Cancelled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TrainingStage {
    #[default]
    Initializing,
    Ingestion,
    Validation,
    Transformation,
    /// Tuning candidates and applying the baseline ratchet.
    Training,
    /// Comparing against the published model.
    Evaluation,
    /// Uploading the accepted model.
    Pushing,
    Complete,
    /// Finished without publishing: the published model scored at least as well.
    Rejected,
    Failed,
    Cancelled,
}

impl TrainingStage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingStage::Initializing => "initializing",
            TrainingStage::Ingestion => "ingestion",
            TrainingStage::Validation => "validation",
            TrainingStage::Transformation => "transformation",
            TrainingStage::Training => "training",
            TrainingStage::Evaluation => "evaluation",
            TrainingStage::Pushing => "pushing",
            TrainingStage::Complete => "complete",
            TrainingStage::Rejected => "rejected",
            TrainingStage::Failed => "failed",
            TrainingStage::Cancelled => "cancelled",
        }
    }

    /// Fraction of the run finished once this stage starts.
    #[must_use]
    pub fn progress(&self) -> f64 {
        match self {
            TrainingStage::Initializing => 0.0,
            TrainingStage::Ingestion => 0.05,
            TrainingStage::Validation => 0.15,
            TrainingStage::Transformation => 0.25,
            TrainingStage::Training => 0.35,
            TrainingStage::Evaluation => 0.85,
            TrainingStage::Pushing => 0.95,
            TrainingStage::Complete
            | TrainingStage::Rejected
            | TrainingStage::Failed
            | TrainingStage::Cancelled => 1.0,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TrainingStage::Complete
                | TrainingStage::Rejected
                | TrainingStage::Failed
                | TrainingStage::Cancelled
        )
    }
}

impl fmt::Display for TrainingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for parsing a [`TrainingStage`] from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTrainingStageError {
    invalid_value: String,
}

impl ParseTrainingStageError {
    #[must_use]
    pub fn invalid_value(&self) -> &str {
        &self.invalid_value
    }
}

impl fmt::Display for ParseTrainingStageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid training stage: '{}'", self.invalid_value)
    }
}

impl std::error::Error for ParseTrainingStageError {}

impl FromStr for TrainingStage {
    type Err = ParseTrainingStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initializing" => Ok(TrainingStage::Initializing),
            "ingestion" => Ok(TrainingStage::Ingestion),
            "validation" => Ok(TrainingStage::Validation),
            "transformation" => Ok(TrainingStage::Transformation),
            "training" => Ok(TrainingStage::Training),
            "evaluation" => Ok(TrainingStage::Evaluation),
            "pushing" => Ok(TrainingStage::Pushing),
            "complete" => Ok(TrainingStage::Complete),
            "rejected" => Ok(TrainingStage::Rejected),
            "failed" => Ok(TrainingStage::Failed),
            "cancelled" => Ok(TrainingStage::Cancelled),
            _ => Err(ParseTrainingStageError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

/// A progress update from a training run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressUpdate {
    pub stage: TrainingStage,

    /// Overall progress from 0.0 to 1.0.
    pub progress: f64,

    pub message: String,

    /// Candidate being tuned, during [`TrainingStage::Training`].
    pub current_model: Option<String>,

    /// `(completed, total)` candidates.
    pub models_completed: Option<(u32, u32)>,
}

impl ProgressUpdate {
    /// Update at the start of `stage`.
    pub fn new(stage: TrainingStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.progress(),
            message: message.into(),
            current_model: None,
            models_completed: None,
        }
    }

    /// Update for candidate `completed` of `total` inside the training stage.
    pub fn candidate(model: &str, completed: u32, total: u32) -> Self {
        let start = TrainingStage::Training.progress();
        let span = TrainingStage::Evaluation.progress() - start;
        let fraction = if total == 0 {
            0.0
        } else {
            f64::from(completed) / f64::from(total)
        };
        Self {
            stage: TrainingStage::Training,
            progress: start + span * fraction,
            message: format!("Tuning {model}"),
            current_model: Some(model.to_string()),
            models_completed: Some((completed, total)),
        }
    }
}

/// Callback receiving [`ProgressUpdate`]s; may be called from a worker thread.
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_stage_from_str() {
        assert_eq!("pushing".parse::<TrainingStage>(), Ok(TrainingStage::Pushing));
        assert_eq!(TrainingStage::Transformation.to_string(), "transformation");

        let err = "deploy".parse::<TrainingStage>().unwrap_err();
        assert_eq!(err.invalid_value(), "deploy");
    }

    #[test]
    fn test_terminal_stages() {
        assert!(TrainingStage::Complete.is_terminal());
        assert!(TrainingStage::Rejected.is_terminal());
        assert!(TrainingStage::Cancelled.is_terminal());
        assert!(!TrainingStage::Evaluation.is_terminal());
    }

    #[test]
    fn test_stage_progress_is_monotonic() {
        let order = [
            TrainingStage::Initializing,
            TrainingStage::Ingestion,
            TrainingStage::Validation,
            TrainingStage::Transformation,
            TrainingStage::Training,
            TrainingStage::Evaluation,
            TrainingStage::Pushing,
            TrainingStage::Complete,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].progress() < pair[1].progress());
        }
    }

    #[test]
    fn test_candidate_progress_stays_inside_training() {
        let first = ProgressUpdate::candidate("ridge", 0, 4);
        let last = ProgressUpdate::candidate("knn", 4, 4);
        assert_eq!(first.progress, TrainingStage::Training.progress());
        assert!((last.progress - TrainingStage::Evaluation.progress()).abs() < 1e-12);
        assert_eq!(last.models_completed, Some((4, 4)));
        assert_eq!(last.current_model.as_deref(), Some("knn"));
    }
}
