//! The persisted baseline score that a new model has to meet.
//!
//! The baseline only moves up. Writers read the record, train, then publish
//! the new score with a compare-and-swap on the record's version; if another
//! run bumped the version in between, the write fails with
//! [`LearningError::BaselineConflict`] instead of clobbering it.

use crate::config::ModelSearchConfig;
use crate::error::{LearningError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Serializes read-modify-write cycles on baseline files within the process.
static BASELINE_WRITER: Mutex<()> = Mutex::new(());

/// Versioned baseline record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineScore {
    pub score: f64,
    pub version: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BaselineScore {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            version: 0,
            updated_at: None,
        }
    }

    /// Record for `score` written on top of `self`. Never lowers the score.
    fn advanced(&self, score: f64) -> Self {
        Self {
            score: score.max(self.score),
            version: self.version + 1,
            updated_at: Some(Utc::now()),
        }
    }
}

/// Where the baseline lives.
pub trait BaselineStore: Send + Sync {
    fn read(&self) -> Result<BaselineScore>;

    /// Write `score` if the stored version still equals `expected_version`.
    fn compare_and_swap(&self, expected_version: u64, score: f64) -> Result<BaselineScore>;
}

/// Baseline kept in the `base_model_*` keys of `model.yaml`.
#[derive(Debug, Clone)]
pub struct YamlBaselineStore {
    path: PathBuf,
}

impl YamlBaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BaselineStore for YamlBaselineStore {
    fn read(&self) -> Result<BaselineScore> {
        let config = ModelSearchConfig::from_yaml_file(&self.path)?;
        Ok(BaselineScore {
            score: config.base_model_score,
            version: config.base_model_version,
            updated_at: config.base_model_updated_at,
        })
    }

    fn compare_and_swap(&self, expected_version: u64, score: f64) -> Result<BaselineScore> {
        let _guard = BASELINE_WRITER.lock();

        let mut config = ModelSearchConfig::from_yaml_file(&self.path)?;
        if config.base_model_version != expected_version {
            return Err(LearningError::BaselineConflict {
                expected: expected_version,
                found: config.base_model_version,
            });
        }

        let current = BaselineScore {
            score: config.base_model_score,
            version: config.base_model_version,
            updated_at: config.base_model_updated_at,
        };
        let next = current.advanced(score);
        config.base_model_score = next.score;
        config.base_model_version = next.version;
        config.base_model_updated_at = next.updated_at;
        config.to_yaml_file(&self.path)?;

        info!(
            "Baseline score {:.4} -> {:.4} (version {})",
            current.score, next.score, next.version
        );
        Ok(next)
    }
}

/// In-process baseline, used when no config file is shared.
#[derive(Debug)]
pub struct MemoryBaselineStore {
    record: Mutex<BaselineScore>,
}

impl MemoryBaselineStore {
    pub fn new(score: f64) -> Self {
        Self {
            record: Mutex::new(BaselineScore::new(score)),
        }
    }
}

impl BaselineStore for MemoryBaselineStore {
    fn read(&self) -> Result<BaselineScore> {
        Ok(*self.record.lock())
    }

    fn compare_and_swap(&self, expected_version: u64, score: f64) -> Result<BaselineScore> {
        let mut record = self.record.lock();
        if record.version != expected_version {
            return Err(LearningError::BaselineConflict {
                expected: expected_version,
                found: record.version,
            });
        }
        *record = record.advanced(score);
        Ok(*record)
    }
}

static_assertions::assert_impl_all!(YamlBaselineStore: Send, Sync);
static_assertions::assert_impl_all!(MemoryBaselineStore: Send, Sync);
