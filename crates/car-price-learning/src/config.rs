//! Model search configuration, read from `model.yaml`.
//!
//! ```yaml
//! base_model_score: 0.8
//! base_model_version: 3
//! base_model_updated_at: 2024-05-01T10:00:00Z
//! model_selection:
//!   cv_folds: 3
//!   random_seed: 42
//! train_model:
//!   ridge:
//!     alpha: [0.1, 1.0, 10.0]
//!   random_forest:
//!     n_estimators: [50, 100]
//!     max_depth: [8, 12]
//! ```
//!
//! The `base_model_*` keys form the persisted baseline record; see
//! [`crate::baseline`]. Everything else is read-only for a run.

use crate::algorithms::{Algorithm, Hyperparameters};
use crate::error::{LearningError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Default number of cross-validation folds.
pub const DEFAULT_CV_FOLDS: usize = 3;

/// A hyperparameter grid: parameter name to candidate values.
pub type ParameterGrid = BTreeMap<String, Vec<f64>>;

fn default_cv_folds() -> usize {
    DEFAULT_CV_FOLDS
}

fn default_seed() -> u64 {
    42
}

/// Settings of the tuning procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelection {
    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,
    /// Seed for fold shuffling and the tree ensembles.
    #[serde(default = "default_seed")]
    pub random_seed: u64,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            cv_folds: DEFAULT_CV_FOLDS,
            random_seed: default_seed(),
        }
    }
}

/// Contents of `model.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSearchConfig {
    /// Score a new model must meet or exceed.
    #[serde(default)]
    pub base_model_score: f64,
    /// Bumped on every baseline write.
    #[serde(default)]
    pub base_model_version: u64,
    #[serde(default)]
    pub base_model_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub model_selection: ModelSelection,
    /// Candidate algorithms and their grids, in name order.
    pub train_model: BTreeMap<String, ParameterGrid>,
}

impl ModelSearchConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ModelSearchConfigBuilder {
        ModelSearchConfigBuilder::default()
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: ModelSearchConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    /// Replace the file at `path` atomically: write a sibling temp file,
    /// then rename it over the original.
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(serde_yaml::to_string(self)?.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Parsed candidates with their grids.
    pub fn candidates(&self) -> Result<Vec<(Algorithm, &ParameterGrid)>> {
        self.train_model
            .iter()
            .map(|(name, grid)| Ok((name.parse::<Algorithm>()?, grid)))
            .collect()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.train_model.is_empty() {
            return Err(LearningError::InvalidConfig(
                "train_model must name at least one algorithm".to_string(),
            ));
        }
        if self.model_selection.cv_folds < 2 {
            return Err(LearningError::InvalidConfig(format!(
                "cv_folds must be at least 2, got {}",
                self.model_selection.cv_folds
            )));
        }
        if !self.base_model_score.is_finite() {
            return Err(LearningError::InvalidConfig(
                "base_model_score must be finite".to_string(),
            ));
        }
        for (algorithm, grid) in self.candidates()? {
            algorithm.check_parameters(grid.keys())?;
            if let Some((name, _)) = grid.iter().find(|(_, values)| values.is_empty()) {
                return Err(LearningError::InvalidConfig(format!(
                    "{algorithm}.{name} has no candidate values"
                )));
            }
        }
        Ok(())
    }
}

/// Every combination of a grid, in name-major order.
///
/// An empty grid expands to one empty parameter set.
pub fn expand_grid(grid: &ParameterGrid) -> Vec<Hyperparameters> {
    let mut combinations = vec![Hyperparameters::new()];
    for (name, values) in grid {
        combinations = combinations
            .into_iter()
            .flat_map(|base| {
                values.iter().map(move |value| {
                    let mut params = base.clone();
                    params.insert(name.clone(), *value);
                    params
                })
            })
            .collect();
    }
    combinations
}

/// Builder for [`ModelSearchConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ModelSearchConfigBuilder {
    base_model_score: Option<f64>,
    cv_folds: Option<usize>,
    random_seed: Option<u64>,
    train_model: BTreeMap<String, ParameterGrid>,
}

impl ModelSearchConfigBuilder {
    pub fn base_model_score(mut self, score: f64) -> Self {
        self.base_model_score = Some(score);
        self
    }

    pub fn cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = Some(folds);
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Add a candidate algorithm with its grid.
    pub fn candidate(mut self, algorithm: Algorithm, grid: ParameterGrid) -> Self {
        self.train_model.insert(algorithm.name().to_string(), grid);
        self
    }

    pub fn build(self) -> Result<ModelSearchConfig> {
        let config = ModelSearchConfig {
            base_model_score: self.base_model_score.unwrap_or(0.0),
            base_model_version: 0,
            base_model_updated_at: None,
            model_selection: ModelSelection {
                cv_folds: self.cv_folds.unwrap_or(DEFAULT_CV_FOLDS),
                random_seed: self.random_seed.unwrap_or_else(default_seed),
            },
            train_model: self.train_model,
        };
        config.validate()?;
        Ok(config)
    }
}
