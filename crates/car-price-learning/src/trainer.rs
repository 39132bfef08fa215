//! The model trainer stage.
//!
//! Every candidate in `model.yaml` is tuned on the transformed train array and
//! scored on the transformed test array. The best one is kept only if it
//! meets the baseline score, in which case the baseline moves up to it and
//! the winner is wrapped with the fitted preprocessor into a
//! [`CarPriceModel`].

use crate::algorithms::Regressor;
use crate::baseline::{BaselineScore, BaselineStore};
use crate::cancellation::CancellationToken;
use crate::config::ModelSearchConfig;
use crate::error::{LearningError, Result};
use crate::matrix::Dataset;
use crate::metrics::{Metrics, r2_score};
use crate::model::{CarPriceModel, ModelInfo};
use crate::progress::{ProgressCallback, ProgressUpdate};
use crate::search::{GridSearch, TunedCandidate};
use crate::types::{ModelComparison, ModelTrainerArtifacts};
use car_price_processing::{DataTransformationArtifacts, FittedPreprocessor};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, warn};

/// Output location of the trainer stage.
#[derive(Debug, Clone)]
pub struct ModelTrainerConfig {
    pub trained_model_file_path: PathBuf,
}

/// Index of the highest test score. Ties keep the earlier candidate.
pub fn best_candidate(comparisons: &[ModelComparison]) -> Option<usize> {
    comparisons
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, c)| match best {
            Some((_, score)) if score >= c.test_score => best,
            _ => Some((i, c.test_score)),
        })
        .map(|(i, _)| i)
}

/// Fails with [`LearningError::NoQualifyingModel`] when `best_score` is
/// below the baseline read at `read`.
pub fn check_qualifies(read: &BaselineScore, best_score: f64) -> Result<()> {
    if best_score < read.score {
        return Err(LearningError::NoQualifyingModel {
            best_score,
            baseline: read.score,
        });
    }
    Ok(())
}

/// Publish `best_score` as the new baseline if it meets the one read at `read`.
///
/// Fails with [`LearningError::NoQualifyingModel`] below the baseline and with
/// [`LearningError::BaselineConflict`] when another run wrote in between.
pub fn ratchet_baseline(
    store: &dyn BaselineStore,
    read: BaselineScore,
    best_score: f64,
) -> Result<BaselineScore> {
    check_qualifies(&read, best_score)?;
    store.compare_and_swap(read.version, best_score)
}

pub struct ModelTrainer<'a> {
    transformation: &'a DataTransformationArtifacts,
    search: &'a ModelSearchConfig,
    baseline: &'a dyn BaselineStore,
    config: ModelTrainerConfig,
    progress: Option<ProgressCallback>,
    cancellation: CancellationToken,
}

impl<'a> ModelTrainer<'a> {
    pub fn new(
        transformation: &'a DataTransformationArtifacts,
        search: &'a ModelSearchConfig,
        baseline: &'a dyn BaselineStore,
        config: ModelTrainerConfig,
    ) -> Self {
        Self {
            transformation,
            search,
            baseline,
            config,
            progress: None,
            cancellation: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    fn report(&self, update: ProgressUpdate) {
        if let Some(callback) = &self.progress {
            callback(update);
        }
    }

    pub fn initiate_model_trainer(&self) -> Result<ModelTrainerArtifacts> {
        info!("Entered the model trainer stage");
        let read = self.baseline.read()?;
        info!("Baseline score {:.4} (version {})", read.score, read.version);

        let train = Dataset::load(&self.transformation.transformed_train_file_path)?;
        let test = Dataset::load(&self.transformation.transformed_test_file_path)?;
        if train.x.ncols() != test.x.ncols() {
            return Err(LearningError::InvalidData(format!(
                "train has {} features, test has {}",
                train.x.ncols(),
                test.x.ncols()
            )));
        }

        let selection = &self.search.model_selection;
        let search = GridSearch::new(selection.cv_folds, selection.random_seed);
        let candidates = self.search.candidates()?;
        let total = candidates.len() as u32;

        let mut tuned: Vec<TunedCandidate> = Vec::with_capacity(candidates.len());
        let mut comparisons = Vec::with_capacity(candidates.len());
        let mut failures = Vec::new();
        for (i, (algorithm, grid)) in candidates.into_iter().enumerate() {
            self.cancellation.check()?;
            self.report(ProgressUpdate::candidate(algorithm.name(), i as u32, total));

            match search.tune(algorithm, grid, &train) {
                Ok(candidate) => {
                    let test_score = r2_score(&test.y, &candidate.model.predict(&test.x));
                    info!(
                        "{}: cv r2 {:.4}, test r2 {:.4}, params {:?}",
                        algorithm, candidate.cv_score, test_score, candidate.params
                    );
                    comparisons.push(ModelComparison {
                        algorithm,
                        params: candidate.params.clone(),
                        cv_score: candidate.cv_score,
                        test_score,
                    });
                    tuned.push(candidate);
                }
                Err(e) => {
                    warn!("{algorithm} failed to train: {e}");
                    failures.push(format!("{algorithm}: {e}"));
                }
            }
        }
        self.report(ProgressUpdate::candidate("all candidates", total, total));

        let Some(best) = best_candidate(&comparisons) else {
            return Err(LearningError::TrainingFailed(failures.join("; ")));
        };
        let winner = tuned.swap_remove(best);
        let best_score = comparisons[best].test_score;
        info!("Best model {} with test r2 {:.4}", winner.algorithm, best_score);

        self.cancellation.check()?;
        check_qualifies(&read, best_score)?;

        // the artifact exists before the baseline moves up to its score
        let preprocessor =
            FittedPreprocessor::load(&self.transformation.transformed_object_file_path)?;
        let test_metrics = Metrics::compute(&test.y, &winner.model.predict(&test.x));
        let info = ModelInfo {
            best_model_name: winner.algorithm.name().to_string(),
            hyperparameters: winner.params,
            cv_score: winner.cv_score,
            test_metrics,
            feature_names: preprocessor.feature_names(),
            trained_at: Utc::now(),
        };
        let model = CarPriceModel::new(preprocessor, winner.model, info);
        model.save(&self.config.trained_model_file_path)?;
        info!(
            "Saved trained model to {}",
            self.config.trained_model_file_path.display()
        );

        if let Err(e) = ratchet_baseline(self.baseline, read, best_score) {
            if let Err(remove) = std::fs::remove_file(&self.config.trained_model_file_path) {
                warn!("Could not remove the unpublished model: {remove}");
            }
            return Err(e);
        }

        let best_comparison = comparisons.swap_remove(best);
        comparisons.sort_by(|a, b| b.test_score.total_cmp(&a.test_score));
        comparisons.insert(0, best_comparison);

        Ok(ModelTrainerArtifacts {
            trained_model_file_path: self.config.trained_model_file_path.clone(),
            best_model_name: model.best_model_name().to_string(),
            best_model_score: best_score,
            model_comparison: comparisons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{Algorithm, Hyperparameters};
    use crate::baseline::MemoryBaselineStore;

    fn comparison(algorithm: Algorithm, test_score: f64) -> ModelComparison {
        ModelComparison {
            algorithm,
            params: Hyperparameters::new(),
            cv_score: test_score,
            test_score,
        }
    }

    #[test]
    fn test_best_score_wins_and_ratchets_baseline() {
        let comparisons = vec![
            comparison(Algorithm::Ridge, 0.77),
            comparison(Algorithm::RandomForest, 0.81),
        ];
        let best = best_candidate(&comparisons).unwrap();
        assert_eq!(comparisons[best].algorithm, Algorithm::RandomForest);

        let store = MemoryBaselineStore::new(0.80);
        let read = store.read().unwrap();
        let updated = ratchet_baseline(&store, read, comparisons[best].test_score).unwrap();
        assert_eq!(updated.score, 0.81);
        assert_eq!(store.read().unwrap().score, 0.81);
    }

    #[test]
    fn test_below_baseline_is_typed_error() {
        let store = MemoryBaselineStore::new(0.80);
        let read = store.read().unwrap();
        let err = ratchet_baseline(&store, read, 0.77).unwrap_err();
        assert!(matches!(
            err,
            LearningError::NoQualifyingModel { best_score, baseline }
                if best_score == 0.77 && baseline == 0.80
        ));
        assert_eq!(store.read().unwrap().version, 0);
    }

    #[test]
    fn test_equal_to_baseline_qualifies() {
        let store = MemoryBaselineStore::new(0.80);
        let read = store.read().unwrap();
        assert!(ratchet_baseline(&store, read, 0.80).is_ok());
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let comparisons = vec![
            comparison(Algorithm::Knn, 0.5),
            comparison(Algorithm::Ridge, 0.5),
        ];
        assert_eq!(best_candidate(&comparisons), Some(0));
        assert_eq!(best_candidate(&[]), None);
    }
}
