//! The model evaluation stage: trained model against the published one.
//!
//! Both models score R² on the same raw test split. The trained model is
//! accepted only if it strictly beats the published score; with nothing
//! published the comparison is against 0. Nothing is mutated here.

use crate::error::Result;
use crate::model::CarPriceModel;
use crate::types::{ModelEvaluationArtifact, ModelEvaluationResponse, ModelTrainerArtifacts};
use car_price_processing::DataIngestionArtifacts;
use car_price_processing::io::read_csv;
use tracing::info;

/// Compare a trained score with the published one, if any.
pub fn compare_scores(trained: f64, published: Option<f64>) -> ModelEvaluationResponse {
    let floor = published.unwrap_or(0.0);
    ModelEvaluationResponse {
        trained_model_r2_score: trained,
        s3_model_r2_score: published,
        is_model_accepted: trained > floor,
        difference: trained - floor,
    }
}

pub struct ModelEvaluation<'a> {
    ingestion: &'a DataIngestionArtifacts,
    trainer: &'a ModelTrainerArtifacts,
    target_column: &'a str,
}

impl<'a> ModelEvaluation<'a> {
    pub fn new(
        ingestion: &'a DataIngestionArtifacts,
        trainer: &'a ModelTrainerArtifacts,
        target_column: &'a str,
    ) -> Self {
        Self {
            ingestion,
            trainer,
            target_column,
        }
    }

    /// Score the trained model and `published` on the test split.
    pub fn evaluate(&self, published: Option<&CarPriceModel>) -> Result<ModelEvaluationResponse> {
        let test = read_csv(&self.ingestion.test_data_file_path)?;
        let trained = CarPriceModel::load(&self.trainer.trained_model_file_path)?;

        let trained_score = trained.score(&test, self.target_column)?;
        let published_score = published
            .map(|model| model.score(&test, self.target_column))
            .transpose()?;

        Ok(compare_scores(trained_score, published_score))
    }

    pub fn initiate_model_evaluation(
        &self,
        published: Option<&CarPriceModel>,
    ) -> Result<ModelEvaluationArtifact> {
        info!("Entered the model evaluation stage");
        let response = self.evaluate(published)?;
        match response.s3_model_r2_score {
            Some(old) => info!(
                "Trained r2 {:.4} vs published r2 {:.4}: accepted = {}",
                response.trained_model_r2_score, old, response.is_model_accepted
            ),
            None => info!(
                "No published model; trained r2 {:.4} accepted = {}",
                response.trained_model_r2_score, response.is_model_accepted
            ),
        }
        Ok(ModelEvaluationArtifact {
            is_model_accepted: response.is_model_accepted,
            trained_model_path: self.trainer.trained_model_file_path.clone(),
            changed_accuracy: response.difference,
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::Algorithm;
    use crate::model::tests::{cars, fitted_model};
    use car_price_processing::io::write_csv;

    #[test]
    fn test_no_published_model_compares_against_zero() {
        let response = compare_scores(0.42, None);
        assert!(response.is_model_accepted);
        assert_eq!(response.difference, 0.42);
        assert_eq!(response.s3_model_r2_score, None);

        assert!(!compare_scores(-0.1, None).is_model_accepted);
    }

    #[test]
    fn test_acceptance_requires_strict_improvement() {
        assert!(compare_scores(0.85, Some(0.80)).is_model_accepted);
        assert!(!compare_scores(0.80, Some(0.80)).is_model_accepted);

        let response = compare_scores(0.75, Some(0.80));
        assert!(!response.is_model_accepted);
        assert_eq!(response.difference, 0.75 - 0.80);
    }

    #[test]
    fn test_evaluate_against_published_model() {
        let dir = tempfile::tempdir().unwrap();
        let test_path = dir.path().join("test.csv");
        let model_path = dir.path().join("car_price_model.bin");
        write_csv(&mut cars(), &test_path).unwrap();

        let trained = fitted_model(Algorithm::DecisionTree);
        trained.save(&model_path).unwrap();
        let published = fitted_model(Algorithm::Ridge);

        let ingestion = DataIngestionArtifacts {
            train_data_file_path: test_path.clone(),
            test_data_file_path: test_path,
        };
        let trainer = ModelTrainerArtifacts {
            trained_model_file_path: model_path.clone(),
            best_model_name: "decision_tree".to_string(),
            best_model_score: 1.0,
            model_comparison: Vec::new(),
        };
        let artifact = ModelEvaluation::new(&ingestion, &trainer, "selling_price")
            .initiate_model_evaluation(Some(&published))
            .unwrap();

        // the unpruned tree reproduces its own training rows exactly
        assert_eq!(artifact.response.trained_model_r2_score, 1.0);
        let old = artifact.response.s3_model_r2_score.unwrap();
        assert!(old < 1.0);
        assert!(artifact.is_model_accepted);
        assert_eq!(artifact.changed_accuracy, 1.0 - old);
        assert_eq!(artifact.trained_model_path, model_path);
    }
}
