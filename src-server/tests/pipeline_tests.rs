//! End-to-end training runs against a seeded document store.

mod common;

use car_price_learning::{BaselineStore, TrainingStage, YamlBaselineStore};
use car_price_lib::{
    CarData, CarPriceError, CarPricePredictor, ModelCache, ObjectStore, TrainPipeline,
    ValidationPolicy,
};
use common::{Fixture, SCHEMA};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn pipeline(fixture: &Fixture, cache: Arc<ModelCache>) -> TrainPipeline {
    TrainPipeline::builder()
        .config(fixture.config.clone())
        .document_source(fixture.source.clone())
        .object_store(fixture.store.clone())
        .model_cache(cache)
        .build()
        .unwrap()
}

#[test]
fn test_first_run_publishes_and_rerun_is_rejected() {
    let fixture = Fixture::new(100);
    let cache = Arc::new(ModelCache::new());

    let first = pipeline(&fixture, cache.clone()).run().unwrap();
    assert!(first.is_published());
    assert!(first.evaluation.is_model_accepted);
    assert_eq!(first.evaluation.response.s3_model_r2_score, None);
    assert_eq!(
        first.evaluation.changed_accuracy,
        first.evaluation.response.trained_model_r2_score
    );
    let pushed = first.pushed.as_ref().unwrap();
    assert_eq!(pushed.bucket_name, fixture.config.bucket_name);
    assert_eq!(pushed.s3_model_path, fixture.config.model_key);
    assert!(
        fixture
            .store
            .exists(&fixture.config.bucket_name, &fixture.config.model_key)
            .unwrap()
    );

    // 100 rows at 0.2 split 80/20 and the drop column is gone
    let train = std::fs::read_to_string(
        first
            .run_dir
            .join("DataIngestionArtifacts/Train/train.csv"),
    )
    .unwrap();
    assert_eq!(train.lines().count(), 81);
    assert!(!train.lines().next().unwrap().contains("listing_id"));

    // the baseline followed the winner
    let baseline = YamlBaselineStore::new(&fixture.config.model_config_path)
        .read()
        .unwrap();
    assert_eq!(baseline.score, first.trainer.best_model_score);
    assert_eq!(baseline.version, 1);

    // same data and seeds: the retrained model only ties the published one
    let second = pipeline(&fixture, cache).run().unwrap();
    assert!(!second.is_published());
    assert!(!second.evaluation.is_model_accepted);
    assert_eq!(second.evaluation.changed_accuracy, 0.0);
    assert_eq!(
        second.evaluation.response.s3_model_r2_score,
        Some(first.evaluation.response.trained_model_r2_score)
    );
}

#[test]
fn test_progress_reaches_complete() {
    let fixture = Fixture::new(60);
    let stages = Arc::new(Mutex::new(Vec::new()));
    let seen = stages.clone();

    TrainPipeline::builder()
        .config(fixture.config.clone())
        .document_source(fixture.source.clone())
        .object_store(fixture.store.clone())
        .on_progress(move |u| seen.lock().unwrap().push(u.stage))
        .build()
        .unwrap()
        .run()
        .unwrap();

    let mut stages = stages.lock().unwrap().clone();
    stages.dedup();
    assert_eq!(
        stages,
        vec![
            TrainingStage::Initializing,
            TrainingStage::Ingestion,
            TrainingStage::Validation,
            TrainingStage::Transformation,
            TrainingStage::Training,
            TrainingStage::Evaluation,
            TrainingStage::Pushing,
            TrainingStage::Complete,
        ]
    );
}

#[test]
fn test_published_model_serves_predictions() {
    let fixture = Fixture::new(80);
    let cache = Arc::new(ModelCache::new());
    pipeline(&fixture, cache.clone()).run().unwrap();

    let predictor = CarPricePredictor::new(
        fixture.store.clone(),
        fixture.config.bucket_name.clone(),
        fixture.config.model_key.clone(),
        cache,
    );
    let mut names = predictor.car_names().unwrap();
    names.sort();
    assert_eq!(
        names,
        vec!["Honda City", "Hyundai i20", "Maruti Alto", "Tata Nexon"]
    );

    let car = CarData {
        car_name: "Honda City".to_string(),
        vehicle_age: "3".to_string(),
        km_driven: "28000".to_string(),
        seller_type: "Dealer".to_string(),
        fuel_type: "Petrol".to_string(),
        transmission_type: "Manual".to_string(),
        mileage: "18.6".to_string(),
        engine: "1300".to_string(),
        max_power: "100".to_string(),
        seats: "5".to_string(),
    };
    let price = predictor.predict(&car).unwrap();
    assert!(price > 0.0);
    assert_eq!(price, (price * 100.0).round() / 100.0);
}

#[test]
fn test_fail_policy_aborts_on_invalid_data() {
    // a declared column the collection does not have
    let schema = SCHEMA
        .replace("  - seats: int\n", "  - seats: int\n  - owner_count: int\n")
        .replace("max_power, seats]", "max_power, seats, owner_count]");
    let mut fixture = Fixture::with_schema(60, &schema);
    fixture.config.validation_policy = ValidationPolicy::Fail;

    let err = pipeline(&fixture, Arc::new(ModelCache::new()))
        .run()
        .unwrap_err();
    assert!(matches!(err, CarPriceError::ValidationFailed(_)));
    assert_eq!(err.error_code(), "VALIDATION_FAILED");
    assert!(fixture.store.is_empty());
}

#[test]
fn test_missing_collection_fails() {
    let mut fixture = Fixture::new(10);
    fixture.config.collection_name = "trucks".to_string();
    let err = pipeline(&fixture, Arc::new(ModelCache::new()))
        .run()
        .unwrap_err();
    assert!(err.to_string().contains("trucks"));
}
