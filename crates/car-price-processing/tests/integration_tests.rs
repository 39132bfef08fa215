//! End-to-end tests for ingestion, validation and transformation.

use car_price_processing::io::{read_array, read_csv};
use car_price_processing::*;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::Path;

const SCHEMA: &str = r#"
columns:
  - car_name: category
  - vehicle_age: int
  - km_driven: int
  - seller_type: category
  - fuel_type: category
  - transmission_type: category
  - mileage: float
  - engine: int
  - max_power: float
  - seats: int
  - selling_price: int
numerical_columns: [vehicle_age, km_driven, mileage, engine, max_power, seats]
categorical_columns: [car_name, seller_type, fuel_type, transmission_type]
onehot_columns: [seller_type, fuel_type, transmission_type]
binary_columns: [car_name]
drop_columns: [brand]
target_column: selling_price
"#;

const CARS: [&str; 6] = ["Maruti Alto", "Hyundai i20", "Honda City", "Maruti Swift", "Tata Nexon", "Mahindra XUV500"];

fn raw_cars(n: usize) -> DataFrame {
    let idx: Vec<usize> = (0..n).collect();
    df![
        "car_name" => idx.iter().map(|i| CARS[i % CARS.len()]).collect::<Vec<_>>(),
        "brand" => idx.iter().map(|i| CARS[i % CARS.len()].split(' ').next().unwrap_or("")).collect::<Vec<_>>(),
        "vehicle_age" => idx.iter().map(|i| (i % 12 + 1) as i64).collect::<Vec<_>>(),
        "km_driven" => idx.iter().map(|i| (5_000 + (i * 7_919) % 150_000) as i64).collect::<Vec<_>>(),
        "seller_type" => idx.iter().map(|i| if i % 3 == 0 { "Dealer" } else { "Individual" }).collect::<Vec<_>>(),
        "fuel_type" => idx.iter().map(|i| if i % 2 == 0 { "Petrol" } else { "Diesel" }).collect::<Vec<_>>(),
        "transmission_type" => idx.iter().map(|i| if i % 4 == 0 { "Automatic" } else { "Manual" }).collect::<Vec<_>>(),
        "mileage" => idx.iter().map(|i| 14.0 + (i % 17) as f64 * 0.5).collect::<Vec<_>>(),
        "engine" => idx.iter().map(|i| (998 + (i % 9) * 150) as i64).collect::<Vec<_>>(),
        "max_power" => idx.iter().map(|i| 60.0 + (i % 23) as f64 * 4.0).collect::<Vec<_>>(),
        "seats" => idx.iter().map(|i| if i % 5 == 0 { 7i64 } else { 5 }).collect::<Vec<_>>(),
        "selling_price" => idx.iter().map(|i| (200_000 + (i % 12) * 45_000 + (i % 6) * 30_000) as i64).collect::<Vec<_>>(),
    ]
    .unwrap()
}

fn ingest(root: &Path, n: usize) -> (SchemaConfig, ProcessingConfig, DataIngestionArtifacts) {
    let schema = SchemaConfig::from_yaml_str(SCHEMA).unwrap();
    let settings = ProcessingConfig::builder().random_seed(11).build().unwrap();
    let source = JsonDocumentSource::new(root.join("documents"));
    source.insert_records("ineuron", "car", &raw_cars(n)).unwrap();

    let config = DataIngestionConfig {
        database_name: "ineuron".to_string(),
        collection_name: "car".to_string(),
        train_data_file_path: root.join("DataIngestionArtifacts/Train/train.csv"),
        test_data_file_path: root.join("DataIngestionArtifacts/Test/test.csv"),
    };
    let artifacts = DataIngestion::new(config, &schema, &settings, &source)
        .initiate_data_ingestion()
        .unwrap();
    (schema, settings, artifacts)
}

#[test]
fn test_ingestion_splits_100_rows_and_drops_columns() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, artifacts) = ingest(dir.path(), 100);

    let train = read_csv(&artifacts.train_data_file_path).unwrap();
    let test = read_csv(&artifacts.test_data_file_path).unwrap();

    assert_eq!(train.height(), 80);
    assert_eq!(test.height(), 20);
    assert!(train.column("brand").is_err());
    assert!(test.column("brand").is_err());
    assert_eq!(train.width(), 11);
}

#[test]
fn test_validation_passes_on_well_formed_splits() {
    let dir = tempfile::tempdir().unwrap();
    let (schema, settings, artifacts) = ingest(dir.path(), 100);
    let drift_path = dir.path().join("DataValidationArtifacts/DataDriftReport.yaml");

    let validation = DataValidation::new(&artifacts, &schema, &settings, &drift_path)
        .initiate_data_validation()
        .unwrap();

    let status = validation.validation_status;
    assert_eq!(status.train, SplitChecks::passing());
    assert_eq!(status.test, SplitChecks::passing());
    assert_eq!(status.overall, !status.drift_detected);
    assert_eq!(validation.report.metrics().n_features, 11);
    assert!(drift_path.exists());
}

#[test]
fn test_validation_flags_numeric_column_stored_as_text() {
    let dir = tempfile::tempdir().unwrap();
    let schema = SchemaConfig::from_yaml_str(SCHEMA).unwrap();
    let settings = ProcessingConfig::builder().random_seed(11).build().unwrap();
    let source = JsonDocumentSource::new(dir.path().join("documents"));

    let mut raw = raw_cars(50);
    let mileage: Vec<String> = (0..50).map(|i| format!("{} kmpl", 14 + i % 9)).collect();
    raw.with_column(Series::new("mileage".into(), mileage)).unwrap();
    source.insert_records("ineuron", "car", &raw).unwrap();

    let artifacts = DataIngestion::new(
        DataIngestionConfig {
            database_name: "ineuron".to_string(),
            collection_name: "car".to_string(),
            train_data_file_path: dir.path().join("train.csv"),
            test_data_file_path: dir.path().join("test.csv"),
        },
        &schema,
        &settings,
        &source,
    )
    .initiate_data_ingestion()
    .unwrap();
    let validation = DataValidation::new(&artifacts, &schema, &settings, dir.path().join("drift.yaml"))
        .initiate_data_validation()
        .unwrap();

    let status = validation.validation_status;
    assert!(status.train.column_count && status.train.declared_columns);
    assert!(!status.train.column_types);
    assert!(!status.test.column_types);
    assert!(!status.overall);
    assert!(!validation.is_valid());
}

#[test]
fn test_transformation_appends_target_last() {
    let dir = tempfile::tempdir().unwrap();
    let (schema, settings, artifacts) = ingest(dir.path(), 100);
    let config = DataTransformationConfig {
        transformed_train_file_path: dir
            .path()
            .join("DataTransformationArtifacts/TransformedTrain/transformed_train_data.arrow"),
        transformed_test_file_path: dir
            .path()
            .join("DataTransformationArtifacts/TransformedTest/transformed_test_data.arrow"),
        preprocessor_file_path: dir
            .path()
            .join("DataTransformationArtifacts/car_price_preprocessor.bin"),
    };

    let transformed = DataTransformation::new(&artifacts, &schema, &settings, config)
        .initiate_data_transformation()
        .unwrap();

    let train = read_array(&transformed.transformed_train_file_path).unwrap();
    let test = read_array(&transformed.transformed_test_file_path).unwrap();
    let preprocessor = FittedPreprocessor::load(&transformed.transformed_object_file_path).unwrap();

    // 2 seller + 2 fuel + 2 transmission + 3 car_name bits + 6 numeric
    assert_eq!(preprocessor.n_features(), 15);
    assert_eq!(train.shape(), (80, 16));
    assert_eq!(test.shape(), (20, 16));

    let names = train.get_column_names();
    assert_eq!(names.last().map(|n| n.as_str()), Some("selling_price"));

    // the target is carried through untouched
    let raw_test = read_csv(&artifacts.test_data_file_path).unwrap();
    let expected: Vec<Option<f64>> = car_price_processing::utils::numeric_values(&raw_test, "selling_price").unwrap();
    let actual = car_price_processing::utils::numeric_values(&test, "selling_price").unwrap();
    assert_eq!(actual, expected);
}
