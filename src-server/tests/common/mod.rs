//! Shared fixture: a seeded document store, config files and an in-memory
//! object store under one temporary directory.

#![allow(dead_code)]

use car_price_lib::{AppConfig, MemoryObjectStore, ValidationPolicy};
use car_price_processing::{DocumentSource, JsonDocumentSource};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const SCHEMA: &str = r#"
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
drop_columns: [listing_id]
target_column: selling_price
"#;

pub const MODEL_YAML: &str = r#"
base_model_score: 0.5
model_selection:
  cv_folds: 3
  random_seed: 7
train_model:
  linear_regression: {}
  ridge:
    alpha: [0.1, 1.0]
"#;

pub const CARS: [&str; 4] = ["Maruti Alto", "Hyundai i20", "Honda City", "Tata Nexon"];

/// `n` listings whose price is linear in age, model and power.
pub fn listings(n: usize) -> DataFrame {
    let idx: Vec<usize> = (0..n).collect();
    df![
        "listing_id" => idx.iter().map(|i| *i as i64).collect::<Vec<_>>(),
        "car_name" => idx.iter().map(|i| CARS[i % 4]).collect::<Vec<_>>(),
        "vehicle_age" => idx.iter().map(|i| (i % 10 + 1) as i64).collect::<Vec<_>>(),
        "km_driven" => idx.iter().map(|i| (10_000 + (i % 10) * 9_000) as i64).collect::<Vec<_>>(),
        "seller_type" => idx.iter().map(|i| if i % 3 == 0 { "Dealer" } else { "Individual" }).collect::<Vec<_>>(),
        "fuel_type" => idx.iter().map(|i| if i % 2 == 0 { "Petrol" } else { "Diesel" }).collect::<Vec<_>>(),
        "transmission_type" => idx.iter().map(|i| if i % 5 == 0 { "Automatic" } else { "Manual" }).collect::<Vec<_>>(),
        "mileage" => idx.iter().map(|i| 17.0 + (i % 6) as f64 * 0.8).collect::<Vec<_>>(),
        "engine" => idx.iter().map(|i| (1_000 + (i % 4) * 150) as i64).collect::<Vec<_>>(),
        "max_power" => idx.iter().map(|i| 70.0 + (i % 4) as f64 * 15.0).collect::<Vec<_>>(),
        "seats" => idx.iter().map(|i| if i % 7 == 0 { 7_i64 } else { 5 }).collect::<Vec<_>>(),
        "selling_price" => idx.iter().map(|i| (900_000 - (i % 10) * 60_000 + (i % 4) * 50_000) as i64).collect::<Vec<_>>(),
    ]
    .unwrap()
}

pub struct Fixture {
    pub dir: TempDir,
    pub config: AppConfig,
    pub source: Arc<JsonDocumentSource>,
    pub store: Arc<MemoryObjectStore>,
}

impl Fixture {
    /// A collection of `rows` listings and config files with `schema`.
    pub fn with_schema(rows: usize, schema: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "config/schema.yaml", schema);
        write(root, "config/model.yaml", MODEL_YAML);

        let config = AppConfig {
            artifacts_dir: root.join("artifacts"),
            schema_config_path: root.join("config/schema.yaml"),
            model_config_path: root.join("config/model.yaml"),
            document_store_dir: root.join("documents"),
            object_store_dir: root.join("objects"),
            random_seed: Some(3),
            validation_policy: ValidationPolicy::Warn,
            ..AppConfig::default()
        };

        let source = Arc::new(JsonDocumentSource::new(&config.document_store_dir));
        source
            .insert_records(&config.database_name, &config.collection_name, &listings(rows))
            .unwrap();

        Self {
            dir,
            config,
            source,
            store: Arc::new(MemoryObjectStore::new()),
        }
    }

    pub fn new(rows: usize) -> Self {
        Self::with_schema(rows, SCHEMA)
    }
}

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}
