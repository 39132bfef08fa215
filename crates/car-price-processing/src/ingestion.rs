//! Data ingestion: fetch the raw collection, drop configured columns, split
//! into train and test, persist both splits as CSV.

use crate::config::{ProcessingConfig, SchemaConfig};
use crate::error::{ProcessingError, Result, ResultExt};
use crate::io;
use crate::source::DocumentSource;
use crate::types::DataIngestionArtifacts;
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::path::PathBuf;
use tracing::{info, warn};

/// Locations used by one ingestion run.
#[derive(Debug, Clone)]
pub struct DataIngestionConfig {
    pub database_name: String,
    pub collection_name: String,
    pub train_data_file_path: PathBuf,
    pub test_data_file_path: PathBuf,
}

/// The ingestion stage.
pub struct DataIngestion<'a> {
    config: DataIngestionConfig,
    schema: &'a SchemaConfig,
    settings: &'a ProcessingConfig,
    source: &'a dyn DocumentSource,
}

impl<'a> DataIngestion<'a> {
    pub fn new(
        config: DataIngestionConfig,
        schema: &'a SchemaConfig,
        settings: &'a ProcessingConfig,
        source: &'a dyn DocumentSource,
    ) -> Self {
        Self {
            config,
            schema,
            settings,
            source,
        }
    }

    /// Fetch the configured collection.
    pub fn fetch_data(&self) -> Result<DataFrame> {
        self.source
            .fetch_collection(&self.config.database_name, &self.config.collection_name)
            .context("Fetching raw records")
    }

    /// Run the stage end to end.
    pub fn initiate_data_ingestion(&self) -> Result<DataIngestionArtifacts> {
        info!("Starting data ingestion");
        let raw = self.fetch_data()?;
        let df = drop_columns(raw, &self.schema.drop_columns)?;

        let (mut train, mut test) =
            train_test_split(&df, self.settings.test_size, self.settings.random_seed)?;
        info!(
            "Split {} rows into {} train / {} test",
            df.height(),
            train.height(),
            test.height()
        );

        io::write_csv(&mut train, &self.config.train_data_file_path)
            .context("Persisting train split")?;
        io::write_csv(&mut test, &self.config.test_data_file_path)
            .context("Persisting test split")?;

        Ok(DataIngestionArtifacts {
            train_data_file_path: self.config.train_data_file_path.clone(),
            test_data_file_path: self.config.test_data_file_path.clone(),
        })
    }
}

/// Drop the named columns that are present; absent names are logged.
pub fn drop_columns(mut df: DataFrame, columns: &[String]) -> Result<DataFrame> {
    for name in columns {
        if df.get_column_index(name).is_some() {
            df = df.drop(name)?;
        } else {
            warn!("Drop column '{}' not present in raw data", name);
        }
    }
    Ok(df)
}

/// Number of test rows for `n` rows: `ceil(n * test_size)`.
fn test_row_count(n: usize, test_size: f64) -> usize {
    let raw = n as f64 * test_size;
    // 100 * 0.2 must give 20, not 21
    if (raw - raw.round()).abs() < 1e-9 {
        raw.round() as usize
    } else {
        raw.ceil() as usize
    }
}

/// Shuffle rows and partition them into disjoint train and test frames.
///
/// With `seed` set the split is reproducible; otherwise it draws from OS
/// entropy.
pub fn train_test_split(
    df: &DataFrame,
    test_size: f64,
    seed: Option<u64>,
) -> Result<(DataFrame, DataFrame)> {
    let n = df.height();
    let n_test = test_row_count(n, test_size);
    if n_test == 0 || n_test >= n {
        return Err(ProcessingError::InvalidData(format!(
            "cannot split {n} rows with test_size {test_size}"
        )));
    }

    let mut indices: Vec<IdxSize> = (0..n as IdxSize).collect();
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);
    let train = df.take(&IdxCa::from_vec("idx".into(), train_idx.to_vec()))?;
    let test = df.take(&IdxCa::from_vec("idx".into(), test_idx.to_vec()))?;
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn frame(n: i64) -> DataFrame {
        df![
            "id" => (0..n).collect::<Vec<_>>(),
            "value" => (0..n).map(|v| v as f64 * 1.5).collect::<Vec<_>>(),
        ]
        .unwrap()
    }

    fn ids(df: &DataFrame) -> HashSet<i64> {
        df.column("id")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn test_split_is_disjoint_and_exhaustive() {
        let df = frame(100);
        let (train, test) = train_test_split(&df, 0.2, Some(7)).unwrap();

        assert_eq!(train.height(), 80);
        assert_eq!(test.height(), 20);

        let train_ids = ids(&train);
        let test_ids = ids(&test);
        assert!(train_ids.is_disjoint(&test_ids));
        assert_eq!(train_ids.len() + test_ids.len(), 100);
    }

    #[test]
    fn test_split_rounds_test_count_up() {
        let (train, test) = train_test_split(&frame(11), 0.2, Some(1)).unwrap();
        assert_eq!(test.height(), 3);
        assert_eq!(train.height(), 8);
    }

    #[test]
    fn test_seeded_split_is_reproducible() {
        let df = frame(50);
        let (a, _) = train_test_split(&df, 0.2, Some(42)).unwrap();
        let (b, _) = train_test_split(&df, 0.2, Some(42)).unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn test_split_too_small() {
        let result = train_test_split(&frame(1), 0.2, None);
        assert!(matches!(result, Err(ProcessingError::InvalidData(_))));
    }

    #[test]
    fn test_drop_columns_ignores_absent() {
        let df = frame(3);
        let dropped = drop_columns(df, &["value".to_string(), "brand".to_string()]).unwrap();
        assert_eq!(dropped.width(), 1);
    }
}
