//! Column-wise preprocessor: one-hot block, binary block, scaled numeric block.

use super::encoders::{BinaryEncoder, OneHotEncoder, StandardScaler};
use crate::config::SchemaConfig;
use crate::error::{ProcessingError, Result, ResultExt};
use crate::utils;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Which columns go through which encoder.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnGroups {
    pub onehot: Vec<String>,
    pub binary: Vec<String>,
    pub numerical: Vec<String>,
}

impl From<&SchemaConfig> for ColumnGroups {
    fn from(schema: &SchemaConfig) -> Self {
        Self {
            onehot: schema.onehot_columns.clone(),
            binary: schema.binary_columns.clone(),
            numerical: schema.numerical_columns.clone(),
        }
    }
}

/// A preprocessor fit on the train features.
///
/// Columns outside the three groups are ignored by [`transform`](Self::transform),
/// so it accepts frames that still carry the target or extra columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    onehot: Vec<(String, OneHotEncoder)>,
    binary: Vec<(String, BinaryEncoder)>,
    numerical: Vec<(String, StandardScaler)>,
}

impl FittedPreprocessor {
    /// Learn encoder state from `df`.
    pub fn fit(df: &DataFrame, groups: &ColumnGroups) -> Result<Self> {
        let mut onehot = Vec::with_capacity(groups.onehot.len());
        for column in &groups.onehot {
            let values = utils::string_values(df, column)?;
            onehot.push((column.clone(), OneHotEncoder::fit(column, &values)?));
        }

        let mut binary = Vec::with_capacity(groups.binary.len());
        for column in &groups.binary {
            let values = utils::string_values(df, column)?;
            binary.push((column.clone(), BinaryEncoder::fit(column, &values)?));
        }

        let mut numerical = Vec::with_capacity(groups.numerical.len());
        for column in &groups.numerical {
            let values = utils::numeric_values(df, column)?;
            numerical.push((column.clone(), StandardScaler::fit(column, &values)?));
        }

        let fitted = Self {
            onehot,
            binary,
            numerical,
        };
        info!(
            "Fitted preprocessor on {} rows -> {} features",
            df.height(),
            fitted.n_features()
        );
        Ok(fitted)
    }

    /// Output column names in output order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_features());
        for (column, encoder) in &self.onehot {
            names.extend(encoder.output_names(column));
        }
        for (column, encoder) in &self.binary {
            names.extend(encoder.output_names(column));
        }
        names.extend(self.numerical.iter().map(|(column, _)| column.clone()));
        names
    }

    pub fn n_features(&self) -> usize {
        self.onehot.iter().map(|(_, e)| e.width()).sum::<usize>()
            + self.binary.iter().map(|(_, e)| e.n_bits).sum::<usize>()
            + self.numerical.len()
    }

    /// Categories learned for a one-hot or binary column, in encoder order.
    pub fn known_categories(&self, column: &str) -> Option<&[String]> {
        self.binary
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, e)| e.categories.as_slice())
            .or_else(|| {
                self.onehot
                    .iter()
                    .find(|(name, _)| name == column)
                    .map(|(_, e)| e.categories.as_slice())
            })
    }

    /// Row-major feature matrix for `df`.
    pub fn transform_rows(&self, df: &DataFrame) -> Result<Vec<Vec<f64>>> {
        let n = df.height();
        let mut rows: Vec<Vec<f64>> = (0..n)
            .map(|_| Vec::with_capacity(self.n_features()))
            .collect();

        for (column, encoder) in &self.onehot {
            let values = utils::string_values(df, column)?;
            for (row, value) in rows.iter_mut().zip(&values) {
                encoder.transform_value(value.as_deref(), row);
            }
        }
        for (column, encoder) in &self.binary {
            let values = utils::string_values(df, column)?;
            for (row, value) in rows.iter_mut().zip(&values) {
                encoder.transform_value(value.as_deref(), row);
            }
        }
        for (column, scaler) in &self.numerical {
            let values = utils::numeric_values(df, column)?;
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(scaler.transform_value(value));
            }
        }
        Ok(rows)
    }

    /// Transform into a frame of `Float64` feature columns.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let rows = self.transform_rows(df)?;
        let columns: Vec<Column> = self
            .feature_names()
            .into_iter()
            .enumerate()
            .map(|(j, name)| {
                let values: Vec<f64> = rows.iter().map(|row| row[j]).collect();
                Series::new(name.into(), values).into()
            })
            .collect();
        let out = DataFrame::new(columns).context("Assembling transformed features")?;
        debug!("Transformed {} rows into {:?}", df.height(), out.shape());
        Ok(out)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_bytes()?)
            .context(format!("Writing preprocessor to {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ProcessingError::Io(e).with_context(format!("Reading preprocessor {}", path.display()))
        })?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn train() -> DataFrame {
        df![
            "car_name" => ["Alto", "Swift", "City", "Alto"],
            "fuel_type" => ["Petrol", "Diesel", "Petrol", "CNG"],
            "km_driven" => [10_000.0, 20_000.0, 30_000.0, 40_000.0],
            "selling_price" => [1.0, 2.0, 3.0, 4.0],
        ]
        .unwrap()
    }

    fn groups() -> ColumnGroups {
        ColumnGroups {
            onehot: vec!["fuel_type".to_string()],
            binary: vec!["car_name".to_string()],
            numerical: vec!["km_driven".to_string()],
        }
    }

    #[test]
    fn test_feature_layout() {
        let pre = FittedPreprocessor::fit(&train(), &groups()).unwrap();
        assert_eq!(
            pre.feature_names(),
            vec![
                "fuel_type_CNG",
                "fuel_type_Diesel",
                "fuel_type_Petrol",
                "car_name_0",
                "car_name_1",
                "km_driven",
            ]
        );
        assert_eq!(pre.n_features(), 6);

        let out = pre.transform(&train()).unwrap();
        assert_eq!(out.shape(), (4, 6));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let pre = FittedPreprocessor::fit(&train(), &groups()).unwrap();
        let first = pre.transform(&train()).unwrap();
        let second = pre.transform(&train()).unwrap();
        assert!(first.equals(&second));
    }

    #[test]
    fn test_unknown_categories_at_transform() {
        let pre = FittedPreprocessor::fit(&train(), &groups()).unwrap();
        let unseen = df![
            "car_name" => ["Nano"],
            "fuel_type" => ["Electric"],
            "km_driven" => [25_000.0],
        ]
        .unwrap();
        let rows = pre.transform_rows(&unseen).unwrap();
        assert_eq!(rows[0], vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_known_categories() {
        let pre = FittedPreprocessor::fit(&train(), &groups()).unwrap();
        assert_eq!(
            pre.known_categories("car_name").unwrap(),
            &["Alto".to_string(), "Swift".to_string(), "City".to_string()]
        );
        assert!(pre.known_categories("km_driven").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("car_price_preprocessor.bin");
        let pre = FittedPreprocessor::fit(&train(), &groups()).unwrap();

        pre.save(&path).unwrap();
        assert_eq!(FittedPreprocessor::load(&path).unwrap(), pre);
    }

    #[test]
    fn test_missing_group_column() {
        let df = train().drop("car_name").unwrap();
        let result = FittedPreprocessor::fit(&df, &groups());
        assert!(matches!(result, Err(ProcessingError::ColumnNotFound(_))));
    }
}
