//! Column encoders fit on train data and applied unchanged afterwards.

use crate::error::{ProcessingError, Result};
use crate::utils::mean_and_std;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Standardizes a numeric column to zero mean and unit variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: f64,
    /// Population standard deviation; 1.0 when the column is constant.
    pub scale: f64,
}

impl StandardScaler {
    pub fn fit(column: &str, values: &[Option<f64>]) -> Result<Self> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return Err(ProcessingError::NoValidValues(column.to_string()));
        }
        let (mean, std) = mean_and_std(&present);
        let scale = if std > 0.0 { std } else { 1.0 };
        Ok(Self { mean, scale })
    }

    /// Missing values map to the mean, i.e. 0.0.
    pub fn transform_value(&self, value: Option<f64>) -> f64 {
        match value {
            Some(v) => (v - self.mean) / self.scale,
            None => 0.0,
        }
    }
}

/// One indicator column per category seen during fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Sorted, distinct.
    pub categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit(column: &str, values: &[Option<String>]) -> Result<Self> {
        let categories: BTreeSet<&String> = values.iter().flatten().collect();
        if categories.is_empty() {
            return Err(ProcessingError::NoValidValues(column.to_string()));
        }
        Ok(Self {
            categories: categories.into_iter().cloned().collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    pub fn output_names(&self, column: &str) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{column}_{c}"))
            .collect()
    }

    /// Unknown or missing categories encode as all zeros.
    pub fn transform_value(&self, value: Option<&str>, out: &mut Vec<f64>) {
        let hit = value.and_then(|v| self.categories.binary_search_by(|c| c.as_str().cmp(v)).ok());
        out.extend((0..self.width()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
    }
}

/// Ordinal code written out in binary, most significant bit first.
///
/// Categories get codes `1..=n` in order of first appearance; code 0 is
/// reserved for unknown or missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryEncoder {
    pub categories: Vec<String>,
    pub n_bits: usize,
}

impl BinaryEncoder {
    pub fn fit(column: &str, values: &[Option<String>]) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let mut categories = Vec::new();
        for value in values.iter().flatten() {
            if seen.insert(value.as_str()) {
                categories.push(value.clone());
            }
        }
        if categories.is_empty() {
            return Err(ProcessingError::NoValidValues(column.to_string()));
        }
        let n_bits = (usize::BITS - categories.len().leading_zeros()) as usize;
        Ok(Self { categories, n_bits })
    }

    pub fn output_names(&self, column: &str) -> Vec<String> {
        (0..self.n_bits).map(|i| format!("{column}_{i}")).collect()
    }

    /// Ordinal code of a value, 0 when unknown.
    pub fn code(&self, value: Option<&str>) -> usize {
        value
            .and_then(|v| self.categories.iter().position(|c| c == v))
            .map_or(0, |i| i + 1)
    }

    pub fn transform_value(&self, value: Option<&str>, out: &mut Vec<f64>) {
        let code = self.code(value);
        out.extend((0..self.n_bits).rev().map(|bit| ((code >> bit) & 1) as f64));
    }
}
