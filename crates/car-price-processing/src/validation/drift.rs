//! Dataset drift between a reference (train) and current (test) frame.
//!
//! Every column shared by both frames is tested. Numerical columns with more
//! than [`CATEGORICAL_NUMERIC_LIMIT`] distinct reference values use the
//! Kolmogorov-Smirnov test; everything else uses chi-square on category
//! frequencies.

use super::stats::{chi_square_two_sample, ks_two_sample};
use crate::error::Result;
use crate::utils::{self, is_numeric_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Numerical columns with at most this many distinct values are tested as
/// categories.
pub const CATEGORICAL_NUMERIC_LIMIT: usize = 5;

/// Which value `detect_dataset_drift` should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriftOutput {
    /// Whether the dataset as a whole drifted.
    #[default]
    Verdict,
    /// Share of drifted features.
    Ratio,
}

/// Value returned by `detect_dataset_drift`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriftSignal {
    Verdict(bool),
    Ratio(f64),
}

/// Per-feature drift result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDrift {
    /// `num` or `cat`.
    pub feature_type: String,
    /// `ks` or `chisquare`.
    pub stattest: String,
    pub statistic: f64,
    pub p_value: f64,
    pub drift_detected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftMetrics {
    pub n_features: usize,
    pub n_drifted_features: usize,
    pub share_drifted_features: f64,
    pub dataset_drift: bool,
    pub features: BTreeMap<String, FeatureDrift>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftData {
    pub metrics: DriftMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftSection {
    pub data: DriftData,
}

/// Full drift report as written to `DataDriftReport.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub data_drift: DriftSection,
}

impl DriftReport {
    pub fn metrics(&self) -> &DriftMetrics {
        &self.data_drift.data.metrics
    }

    pub fn dataset_drift(&self) -> bool {
        self.metrics().dataset_drift
    }

    /// `n_drifted_features / n_features`, zero when nothing was tested.
    pub fn drift_ratio(&self) -> f64 {
        let metrics = self.metrics();
        if metrics.n_features == 0 {
            0.0
        } else {
            metrics.n_drifted_features as f64 / metrics.n_features as f64
        }
    }

    /// Pick the requested signal out of the report.
    pub fn signal(&self, output: DriftOutput) -> DriftSignal {
        match output {
            DriftOutput::Verdict => DriftSignal::Verdict(self.dataset_drift()),
            DriftOutput::Ratio => DriftSignal::Ratio(self.drift_ratio()),
        }
    }

    /// Serialize the report as YAML, creating parent directories.
    pub fn write_yaml(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}

/// Thresholds for the drift verdicts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftThresholds {
    pub p_value: f64,
    pub drift_share: f64,
}

impl Default for DriftThresholds {
    fn default() -> Self {
        Self {
            p_value: 0.05,
            drift_share: 0.5,
        }
    }
}

fn test_feature(
    reference: &DataFrame,
    current: &DataFrame,
    name: &str,
    p_threshold: f64,
) -> Result<FeatureDrift> {
    let dtype = reference.column(name)?.dtype().clone();
    let numeric = is_numeric_dtype(&dtype)
        && utils::distinct_count(reference, name)? > CATEGORICAL_NUMERIC_LIMIT;

    let (feature_type, stattest, (statistic, p_value)) = if numeric {
        let a: Vec<f64> = utils::numeric_values(reference, name)?
            .into_iter()
            .flatten()
            .collect();
        let b: Vec<f64> = utils::numeric_values(current, name)?
            .into_iter()
            .flatten()
            .collect();
        ("num", "ks", ks_two_sample(&a, &b))
    } else {
        let a: Vec<String> = utils::string_values(reference, name)?
            .into_iter()
            .flatten()
            .collect();
        let b: Vec<String> = utils::string_values(current, name)?
            .into_iter()
            .flatten()
            .collect();
        let feature_type = if is_numeric_dtype(&dtype) { "num" } else { "cat" };
        (feature_type, "chisquare", chi_square_two_sample(&a, &b))
    };

    Ok(FeatureDrift {
        feature_type: feature_type.to_string(),
        stattest: stattest.to_string(),
        statistic,
        p_value,
        drift_detected: p_value < p_threshold,
    })
}

/// Test every shared column and assemble the report.
pub fn compute_drift_report(
    reference: &DataFrame,
    current: &DataFrame,
    thresholds: DriftThresholds,
) -> Result<DriftReport> {
    let current_columns: BTreeSet<String> = utils::column_names(current).into_iter().collect();
    let mut features = BTreeMap::new();
    for name in utils::column_names(reference) {
        if !current_columns.contains(&name) {
            continue;
        }
        let result = test_feature(reference, current, &name, thresholds.p_value)?;
        debug!(
            "Drift {} ({}): p = {:.4}, drifted = {}",
            name, result.stattest, result.p_value, result.drift_detected
        );
        features.insert(name, result);
    }

    let n_features = features.len();
    let n_drifted_features = features.values().filter(|f| f.drift_detected).count();
    let share_drifted_features = if n_features == 0 {
        0.0
    } else {
        n_drifted_features as f64 / n_features as f64
    };
    let dataset_drift = n_features > 0 && share_drifted_features >= thresholds.drift_share;

    info!(
        "Drift: {}/{} features drifted, dataset drift = {}",
        n_drifted_features, n_features, dataset_drift
    );

    Ok(DriftReport {
        data_drift: DriftSection {
            data: DriftData {
                metrics: DriftMetrics {
                    n_features,
                    n_drifted_features,
                    share_drifted_features,
                    dataset_drift,
                    features,
                },
            },
        },
    })
}

/// Compute drift, persist the report to `report_path`, and return the
/// requested signal together with the report.
pub fn detect_dataset_drift(
    reference: &DataFrame,
    current: &DataFrame,
    output: DriftOutput,
    thresholds: DriftThresholds,
    report_path: &Path,
) -> Result<(DriftSignal, DriftReport)> {
    let report = compute_drift_report(reference, current, thresholds)?;
    report.write_yaml(report_path)?;
    Ok((report.signal(output), report))
}
