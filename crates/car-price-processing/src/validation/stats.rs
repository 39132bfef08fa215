//! Two-sample statistical tests used by drift detection.

use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::collections::BTreeMap;

/// Two-sample Kolmogorov-Smirnov test.
///
/// Returns `(statistic, p_value)` using the asymptotic Kolmogorov
/// distribution with the Stephens small-sample correction.
pub fn ks_two_sample(reference: &[f64], current: &[f64]) -> (f64, f64) {
    if reference.is_empty() || current.is_empty() {
        return (0.0, 1.0);
    }
    let mut a = reference.to_vec();
    let mut b = current.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let (n, m) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut statistic: f64 = 0.0;
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        statistic = statistic.max((i as f64 / n - j as f64 / m).abs());
    }

    let en = (n * m / (n + m)).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * statistic;
    (statistic, kolmogorov_survival(lambda))
}

/// `P(K > lambda)` for the Kolmogorov distribution.
fn kolmogorov_survival(lambda: f64) -> f64 {
    if lambda < 0.2 {
        return 1.0;
    }
    let mut sum = 0.0;
    let mut sign = 1.0;
    for k in 1..=100 {
        let term = sign * (-2.0 * (k as f64).powi(2) * lambda * lambda).exp();
        sum += term;
        if term.abs() < 1e-12 {
            break;
        }
        sign = -sign;
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

/// Pearson chi-square test of homogeneity on the category counts of two
/// samples.
///
/// Returns `(statistic, p_value)`. A single shared category yields p = 1.
pub fn chi_square_two_sample(reference: &[String], current: &[String]) -> (f64, f64) {
    let mut table: BTreeMap<&str, [f64; 2]> = BTreeMap::new();
    for value in reference {
        table.entry(value.as_str()).or_default()[0] += 1.0;
    }
    for value in current {
        table.entry(value.as_str()).or_default()[1] += 1.0;
    }

    let totals = [reference.len() as f64, current.len() as f64];
    let grand_total = totals[0] + totals[1];
    if table.len() < 2 || totals[0] == 0.0 || totals[1] == 0.0 {
        return (0.0, 1.0);
    }

    let mut statistic = 0.0;
    for counts in table.values() {
        let row_total = counts[0] + counts[1];
        for (observed, total) in counts.iter().zip(totals) {
            let expected = row_total * total / grand_total;
            statistic += (observed - expected).powi(2) / expected;
        }
    }

    // at least two categories, so dof >= 1
    let dof = (table.len() - 1) as f64;
    let p_value = ChiSquared::new(dof).map_or(1.0, |dist| dist.sf(statistic));
    (statistic, p_value)
}
