//! k-nearest-neighbours regression over Euclidean distance.

use super::Regressor;
use crate::matrix::Matrix;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNeighborsRegressor {
    x: Matrix,
    y: Vec<f64>,
    n_neighbors: usize,
    distance_weighted: bool,
}

impl KNeighborsRegressor {
    /// Memorizes the training set. `n_neighbors` is capped at its size.
    pub fn fit(x: &Matrix, y: &[f64], n_neighbors: usize, distance_weighted: bool) -> Self {
        Self {
            x: x.clone(),
            y: y.to_vec(),
            n_neighbors: n_neighbors.min(y.len()).max(1),
            distance_weighted,
        }
    }
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(u, v)| (u - v).powi(2)).sum()
}

impl Regressor for KNeighborsRegressor {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut distances: Vec<(f64, usize)> = self
            .x
            .outer_iter()
            .enumerate()
            .map(|(i, train_row)| (squared_distance(row, train_row), i))
            .collect();
        let k = self.n_neighbors.min(distances.len());
        distances.select_nth_unstable_by(k - 1, |a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let neighbours = &distances[..k];

        if !self.distance_weighted {
            return neighbours.iter().map(|&(_, i)| self.y[i]).sum::<f64>() / k as f64;
        }

        // exact matches take all the weight
        let exact: Vec<f64> = neighbours
            .iter()
            .filter(|(d, _)| *d == 0.0)
            .map(|&(_, i)| self.y[i])
            .collect();
        if !exact.is_empty() {
            return exact.iter().sum::<f64>() / exact.len() as f64;
        }

        let (weighted, total) = neighbours.iter().fold((0.0, 0.0), |(acc, w_sum), &(d, i)| {
            let w = 1.0 / d.sqrt();
            (acc + w * self.y[i], w_sum + w)
        });
        weighted / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::matrix_from_rows;
    use ndarray::aview1;

    fn model(weighted: bool) -> KNeighborsRegressor {
        let x = matrix_from_rows(vec![vec![0.0], vec![1.0], vec![2.0], vec![10.0]]).unwrap();
        KNeighborsRegressor::fit(&x, &[0.0, 10.0, 20.0, 100.0], 2, weighted)
    }

    #[test]
    fn test_uniform_average() {
        assert_eq!(model(false).predict_row(aview1(&[0.4])), 5.0);
    }

    #[test]
    fn test_distance_weighted() {
        // neighbours 0.0 (d=0.5) and 1.0 (d=0.5) weigh equally
        assert_eq!(model(true).predict_row(aview1(&[0.5])), 5.0);
        assert_eq!(model(true).predict_row(aview1(&[2.0])), 20.0);
    }

    #[test]
    fn test_k_capped_at_training_size() {
        let x = matrix_from_rows(vec![vec![0.0], vec![1.0]]).unwrap();
        let knn = KNeighborsRegressor::fit(&x, &[1.0, 3.0], 10, false);
        assert_eq!(knn.predict_row(aview1(&[5.0])), 2.0);
    }
}
