//! CART regression tree with squared-error splits.

use super::Regressor;
use crate::matrix::Matrix;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Growth limits shared by the tree ensembles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    sse: f64,
}

fn mean(y: &[f64], indices: &[usize]) -> f64 {
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn sse(y: &[f64], indices: &[usize]) -> f64 {
    let m = mean(y, indices);
    indices.iter().map(|&i| (y[i] - m).powi(2)).sum()
}

fn best_split(x: &Matrix, y: &[f64], indices: &[usize]) -> Option<BestSplit> {
    let n = indices.len();
    let mut best: Option<BestSplit> = None;
    let mut order = indices.to_vec();

    for feature in 0..x.ncols() {
        let column = x.column(feature);
        order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));

        let total_sum: f64 = order.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = order.iter().map(|&i| y[i] * y[i]).sum();
        let (mut left_sum, mut left_sq) = (0.0, 0.0);

        for s in 1..n {
            let prev = order[s - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            let (lo, hi) = (column[prev], column[order[s]]);
            if lo == hi {
                continue;
            }

            let (nl, nr) = (s as f64, (n - s) as f64);
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let candidate = (left_sq - left_sum * left_sum / nl) + (right_sq - right_sum * right_sum / nr);

            if best.as_ref().is_none_or(|b| candidate < b.sse) {
                best = Some(BestSplit {
                    feature,
                    threshold: lo + (hi - lo) / 2.0,
                    sse: candidate,
                });
            }
        }
    }
    best
}

impl DecisionTreeRegressor {
    pub fn fit(x: &Matrix, y: &[f64], params: &TreeParams) -> Self {
        Self::fit_on(x, y, (0..y.len()).collect(), params)
    }

    /// Fit on a subset of rows; repeated indices act as sample weights.
    pub fn fit_on(x: &Matrix, y: &[f64], indices: Vec<usize>, params: &TreeParams) -> Self {
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut pending = vec![(0usize, indices, 0usize)];

        while let Some((slot, rows, depth)) = pending.pop() {
            let value = mean(y, &rows);
            let parent_sse = sse(y, &rows);
            let depth_left = params.max_depth.is_none_or(|max| depth < max);

            let split = if depth_left && rows.len() >= params.min_samples_split && parent_sse > 1e-12 {
                best_split(x, y, &rows).filter(|s| s.sse < parent_sse)
            } else {
                None
            };

            let Some(split) = split else {
                nodes[slot] = Node::Leaf { value };
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .partition(|&&i| x[[i, split.feature]] <= split.threshold);

            let left = nodes.len();
            nodes.push(Node::Leaf { value: 0.0 });
            let right = nodes.len();
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[slot] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
            pending.push((left, left_rows, depth + 1));
            pending.push((right, right_rows, depth + 1));
        }

        Self { nodes }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf; a lone leaf has depth 0.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            match &self.nodes[node] {
                Node::Leaf { .. } => deepest = deepest.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
            }
        }
        deepest
    }
}

impl Regressor for DecisionTreeRegressor {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}
