use crate::error::{PredictError, Result};
use crate::model::kdtree::KdTree;

/// K-nearest-neighbor regressor backed by a k-d tree.
///
/// Prediction is the arithmetic mean of the `k` nearest training targets.
/// Targets may be vector-valued; the mean is then taken component-wise.
#[derive(Debug, Clone)]
pub struct KnnRegressor {
    k: usize,
    tree: KdTree,
    targets: Vec<Vec<f64>>,
    width: usize,
}

impl KnnRegressor {
    /// Fit on single-output targets. `k` must be in `1..=rows`.
    pub fn fit(features: Vec<Vec<f64>>, targets: Vec<f64>, k: usize) -> Result<Self> {
        let multi = targets.into_iter().map(|y| vec![y]).collect();
        Self::fit_multi(features, multi, k)
    }

    /// Fit on vector-valued targets. Requires one target per feature row.
    pub fn fit_multi(features: Vec<Vec<f64>>, targets: Vec<Vec<f64>>, k: usize) -> Result<Self> {
        let rows = features.len();
        if targets.len() != rows {
            return Err(PredictError::LengthMismatch {
                features: rows,
                targets: targets.len(),
            });
        }
        if k == 0 || k > rows {
            return Err(PredictError::KOutOfRange { k, rows });
        }
        let width = targets.first().map(|t| t.len()).unwrap_or(0);
        Ok(Self {
            k,
            tree: KdTree::build(features),
            targets,
            width,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn training_rows(&self) -> usize {
        self.tree.len()
    }

    /// Predict the first (usually only) output component for each query.
    pub fn predict(&self, queries: &[Vec<f64>]) -> Vec<f64> {
        queries.iter().map(|q| self.predict_one(q)).collect()
    }

    /// Single-query convenience for the forecast loop.
    pub fn predict_one(&self, query: &[f64]) -> f64 {
        let neighbors = self.tree.nearest(query, self.k);
        let sum: f64 = neighbors.iter().map(|n| self.targets[n.index][0]).sum();
        sum / neighbors.len() as f64
    }

    /// Component-wise mean of the k nearest targets for each query.
    pub fn predict_multi(&self, queries: &[Vec<f64>]) -> Vec<Vec<f64>> {
        queries
            .iter()
            .map(|q| {
                let neighbors = self.tree.nearest(q, self.k);
                let mut mean = vec![0.0; self.width];
                for n in &neighbors {
                    for (m, y) in mean.iter_mut().zip(&self.targets[n.index]) {
                        *m += y;
                    }
                }
                let count = neighbors.len() as f64;
                for m in &mut mean {
                    *m /= count;
                }
                mean
            })
            .collect()
    }
}
