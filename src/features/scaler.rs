use crate::error::{PredictError, Result};
use serde::{Deserialize, Serialize};

/// Below this a column is treated as constant and its scale is clamped.
const MIN_STDDEV: f64 = 1e-12;

/// Per-column standardizer: `(x - mean) / stddev`.
///
/// Fit once on the training split; the stored statistics are reused verbatim
/// for test and forecast inputs. A column whose values are all identical has
/// no scale to learn; its stddev is clamped to 1.0 so the column standardizes
/// to zero instead of dividing by zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    means: Vec<f64>,
    stddevs: Vec<f64>,
}

impl Scaler {
    /// Compute per-column mean and population standard deviation.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(PredictError::NotEnoughRows {
                rows: 0,
                required: 1,
            });
        }
        let cols = rows[0].len();
        let n = rows.len() as f64;

        let mut means = vec![0.0; cols];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut stddevs = vec![0.0; cols];
        for row in rows {
            for (c, v) in row.iter().enumerate() {
                let d = v - means[c];
                stddevs[c] += d * d;
            }
        }
        for s in &mut stddevs {
            *s = (*s / n).sqrt();
            if *s < MIN_STDDEV {
                *s = 1.0;
            }
        }

        Ok(Self { means, stddevs })
    }

    /// Standardize rows using the fitted statistics. Never refits.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.stddevs))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    pub fn columns(&self) -> usize {
        self.means.len()
    }
}
