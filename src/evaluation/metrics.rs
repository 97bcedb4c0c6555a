use serde::{Deserialize, Serialize};

/// Error metrics for a set of predictions against actuals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub rmse: f64,
    pub r2: f64,
}

impl ErrorSummary {
    pub fn from_predictions(actual: &[f64], predicted: &[f64]) -> Self {
        Self {
            rmse: rmse(actual, predicted),
            r2: r_squared(actual, predicted),
        }
    }
}

/// Root mean squared error. Empty input yields 0.0.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum();
    (sum / actual.len() as f64).sqrt()
}

/// Coefficient of determination. A constant actual series has no variance to
/// explain; that degenerate case reports 0.0.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean) * (a - mean)).sum();
    if ss_tot < 1e-12 {
        return 0.0;
    }
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum();
    1.0 - ss_res / ss_tot
}
