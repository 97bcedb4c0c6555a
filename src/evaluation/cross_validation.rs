use crate::error::{PredictError, Result};
use crate::evaluation::metrics::ErrorSummary;
use crate::model::KnnRegressor;

/// Cross-validate one candidate `k`: contiguous folds, train on the rest,
/// score on the held-out fold, average RMSE and R² over all folds. The same
/// partition feeds both metrics.
///
/// Errors propagate to the caller (the hyperparameter search maps them to a
/// worst-case sentinel so one bad candidate cannot abort a whole search).
pub fn evaluate(k: usize, features: &[Vec<f64>], targets: &[f64], folds: usize) -> Result<ErrorSummary> {
    let n = targets.len();
    if folds < 2 || n < folds {
        return Err(PredictError::NotEnoughRows {
            rows: n,
            required: folds.max(2),
        });
    }

    let fold_size = n / folds;
    let mut rmse_sum = 0.0;
    let mut r2_sum = 0.0;

    for fold in 0..folds {
        let test_start = fold * fold_size;
        let test_end = if fold == folds - 1 {
            n // last fold absorbs the remainder
        } else {
            test_start + fold_size
        };

        let mut train_x = Vec::with_capacity(n - (test_end - test_start));
        let mut train_y = Vec::with_capacity(train_x.capacity());
        for i in (0..test_start).chain(test_end..n) {
            train_x.push(features[i].clone());
            train_y.push(targets[i]);
        }

        let model = KnnRegressor::fit(train_x, train_y, k)?;
        let test_x = &features[test_start..test_end];
        let test_y = &targets[test_start..test_end];
        let predictions = model.predict(test_x);
        let summary = ErrorSummary::from_predictions(test_y, &predictions);
        rmse_sum += summary.rmse;
        r2_sum += summary.r2;
    }

    Ok(ErrorSummary {
        rmse: rmse_sum / folds as f64,
        r2: r2_sum / folds as f64,
    })
}
