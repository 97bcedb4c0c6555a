use crate::domain::{PriceField, Record};
use crate::error::{PredictError, Result};
use crate::features::{self, FeatureSchema, Scaler};
use crate::evaluation::metrics::ErrorSummary;
use crate::evaluation::search::{self, CandidateScore, SearchConfig};
use crate::model::KnnRegressor;

/// Training options: hyperparameter search settings plus the held-out split.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub search: SearchConfig,
    /// Fraction of rows held out for the final test metrics.
    pub test_ratio: f64,
    pub split_seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            test_ratio: 0.2,
            split_seed: 42,
        }
    }
}

/// A fitted model with everything inference needs: the regressor over scaled
/// training vectors, the scaler fitted on the same training split, and the
/// feature schema the vectors were built from. Immutable after training.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model: KnnRegressor,
    pub scaler: Scaler,
    pub schema: FeatureSchema,
}

impl TrainedModel {
    /// Scale raw feature rows with the fitted scaler and predict.
    pub fn predict(&self, raw_rows: &[Vec<f64>]) -> Vec<f64> {
        self.model.predict(&self.scaler.transform(raw_rows))
    }
}

/// Everything the caller needs to judge a trained model.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub target: PriceField,
    pub optimal_k: usize,
    pub test: ErrorSummary,
    /// Per-candidate cross-validation curve, in search order.
    pub candidates: Vec<CandidateScore>,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Test-set predictions paired with `actuals`, for downstream display.
    pub predictions: Vec<f64>,
    pub actuals: Vec<f64>,
}

impl ModelReport {
    pub fn print_summary(&self) {
        println!("\n--- {} model ---", self.target);
        println!(
            "  Rows: {} train / {} test",
            self.train_rows, self.test_rows
        );
        println!("  Optimal k: {}", self.optimal_k);
        println!(
            "  Test RMSE: {:.4}  R²: {:.4}",
            self.test.rmse, self.test.r2
        );
        println!("  RMSE by k:");
        for c in &self.candidates {
            if c.failed() {
                println!("    k={:<3} failed", c.k);
            } else {
                println!("    k={:<3} rmse={:.4} r²={:.4}", c.k, c.rmse, c.r2);
            }
        }
    }
}

/// Full training pass for one target: build features, split, scale, search
/// for the best `k`, fit the final model and score it on the held-out set.
///
/// Returns either a complete (model, report) pair or an error; a partially
/// trained model is never handed back.
pub fn train_and_evaluate(
    records: &[Record],
    target: PriceField,
    config: &TrainConfig,
) -> Result<(TrainedModel, ModelReport)> {
    let dataset = features::build_dataset(records, target)?;
    let required = dataset.schema.max_lookback() + config.search.folds.max(2);
    if dataset.len() < config.search.folds.max(2) {
        return Err(PredictError::NotEnoughRows {
            rows: records.len(),
            required,
        });
    }

    let split = features::split_dataset(&dataset, config.test_ratio, config.split_seed);
    if split.test_x.is_empty() || split.train_x.is_empty() {
        return Err(PredictError::NotEnoughRows {
            rows: dataset.len(),
            required: required.max(2),
        });
    }

    let scaler = Scaler::fit(&split.train_x)?;
    let train_scaled = scaler.transform(&split.train_x);
    let test_scaled = scaler.transform(&split.test_x);

    let outcome = search::find_optimal_k(&train_scaled, &split.train_y, &config.search)?;

    let model = KnnRegressor::fit(train_scaled, split.train_y.clone(), outcome.best_k)?;
    let predictions = model.predict(&test_scaled);
    let test = ErrorSummary::from_predictions(&split.test_y, &predictions);

    let report = ModelReport {
        target,
        optimal_k: outcome.best_k,
        test,
        candidates: outcome.candidates,
        train_rows: split.train_y.len(),
        test_rows: split.test_y.len(),
        predictions,
        actuals: split.test_y,
    };
    let trained = TrainedModel {
        model,
        scaler,
        schema: dataset.schema,
    };
    Ok((trained, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::search::ExecutionMode;
    use crate::forecast::{forecast, MaSeedPolicy};
    use chrono::NaiveDate;

    /// 60 synthetic days of strictly increasing closes: 100, 101, ... 159.
    fn increasing_records() -> Vec<Record> {
        (0..60)
            .map(|i| Record {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64),
                open: Some(100.0 + i as f64 - 0.3),
                high: Some(100.0 + i as f64 + 0.5),
                low: Some(100.0 + i as f64 - 0.5),
                close: 100.0 + i as f64,
                volume: 1000.0 + (i as f64 * 3.0),
            })
            .collect()
    }

    fn small_k_config() -> TrainConfig {
        TrainConfig {
            search: SearchConfig {
                k_range: (1..=5).collect(),
                folds: 5,
                mode: ExecutionMode::Sequential,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end_increasing_series() {
        let records = increasing_records();
        let (model, report) = train_and_evaluate(&records, PriceField::Close, &small_k_config()).unwrap();

        // 60 records, 10 dropped, 80/20 split
        assert_eq!(report.train_rows, 40);
        assert_eq!(report.test_rows, 10);
        assert_eq!(report.candidates.len(), 5);

        // Near-linear trend favors small k: the best candidate's RMSE is no
        // worse than the largest k tested.
        let last = report.candidates.last().unwrap();
        let best = report
            .candidates
            .iter()
            .find(|c| c.k == report.optimal_k)
            .unwrap();
        assert!(best.rmse <= last.rmse);
        assert!(report.test.rmse < 5.0, "test rmse {}", report.test.rmse);
        assert!(report.test.r2 > 0.9, "test r2 {}", report.test.r2);

        // 5-day forecast continues from the end of the trend: no jump, from
        // the last close or between consecutive steps, may exceed the
        // largest historical day-over-day move (1.0).
        let points = forecast(&model, &records, 5, MaSeedPolicy::default()).unwrap();
        assert_eq!(points.len(), 5);
        let last_close = 159.0;
        assert!(
            (points[0].value - last_close).abs() <= 1.0 + 1e-9,
            "first forecast {} jumped from {}",
            points[0].value,
            last_close
        );
        for w in points.windows(2) {
            assert!((w[1].value - w[0].value).abs() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_search_mode_does_not_change_selection() {
        let records = increasing_records();
        let seq = small_k_config();
        let mut par = small_k_config();
        par.search.mode = ExecutionMode::Parallel { workers: 3 };

        let (_, a) = train_and_evaluate(&records, PriceField::Close, &seq).unwrap();
        let (_, b) = train_and_evaluate(&records, PriceField::Close, &par).unwrap();
        assert_eq!(a.optimal_k, b.optimal_k);
        assert_eq!(a.test.rmse, b.test.rmse);
        assert_eq!(a.test.r2, b.test.r2);
    }

    #[test]
    fn test_too_few_records() {
        let records: Vec<Record> = increasing_records().into_iter().take(12).collect();
        // 12 records leave 2 feature rows; not enough for 5 folds
        let err = train_and_evaluate(&records, PriceField::Close, &small_k_config()).unwrap_err();
        assert!(matches!(err, PredictError::NotEnoughRows { .. }));
    }

    #[test]
    fn test_missing_target_column() {
        let mut records = increasing_records();
        for r in &mut records {
            r.high = None;
        }
        let err = train_and_evaluate(&records, PriceField::High, &small_k_config()).unwrap_err();
        assert!(matches!(err, PredictError::MissingField { .. }));
    }

    #[test]
    fn test_open_target_trains_independently() {
        let records = increasing_records();
        let (model, report) = train_and_evaluate(&records, PriceField::Open, &small_k_config()).unwrap();
        assert_eq!(report.target, PriceField::Open);
        assert_eq!(model.schema.target(), PriceField::Open);
        assert!(report.test.rmse < 5.0);
    }

    #[test]
    fn test_trained_model_predicts_raw_rows() {
        let records = increasing_records();
        let (model, _) = train_and_evaluate(&records, PriceField::Close, &small_k_config()).unwrap();
        // A raw (unscaled) feature row resembling the series' tail
        let raw = vec![vec![158.0, 157.0, 156.0, 1171.0, 156.0, 153.5, 1.0]];
        let out = model.predict(&raw);
        assert_eq!(out.len(), 1);
        assert!(out[0] > 140.0 && out[0] < 165.0, "prediction {}", out[0]);
    }

    #[test]
    fn test_report_pairs_predictions_with_actuals() {
        let records = increasing_records();
        let (_, report) = train_and_evaluate(&records, PriceField::Close, &small_k_config()).unwrap();
        assert_eq!(report.predictions.len(), report.actuals.len());
        assert_eq!(report.predictions.len(), report.test_rows);
    }
}
