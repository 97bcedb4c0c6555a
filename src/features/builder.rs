use crate::domain::{PriceField, Record};
use crate::error::{PredictError, Result};
use crate::features::schema::{FeatureKind, FeatureSchema};
use chrono::NaiveDate;

/// Feature table derived from a record sequence: one row per surviving
/// record, columns in schema order, target taken from the same row.
/// Rows keep the original time order.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub schema: FeatureSchema,
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    pub dates: Vec<NaiveDate>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Train/test partition of a dataset.
#[derive(Debug, Clone)]
pub struct Split {
    pub train_x: Vec<Vec<f64>>,
    pub train_y: Vec<f64>,
    pub test_x: Vec<Vec<f64>>,
    pub test_y: Vec<f64>,
}

/// Build the canonical feature table for `target` from time-ordered records.
///
/// Lags at offsets 1..3, previous-day volume, trailing 5- and 10-period
/// moving averages and the 1-period difference, in the fixed canonical
/// order. Rows where any feature is undefined (insufficient history) are
/// dropped, so the first `max_lookback` rows never appear.
pub fn build_dataset(records: &[Record], target: PriceField) -> Result<Dataset> {
    let mut series = Vec::with_capacity(records.len());
    for r in records {
        match r.field(target) {
            Some(v) => series.push(v),
            None => {
                return Err(PredictError::MissingField {
                    field: target.name().to_string(),
                })
            }
        }
    }

    let schema = FeatureSchema::canonical(target);
    let lookback = schema.max_lookback();

    let mut rows = Vec::new();
    let mut targets = Vec::new();
    let mut dates = Vec::new();

    for i in lookback..records.len() {
        let mut row = Vec::with_capacity(schema.len());
        let mut complete = true;
        for slot in schema.slots() {
            match feature_value(records, i, *slot) {
                Some(v) => row.push(v),
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            rows.push(row);
            targets.push(series[i]);
            dates.push(records[i].date);
        }
    }

    Ok(Dataset {
        schema,
        rows,
        targets,
        dates,
    })
}

/// Value of one feature slot at row `i`, or None when undefined.
fn feature_value(records: &[Record], i: usize, kind: FeatureKind) -> Option<f64> {
    match kind {
        FeatureKind::Lag { field, offset } => {
            if i < offset {
                return None;
            }
            records[i - offset].field(field)
        }
        FeatureKind::VolumeLag => {
            if i < 1 {
                return None;
            }
            Some(records[i - 1].volume)
        }
        FeatureKind::MovingAverage { field, window } => {
            if i < window {
                return None;
            }
            let mut sum = 0.0;
            for r in &records[i + 1 - window..=i] {
                sum += r.field(field)?;
            }
            Some(sum / window as f64)
        }
        FeatureKind::Change { field } => {
            if i < 1 {
                return None;
            }
            Some(records[i].field(field)? - records[i - 1].field(field)?)
        }
    }
}

/// Shuffled train/test split with a fixed seed for reproducibility.
/// `test_ratio` is the fraction held out (e.g. 0.2 for an 80/20 split).
pub fn split_dataset(dataset: &Dataset, test_ratio: f64, seed: u64) -> Split {
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    let n = dataset.len();
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_size = ((n as f64) * test_ratio).round() as usize;
    let test_size = test_size.min(n);
    let (test_idx, train_idx) = indices.split_at(test_size);

    let mut split = Split {
        train_x: Vec::with_capacity(train_idx.len()),
        train_y: Vec::with_capacity(train_idx.len()),
        test_x: Vec::with_capacity(test_idx.len()),
        test_y: Vec::with_capacity(test_idx.len()),
    };
    for &i in train_idx {
        split.train_x.push(dataset.rows[i].clone());
        split.train_y.push(dataset.targets[i]);
    }
    for &i in test_idx {
        split.test_x.push(dataset.rows[i].clone());
        split.test_y.push(dataset.targets[i]);
    }
    split
}
