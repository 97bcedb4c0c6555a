use crate::domain::{ForecastPoint, PriceField, Record};
use crate::error::{PredictError, Result};
use crate::features::FeatureKind;
use crate::pipeline::TrainedModel;
use std::collections::VecDeque;

/// What to do when a moving average must roll but fewer than `window` values
/// have ever been observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaSeedPolicy {
    /// Reseed the average with the new prediction itself.
    #[default]
    ReseedWithPrediction,
    /// Keep the previous average unchanged.
    HoldPrevious,
}

/// Rolling forecast state: the last three target values, the last observed
/// volume, both moving averages and the most recent values window that
/// feeds their rolling updates. Lives only for the duration of one forecast.
#[derive(Debug, Clone)]
pub struct ForecastState {
    current: f64,
    prev1: f64,
    prev2: f64,
    last_volume: f64,
    ma5: f64,
    ma10: f64,
    price_change: f64,
    /// Most recent target values, oldest first, capped at the widest window.
    window: VecDeque<f64>,
}

const WIDEST_WINDOW: usize = 10;

impl ForecastState {
    /// Derive the initial state from the tail of the historical records.
    pub fn from_history(records: &[Record], target: PriceField) -> Result<Self> {
        if records.is_empty() {
            return Err(PredictError::NotEnoughRows {
                rows: 0,
                required: 1,
            });
        }
        let mut values = Vec::with_capacity(records.len());
        for r in records {
            match r.field(target) {
                Some(v) => values.push(v),
                None => {
                    return Err(PredictError::MissingField {
                        field: target.name().to_string(),
                    })
                }
            }
        }

        let n = values.len();
        let current = values[n - 1];
        let prev1 = if n > 1 { values[n - 2] } else { current };
        let prev2 = if n > 2 { values[n - 3] } else { prev1 };

        let tail_mean = |w: usize| {
            let take = w.min(n);
            values[n - take..].iter().sum::<f64>() / take as f64
        };

        let window: VecDeque<f64> = values[n - WIDEST_WINDOW.min(n)..].iter().copied().collect();

        Ok(Self {
            current,
            prev1,
            prev2,
            last_volume: records[n - 1].volume,
            ma5: tail_mean(5),
            ma10: tail_mean(10),
            price_change: current - prev1,
            window,
        })
    }

    /// Most recent known target value (the `t-1` input of the next step).
    pub fn lag1(&self) -> f64 {
        self.current
    }

    pub fn lag2(&self) -> f64 {
        self.prev1
    }

    pub fn lag3(&self) -> f64 {
        self.prev2
    }

    pub fn ma5(&self) -> f64 {
        self.ma5
    }

    pub fn ma10(&self) -> f64 {
        self.ma10
    }

    pub fn price_change(&self) -> f64 {
        self.price_change
    }

    /// Value of one schema slot from the current state. Slots outside the
    /// canonical feature set fail fast: the model was trained on features
    /// this state cannot produce.
    pub fn feature_value(&self, kind: FeatureKind, target: PriceField) -> Result<f64> {
        match kind {
            FeatureKind::Lag { field, offset: 1 } if field == target => Ok(self.current),
            FeatureKind::Lag { field, offset: 2 } if field == target => Ok(self.prev1),
            FeatureKind::Lag { field, offset: 3 } if field == target => Ok(self.prev2),
            FeatureKind::VolumeLag => Ok(self.last_volume),
            FeatureKind::MovingAverage { field, window: 5 } if field == target => Ok(self.ma5),
            FeatureKind::MovingAverage { field, window: 10 } if field == target => Ok(self.ma10),
            FeatureKind::Change { field } if field == target => Ok(self.price_change),
            other => Err(PredictError::UnsupportedFeature {
                feature: other.name(),
            }),
        }
    }

    /// Pure transition: fold one prediction into the state.
    ///
    /// Target history shifts by one, the price change is recomputed, and
    /// each moving average rolls forward by dropping the oldest value that
    /// leaves its window: `MA' = (MA * w - dropped + new) / w`.
    pub fn step(&self, prediction: f64, policy: MaSeedPolicy) -> ForecastState {
        let ma5 = roll_average(self.ma5, 5, &self.window, prediction, policy);
        let ma10 = roll_average(self.ma10, 10, &self.window, prediction, policy);

        let mut window = self.window.clone();
        window.push_back(prediction);
        if window.len() > WIDEST_WINDOW {
            window.pop_front();
        }

        ForecastState {
            current: prediction,
            prev1: self.current,
            prev2: self.prev1,
            last_volume: self.last_volume,
            ma5,
            ma10,
            price_change: prediction - self.current,
            window,
        }
    }
}

fn roll_average(
    ma: f64,
    window: usize,
    values: &VecDeque<f64>,
    new: f64,
    policy: MaSeedPolicy,
) -> f64 {
    if values.len() >= window {
        let dropped = values[values.len() - window];
        (ma * window as f64 - dropped + new) / window as f64
    } else {
        match policy {
            MaSeedPolicy::ReseedWithPrediction => new,
            MaSeedPolicy::HoldPrevious => ma,
        }
    }
}

/// Recursively forecast `steps` future values.
///
/// Each step builds a feature vector in the model's schema order, scales it
/// with the model's fitted scaler, predicts, and feeds the prediction back
/// into the state — predictions compound, exactly as at inference time the
/// real future would not be available. Output dates advance one calendar day
/// per step starting the day after the last historical date; weekends are
/// not skipped.
pub fn forecast(
    model: &TrainedModel,
    records: &[Record],
    steps: usize,
    policy: MaSeedPolicy,
) -> Result<Vec<ForecastPoint>> {
    let target = model.schema.target();
    let mut state = ForecastState::from_history(records, target)?;
    let last_date = records
        .last()
        .map(|r| r.date)
        .ok_or(PredictError::NotEnoughRows {
            rows: 0,
            required: 1,
        })?;

    let mut out = Vec::with_capacity(steps);
    for step in 0..steps {
        let mut raw = Vec::with_capacity(model.schema.len());
        for slot in model.schema.slots() {
            raw.push(state.feature_value(*slot, target)?);
        }
        let scaled = model.scaler.transform_row(&raw);
        let prediction = model.model.predict_one(&scaled);

        out.push(ForecastPoint {
            date: last_date + chrono::Days::new(step as u64 + 1),
            value: prediction,
        });
        state = state.step(prediction, policy);
    }
    Ok(out)
}
