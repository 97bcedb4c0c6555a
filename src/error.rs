use thiserror::Error;

/// Errors surfaced by the prediction engine.
///
/// The first four variants are configuration failures: they mean the caller
/// asked for something the data cannot support and are never recovered
/// silently. `SearchExhausted` means every candidate `k` failed
/// cross-validation. The remaining variants wrap the CSV data boundary.
///
/// Zero-variance feature columns are not an error: the scaler clamps their
/// scale and standardizes them to zero, matching the usual scaler contract.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("target field '{field}' is not present in the loaded records")]
    MissingField { field: String },

    #[error("feature and target counts differ: {features} feature rows, {targets} targets")]
    LengthMismatch { features: usize, targets: usize },

    #[error("k={k} is outside the valid range 1..={rows} for the available training rows")]
    KOutOfRange { k: usize, rows: usize },

    #[error("forecast feature '{feature}' is not covered by the canonical feature set")]
    UnsupportedFeature { feature: String },

    #[error("all {candidates} candidate k values failed cross-validation")]
    SearchExhausted { candidates: usize },

    #[error("not enough rows: got {rows}, need at least {required}")]
    NotEnoughRows { rows: usize, required: usize },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PredictError>;
