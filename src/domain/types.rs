use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV observation from a historical price CSV.
/// `close` and `volume` are always present; the other price fields are
/// optional columns that may be missing from the source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: f64,
}

impl Record {
    /// Value of the given price field, if the column is present.
    pub fn field(&self, field: PriceField) -> Option<f64> {
        match field {
            PriceField::Close => Some(self.close),
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
        }
    }
}

/// Price series that can be selected as a prediction target.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceField {
    Close,
    Open,
    High,
    Low,
}

impl PriceField {
    pub fn name(&self) -> &'static str {
        match self {
            PriceField::Close => "Close",
            PriceField::Open => "Open",
            PriceField::High => "High",
            PriceField::Low => "Low",
        }
    }
}

impl std::fmt::Display for PriceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for PriceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "close" => Ok(PriceField::Close),
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            other => Err(format!(
                "unknown price field '{}' (expected close, open, high or low)",
                other
            )),
        }
    }
}

/// One forecast step: the predicted value for a future calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(close: f64) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: Some(close - 1.0),
            high: Some(close + 2.0),
            low: Some(close - 2.0),
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn test_field_access() {
        let r = make_record(100.0);
        assert_eq!(r.field(PriceField::Close), Some(100.0));
        assert_eq!(r.field(PriceField::Open), Some(99.0));
        assert_eq!(r.field(PriceField::High), Some(102.0));
        assert_eq!(r.field(PriceField::Low), Some(98.0));
    }

    #[test]
    fn test_field_absent_column() {
        let mut r = make_record(100.0);
        r.open = None;
        assert_eq!(r.field(PriceField::Open), None);
        // Close is always present
        assert_eq!(r.field(PriceField::Close), Some(100.0));
    }

    #[test]
    fn test_price_field_parse() {
        assert_eq!("close".parse::<PriceField>().unwrap(), PriceField::Close);
        assert_eq!(" High ".parse::<PriceField>().unwrap(), PriceField::High);
        assert_eq!("LOW".parse::<PriceField>().unwrap(), PriceField::Low);
        assert!("volume".parse::<PriceField>().is_err());
    }

    #[test]
    fn test_price_field_display() {
        assert_eq!(format!("{}", PriceField::Close), "Close");
        assert_eq!(format!("{}", PriceField::Open), "Open");
    }
}
