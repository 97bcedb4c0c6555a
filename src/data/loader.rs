use crate::domain::Record;
use crate::error::{PredictError, Result};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{info, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load daily OHLCV history from a CSV file.
///
/// Columns are addressed by header name, so their order does not matter and
/// extra columns (such as `Adj Close`) are ignored. `Date`, `Close` and
/// `Volume` are required; `Open`, `High` and `Low` are kept when present.
/// Rows whose required values fail to parse are skipped with a warning, and
/// the survivors are returned sorted ascending by date.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let date_col = column(&headers, "Date")?;
    let close_col = column(&headers, "Close")?;
    let volume_col = column(&headers, "Volume")?;
    let open_col = find_column(&headers, "Open");
    let high_col = find_column(&headers, "High");
    let low_col = find_column(&headers, "Low");

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        match parse_row(&row, date_col, close_col, volume_col) {
            Some((date, close, volume)) => {
                records.push(Record {
                    date,
                    open: open_col.and_then(|c| parse_f64(&row, c)),
                    high: high_col.and_then(|c| parse_f64(&row, c)),
                    low: low_col.and_then(|c| parse_f64(&row, c)),
                    close,
                    volume,
                });
            }
            None => {
                skipped += 1;
                warn!(line = line + 2, "skipping unparseable row");
            }
        }
    }

    // Stable sort: equal dates keep their file order.
    records.sort_by_key(|r| r.date);
    info!(rows = records.len(), skipped, "loaded price history");
    Ok(records)
}

fn parse_row(
    row: &csv::StringRecord,
    date_col: usize,
    close_col: usize,
    volume_col: usize,
) -> Option<(NaiveDate, f64, f64)> {
    let date = NaiveDate::parse_from_str(row.get(date_col)?.trim(), DATE_FORMAT).ok()?;
    let close = row.get(close_col)?.trim().parse::<f64>().ok()?;
    let volume = row.get(volume_col)?.trim().parse::<f64>().ok()?;
    Some((date, close, volume))
}

fn parse_f64(row: &csv::StringRecord, col: usize) -> Option<f64> {
    row.get(col)?.trim().parse::<f64>().ok()
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    find_column(headers, name).ok_or_else(|| PredictError::MissingField {
        field: name.to_string(),
    })
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}
