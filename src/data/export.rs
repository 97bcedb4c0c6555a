use crate::domain::{ForecastPoint, PriceField};
use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Write forecasts to CSV: a `Date` column followed by one
/// `Forecasted_<Field>` column per target. All targets are expected to share
/// the same forecast dates; the first target supplies them.
pub fn save_forecast<P: AsRef<Path>>(
    path: P,
    forecasts: &[(PriceField, Vec<ForecastPoint>)],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(&path)?;

    let mut header = vec!["Date".to_string()];
    for (field, _) in forecasts {
        header.push(format!("Forecasted_{}", field));
    }
    writer.write_record(&header)?;

    let steps = forecasts.first().map(|(_, p)| p.len()).unwrap_or(0);
    for i in 0..steps {
        let mut row = Vec::with_capacity(forecasts.len() + 1);
        row.push(forecasts[0].1[i].date.format("%Y-%m-%d").to_string());
        for (_, points) in forecasts {
            match points.get(i) {
                Some(p) => row.push(format!("{:.6}", p.value)),
                None => row.push(String::new()),
            }
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!(path = %path.as_ref().display(), rows = steps, "wrote forecast");
    Ok(())
}
