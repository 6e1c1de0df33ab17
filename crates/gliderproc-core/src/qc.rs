// crates/gliderproc-core/src/qc.rs

use tracing::info;

use crate::error::Result;
use crate::timeseries::TimeSeries;

/// Plausible physical range for a named variable, where one is defined. Values
/// strictly outside the range are not believable for an ocean deployment and
/// become missing. This is a blunt plausibility filter, not outlier detection;
/// a statistical quality-control pass would go beyond it.
pub fn plausible_range(field: &str) -> Option<(f64, f64)> {
    match field {
        "temperature" | "temperature_corrected" => Some((10.0, 40.0)),
        _ if field == "salinity" || field.starts_with("salinity_corrected") => Some((2.0, 40.0)),
        _ => None,
    }
}

/// Replaces out-of-range values with NaN for every field that has a plausible
/// range. Fields without a range entry are left untouched. Returns the number
/// of values replaced.
pub fn apply_plausible_range_clamp(series: &mut TimeSeries) -> Result<usize> {
    let mut replaced = 0usize;
    for field in series.field_names() {
        let Some((min, max)) = plausible_range(&field) else {
            continue;
        };
        let mut values = series.values(&field)?;
        let mut touched = false;
        for value in values.iter_mut() {
            if value.is_finite() && (*value < min || *value > max) {
                *value = f64::NAN;
                replaced += 1;
                touched = true;
            }
        }
        if touched {
            series.set(&field, values)?;
        }
    }
    if replaced > 0 {
        info!(replaced, "out-of-range values replaced with missing");
    }
    Ok(replaced)
}
