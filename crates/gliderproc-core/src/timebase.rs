// crates/gliderproc-core/src/timebase.rs

use tracing::info;

use crate::error::Result;
use crate::interpolation::{count_finite, interp_linear};
use crate::timeseries::TimeSeries;

/// Minimum number of rows the pipeline needs to keep going after any filtering
/// stage. Below this there is nothing to segment or correct.
pub const MIN_ROWS: usize = 3;

pub const TIME_FIELD: &str = "time";
pub const LATITUDE_FIELD: &str = "latitude";
pub const LONGITUDE_FIELD: &str = "longitude";

#[derive(Debug, Clone, Copy)]
pub struct TimeBaseReport {
    pub dropped_missing_time: usize,
    pub remaining: usize,
}

/// Establishes the master time base: drops rows with a missing time stamp and
/// sorts the whole series ascending by time. The sort is stable, so rows sharing
/// a timestamp keep their input order and the result is deterministic.
pub fn build_time_base(series: &mut TimeSeries) -> Result<TimeBaseReport> {
    let time = series.values(TIME_FIELD)?;
    let keep: Vec<bool> = time.iter().map(|t| t.is_finite()).collect();
    let dropped = series.retain(&keep)?;

    let time = series.values(TIME_FIELD)?;
    let mut order: Vec<usize> = (0..time.len()).collect();
    order.sort_by(|&a, &b| {
        time[a]
            .partial_cmp(&time[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    series.reorder(&order)?;

    Ok(TimeBaseReport {
        dropped_missing_time: dropped,
        remaining: series.len(),
    })
}

#[derive(Debug, Clone, Copy)]
pub struct GapFillReport {
    pub interpolated_fields: usize,
    pub dropped_unreferenced: usize,
    pub remaining: usize,
}

/// Linearly interpolates sparsely-sampled control channels onto the master time
/// base (no extrapolation outside each channel's support), then trims every row
/// that still lacks the full {time, latitude, longitude} reference triple.
pub fn interpolate_control_channels(
    series: &mut TimeSeries,
    control_fields: &[&str],
) -> Result<GapFillReport> {
    let time = series.values(TIME_FIELD)?;
    let total = time.len();
    let mut interpolated_fields = 0;

    for field in control_fields {
        let Some(values) = series.values_opt(field) else {
            continue;
        };
        let finite = count_finite(&values);
        if finite > 1 && finite < total {
            let filled = interp_linear(&time, &values, &time);
            series.set(field, filled)?;
            interpolated_fields += 1;
        }
    }

    let latitude = series.values(LATITUDE_FIELD)?;
    let longitude = series.values(LONGITUDE_FIELD)?;
    let keep: Vec<bool> = (0..total)
        .map(|idx| {
            time[idx].is_finite() && latitude[idx].is_finite() && longitude[idx].is_finite()
        })
        .collect();
    let dropped = series.retain(&keep)?;
    if dropped > 0 {
        info!(
            dropped,
            "trimmed rows lacking a full spatio-temporal reference"
        );
    }

    Ok(GapFillReport {
        interpolated_fields,
        dropped_unreferenced: dropped,
        remaining: series.len(),
    })
}
