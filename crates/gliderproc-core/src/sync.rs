// crates/gliderproc-core/src/sync.rs

use tracing::info;

use crate::error::Result;
use crate::interpolation::{diff, median};
use crate::timebase::TIME_FIELD;
use crate::timeseries::TimeSeries;

pub const SCIENCE_TIME_FIELD: &str = "science_time";

/// A sample counts as synchronized when the science clock trails the navigation
/// clock by no more than this multiple of the navigation sampling period.
const LAG_THRESHOLD_PERIODS: f64 = 2.5;

#[derive(Debug, Clone, Copy)]
pub struct SyncReport {
    pub synchronized: usize,
    pub total: usize,
    pub deleted: usize,
}

/// Fills gaps in the science clock from the navigation clock, using the median
/// offset between the two where both are populated. With no overlap at all the
/// gaps are left untouched.
pub fn fill_science_time(nav_time: &[f64], sci_time: &[f64]) -> Vec<f64> {
    let offsets: Vec<f64> = nav_time
        .iter()
        .zip(sci_time.iter())
        .filter(|(nav, sci)| nav.is_finite() && sci.is_finite())
        .map(|(nav, sci)| nav - sci)
        .collect();
    let offset = median(&offsets);
    if !offset.is_finite() {
        return sci_time.to_vec();
    }

    nav_time
        .iter()
        .zip(sci_time.iter())
        .map(|(&nav, &sci)| {
            if sci.is_finite() {
                sci
            } else if nav.is_finite() {
                nav - offset
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Quantifies the lag between the navigation and science time series against an
/// adaptive threshold. When `delete_desynchronized` is set, every field of the
/// series is trimmed to the synchronized rows in lockstep.
pub fn check_synchronization(
    series: &mut TimeSeries,
    delete_desynchronized: bool,
) -> Result<SyncReport> {
    let nav_time = series.values(TIME_FIELD)?;
    let sci_time = series.values(SCIENCE_TIME_FIELD)?;
    let total = nav_time.len();

    let sampling_period = median(&diff(&nav_time));
    let threshold = LAG_THRESHOLD_PERIODS * sampling_period;

    let synchronized: Vec<bool> = nav_time
        .iter()
        .zip(sci_time.iter())
        .map(|(&nav, &sci)| (nav - sci).abs() <= threshold)
        .collect();
    let in_sync = synchronized.iter().filter(|s| **s).count();

    let deleted = if delete_desynchronized && in_sync < total {
        series.retain(&synchronized)?
    } else {
        0
    };

    info!(
        synchronized = in_sync,
        total, deleted, "navigation/science synchronization checked"
    );

    Ok(SyncReport {
        synchronized: in_sync,
        total,
        deleted,
    })
}
