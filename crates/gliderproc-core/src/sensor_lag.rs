// crates/gliderproc-core/src/sensor_lag.rs

use tracing::{info, warn};

use crate::error::Result;
use crate::fusion::{CONDUCTIVITY_FIELD, TEMPERATURE_FIELD};
use crate::interpolation::interp_linear;
use crate::options::ProcessingOptions;
use crate::profiles::{profile_rows, PROFILE_INDEX_FIELD};
use crate::recipe::{CorrectionRecipe, CorrectionToken};
use crate::thermal_lag::ThermalLagParams;
use crate::timeseries::TimeSeries;

pub const TEMPERATURE_CORRECTED_FIELD: &str = "temperature_corrected";
pub const CONDUCTIVITY_CORRECTED_FIELD: &str = "conductivity_corrected";

/// Calibration routines whose numeric policy is external to the pipeline: how a
/// first-order time constant or a thermal-lag parameter row is fitted from the
/// record. Implementations must signal failure with NaN (for time constants) or
/// an empty row set, never by panicking.
pub trait LagCalibration {
    /// Estimates the first-order response time constant of `variable` from the
    /// whole dataset, in seconds. NaN means identification failed.
    fn identify_time_constant(
        &self,
        series: &TimeSeries,
        variable: &str,
        time_field: &str,
        depth_field: &str,
    ) -> f64;

    /// Produces thermal-lag parameter rows with their meaning labels.
    fn identify_thermal_params(&self, series: &TimeSeries) -> Vec<ThermalLagParams>;
}

/// Identified or configured time constant actually applied to one variable.
#[derive(Debug, Clone)]
pub struct SensorLagParams {
    pub variable: String,
    pub time_constant: f64,
    pub identified: bool,
}

/// Inverts a first-order sensor response: corrected = v + tau * dv/dt, with the
/// derivative taken by centered differences (one-sided at the record ends).
/// Samples without a usable time step stay missing.
pub fn first_order_lag_correction(values: &[f64], time: &[f64], time_constant: f64) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for idx in 0..n {
        let lo = idx.saturating_sub(1);
        let hi = (idx + 1).min(n.saturating_sub(1));
        let dt = time[hi] - time[lo];
        if dt > 0.0 {
            out[idx] = values[idx] + time_constant * (values[hi] - values[lo]) / dt;
        }
    }
    out
}

/// Removes rows unusable for per-profile correction: any missing value in any
/// column, or a time stamp that does not advance past the previously kept row.
/// The first column is the time axis. Returns the cleaned columns together with
/// the surviving row positions within the profile.
pub fn clean_profile_rows(columns: &[&[f64]]) -> (Vec<Vec<f64>>, Vec<usize>) {
    let n = columns.first().map(|c| c.len()).unwrap_or(0);
    let mut cleaned: Vec<Vec<f64>> = columns.iter().map(|_| Vec::new()).collect();
    let mut survivors = Vec::new();
    let mut last_time = f64::NEG_INFINITY;

    for row in 0..n {
        if columns.iter().any(|col| !col[row].is_finite()) {
            continue;
        }
        let t = columns[0][row];
        if t <= last_time {
            continue;
        }
        last_time = t;
        for (slot, col) in cleaned.iter_mut().zip(columns.iter()) {
            slot.push(col[row]);
        }
        survivors.push(row);
    }

    (cleaned, survivors)
}

/// Runs the sensor-lag stage for every variable named by the active recipe.
/// Each profile is corrected independently; discontinuities at profile
/// boundaries are expected. A variable whose time constant cannot be identified
/// loses its token and produces no output field.
pub fn apply_sensor_lag(
    series: &mut TimeSeries,
    recipe: &mut CorrectionRecipe,
    options: &ProcessingOptions,
    calibration: &dyn LagCalibration,
    time_field: &str,
    depth_field: &str,
) -> Result<Vec<SensorLagParams>> {
    let plan = [
        (
            CorrectionToken::SensorLagTemperature,
            TEMPERATURE_FIELD,
            TEMPERATURE_CORRECTED_FIELD,
            options.temp_time_constant,
        ),
        (
            CorrectionToken::SensorLagConductivity,
            CONDUCTIVITY_FIELD,
            CONDUCTIVITY_CORRECTED_FIELD,
            options.cond_time_constant,
        ),
    ];

    let mut applied = Vec::new();

    for (token, variable, out_field, explicit) in plan {
        if !recipe.contains(token) {
            continue;
        }
        if !series.contains(variable) {
            recipe.drop_token(token, format!("{variable} is unavailable"));
            continue;
        }

        let identified = explicit.is_none();
        let time_constant = match explicit {
            Some(value) => value,
            None => calibration.identify_time_constant(series, variable, time_field, depth_field),
        };
        if !time_constant.is_finite() {
            recipe.drop_token(
                token,
                format!("time constant identification failed for {variable}"),
            );
            continue;
        }

        let time = series.values(time_field)?;
        let depth = series.values(depth_field)?;
        let values = series.values(variable)?;
        let profile_index = series.values(PROFILE_INDEX_FIELD)?;
        let max_profile = profile_index
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .fold(0.0f64, f64::max) as u32;

        let mut out = vec![f64::NAN; time.len()];
        for profile in 1..=max_profile {
            let rows = profile_rows(&profile_index, profile);
            if rows.len() < 2 {
                continue;
            }
            let t: Vec<f64> = rows.iter().map(|&r| time[r]).collect();
            let z: Vec<f64> = rows.iter().map(|&r| depth[r]).collect();
            let v: Vec<f64> = rows.iter().map(|&r| values[r]).collect();
            let (cleaned, survivors) = clean_profile_rows(&[&t, &z, &v]);
            if survivors.len() < 2 {
                continue;
            }
            let corrected = first_order_lag_correction(&cleaned[2], &cleaned[0], time_constant);
            for (pos, value) in survivors.iter().zip(corrected.iter()) {
                out[rows[*pos]] = *value;
            }
        }

        series.set(out_field, out)?;
        info!(
            variable,
            time_constant, identified, "sensor-lag correction applied"
        );
        applied.push(SensorLagParams {
            variable: variable.to_string(),
            time_constant,
            identified,
        });
    }

    Ok(applied)
}

/// Default calibration strategy. The time constant is found by a grid search
/// that minimizes the area between temperature/conductivity-versus-depth curves
/// of adjacent down/up casts, which a response lag pulls apart symmetrically.
/// Thermal-lag parameter rows fall back to the flow-dependent constants of
/// Garau et al. (2011) for every input combination the record supports.
#[derive(Debug, Clone, Copy)]
pub struct DefaultLagCalibration {
    pub max_time_constant: f64,
    pub grid_step: f64,
    pub min_cast_samples: usize,
    pub depth_levels: usize,
}

impl Default for DefaultLagCalibration {
    fn default() -> Self {
        Self {
            max_time_constant: 25.0,
            grid_step: 0.5,
            min_cast_samples: 5,
            depth_levels: 20,
        }
    }
}

const DEFAULT_THERMAL_PARAMS: [f64; 4] = [0.0135, 0.0264, 7.1499, 2.7858];

struct Cast {
    time: Vec<f64>,
    depth: Vec<f64>,
    values: Vec<f64>,
}

impl DefaultLagCalibration {
    fn collect_casts(
        &self,
        series: &TimeSeries,
        variable: &str,
        time_field: &str,
        depth_field: &str,
    ) -> Vec<Cast> {
        let (Some(time), Some(depth), Some(values), Some(profile_index)) = (
            series.values_opt(time_field),
            series.values_opt(depth_field),
            series.values_opt(variable),
            series.values_opt(PROFILE_INDEX_FIELD),
        ) else {
            return Vec::new();
        };

        let max_profile = profile_index
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .fold(0.0f64, f64::max) as u32;

        let mut casts = Vec::new();
        for profile in 1..=max_profile {
            let rows = profile_rows(&profile_index, profile);
            let t: Vec<f64> = rows.iter().map(|&r| time[r]).collect();
            let z: Vec<f64> = rows.iter().map(|&r| depth[r]).collect();
            let v: Vec<f64> = rows.iter().map(|&r| values[r]).collect();
            let (cleaned, survivors) = clean_profile_rows(&[&t, &z, &v]);
            if survivors.len() >= self.min_cast_samples {
                casts.push(Cast {
                    time: cleaned[0].clone(),
                    depth: cleaned[1].clone(),
                    values: cleaned[2].clone(),
                });
            }
        }
        casts
    }

    fn pair_area(&self, first: &Cast, second: &Cast, time_constant: f64) -> Option<f64> {
        let bounds = |cast: &Cast| {
            cast.depth
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &z| {
                    (lo.min(z), hi.max(z))
                })
        };
        let (lo1, hi1) = bounds(first);
        let (lo2, hi2) = bounds(second);
        let lo = lo1.max(lo2);
        let hi = hi1.min(hi2);
        if !(hi - lo).is_finite() || hi <= lo {
            return None;
        }

        let corrected1 = first_order_lag_correction(&first.values, &first.time, time_constant);
        let corrected2 = first_order_lag_correction(&second.values, &second.time, time_constant);

        let levels: Vec<f64> = (0..self.depth_levels)
            .map(|idx| lo + (hi - lo) * idx as f64 / (self.depth_levels - 1) as f64)
            .collect();
        let on_grid1 = interp_linear(&first.depth, &corrected1, &levels);
        let on_grid2 = interp_linear(&second.depth, &corrected2, &levels);

        let mut area = 0.0;
        let mut count = 0usize;
        for (a, b) in on_grid1.iter().zip(on_grid2.iter()) {
            if a.is_finite() && b.is_finite() {
                area += (a - b).abs();
                count += 1;
            }
        }
        if count == 0 {
            None
        } else {
            Some(area / count as f64)
        }
    }
}

impl LagCalibration for DefaultLagCalibration {
    fn identify_time_constant(
        &self,
        series: &TimeSeries,
        variable: &str,
        time_field: &str,
        depth_field: &str,
    ) -> f64 {
        let casts = self.collect_casts(series, variable, time_field, depth_field);
        if casts.len() < 2 {
            warn!(variable, "not enough valid casts to identify a time constant");
            return f64::NAN;
        }

        let steps = (self.max_time_constant / self.grid_step).round() as usize;
        let mut best = f64::NAN;
        let mut best_score = f64::INFINITY;
        for step in 0..=steps {
            let candidate = step as f64 * self.grid_step;
            let mut score = 0.0;
            let mut pairs = 0usize;
            for window in casts.windows(2) {
                if let Some(area) = self.pair_area(&window[0], &window[1], candidate) {
                    score += area;
                    pairs += 1;
                }
            }
            if pairs == 0 {
                continue;
            }
            let score = score / pairs as f64;
            if score < best_score {
                best_score = score;
                best = candidate;
            }
        }

        if !best.is_finite() {
            warn!(variable, "no cast pair with overlapping depth coverage");
        }
        best
    }

    fn identify_thermal_params(&self, series: &TimeSeries) -> Vec<ThermalLagParams> {
        let [alpha_offset, alpha_slope, tau_offset, tau_slope] = DEFAULT_THERMAL_PARAMS;
        let row = |meaning: &str| ThermalLagParams {
            alpha_offset,
            alpha_slope,
            tau_offset,
            tau_slope,
            meaning: meaning.to_string(),
        };

        let mut rows = vec![row("")];
        let has_temp = series.contains(TEMPERATURE_CORRECTED_FIELD);
        let has_cond = series.contains(CONDUCTIVITY_CORRECTED_FIELD);
        if has_temp {
            rows.push(row("temp"));
        }
        if has_cond {
            rows.push(row("cond"));
        }
        if has_temp && has_cond {
            rows.push(row("temp_cond"));
        }
        rows
    }
}
