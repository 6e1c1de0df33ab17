// crates/gliderproc-core/src/thermal_lag.rs

use tracing::{info, warn};

use crate::error::Result;
use crate::fusion::{CONDUCTIVITY_FIELD, PRESSURE_FIELD, TEMPERATURE_FIELD};
use crate::options::ProcessingOptions;
use crate::physics::{practical_salinity, C3515_S_M};
use crate::profiles::{profile_rows, PROFILE_INDEX_FIELD};
use crate::recipe::{CorrectionRecipe, CorrectionToken};
use crate::sensor_lag::{
    clean_profile_rows, LagCalibration, CONDUCTIVITY_CORRECTED_FIELD, TEMPERATURE_CORRECTED_FIELD,
};
use crate::timeseries::TimeSeries;

pub const PITCH_FIELD: &str = "pitch";

/// One row of thermal-lag calibration parameters: offset/slope pairs for the
/// error amplitude (alpha) and the time-constant attenuation (tau), both
/// flow-speed dependent, plus the meaning label naming which corrected input
/// variants the row applies to.
#[derive(Debug, Clone)]
pub struct ThermalLagParams {
    pub alpha_offset: f64,
    pub alpha_slope: f64,
    pub tau_offset: f64,
    pub tau_slope: f64,
    pub meaning: String,
}

impl ThermalLagParams {
    pub fn has_nan(&self) -> bool {
        !(self.alpha_offset.is_finite()
            && self.alpha_slope.is_finite()
            && self.tau_offset.is_finite()
            && self.tau_slope.is_finite())
    }
}

/// Input slots of the thermal-lag correction, in the fixed order the output
/// field name enumerates them.
const SLOT_MARKERS: &[&str] = &["time", "depth", "temp", "cond", "pitch"];

const BASE_FIELD_NAME: &str = "salinity_corrected";
const THERMAL_SUFFIX: &str = "TH";

fn meaning_markers(meaning: &str) -> Vec<&str> {
    meaning.split('_').filter(|m| !m.is_empty()).collect()
}

/// Composes the output field name for a corrected salinity series. The base is
/// `salinity_corrected`; one `_<marker>` suffix is appended for each input slot
/// whose meaning label names the corrected variant, in the fixed slot order
/// {time, depth, temp, cond, pitch}; `_TH` closes the name. Downstream
/// consumers rely on this exact composition to tell correction combinations
/// apart, so the function is pure and exhaustively unit-tested.
pub fn corrected_salinity_field_name(meaning: &str) -> String {
    let markers = meaning_markers(meaning);
    let mut name = String::from(BASE_FIELD_NAME);
    for slot in SLOT_MARKERS {
        if markers.contains(slot) {
            name.push('_');
            name.push_str(slot);
        }
    }
    name.push('_');
    name.push_str(THERMAL_SUFFIX);
    name
}

/// Flow speed through the conductivity cell is never allowed below this floor,
/// which keeps the flow-dependent alpha and tau finite on stalled samples.
const MIN_FLOW_SPEED: f64 = 1e-2;
const MIN_SIN_PITCH: f64 = 1e-2;

/// Estimates the temperature inside the conductivity cell from the ambient
/// temperature record: a first-order recursive error filter whose amplitude and
/// time constant depend on the flow speed through the cell (Lueck & Picklo
/// form). Pitch refines the flow estimate where available; otherwise the
/// vertical velocity stands in.
pub fn thermal_lag_cell_temperature(
    time: &[f64],
    temperature: &[f64],
    depth: &[f64],
    pitch: &[f64],
    params: &ThermalLagParams,
) -> Vec<f64> {
    let n = time.len();
    let mut cell = vec![f64::NAN; n];
    if n == 0 {
        return cell;
    }

    let flow_at = |idx: usize| {
        let lo = idx.saturating_sub(1);
        let hi = (idx + 1).min(n - 1);
        let dt = time[hi] - time[lo];
        if dt <= 0.0 {
            return MIN_FLOW_SPEED;
        }
        let vertical = ((depth[hi] - depth[lo]) / dt).abs();
        let speed = if pitch[idx].is_finite() {
            vertical / pitch[idx].sin().abs().max(MIN_SIN_PITCH)
        } else {
            vertical
        };
        speed.max(MIN_FLOW_SPEED)
    };

    let mut error = 0.0;
    cell[0] = temperature[0];
    for idx in 1..n {
        let dt = time[idx] - time[idx - 1];
        if dt <= 0.0 {
            cell[idx] = temperature[idx] - error;
            continue;
        }
        let flow = flow_at(idx);
        let alpha = params.alpha_offset + params.alpha_slope / flow;
        let tau = params.tau_offset + params.tau_slope / flow.sqrt();
        let nyquist = 1.0 / (2.0 * dt);
        let a = 4.0 * nyquist * alpha * tau / (1.0 + 4.0 * nyquist * tau);
        let b = 1.0 - 2.0 * a / alpha;
        error = -b * error + a * (temperature[idx] - temperature[idx - 1]);
        cell[idx] = temperature[idx] - error;
    }
    cell
}

/// Runs the thermal-lag stage: resolves the parameter table (configured or
/// identified), discards unusable rows, and derives one corrected salinity
/// field per retained parameter row under its dynamically composed name.
pub fn apply_thermal_lag(
    series: &mut TimeSeries,
    recipe: &mut CorrectionRecipe,
    options: &ProcessingOptions,
    calibration: &dyn LagCalibration,
    time_field: &str,
    depth_field: &str,
) -> Result<Vec<ThermalLagParams>> {
    if !recipe.contains(CorrectionToken::ThermalLag) {
        return Ok(Vec::new());
    }

    for required in [TEMPERATURE_FIELD, CONDUCTIVITY_FIELD, PRESSURE_FIELD] {
        if !series.contains(required) {
            recipe.drop_token(
                CorrectionToken::ThermalLag,
                format!("{required} is unavailable"),
            );
            return Ok(Vec::new());
        }
    }

    let rows = resolve_parameter_rows(series, options, calibration);
    let mut retained: Vec<ThermalLagParams> = Vec::new();
    for row in rows {
        if row.has_nan() {
            warn!(
                meaning = %row.meaning,
                "thermal-lag parameter row contains NaN; discarded"
            );
            continue;
        }
        retained.push(row);
    }
    if retained.is_empty() {
        recipe.drop_token(
            CorrectionToken::ThermalLag,
            "no usable thermal-lag parameter row",
        );
        return Ok(Vec::new());
    }

    let time = series.values(time_field)?;
    let depth = series.values(depth_field)?;
    let pressure = series.values(PRESSURE_FIELD)?;
    let pitch = series
        .values_opt(PITCH_FIELD)
        .unwrap_or_else(|| vec![f64::NAN; time.len()]);
    let profile_index = series.values(PROFILE_INDEX_FIELD)?;
    let max_profile = profile_index
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .fold(0.0f64, f64::max) as u32;

    let mut applied = Vec::new();
    for params in retained {
        let markers = meaning_markers(&params.meaning);
        let temp_field = if markers.contains(&"temp") {
            TEMPERATURE_CORRECTED_FIELD
        } else {
            TEMPERATURE_FIELD
        };
        let cond_field = if markers.contains(&"cond") {
            CONDUCTIVITY_CORRECTED_FIELD
        } else {
            CONDUCTIVITY_FIELD
        };
        let (Some(temperature), Some(conductivity)) =
            (series.values_opt(temp_field), series.values_opt(cond_field))
        else {
            warn!(
                meaning = %params.meaning,
                "thermal-lag parameter row names a corrected variant that was not produced; discarded"
            );
            continue;
        };

        let mut out = vec![f64::NAN; time.len()];
        for profile in 1..=max_profile {
            let rows = profile_rows(&profile_index, profile);
            if rows.len() < 2 {
                continue;
            }
            let t: Vec<f64> = rows.iter().map(|&r| time[r]).collect();
            let z: Vec<f64> = rows.iter().map(|&r| depth[r]).collect();
            let temp: Vec<f64> = rows.iter().map(|&r| temperature[r]).collect();
            let cond: Vec<f64> = rows.iter().map(|&r| conductivity[r]).collect();
            let press: Vec<f64> = rows.iter().map(|&r| pressure[r]).collect();
            let (cleaned, survivors) = clean_profile_rows(&[&t, &z, &temp, &cond, &press]);
            if survivors.len() < 2 {
                continue;
            }
            let pitch_sub: Vec<f64> = survivors.iter().map(|&pos| pitch[rows[pos]]).collect();

            let cell_temperature = thermal_lag_cell_temperature(
                &cleaned[0],
                &cleaned[2],
                &cleaned[1],
                &pitch_sub,
                &params,
            );
            for (slot, &pos) in survivors.iter().enumerate() {
                let ratio = cleaned[3][slot] / C3515_S_M;
                out[rows[pos]] =
                    practical_salinity(ratio, cell_temperature[slot], cleaned[4][slot]);
            }
        }

        let field = corrected_salinity_field_name(&params.meaning);
        info!(field = %field, meaning = %params.meaning, "thermal-lag salinity derived");
        series.set(&field, out)?;
        applied.push(params);
    }

    if applied.is_empty() {
        recipe.drop_token(
            CorrectionToken::ThermalLag,
            "every thermal-lag parameter row was discarded",
        );
    }

    Ok(applied)
}

fn resolve_parameter_rows(
    series: &TimeSeries,
    options: &ProcessingOptions,
    calibration: &dyn LagCalibration,
) -> Vec<ThermalLagParams> {
    if let (Some(params), Some(meanings)) =
        (&options.thermal_params, &options.thermal_params_meaning)
    {
        if params.len() == meanings.len() {
            return params
                .iter()
                .zip(meanings.iter())
                .map(|(row, meaning)| ThermalLagParams {
                    alpha_offset: row[0],
                    alpha_slope: row[1],
                    tau_offset: row[2],
                    tau_slope: row[3],
                    meaning: meaning.clone(),
                })
                .collect();
        }
        warn!(
            params = params.len(),
            meanings = meanings.len(),
            "thermal parameter table and meaning labels disagree in length; identifying instead"
        );
    }
    calibration.identify_thermal_params(series)
}
