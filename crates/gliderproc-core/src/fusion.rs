// crates/gliderproc-core/src/fusion.rs

use tracing::{debug, info};

use crate::error::Result;
use crate::interpolation::count_finite;
use crate::timebase::TIME_FIELD;
use crate::timeseries::TimeSeries;

pub const CONDUCTIVITY_FIELD: &str = "conductivity";
pub const TEMPERATURE_FIELD: &str = "temperature";
pub const PRESSURE_FIELD: &str = "pressure";

/// The CTD pressure channel reports bar; the rest of the pipeline works in decibar.
const BAR_TO_DECIBAR: f64 = 10.0;

/// Candidate {conductivity, temperature, pressure} source triples in priority
/// order: the pumped CTD41CP science channels first, the flight-controller
/// hydrography as fallback.
const CTD_SOURCES: &[[&str; 3]] = &[
    ["sci_water_cond", "sci_water_temp", "sci_water_pressure"],
    ["m_water_cond", "m_water_temp", "m_water_pressure"],
];

/// Current-estimate source pairs, refined dead-reckoning output preferred.
const CURRENT_SOURCES: &[[&str; 2]] = &[
    ["m_final_water_vx", "m_final_water_vy"],
    ["m_water_vx", "m_water_vy"],
];

const FLNTU_CHANNELS: &[(&str, &str)] = &[
    ("sci_flntu_chlor_units", "chlorophyll"),
    ("sci_flntu_turb_units", "turbidity"),
];

const OXYGEN_CHANNELS: &[(&str, &str)] = &[
    ("sci_oxy3835_oxygen", "oxygen_concentration"),
    ("sci_oxy3835_saturation", "oxygen_saturation"),
    ("sci_oxy3835_temp", "oxygen_temperature"),
];

/// Every raw channel the fusion selector may consume. The pipeline stages these
/// into the working series before the master time base is built so that all
/// candidates get trimmed and sorted in lockstep.
pub fn candidate_raw_channels() -> impl Iterator<Item = &'static str> {
    CTD_SOURCES
        .iter()
        .flatten()
        .copied()
        .chain(CURRENT_SOURCES.iter().flatten().copied())
        .chain(FLNTU_CHANNELS.iter().map(|(raw, _)| *raw))
        .chain(OXYGEN_CHANNELS.iter().map(|(raw, _)| *raw))
}

/// Which optional instrument groups made it into the output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorAvailability {
    pub ctd: bool,
    pub flntu: bool,
    pub oxygen: bool,
    pub water_currents: bool,
}

/// Sparse current-estimate sub-series. Its valid rows are a strict subset of the
/// master time base and are kept independently indexed, not co-indexed.
#[derive(Debug, Clone)]
pub struct WaterCurrentInfo {
    pub time: Vec<f64>,
    pub velocity_east: Vec<f64>,
    pub velocity_north: Vec<f64>,
}

/// Chooses among the competing hydrography sources and exposes the winner under
/// the canonical field names, scaling pressure to decibar. All candidate raw
/// fields are removed afterwards. Returns whether any source had data.
pub fn select_ctd_source(series: &mut TimeSeries) -> Result<bool> {
    let mut chosen: Option<&[&str; 3]> = None;
    for candidate in CTD_SOURCES {
        let present = candidate.iter().all(|name| series.contains(name));
        if !present {
            continue;
        }
        let has_data = candidate.iter().any(|name| {
            series
                .values_opt(name)
                .map(|v| count_finite(&v) > 0)
                .unwrap_or(false)
        });
        if has_data {
            chosen = Some(candidate);
            break;
        }
    }

    if let Some([cond, temp, press]) = chosen {
        let conductivity = series.values(cond)?;
        let temperature = series.values(temp)?;
        let pressure: Vec<f64> = series
            .values(press)?
            .into_iter()
            .map(|p| p * BAR_TO_DECIBAR)
            .collect();
        series.set(CONDUCTIVITY_FIELD, conductivity)?;
        series.set(TEMPERATURE_FIELD, temperature)?;
        series.set(PRESSURE_FIELD, pressure)?;
        info!(source = cond, "selected CTD source");
    } else {
        debug!("no CTD source with data; hydrography outputs unavailable");
    }

    for candidate in CTD_SOURCES {
        for name in candidate {
            series.remove(name)?;
        }
    }

    Ok(chosen.is_some())
}

/// Includes an auxiliary sensor group only when its full channel set resolved and
/// carries data. Groups prone to flat output additionally require more than one
/// distinct value across all channels.
fn select_aux_group(
    series: &mut TimeSeries,
    channels: &[(&str, &str)],
    require_distinct: bool,
) -> Result<bool> {
    let present = channels.iter().all(|(raw, _)| series.contains(raw));
    let mut selected = false;

    if present {
        let mut any_finite = false;
        let mut distinct: Vec<u64> = Vec::new();
        for (raw, _) in channels {
            let values = series.values(raw)?;
            any_finite |= count_finite(&values) > 0;
            for v in values.iter().filter(|v| v.is_finite()) {
                let bits = v.to_bits();
                if !distinct.contains(&bits) {
                    distinct.push(bits);
                }
            }
        }
        let degenerate = require_distinct && distinct.len() <= 1;
        if any_finite && !degenerate {
            for (raw, out) in channels {
                let values = series.values(raw)?;
                series.set(out, values)?;
            }
            selected = true;
        }
    }

    for (raw, _) in channels {
        series.remove(raw)?;
    }

    Ok(selected)
}

pub fn select_flntu(series: &mut TimeSeries) -> Result<bool> {
    select_aux_group(series, FLNTU_CHANNELS, true)
}

pub fn select_oxygen(series: &mut TimeSeries) -> Result<bool> {
    select_aux_group(series, OXYGEN_CHANNELS, false)
}

/// Pulls the rows where a current estimate actually exists out into an
/// independently-indexed sub-series, then drops the raw channels from the main
/// record.
pub fn extract_water_currents(series: &mut TimeSeries) -> Result<Option<WaterCurrentInfo>> {
    let mut info: Option<WaterCurrentInfo> = None;

    for [vx_name, vy_name] in CURRENT_SOURCES {
        if info.is_some() || !series.contains(vx_name) || !series.contains(vy_name) {
            continue;
        }
        let time = series.values(TIME_FIELD)?;
        let vx = series.values(vx_name)?;
        let vy = series.values(vy_name)?;

        let mut out = WaterCurrentInfo {
            time: Vec::new(),
            velocity_east: Vec::new(),
            velocity_north: Vec::new(),
        };
        for idx in 0..time.len() {
            if vx[idx].is_finite() && vy[idx].is_finite() {
                out.time.push(time[idx]);
                out.velocity_east.push(vx[idx]);
                out.velocity_north.push(vy[idx]);
            }
        }
        if !out.time.is_empty() {
            info = Some(out);
        }
    }

    for source in CURRENT_SOURCES {
        for name in source {
            series.remove(name)?;
        }
    }

    Ok(info)
}
