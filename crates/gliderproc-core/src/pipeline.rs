// crates/gliderproc-core/src/pipeline.rs

use std::fmt;

use tracing::{debug, info};

use crate::coordinates::{cumulative_distance_m, nmea_to_decimal_degrees_all};
use crate::error::Result;
use crate::fusion::{
    self, SensorAvailability, WaterCurrentInfo, CONDUCTIVITY_FIELD, PRESSURE_FIELD,
    TEMPERATURE_FIELD,
};
use crate::interpolation::count_finite;
use crate::options::ProcessingOptions;
use crate::physics::{density, depth_from_pressure, practical_salinity, pressure_filter, C3515_S_M};
use crate::profiles::{segment_profiles, MinRangeProfileFilter, ProfileFilter};
use crate::qc::apply_plausible_range_clamp;
use crate::raw::{ChannelIndex, RawRecord};
use crate::recipe::CorrectionRecipe;
use crate::sensor_lag::{
    apply_sensor_lag, DefaultLagCalibration, LagCalibration, SensorLagParams,
};
use crate::sync::{check_synchronization, fill_science_time, SCIENCE_TIME_FIELD};
use crate::thermal_lag::{apply_thermal_lag, ThermalLagParams, PITCH_FIELD};
use crate::timebase::{
    build_time_base, interpolate_control_channels, LATITUDE_FIELD, LONGITUDE_FIELD, MIN_ROWS,
    TIME_FIELD,
};
use crate::timeseries::TimeSeries;
use crate::transects::{derive_transects, TransectBounds};

pub const DEPTH_FIELD: &str = "depth";
pub const DEPTH_CTD_FIELD: &str = "depth_ctd";
pub const SALINITY_FIELD: &str = "salinity";
pub const DENSITY_FIELD: &str = "density";
pub const DISTANCE_FIELD: &str = "distance_over_ground";
pub const WAYPOINT_LATITUDE_FIELD: &str = "waypoint_latitude";
pub const WAYPOINT_LONGITUDE_FIELD: &str = "waypoint_longitude";

/// Why the pipeline stopped without producing a usable record. Structural
/// preconditions never raise an error: the caller receives an empty dataset
/// carrying one of these diagnostics instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    NoTimeChannel,
    NoPositionChannel,
    InsufficientRows {
        stage: &'static str,
        remaining: usize,
    },
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::NoTimeChannel => write!(f, "no candidate time channel in the record"),
            HaltReason::NoPositionChannel => {
                write!(f, "no candidate position channels in the record")
            }
            HaltReason::InsufficientRows { stage, remaining } => {
                write!(f, "only {remaining} rows left after the {stage} stage")
            }
        }
    }
}

/// Calibration parameters the correction stages actually used.
#[derive(Debug, Clone, Default)]
pub struct CorrectionParams {
    pub sensor_lag: Vec<SensorLagParams>,
    pub thermal_lag: Vec<ThermalLagParams>,
}

/// Everything the pipeline produces for one raw record.
#[derive(Debug, Clone)]
pub struct ProcessedDataset {
    pub timeseries: TimeSeries,
    pub availability: SensorAvailability,
    pub correction_params: CorrectionParams,
    pub transects: Vec<TransectBounds>,
    pub water_info: Option<WaterCurrentInfo>,
    pub recipe: CorrectionRecipe,
    pub profile_count: u32,
    pub source: Option<String>,
    pub halt: Option<HaltReason>,
}

impl ProcessedDataset {
    fn halted(reason: HaltReason, source: Option<String>) -> Self {
        Self {
            timeseries: TimeSeries::new(),
            availability: SensorAvailability::default(),
            correction_params: CorrectionParams::default(),
            transects: Vec::new(),
            water_info: None,
            recipe: CorrectionRecipe::default(),
            profile_count: 0,
            source,
            halt: Some(reason),
        }
    }

    /// True when nothing was processed; callers must check this before using
    /// any other part of the output.
    pub fn is_empty(&self) -> bool {
        self.halt.is_some()
    }
}

/// The batch transform from raw multi-rate telemetry to a quality-controlled,
/// profile-segmented time series. Owns the policy seams (profile filtering,
/// lag calibration) so callers and tests can substitute them.
pub struct GliderPipeline {
    options: ProcessingOptions,
    profile_filter: Box<dyn ProfileFilter>,
    calibration: Box<dyn LagCalibration>,
}

impl GliderPipeline {
    pub fn new(options: ProcessingOptions) -> Self {
        let profile_filter = Box::new(MinRangeProfileFilter {
            min_depth_range: options.min_profile_depth_range,
        });
        Self {
            options,
            profile_filter,
            calibration: Box::new(DefaultLagCalibration::default()),
        }
    }

    pub fn with_profile_filter(mut self, filter: Box<dyn ProfileFilter>) -> Self {
        self.profile_filter = filter;
        self
    }

    pub fn with_calibration(mut self, calibration: Box<dyn LagCalibration>) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    pub fn process(&self, record: &RawRecord) -> Result<ProcessedDataset> {
        let source = record.source().map(str::to_string);
        let index = ChannelIndex::resolve(record);

        let Some(time_channel) = index.time.clone() else {
            info!("halting: {}", HaltReason::NoTimeChannel);
            return Ok(ProcessedDataset::halted(HaltReason::NoTimeChannel, source));
        };
        if !index.has_position() {
            info!("halting: {}", HaltReason::NoPositionChannel);
            return Ok(ProcessedDataset::halted(
                HaltReason::NoPositionChannel,
                source,
            ));
        }

        let mut series = TimeSeries::new();
        self.stage_channels(record, &index, &time_channel, &mut series)?;

        let time_base = build_time_base(&mut series)?;
        debug!(
            dropped = time_base.dropped_missing_time,
            remaining = time_base.remaining,
            "master time base established"
        );
        if series.len() < MIN_ROWS {
            let halt = HaltReason::InsufficientRows {
                stage: "time base",
                remaining: series.len(),
            };
            info!("halting: {halt}");
            return Ok(ProcessedDataset::halted(halt, source));
        }

        // Waypoints stay out of this list: they are step-valued commands, and
        // interpolating across a change would invent fixes that were never
        // commanded. Their NaN gaps are forward-filled by the transect deriver.
        let control_fields = [LATITUDE_FIELD, LONGITUDE_FIELD, PITCH_FIELD, DEPTH_FIELD];
        interpolate_control_channels(&mut series, &control_fields)?;
        if series.len() < MIN_ROWS {
            let halt = HaltReason::InsufficientRows {
                stage: "spatial reference",
                remaining: series.len(),
            };
            info!("halting: {halt}");
            return Ok(ProcessedDataset::halted(halt, source));
        }

        let mut availability = SensorAvailability {
            ctd: fusion::select_ctd_source(&mut series)?,
            flntu: fusion::select_flntu(&mut series)?,
            oxygen: fusion::select_oxygen(&mut series)?,
            water_currents: false,
        };
        let water_info = fusion::extract_water_currents(&mut series)?;
        availability.water_currents = water_info.is_some();

        if series.contains(SCIENCE_TIME_FIELD) {
            if self.options.allow_sci_time_fill {
                let nav = series.values(TIME_FIELD)?;
                let sci = series.values(SCIENCE_TIME_FIELD)?;
                series.set(SCIENCE_TIME_FIELD, fill_science_time(&nav, &sci))?;
            }
            check_synchronization(&mut series, self.options.allow_desynchro_deletion)?;
            if series.len() < MIN_ROWS {
                let halt = HaltReason::InsufficientRows {
                    stage: "synchronization",
                    remaining: series.len(),
                };
                info!("halting: {halt}");
                return Ok(ProcessedDataset::halted(halt, source));
            }
        }

        if availability.ctd && self.options.allow_press_filter {
            let pressure = series.values(PRESSURE_FIELD)?;
            series.set(PRESSURE_FIELD, pressure_filter(&pressure))?;
        }

        self.derive_quantities(&mut series, availability.ctd)?;

        let time_field = if series.contains(SCIENCE_TIME_FIELD) {
            SCIENCE_TIME_FIELD
        } else {
            TIME_FIELD
        };
        let depth_field = self.choose_depth_field(&series);

        let mut recipe = CorrectionRecipe::parse(&self.options.salinity_corrected);
        let mut correction_params = CorrectionParams::default();
        let mut profile_count = 0u32;

        match depth_field {
            Some(depth_field) => {
                let report = segment_profiles(
                    &mut series,
                    time_field,
                    depth_field,
                    self.profile_filter.as_ref(),
                )?;
                profile_count = report.profiles;

                correction_params.sensor_lag = apply_sensor_lag(
                    &mut series,
                    &mut recipe,
                    &self.options,
                    self.calibration.as_ref(),
                    time_field,
                    depth_field,
                )?;
                correction_params.thermal_lag = apply_thermal_lag(
                    &mut series,
                    &mut recipe,
                    &self.options,
                    self.calibration.as_ref(),
                    time_field,
                    depth_field,
                )?;
            }
            None => {
                for token in recipe.tokens().to_vec() {
                    recipe.drop_token(token, "no usable depth signal for segmentation");
                }
                series.set(
                    crate::profiles::PROFILE_INDEX_FIELD,
                    vec![0.0; series.len()],
                )?;
            }
        }

        apply_plausible_range_clamp(&mut series)?;
        self.derive_density(&mut series)?;

        let time = series.values(TIME_FIELD)?;
        let wpt_lat = series.values_opt(WAYPOINT_LATITUDE_FIELD);
        let wpt_lon = series.values_opt(WAYPOINT_LONGITUDE_FIELD);
        let transects = derive_transects(&time, wpt_lat.as_deref(), wpt_lon.as_deref());

        info!(
            rows = series.len(),
            fields = series.field_names().len(),
            profiles = profile_count,
            transects = transects.len(),
            "glider record processed"
        );

        Ok(ProcessedDataset {
            timeseries: series,
            availability,
            correction_params,
            transects,
            water_info,
            recipe,
            profile_count,
            source,
            halt: None,
        })
    }

    /// Copies every resolved channel into the working series under its canonical
    /// field name, converting packed positions to decimal degrees up front.
    fn stage_channels(
        &self,
        record: &RawRecord,
        index: &ChannelIndex,
        time_channel: &str,
        series: &mut TimeSeries,
    ) -> Result<()> {
        let channel = |name: &str| -> Vec<f64> {
            record.channel(name).map(|v| v.to_vec()).unwrap_or_default()
        };

        series.set(TIME_FIELD, channel(time_channel))?;
        if let Some(name) = &index.latitude {
            series.set(LATITUDE_FIELD, nmea_to_decimal_degrees_all(&channel(name)))?;
        }
        if let Some(name) = &index.longitude {
            series.set(LONGITUDE_FIELD, nmea_to_decimal_degrees_all(&channel(name)))?;
        }
        if let Some(name) = &index.science_time {
            series.set(SCIENCE_TIME_FIELD, channel(name))?;
        }
        if let Some(name) = &index.depth {
            series.set(DEPTH_FIELD, channel(name))?;
        }
        if let Some(name) = &index.pitch {
            series.set(PITCH_FIELD, channel(name))?;
        }
        if let Some(name) = &index.waypoint_latitude {
            series.set(
                WAYPOINT_LATITUDE_FIELD,
                nmea_to_decimal_degrees_all(&channel(name)),
            )?;
        }
        if let Some(name) = &index.waypoint_longitude {
            series.set(
                WAYPOINT_LONGITUDE_FIELD,
                nmea_to_decimal_degrees_all(&channel(name)),
            )?;
        }
        for name in fusion::candidate_raw_channels() {
            if record.has_channel(name) {
                series.set(name, channel(name))?;
            }
        }
        Ok(())
    }

    /// Adds the derived physical quantities that only need the fused channels:
    /// CTD depth, raw salinity and distance over ground.
    fn derive_quantities(&self, series: &mut TimeSeries, ctd: bool) -> Result<()> {
        let latitude = series.values(LATITUDE_FIELD)?;
        let longitude = series.values(LONGITUDE_FIELD)?;
        series.set(DISTANCE_FIELD, cumulative_distance_m(&latitude, &longitude))?;

        if !ctd {
            return Ok(());
        }

        let pressure = series.values(PRESSURE_FIELD)?;
        let depth_ctd: Vec<f64> = pressure
            .iter()
            .zip(latitude.iter())
            .map(|(&p, &lat)| depth_from_pressure(p, lat))
            .collect();
        series.set(DEPTH_CTD_FIELD, depth_ctd)?;

        let conductivity = series.values(CONDUCTIVITY_FIELD)?;
        let temperature = series.values(TEMPERATURE_FIELD)?;
        let salinity: Vec<f64> = (0..pressure.len())
            .map(|idx| {
                practical_salinity(
                    conductivity[idx] / C3515_S_M,
                    temperature[idx],
                    pressure[idx],
                )
            })
            .collect();
        series.set(SALINITY_FIELD, salinity)?;
        Ok(())
    }

    fn derive_density(&self, series: &mut TimeSeries) -> Result<()> {
        if !series.contains(SALINITY_FIELD) {
            return Ok(());
        }
        let salinity = series.values(SALINITY_FIELD)?;
        let temperature = series.values(TEMPERATURE_FIELD)?;
        let pressure = series.values(PRESSURE_FIELD)?;
        let values: Vec<f64> = (0..salinity.len())
            .map(|idx| density(salinity[idx], temperature[idx], pressure[idx]))
            .collect();
        series.set(DENSITY_FIELD, values)?;
        Ok(())
    }

    /// Picks the depth signal profiles are segmented against: the vehicle depth
    /// sensor when it has enough support, otherwise the CTD-derived depth.
    fn choose_depth_field(&self, series: &TimeSeries) -> Option<&'static str> {
        for field in [DEPTH_FIELD, DEPTH_CTD_FIELD] {
            if let Some(values) = series.values_opt(field) {
                if count_finite(&values) >= 2 {
                    return Some(field);
                }
            }
        }
        None
    }
}
