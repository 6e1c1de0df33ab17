use gliderproc_core::error::Result;
use gliderproc_core::options::ProcessingOptions;
use gliderproc_core::profiles::PROFILE_INDEX_FIELD;
use gliderproc_core::recipe::{CorrectionRecipe, CorrectionToken};
use gliderproc_core::sensor_lag::{
    apply_sensor_lag, clean_profile_rows, first_order_lag_correction, LagCalibration,
    TEMPERATURE_CORRECTED_FIELD,
};
use gliderproc_core::thermal_lag::{
    apply_thermal_lag, corrected_salinity_field_name, ThermalLagParams,
};
use gliderproc_core::timeseries::TimeSeries;

/// Calibration that always fails, for exercising the token-removal paths.
struct NanCalibration;

impl LagCalibration for NanCalibration {
    fn identify_time_constant(&self, _: &TimeSeries, _: &str, _: &str, _: &str) -> f64 {
        f64::NAN
    }

    fn identify_thermal_params(&self, _: &TimeSeries) -> Vec<ThermalLagParams> {
        Vec::new()
    }
}

fn series(columns: &[(&str, Vec<f64>)]) -> TimeSeries {
    let mut out = TimeSeries::new();
    for (name, values) in columns {
        out.set(name, values.clone()).unwrap();
    }
    out
}

#[test]
fn first_order_correction_shifts_a_linear_ramp_by_tau_times_slope() {
    let time: Vec<f64> = (0..6).map(|i| i as f64).collect();
    let values: Vec<f64> = time.iter().map(|t| 2.0 * t).collect();

    let corrected = first_order_lag_correction(&values, &time, 3.0);
    for (raw, fixed) in values.iter().zip(corrected.iter()) {
        assert!((fixed - (raw + 6.0)).abs() < 1e-12, "got {fixed} for {raw}");
    }
}

#[test]
fn first_order_correction_needs_an_advancing_clock() {
    let corrected = first_order_lag_correction(&[1.0, 2.0, 3.0], &[0.0, 0.0, 10.0], 1.0);
    assert!(corrected[0].is_nan());
    assert!(corrected[1].is_finite());
    assert!(corrected[2].is_finite());
}

#[test]
fn profile_cleaning_drops_missing_and_stalled_rows() {
    let t = [0.0, 1.0, 1.0, 2.0, 3.0, 4.0];
    let v = [10.0, 11.0, 12.0, f64::NAN, 14.0, 15.0];

    let (cleaned, survivors) = clean_profile_rows(&[&t, &v]);
    assert_eq!(survivors, vec![0, 1, 4, 5]);
    assert_eq!(cleaned[0], vec![0.0, 1.0, 3.0, 4.0]);
    assert_eq!(cleaned[1], vec![10.0, 11.0, 14.0, 15.0]);
}

fn ramp_series() -> TimeSeries {
    let time: Vec<f64> = (0..10).map(|i| i as f64).collect();
    let temperature: Vec<f64> = time.iter().map(|t| 10.0 + 0.5 * t).collect();
    // One depth dropout inside the accepted profile.
    let mut depth: Vec<f64> = time.iter().map(|t| t * 5.0).collect();
    depth[2] = f64::NAN;
    let index = vec![1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
    series(&[
        ("time", time),
        ("depth", depth),
        ("temperature", temperature),
        (PROFILE_INDEX_FIELD, index),
    ])
}

#[test]
fn explicit_time_constant_skips_identification() -> Result<()> {
    let mut ts = ramp_series();
    let mut recipe = CorrectionRecipe::parse("T");
    let options = ProcessingOptions {
        temp_time_constant: Some(2.0),
        ..Default::default()
    };

    let applied = apply_sensor_lag(&mut ts, &mut recipe, &options, &NanCalibration, "time", "depth")?;
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].time_constant, 2.0);
    assert!(!applied[0].identified);

    let corrected = ts.values(TEMPERATURE_CORRECTED_FIELD)?;
    // Slope 0.5, tau 2: every usable sample of the accepted profile shifts by one.
    for idx in [0, 1, 3, 4] {
        let expected = 11.0 + 0.5 * idx as f64;
        assert!(
            (corrected[idx] - expected).abs() < 1e-12,
            "row {idx}: got {}",
            corrected[idx]
        );
    }
    // A row missing its depth is unusable and stays missing even though the
    // variable itself was sampled there.
    assert!(corrected[2].is_nan());
    // Rows outside any accepted profile stay missing.
    assert!(corrected[5..].iter().all(|v| v.is_nan()));
    Ok(())
}

#[test]
fn failed_identification_drops_the_token_and_yields_no_field() -> Result<()> {
    let mut ts = ramp_series();
    let mut recipe = CorrectionRecipe::parse("T");
    let options = ProcessingOptions::default();

    let applied = apply_sensor_lag(&mut ts, &mut recipe, &options, &NanCalibration, "time", "depth")?;
    assert!(applied.is_empty());
    assert!(!recipe.contains(CorrectionToken::SensorLagTemperature));
    assert_eq!(recipe.removals().len(), 1);
    assert!(!ts.contains(TEMPERATURE_CORRECTED_FIELD));
    Ok(())
}

#[test]
fn missing_variable_drops_the_token() -> Result<()> {
    let mut ts = ramp_series();
    let mut recipe = CorrectionRecipe::parse("C");
    let options = ProcessingOptions {
        cond_time_constant: Some(1.0),
        ..Default::default()
    };

    let applied = apply_sensor_lag(&mut ts, &mut recipe, &options, &NanCalibration, "time", "depth")?;
    assert!(applied.is_empty());
    assert!(recipe.is_empty());
    assert!(recipe.removals()[0].reason.contains("conductivity"));
    Ok(())
}

#[test]
fn corrected_salinity_names_enumerate_slots_in_fixed_order() {
    let cases = [
        ("", "salinity_corrected_TH"),
        ("time", "salinity_corrected_time_TH"),
        ("depth", "salinity_corrected_depth_TH"),
        ("temp", "salinity_corrected_temp_TH"),
        ("cond", "salinity_corrected_cond_TH"),
        ("pitch", "salinity_corrected_pitch_TH"),
        ("temp_cond", "salinity_corrected_temp_cond_TH"),
        // Slot order is canonical regardless of label order.
        ("cond_temp", "salinity_corrected_temp_cond_TH"),
        (
            "pitch_cond_temp_depth_time",
            "salinity_corrected_time_depth_temp_cond_pitch_TH",
        ),
        ("bogus", "salinity_corrected_TH"),
    ];
    for (meaning, expected) in cases {
        assert_eq!(corrected_salinity_field_name(meaning), expected, "{meaning:?}");
    }
}

fn hydrography_series() -> TimeSeries {
    let n = 6;
    let time: Vec<f64> = (0..n).map(|i| i as f64 * 10.0).collect();
    let depth: Vec<f64> = (0..n).map(|i| i as f64 * 5.0).collect();
    let temperature: Vec<f64> = (0..n).map(|i| 20.0 - i as f64).collect();
    let conductivity: Vec<f64> = (0..n).map(|i| 4.2 - 0.05 * i as f64).collect();
    let pressure = depth.clone();
    series(&[
        ("time", time),
        ("depth", depth),
        ("temperature", temperature),
        ("conductivity", conductivity),
        ("pressure", pressure),
        (PROFILE_INDEX_FIELD, vec![1.0; n]),
    ])
}

fn thermal_options(rows: Vec<[f64; 4]>, meanings: Vec<&str>) -> ProcessingOptions {
    ProcessingOptions {
        thermal_params: Some(rows),
        thermal_params_meaning: Some(meanings.into_iter().map(str::to_string).collect()),
        ..Default::default()
    }
}

#[test]
fn thermal_lag_derives_a_corrected_salinity_field() -> Result<()> {
    let mut ts = hydrography_series();
    let mut recipe = CorrectionRecipe::parse("TH");
    let options = thermal_options(vec![[0.0135, 0.0264, 7.1499, 2.7858]], vec![""]);

    let applied =
        apply_thermal_lag(&mut ts, &mut recipe, &options, &NanCalibration, "time", "depth")?;
    assert_eq!(applied.len(), 1);
    assert!(recipe.contains(CorrectionToken::ThermalLag));

    let salinity = ts.values("salinity_corrected_TH")?;
    assert!(salinity.iter().all(|v| v.is_finite()), "{salinity:?}");
    assert!(salinity.iter().all(|v| *v > 0.0));
    Ok(())
}

#[test]
fn nan_parameter_rows_are_discarded_but_finite_rows_still_apply() -> Result<()> {
    let mut ts = hydrography_series();
    let mut recipe = CorrectionRecipe::parse("TH");
    let options = thermal_options(
        vec![
            [f64::NAN, 0.0264, 7.1499, 2.7858],
            [0.0135, 0.0264, 7.1499, 2.7858],
        ],
        vec!["time", ""],
    );

    let applied =
        apply_thermal_lag(&mut ts, &mut recipe, &options, &NanCalibration, "time", "depth")?;
    assert_eq!(applied.len(), 1);
    assert!(ts.contains("salinity_corrected_TH"));
    assert!(!ts.contains("salinity_corrected_time_TH"));
    Ok(())
}

#[test]
fn all_nan_parameter_rows_drop_the_thermal_token() -> Result<()> {
    let mut ts = hydrography_series();
    let mut recipe = CorrectionRecipe::parse("TH");
    let options = thermal_options(vec![[f64::NAN; 4]], vec![""]);

    let applied =
        apply_thermal_lag(&mut ts, &mut recipe, &options, &NanCalibration, "time", "depth")?;
    assert!(applied.is_empty());
    assert!(!recipe.contains(CorrectionToken::ThermalLag));
    assert_eq!(recipe.removals().len(), 1);
    Ok(())
}

#[test]
fn rows_naming_an_unproduced_corrected_variant_are_skipped() -> Result<()> {
    // The row asks for the lag-corrected temperature, which was never derived.
    let mut ts = hydrography_series();
    let mut recipe = CorrectionRecipe::parse("TH");
    let options = thermal_options(vec![[0.0135, 0.0264, 7.1499, 2.7858]], vec!["temp"]);

    let applied =
        apply_thermal_lag(&mut ts, &mut recipe, &options, &NanCalibration, "time", "depth")?;
    assert!(applied.is_empty());
    assert!(!recipe.contains(CorrectionToken::ThermalLag));
    assert!(!ts.contains("salinity_corrected_temp_TH"));
    Ok(())
}

#[test]
fn missing_pressure_drops_the_thermal_token_up_front() -> Result<()> {
    let mut ts = ramp_series();
    ts.set("conductivity", vec![4.0; 10])?;
    let mut recipe = CorrectionRecipe::parse("TH");
    let options = ProcessingOptions::default();

    apply_thermal_lag(&mut ts, &mut recipe, &options, &NanCalibration, "time", "depth")?;
    assert!(!recipe.contains(CorrectionToken::ThermalLag));
    assert!(recipe.removals()[0].reason.contains("pressure"));
    Ok(())
}
