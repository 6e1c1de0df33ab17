use gliderproc_core::error::Result;
use gliderproc_core::timebase::{
    build_time_base, interpolate_control_channels, LATITUDE_FIELD, LONGITUDE_FIELD, TIME_FIELD,
};
use gliderproc_core::timeseries::TimeSeries;

fn series(columns: &[(&str, Vec<f64>)]) -> TimeSeries {
    let mut out = TimeSeries::new();
    for (name, values) in columns {
        out.set(name, values.clone()).unwrap();
    }
    out
}

#[test]
fn time_base_drops_missing_time_and_sorts() -> Result<()> {
    let mut ts = series(&[
        (TIME_FIELD, vec![30.0, f64::NAN, 10.0, 20.0]),
        ("depth", vec![3.0, 99.0, 1.0, 2.0]),
    ]);

    let report = build_time_base(&mut ts)?;
    assert_eq!(report.dropped_missing_time, 1);
    assert_eq!(report.remaining, 3);
    assert_eq!(ts.values(TIME_FIELD)?, vec![10.0, 20.0, 30.0]);
    assert_eq!(ts.values("depth")?, vec![1.0, 2.0, 3.0]);
    Ok(())
}

#[test]
fn time_base_sort_is_stable_for_equal_timestamps() -> Result<()> {
    let mut ts = series(&[
        (TIME_FIELD, vec![10.0, 5.0, 10.0]),
        ("marker", vec![1.0, 0.0, 2.0]),
    ]);

    build_time_base(&mut ts)?;
    assert_eq!(ts.values("marker")?, vec![0.0, 1.0, 2.0]);
    Ok(())
}

#[test]
fn fully_populated_record_passes_through_unchanged() -> Result<()> {
    let time = vec![0.0, 10.0, 20.0, 30.0];
    let lat = vec![39.0, 39.1, 39.2, 39.3];
    let lon = vec![2.0, 2.1, 2.2, 2.3];
    let pitch = vec![0.4, -0.4, 0.4, -0.4];
    let mut ts = series(&[
        (TIME_FIELD, time.clone()),
        (LATITUDE_FIELD, lat.clone()),
        (LONGITUDE_FIELD, lon.clone()),
        ("pitch", pitch.clone()),
    ]);

    let report = interpolate_control_channels(&mut ts, &[LATITUDE_FIELD, LONGITUDE_FIELD, "pitch"])?;
    assert_eq!(report.interpolated_fields, 0);
    assert_eq!(report.dropped_unreferenced, 0);
    assert_eq!(ts.values(TIME_FIELD)?, time);
    assert_eq!(ts.values(LATITUDE_FIELD)?, lat);
    assert_eq!(ts.values(LONGITUDE_FIELD)?, lon);
    assert_eq!(ts.values("pitch")?, pitch);
    Ok(())
}

#[test]
fn sparse_positions_are_interpolated_then_unreferenced_rows_trimmed() -> Result<()> {
    let mut ts = series(&[
        (TIME_FIELD, vec![0.0, 10.0, 20.0, 30.0]),
        (LATITUDE_FIELD, vec![f64::NAN, 39.0, f64::NAN, 39.2]),
        (LONGITUDE_FIELD, vec![f64::NAN, 2.0, 2.1, 2.2]),
    ]);

    let report = interpolate_control_channels(&mut ts, &[LATITUDE_FIELD, LONGITUDE_FIELD])?;
    // Row 0 sits before the latitude support and stays unreferenced.
    assert_eq!(report.dropped_unreferenced, 1);
    assert_eq!(ts.len(), 3);
    let lat = ts.values(LATITUDE_FIELD)?;
    assert!((lat[1] - 39.1).abs() < 1e-12, "interior gap filled, got {}", lat[1]);
    Ok(())
}
