use gliderproc_core::error::Result;
use gliderproc_core::qc::{apply_plausible_range_clamp, plausible_range};
use gliderproc_core::timeseries::TimeSeries;

fn series(columns: &[(&str, Vec<f64>)]) -> TimeSeries {
    let mut out = TimeSeries::new();
    for (name, values) in columns {
        out.set(name, values.clone()).unwrap();
    }
    out
}

#[test]
fn range_table_covers_hydrography_and_derived_salinities() {
    assert_eq!(plausible_range("temperature"), Some((10.0, 40.0)));
    assert_eq!(plausible_range("temperature_corrected"), Some((10.0, 40.0)));
    assert_eq!(plausible_range("salinity"), Some((2.0, 40.0)));
    assert_eq!(plausible_range("salinity_corrected_TH"), Some((2.0, 40.0)));
    assert_eq!(
        plausible_range("salinity_corrected_temp_cond_TH"),
        Some((2.0, 40.0))
    );
    assert_eq!(plausible_range("conductivity"), None);
    assert_eq!(plausible_range("depth"), None);
}

#[test]
fn clamp_is_strict_at_the_bounds() -> Result<()> {
    let mut ts = series(&[(
        "temperature",
        vec![9.99, 10.0, 25.0, 40.0, 40.01],
    )]);

    let replaced = apply_plausible_range_clamp(&mut ts)?;
    assert_eq!(replaced, 2);

    let values = ts.values("temperature")?;
    assert!(values[0].is_nan());
    assert_eq!(values[1], 10.0);
    assert_eq!(values[2], 25.0);
    assert_eq!(values[3], 40.0);
    assert!(values[4].is_nan());
    Ok(())
}

#[test]
fn fields_without_a_range_are_untouched() -> Result<()> {
    let mut ts = series(&[
        ("depth", vec![-5.0, 1200.0]),
        ("salinity", vec![1.0, 38.0]),
    ]);

    let replaced = apply_plausible_range_clamp(&mut ts)?;
    assert_eq!(replaced, 1);
    assert_eq!(ts.values("depth")?, vec![-5.0, 1200.0]);
    assert!(ts.values("salinity")?[0].is_nan());
    Ok(())
}

#[test]
fn missing_values_do_not_count_as_replaced() -> Result<()> {
    let mut ts = series(&[("salinity", vec![f64::NAN, 35.0])]);
    let replaced = apply_plausible_range_clamp(&mut ts)?;
    assert_eq!(replaced, 0);
    Ok(())
}
