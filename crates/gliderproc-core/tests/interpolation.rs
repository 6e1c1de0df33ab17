use gliderproc_core::interpolation::{
    diff, interp_linear, interp_linear_extrapolate, median,
};

#[test]
fn interpolation_hits_support_points_exactly() {
    let xs = [0.0, 1.0, 2.0];
    let ys = [10.0, 20.0, 40.0];
    let out = interp_linear(&xs, &ys, &[0.0, 1.0, 2.0]);
    assert_eq!(out, vec![10.0, 20.0, 40.0]);
}

#[test]
fn interpolation_is_linear_between_support_points() {
    let xs = [0.0, 2.0];
    let ys = [0.0, 10.0];
    let out = interp_linear(&xs, &ys, &[0.5, 1.0, 1.5]);
    assert_eq!(out, vec![2.5, 5.0, 7.5]);
}

#[test]
fn interpolation_does_not_extrapolate() {
    let xs = [1.0, 2.0];
    let ys = [1.0, 2.0];
    let out = interp_linear(&xs, &ys, &[0.0, 3.0]);
    assert!(out[0].is_nan());
    assert!(out[1].is_nan());
}

#[test]
fn interpolation_skips_missing_support() {
    let xs = [0.0, 1.0, 2.0, 3.0];
    let ys = [0.0, f64::NAN, 2.0, 3.0];
    let out = interp_linear(&xs, &ys, &[1.0]);
    assert_eq!(out, vec![1.0]);
}

#[test]
fn extrapolating_variant_extends_end_segments() {
    let xs = [1.0, 2.0];
    let ys = [10.0, 20.0];
    let out = interp_linear_extrapolate(&xs, &ys, &[0.0, 3.0]);
    assert_eq!(out, vec![0.0, 30.0]);
}

#[test]
fn missing_queries_stay_missing() {
    let xs = [0.0, 1.0];
    let ys = [0.0, 1.0];
    let out = interp_linear_extrapolate(&xs, &ys, &[f64::NAN]);
    assert!(out[0].is_nan());
}

#[test]
fn median_ignores_missing_entries() {
    assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
    assert_eq!(median(&[1.0, f64::NAN, 3.0]), 2.0);
    assert!(median(&[]).is_nan());
    assert!(median(&[f64::NAN]).is_nan());
}

#[test]
fn diff_is_first_difference() {
    assert_eq!(diff(&[1.0, 3.0, 2.0]), vec![2.0, -1.0]);
    assert!(diff(&[1.0]).is_empty());
}
