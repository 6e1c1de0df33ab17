// crates/gliderproc-core/src/coordinates.rs

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Converts a position encoded as degrees + decimal minutes (`DDMM.mmmm`, the
/// NMEA convention used by the vehicle) to decimal degrees. Missing stays missing.
///
/// Must run before any interpolation: interpolating the packed encoding across a
/// minute/degree boundary would produce positions that never existed.
pub fn nmea_to_decimal_degrees(value: f64) -> f64 {
    if !value.is_finite() {
        return f64::NAN;
    }
    let sign = if value < 0.0 { -1.0 } else { 1.0 };
    let magnitude = value.abs();
    let degrees = (magnitude / 100.0).floor();
    let minutes = magnitude % 100.0;
    sign * (degrees + minutes / 60.0)
}

pub fn nmea_to_decimal_degrees_all(values: &[f64]) -> Vec<f64> {
    values.iter().copied().map(nmea_to_decimal_degrees).collect()
}

/// Great-circle distance between two fixes in decimal degrees.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Cumulative along-track distance over ground. Rows without a valid fix carry the
/// last accumulated value; rows before the first valid fix are missing.
pub fn cumulative_distance_m(latitude: &[f64], longitude: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; latitude.len()];
    let mut total = 0.0;
    let mut last_fix: Option<(f64, f64)> = None;

    for idx in 0..latitude.len() {
        let (lat, lon) = (latitude[idx], longitude[idx]);
        if lat.is_finite() && lon.is_finite() {
            if let Some((prev_lat, prev_lon)) = last_fix {
                total += haversine_distance_m(prev_lat, prev_lon, lat, lon);
            }
            last_fix = Some((lat, lon));
            out[idx] = total;
        } else if last_fix.is_some() {
            out[idx] = total;
        }
    }

    out
}
