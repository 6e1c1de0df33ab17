// crates/gliderproc-core/src/physics.rs

/// Seawater equations of state consumed by the pipeline, in their standard
/// UNESCO/PSS-78 forms. Inputs and outputs follow the pipeline conventions:
/// pressure in decibar, temperature in degrees Celsius (ITS-90 treated as IPTS-68
/// here, the difference is below sensor accuracy), salinity on the practical
/// scale, NaN in, NaN out.

/// Conductivity of standard seawater at S=35, T=15, P=0, in S/m.
pub const C3515_S_M: f64 = 4.2914;

/// Depth in meters from sea pressure (decibar) and latitude (decimal degrees),
/// Fofonoff & Millard (UNESCO 1983). Positive down.
pub fn depth_from_pressure(pressure: f64, latitude: f64) -> f64 {
    if !pressure.is_finite() || !latitude.is_finite() {
        return f64::NAN;
    }
    let sin_lat = latitude.to_radians().sin();
    let sin2 = sin_lat * sin_lat;
    let gravity = 9.780318 * (1.0 + (5.2788e-3 + 2.36e-5 * sin2) * sin2) + 1.092e-6 * pressure;
    let depth =
        (((-1.82e-15 * pressure + 2.279e-10) * pressure - 2.2512e-5) * pressure + 9.72659)
            * pressure;
    depth / gravity
}

/// Practical salinity from a conductivity ratio R = C(S,T,P)/C(35,15,0),
/// temperature (deg C) and pressure (decibar). PSS-78; valid for S in 2..42.
pub fn practical_salinity(ratio: f64, temperature: f64, pressure: f64) -> f64 {
    if !ratio.is_finite() || !temperature.is_finite() || !pressure.is_finite() || ratio <= 0.0 {
        return f64::NAN;
    }
    let t = temperature;

    // rt: conductivity ratio of standard seawater at temperature t.
    let rt_coeff = 0.6766097
        + t * (2.00564e-2 + t * (1.104259e-4 + t * (-6.9698e-7 + t * 1.0031e-9)));

    // Rp: pressure correction.
    let e1 = 2.070e-5;
    let e2 = -6.370e-10;
    let e3 = 3.989e-15;
    let d1 = 3.426e-2;
    let d2 = 4.464e-4;
    let d3 = 4.215e-1;
    let d4 = -3.107e-3;
    let rp = 1.0
        + pressure * (e1 + pressure * (e2 + pressure * e3))
            / (1.0 + d1 * t + d2 * t * t + (d3 + d4 * t) * ratio);

    let rt = ratio / (rp * rt_coeff);
    if rt < 0.0 {
        return f64::NAN;
    }
    let sqrt_rt = rt.sqrt();

    let a = [0.0080, -0.1692, 25.3851, 14.0941, -7.0261, 2.7081];
    let b = [0.0005, -0.0056, -0.0066, -0.0375, 0.0636, -0.0144];
    let k = 0.0162;

    let mut salinity = 0.0;
    let mut delta = 0.0;
    let mut rt_pow = 1.0;
    for idx in 0..6 {
        salinity += a[idx] * rt_pow;
        delta += b[idx] * rt_pow;
        rt_pow *= sqrt_rt;
    }
    salinity += (t - 15.0) / (1.0 + k * (t - 15.0)) * delta;
    salinity
}

/// In-situ density (kg/m^3) from practical salinity, temperature (deg C) and
/// pressure (decibar). EOS-80 with the secant bulk modulus.
pub fn density(salinity: f64, temperature: f64, pressure: f64) -> f64 {
    if !salinity.is_finite() || !temperature.is_finite() || !pressure.is_finite() {
        return f64::NAN;
    }
    let s = salinity;
    let t = temperature;
    let sqrt_s = s.max(0.0).sqrt();

    let rho_w = 999.842594
        + t * (6.793952e-2
            + t * (-9.095290e-3 + t * (1.001685e-4 + t * (-1.120083e-6 + t * 6.536332e-9))));
    let rho_0 = rho_w
        + s * (0.824493
            + t * (-4.0899e-3 + t * (7.6438e-5 + t * (-8.2467e-7 + t * 5.3875e-9))))
        + s * sqrt_s * (-5.72466e-3 + t * (1.0227e-4 + t * -1.6546e-6))
        + 4.8314e-4 * s * s;
    if pressure == 0.0 {
        return rho_0;
    }

    let kw = 19652.21
        + t * (148.4206 + t * (-2.327105 + t * (1.360477e-2 + t * -5.155288e-5)));
    let k0 = kw
        + s * (54.6746 + t * (-0.603459 + t * (1.09987e-2 + t * -6.1670e-5)))
        + s * sqrt_s * (7.944e-2 + t * (1.6483e-2 + t * -5.3009e-4));

    let aw = 3.239908 + t * (1.43713e-3 + t * (1.16092e-4 + t * -5.77905e-7));
    let a = aw + s * (2.2838e-3 + t * (-1.0981e-5 + t * -1.6078e-6)) + 1.91075e-4 * s * sqrt_s;

    let bw = 8.50935e-5 + t * (-6.12293e-6 + t * 5.2787e-8);
    let b = bw + s * (-9.9348e-7 + t * (2.0816e-8 + t * 9.1697e-10));

    let p_bar = pressure / 10.0;
    let bulk = k0 + p_bar * (a + p_bar * b);
    rho_0 / (1.0 - p_bar / bulk)
}

/// Light smoothing of the pressure channel: a centered three-sample median that
/// knocks out single-sample transducer spikes while leaving missing samples (and
/// the record ends) untouched.
pub fn pressure_filter(pressure: &[f64]) -> Vec<f64> {
    let n = pressure.len();
    let mut out = pressure.to_vec();
    for idx in 1..n.saturating_sub(1) {
        let window = [pressure[idx - 1], pressure[idx], pressure[idx + 1]];
        if window.iter().all(|p| p.is_finite()) {
            let mut sorted = window;
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            out[idx] = sorted[1];
        }
    }
    out
}
