// crates/gliderproc-core/src/interpolation.rs

/// Shared numeric substrate for the gap interpolator, the synchronization checker
/// and the profile segmenter: NaN-aware linear interpolation and small vector
/// statistics.

/// Linear interpolation of the finite (x, y) support pairs onto the query points.
/// Queries outside the convex hull of the support yield NaN (no extrapolation).
pub fn interp_linear(xs: &[f64], ys: &[f64], queries: &[f64]) -> Vec<f64> {
    interp_impl(xs, ys, queries, false)
}

/// Variant used where interior continuity matters more than strictness: queries
/// beyond the support range are extended along the nearest end segment.
pub fn interp_linear_extrapolate(xs: &[f64], ys: &[f64], queries: &[f64]) -> Vec<f64> {
    interp_impl(xs, ys, queries, true)
}

fn interp_impl(xs: &[f64], ys: &[f64], queries: &[f64], extrapolate: bool) -> Vec<f64> {
    let mut support: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect();
    support.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    support.dedup_by(|a, b| a.0 == b.0);

    if support.len() < 2 {
        return match support.first() {
            Some(&(_, y)) if extrapolate => vec![y; queries.len()],
            Some(&(x, y)) => queries
                .iter()
                .map(|&q| if q == x { y } else { f64::NAN })
                .collect(),
            None => vec![f64::NAN; queries.len()],
        };
    }

    queries
        .iter()
        .map(|&q| {
            if !q.is_finite() {
                return f64::NAN;
            }
            let first = support[0];
            let last = support[support.len() - 1];
            if q < first.0 {
                if !extrapolate {
                    return f64::NAN;
                }
                let (x0, y0) = first;
                let (x1, y1) = support[1];
                return y0 + (q - x0) * (y1 - y0) / (x1 - x0);
            }
            if q > last.0 {
                if !extrapolate {
                    return f64::NAN;
                }
                let (x0, y0) = support[support.len() - 2];
                let (x1, y1) = last;
                return y1 + (q - x1) * (y1 - y0) / (x1 - x0);
            }
            let pos = support.partition_point(|&(x, _)| x < q);
            if pos < support.len() && support[pos].0 == q {
                return support[pos].1;
            }
            let (x0, y0) = support[pos - 1];
            let (x1, y1) = support[pos];
            y0 + (q - x0) * (y1 - y0) / (x1 - x0)
        })
        .collect()
}

/// Median of the finite entries; NaN when none exist.
pub fn median(values: &[f64]) -> f64 {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = finite.len() / 2;
    if finite.len() % 2 == 1 {
        finite[mid]
    } else {
        (finite[mid - 1] + finite[mid]) / 2.0
    }
}

/// First difference: out[i] = values[i + 1] - values[i].
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

pub fn count_finite(values: &[f64]) -> usize {
    values.iter().filter(|v| v.is_finite()).count()
}
