// crates/gliderproc-core/src/transects.rs

/// Derives transect time boundaries from commanded waypoint changes. A transect
/// runs from one waypoint change to the next; a record with no waypoint
/// channels (or no waypoint data) is a single transect spanning the whole
/// retained time range.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransectBounds {
    pub start_time: f64,
    pub end_time: f64,
}

pub fn derive_transects(
    time: &[f64],
    waypoint_latitude: Option<&[f64]>,
    waypoint_longitude: Option<&[f64]>,
) -> Vec<TransectBounds> {
    let whole = || {
        let first = time.iter().copied().find(|t| t.is_finite());
        let last = time.iter().rev().copied().find(|t| t.is_finite());
        match (first, last) {
            (Some(start_time), Some(end_time)) => vec![TransectBounds {
                start_time,
                end_time,
            }],
            _ => Vec::new(),
        }
    };

    let (Some(wpt_lat), Some(wpt_lon)) = (waypoint_latitude, waypoint_longitude) else {
        return whole();
    };

    // Boundaries sit where the forward-filled waypoint pair changes.
    let mut boundaries: Vec<usize> = Vec::new();
    let mut last_fix: Option<(f64, f64)> = None;
    for idx in 0..time.len() {
        let (lat, lon) = (wpt_lat[idx], wpt_lon[idx]);
        if !lat.is_finite() || !lon.is_finite() {
            continue;
        }
        match last_fix {
            Some((prev_lat, prev_lon)) if prev_lat == lat && prev_lon == lon => {}
            Some(_) => boundaries.push(idx),
            None => {}
        }
        last_fix = Some((lat, lon));
    }
    if last_fix.is_none() {
        return whole();
    }

    let mut bounds = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0usize;
    for boundary in boundaries.into_iter().chain(std::iter::once(time.len())) {
        if boundary <= start {
            continue;
        }
        let segment = &time[start..boundary];
        let first = segment.iter().copied().find(|t| t.is_finite());
        let last = segment.iter().rev().copied().find(|t| t.is_finite());
        if let (Some(start_time), Some(end_time)) = (first, last) {
            bounds.push(TransectBounds {
                start_time,
                end_time,
            });
        }
        start = boundary;
    }
    if bounds.is_empty() {
        whole()
    } else {
        bounds
    }
}
