// crates/gliderproc-core/src/profiles.rs

use tracing::info;

use crate::error::Result;
use crate::interpolation::{count_finite, interp_linear_extrapolate};
use crate::timeseries::TimeSeries;

pub const PROFILE_INDEX_FIELD: &str = "profile_index";

/// Assigns a profile index to every sample given the candidate cast boundaries.
/// Index 0 marks samples whose segment was rejected; accepted segments are
/// numbered 1..max in time order. This is a policy seam: what counts as "too
/// shallow to be a genuine cast" is configurable, not baked into the segmenter.
pub trait ProfileFilter {
    fn assign(&self, depth: &[f64], boundaries: &[usize]) -> Vec<u32>;
}

/// Default policy: a segment is a genuine dive or climb only if the depth it
/// spans exceeds a minimum range in meters.
#[derive(Debug, Clone, Copy)]
pub struct MinRangeProfileFilter {
    pub min_depth_range: f64,
}

impl Default for MinRangeProfileFilter {
    fn default() -> Self {
        Self {
            min_depth_range: 10.0,
        }
    }
}

impl ProfileFilter for MinRangeProfileFilter {
    fn assign(&self, depth: &[f64], boundaries: &[usize]) -> Vec<u32> {
        let mut index = vec![0u32; depth.len()];
        if boundaries.len() < 2 {
            return index;
        }

        let mut next = 0u32;
        for window in boundaries.windows(2) {
            let (start, end) = (window[0], window[1]);
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for &z in depth[start..=end].iter().filter(|z| z.is_finite()) {
                min = min.min(z);
                max = max.max(z);
            }
            let range = max - min;
            let accepted = range.is_finite() && range >= self.min_depth_range;
            if accepted {
                next += 1;
            }
            let assigned = if accepted { next } else { 0 };
            // Half-open segments keep the partition gap-free; the final boundary
            // sample belongs to the last segment.
            let upper = if end + 1 == depth.len() { end + 1 } else { end };
            for slot in index[start..upper].iter_mut() {
                *slot = assigned;
            }
        }

        index
    }
}

/// Interpolates interior depth gaps against the given time base, extending the
/// boundary from available neighbors, so the derivative never breaks on a
/// missing sample.
pub fn continuous_depth(time: &[f64], depth: &[f64]) -> Vec<f64> {
    if count_finite(depth) < 2 {
        return depth.to_vec();
    }
    interp_linear_extrapolate(time, depth, time)
}

/// Candidate cast boundaries: sample indices where the first difference of the
/// continuous depth changes sign (or touches zero), plus the first and last
/// sample. Sorted and deduplicated.
pub fn inflection_indices(depth: &[f64]) -> Vec<usize> {
    let n = depth.len();
    if n == 0 {
        return Vec::new();
    }

    let mut boundaries = vec![0usize];
    if n >= 3 {
        for idx in 0..n - 2 {
            let d0 = depth[idx + 1] - depth[idx];
            let d1 = depth[idx + 2] - depth[idx + 1];
            if d0 * d1 <= 0.0 {
                boundaries.push(idx + 1);
            }
        }
    }
    boundaries.push(n - 1);
    boundaries.dedup();
    boundaries
}

#[derive(Debug, Clone, Copy)]
pub struct ProfileReport {
    pub candidates: usize,
    pub profiles: u32,
}

/// Segments the series into dive/climb profiles along the depth signal and adds
/// the per-sample profile index field.
pub fn segment_profiles(
    series: &mut TimeSeries,
    time_field: &str,
    depth_field: &str,
    filter: &dyn ProfileFilter,
) -> Result<ProfileReport> {
    let time = series.values(time_field)?;
    let depth = series.values(depth_field)?;

    let filled = continuous_depth(&time, &depth);
    let boundaries = inflection_indices(&filled);
    let index = filter.assign(&filled, &boundaries);
    let profiles = index.iter().copied().max().unwrap_or(0);

    info!(
        candidates = boundaries.len(),
        profiles, "depth trajectory segmented"
    );

    series.set(
        PROFILE_INDEX_FIELD,
        index.iter().map(|&i| f64::from(i)).collect(),
    )?;

    Ok(ProfileReport {
        candidates: boundaries.len(),
        profiles,
    })
}

/// Row positions belonging to one profile.
pub fn profile_rows(profile_index: &[f64], profile: u32) -> Vec<usize> {
    let wanted = f64::from(profile);
    profile_index
        .iter()
        .enumerate()
        .filter(|(_, &p)| p == wanted)
        .map(|(idx, _)| idx)
        .collect()
}
