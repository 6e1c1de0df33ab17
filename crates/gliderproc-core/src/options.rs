// crates/gliderproc-core/src/options.rs

use serde::Deserialize;

/// Configuration recognized by the pipeline. Deserializes from TOML with every
/// field optional; unspecified fields take the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingOptions {
    /// Correction recipe for the derived salinity, an underscore-delimited token
    /// list over {T, C, TH}.
    pub salinity_corrected: String,
    /// Fill gaps in the science clock from the navigation clock.
    pub allow_sci_time_fill: bool,
    /// Smooth the pressure channel before deriving depth and salinity.
    pub allow_press_filter: bool,
    /// Delete rows whose science clock has drifted from the navigation clock.
    pub allow_desynchro_deletion: bool,
    /// Explicit first-order time constant for temperature, seconds. When absent
    /// the constant is identified from the data once per dataset.
    pub temp_time_constant: Option<f64>,
    /// Explicit first-order time constant for conductivity, seconds.
    pub cond_time_constant: Option<f64>,
    /// Explicit thermal-lag parameter rows, each an
    /// (alpha offset, alpha slope, tau offset, tau slope) quadruple.
    pub thermal_params: Option<Vec<[f64; 4]>>,
    /// Meaning label per thermal parameter row, naming which corrected input
    /// variants the row was fitted against (for example "temp" or "temp_cond").
    pub thermal_params_meaning: Option<Vec<String>>,
    /// Minimum depth span in meters for a segment to count as a real profile.
    pub min_profile_depth_range: f64,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            salinity_corrected: "TH".to_string(),
            allow_sci_time_fill: true,
            allow_press_filter: true,
            allow_desynchro_deletion: true,
            temp_time_constant: None,
            cond_time_constant: None,
            thermal_params: None,
            thermal_params_meaning: None,
            min_profile_depth_range: 10.0,
        }
    }
}
