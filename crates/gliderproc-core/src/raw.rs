// crates/gliderproc-core/src/raw.rs

use std::collections::HashMap;

use crate::error::{ProcessingError, Result};

/// Raw multi-rate telemetry as downloaded from the vehicle: a numeric matrix whose
/// columns are named instrument channels. Rows are not necessarily time-ordered and
/// missing samples are NaN.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    columns: HashMap<String, usize>,
    data: Vec<Vec<f64>>,
    height: usize,
    source: Option<String>,
}

impl RawRecord {
    pub fn new(source: Option<String>) -> Self {
        Self {
            columns: HashMap::new(),
            data: Vec::new(),
            height: 0,
            source,
        }
    }

    pub fn from_columns(
        columns: Vec<(String, Vec<f64>)>,
        source: Option<String>,
    ) -> Result<Self> {
        let mut record = Self::new(source);
        for (name, values) in columns {
            record.push_channel(name, values)?;
        }
        Ok(record)
    }

    /// Appends a channel column. Every channel must have the same number of rows.
    pub fn push_channel(&mut self, name: String, values: Vec<f64>) -> Result<()> {
        if self.data.is_empty() {
            self.height = values.len();
        } else if values.len() != self.height {
            return Err(ProcessingError::RaggedMatrix {
                column: name,
                expected: self.height,
                found: values.len(),
            });
        }
        self.columns.insert(name, self.data.len());
        self.data.push(values);
        Ok(())
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|&idx| self.data[idx].as_slice())
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

/// Candidate raw channels per logical channel, primary source first. The order is
/// significant: the first candidate present in the record wins.
const TIME_CANDIDATES: &[&str] = &["m_present_time"];
const LATITUDE_CANDIDATES: &[&str] = &["m_gps_lat", "m_lat"];
const LONGITUDE_CANDIDATES: &[&str] = &["m_gps_lon", "m_lon"];
const SCIENCE_TIME_CANDIDATES: &[&str] = &["sci_m_present_time", "sci_ctd41cp_timestamp"];
const DEPTH_CANDIDATES: &[&str] = &["m_depth"];
const PITCH_CANDIDATES: &[&str] = &["m_pitch"];
const WAYPOINT_LATITUDE_CANDIDATES: &[&str] = &["c_wpt_lat"];
const WAYPOINT_LONGITUDE_CANDIDATES: &[&str] = &["c_wpt_lon"];

/// Resolution of symbolic channel names against the columns actually present in a
/// raw record. Built once, immutable afterwards. Competing full sensor sources
/// (CTD vs. flight-controller hydrography, current estimates) are resolved later by
/// the fusion selector, which looks at data content rather than mere presence.
#[derive(Debug, Clone)]
pub struct ChannelIndex {
    pub time: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub science_time: Option<String>,
    pub depth: Option<String>,
    pub pitch: Option<String>,
    pub waypoint_latitude: Option<String>,
    pub waypoint_longitude: Option<String>,
}

impl ChannelIndex {
    pub fn resolve(record: &RawRecord) -> Self {
        Self {
            time: first_present(record, TIME_CANDIDATES),
            latitude: first_present(record, LATITUDE_CANDIDATES),
            longitude: first_present(record, LONGITUDE_CANDIDATES),
            science_time: first_present(record, SCIENCE_TIME_CANDIDATES),
            depth: first_present(record, DEPTH_CANDIDATES),
            pitch: first_present(record, PITCH_CANDIDATES),
            waypoint_latitude: first_present(record, WAYPOINT_LATITUDE_CANDIDATES),
            waypoint_longitude: first_present(record, WAYPOINT_LONGITUDE_CANDIDATES),
        }
    }

    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    pub fn has_waypoints(&self) -> bool {
        self.waypoint_latitude.is_some() && self.waypoint_longitude.is_some()
    }
}

fn first_present(record: &RawRecord, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|name| record.has_channel(name))
        .map(|name| (*name).to_string())
}
