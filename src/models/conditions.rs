//! Classification thresholds and the daylight restriction

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Named wind-speed class with its lower threshold in knots
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(from = "BandSpec")]
pub struct Band {
    pub label: String,
    pub min_speed: f64,
}

impl Band {
    #[must_use]
    pub fn new(label: impl Into<String>, min_speed: f64) -> Self {
        Self {
            label: label.into(),
            min_speed,
        }
    }
}

/// Accepted wire shapes for a band: `["good", 17]` or `{"label": "good", "min_speed": 17}`
#[derive(Deserialize)]
#[serde(untagged)]
enum BandSpec {
    Pair(String, f64),
    Named { label: String, min_speed: f64 },
}

impl From<BandSpec> for Band {
    fn from(spec: BandSpec) -> Self {
        match spec {
            BandSpec::Pair(label, min_speed) | BandSpec::Named { label, min_speed } => {
                Band { label, min_speed }
            }
        }
    }
}

/// Global kiteability thresholds
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConditionsConfig {
    /// Strictly descending ladder; the last rung is the non-kiteable floor
    pub bands: Vec<Band>,
    /// Maximum acceptable precipitation rate in mm/h
    pub rain_limit: f64,
    /// Minimum duration of a reported window
    #[serde(default = "default_min_run_hours")]
    pub min_run_hours: f64,
}

fn default_min_run_hours() -> f64 {
    2.0
}

/// Hour-of-day restriction, half-open `[day_start, day_end)`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TimeWindow {
    pub day_start: u8,
    pub day_end: u8,
    /// Zone the hours are read in
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    /// Also require the sun to be up at the spot
    #[serde(default)]
    pub sunlight_only: bool,
}

fn default_timezone() -> Tz {
    Tz::UTC
}

impl TimeWindow {
    /// Window in UTC without the sunlight restriction
    #[must_use]
    pub fn hours(day_start: u8, day_end: u8) -> Self {
        Self {
            day_start,
            day_end,
            timezone: default_timezone(),
            sunlight_only: false,
        }
    }

    /// Whether a local hour-of-day falls in the window
    #[must_use]
    pub fn contains_hour(&self, hour: u32) -> bool {
        hour >= u32::from(self.day_start) && hour < u32::from(self.day_end)
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::hours(6, 20)
    }
}
