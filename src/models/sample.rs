//! Forecast sample models: raw per-resolution points, validated points and
//! annotated timeline entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Native sampling granularity of a forecast series
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Hourly,
    FifteenMin,
}

impl Resolution {
    /// Rank used to pick a winner when two samples share a timestamp.
    /// Higher wins.
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            Resolution::Hourly => 0,
            Resolution::FifteenMin => 1,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Hourly => write!(f, "1h"),
            Resolution::FifteenMin => write!(f, "15min"),
        }
    }
}

/// One forecast point as delivered by a provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RawSample {
    /// Valid time of the forecast point
    pub timestamp: DateTime<Utc>,
    /// Mean wind speed in knots
    pub wind_speed: Option<f64>,
    /// Gust speed in knots
    pub wind_gust: Option<f64>,
    /// Direction the wind comes from, degrees
    pub wind_direction: Option<f64>,
    /// Precipitation rate in mm/h
    pub precipitation: Option<f64>,
    /// Significant wave height in meters
    pub wave_height: Option<f64>,
    pub resolution: Resolution,
}

impl RawSample {
    /// Sample with wind only; everything optional left absent
    #[must_use]
    pub fn wind(
        timestamp: DateTime<Utc>,
        resolution: Resolution,
        wind_speed: f64,
        wind_direction: f64,
    ) -> Self {
        Self {
            timestamp,
            wind_speed: Some(wind_speed),
            wind_gust: None,
            wind_direction: Some(wind_direction),
            precipitation: None,
            wave_height: None,
            resolution,
        }
    }

    #[must_use]
    pub fn with_precipitation(mut self, precipitation: f64) -> Self {
        self.precipitation = Some(precipitation);
        self
    }

    #[must_use]
    pub fn with_gust(mut self, gust: f64) -> Self {
        self.wind_gust = Some(gust);
        self
    }

    #[must_use]
    pub fn with_wave_height(mut self, wave_height: f64) -> Self {
        self.wave_height = Some(wave_height);
        self
    }
}

/// A provider series at a single native resolution
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResolutionSeries {
    pub resolution: Resolution,
    /// Samples ordered by timestamp
    pub samples: Vec<RawSample>,
}

impl ResolutionSeries {
    #[must_use]
    pub fn new(resolution: Resolution, samples: Vec<RawSample>) -> Self {
        Self {
            resolution,
            samples,
        }
    }
}

/// Everything a provider returned for one spot
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SpotForecast {
    pub series: Vec<ResolutionSeries>,
}

impl SpotForecast {
    /// Total number of raw samples across all resolutions
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.series.iter().map(|s| s.samples.len()).sum()
    }
}

/// Validated sample with the wind fields guaranteed present
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NormalizedSample {
    pub timestamp: DateTime<Utc>,
    pub resolution: Resolution,
    /// Mean wind speed in knots
    pub wind_speed: f64,
    /// Gust speed in knots
    pub wind_gust: Option<f64>,
    /// Direction in [0, 360)
    pub wind_direction: f64,
    /// Precipitation rate in mm/h
    pub precipitation: Option<f64>,
    /// Wave height in meters
    pub wave_height: Option<f64>,
}

/// Timeline entry with the outcome of every kiteability check
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnnotatedSample {
    #[serde(flatten)]
    pub sample: NormalizedSample,
    /// 16-point compass label of the direction
    pub direction_label: String,
    pub in_sector: bool,
    /// Strongest band the speed qualifies for, if any
    pub band: Option<String>,
    /// Whether `band` is a kiteable rung rather than the floor
    pub usable_band: bool,
    pub rain_ok: bool,
    pub in_time_window: bool,
    pub kiteable: bool,
}

/// Convert a bearing to a 16-point compass label
#[must_use]
pub fn direction_to_cardinal(degrees: f64) -> &'static str {
    const LABELS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let idx = ((degrees.rem_euclid(360.0) + 11.25) / 22.5).floor() as usize % 16;
    LABELS[idx]
}
