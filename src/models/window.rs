//! Result models: kiteable windows and per-day summaries

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Contiguous kiteable run meeting the minimum duration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct KiteableWindow {
    pub spot_name: String,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    /// Wall-clock span `end_ts - start_ts`
    pub duration_hours: f64,
    /// Band of the lowest wind speed in the run
    pub weakest_band: String,
    pub sample_count: usize,
    pub min_wind: f64,
    pub max_wind: f64,
    pub max_gust: Option<f64>,
}

impl KiteableWindow {
    /// Format the window as `HH:MM-HH:MM` in UTC
    #[must_use]
    pub fn format_span(&self) -> String {
        format!(
            "{}-{}",
            self.start_ts.format("%H:%M"),
            self.end_ts.format("%H:%M")
        )
    }
}

/// Aggregate of one local day's kiteable samples at a spot
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub kiteable_samples: usize,
    pub first_kiteable: DateTime<Utc>,
    pub last_kiteable: DateTime<Utc>,
    pub avg_wind: f64,
    pub max_gust: Option<f64>,
    /// Strongest band seen among the day's kiteable samples
    pub best_band: String,
}
