//! Kitesurfing module
//!
//! This module turns already-fetched forecast series into kiteable windows:
//! - Sector matching and band classification of single samples
//! - Validation and merging of hourly and 15-minute series into one timeline
//! - Kiteability annotation and run detection
//! - Daily summaries and the multi-spot forecast service

pub mod bands;
pub mod error;
pub mod evaluator;
pub mod forecast;
pub mod normalize;
pub mod runs;
pub mod sector;
pub mod summary;
pub mod timeline;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{
    AnnotatedSample, ConditionsConfig, DailySummary, KiteableWindow, SpotConfig, SpotForecast,
    TimeWindow,
};

// Re-export commonly used types from submodules
pub use bands::{BandLadder, BandMatch};
pub use error::{AnalysisError, Result};
pub use evaluator::{annotate, check_conditions, check_inputs};
pub use forecast::{ForecastReport, KiteForecastService, SpotReport};
pub use normalize::normalize;
pub use runs::build_runs;
pub use sector::in_sector;
pub use summary::summarize_days;
pub use timeline::{MergedTimeline, Timeline, merge};

/// Outcome class of one spot's analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotStatus {
    /// Nothing could be evaluated: no data or every sample invalid
    NoData,
    /// Samples were evaluated but no window qualified
    Unsuitable,
    /// At least one window qualified
    Kiteable,
}

/// Everything derived for one spot in one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotAnalysis {
    pub spot_name: String,
    pub samples_received: usize,
    pub samples_dropped: usize,
    pub samples_evaluated: usize,
    pub windows: Vec<KiteableWindow>,
    pub days: Vec<DailySummary>,
    pub timeline: Vec<AnnotatedSample>,
}

impl SpotAnalysis {
    #[must_use]
    pub fn status(&self) -> SpotStatus {
        if self.samples_evaluated == 0 {
            SpotStatus::NoData
        } else if self.windows.is_empty() {
            SpotStatus::Unsuitable
        } else {
            SpotStatus::Kiteable
        }
    }

    #[must_use]
    pub fn total_kiteable_hours(&self) -> f64 {
        self.windows.iter().map(|w| w.duration_hours).sum()
    }
}

/// Run the full pipeline for one spot.
///
/// Fails only on invalid configuration; bad samples are dropped and counted.
pub fn analyze_spot(
    spot: &SpotConfig,
    forecast: &SpotForecast,
    conditions: &ConditionsConfig,
    window: &TimeWindow,
) -> Result<SpotAnalysis> {
    let ladder = check_inputs(spot, conditions)?;

    let merged = merge(&forecast.series);
    let timeline = annotate(&merged.timeline, spot, &ladder, conditions, window)?;
    let windows = build_runs(&spot.name, &timeline, conditions.min_run_hours);
    let days = summarize_days(&timeline, &ladder, window.timezone);

    debug!(
        spot = %spot.name,
        kiteable = timeline.iter().filter(|s| s.kiteable).count(),
        "Annotated timeline"
    );
    info!(
        spot = %spot.name,
        samples = timeline.len(),
        dropped = merged.dropped,
        windows = windows.len(),
        "Analyzed spot"
    );

    Ok(SpotAnalysis {
        spot_name: spot.name.clone(),
        samples_received: forecast.sample_count(),
        samples_dropped: merged.dropped,
        samples_evaluated: timeline.len(),
        windows,
        days,
        timeline,
    })
}
