//! Data models for the KiteWindows application
//!
//! This module contains the core domain models organized by concern:
//! - Spot: identity, coordinates and usable wind sector
//! - Conditions: band ladder, rain ceiling and daylight window
//! - Sample: raw, normalized and annotated forecast points
//! - Window: kiteable windows and daily summaries

pub mod conditions;
pub mod sample;
pub mod spot;
pub mod window;

// Re-export all public types for convenient access
pub use conditions::{Band, ConditionsConfig, TimeWindow};
pub use sample::{
    AnnotatedSample, NormalizedSample, RawSample, Resolution, ResolutionSeries, SpotForecast,
    direction_to_cardinal,
};
pub use spot::{Sector, SpotConfig};
pub use window::{DailySummary, KiteableWindow};
