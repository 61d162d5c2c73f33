//! `KiteWindows` - kitesurfing wind windows from weather model forecasts
//!
//! This library merges hourly and 15-minute forecast series per spot,
//! classifies each sample against a spot's wind sector and a ladder of speed
//! bands, and extracts contiguous kiteable windows.

pub mod cache;
pub mod config;
pub mod error;
pub mod kitesurfing;
pub mod logging;
pub mod models;
pub mod weather;

// Re-export core types for public API
pub use cache::ForecastCache;
pub use config::KiteWindowsConfig;
pub use error::KiteWindowsError;
pub use kitesurfing::{
    AnalysisError, BandLadder, ForecastReport, KiteForecastService, SpotAnalysis, SpotReport,
    SpotStatus, analyze_spot,
};
pub use models::{
    AnnotatedSample, Band, ConditionsConfig, KiteableWindow, RawSample, Resolution, Sector,
    SpotConfig, SpotForecast, TimeWindow,
};
pub use weather::{CachedProvider, ForecastProvider, OpenMeteoProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, KiteWindowsError>;
