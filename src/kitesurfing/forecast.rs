//! Multi-spot forecast service
//!
//! Fetches every configured spot concurrently, runs the analysis pipeline on
//! each and collects the results into one report.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::KiteWindowsError;
use crate::config::KiteWindowsConfig;
use crate::models::{AnnotatedSample, DailySummary, KiteableWindow, SpotConfig};
use crate::weather::{ForecastProvider, ModelRun};

use super::{SpotAnalysis, SpotStatus, analyze_spot, check_conditions, check_inputs};

/// Name of the report file written into the output directory
pub const REPORT_FILE: &str = "windows.json";

/// Result for a single spot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotReport {
    pub spot: SpotConfig,
    pub status: SpotStatus,
    pub samples_received: usize,
    pub samples_dropped: usize,
    pub samples_evaluated: usize,
    pub windows: Vec<KiteableWindow>,
    pub days: Vec<DailySummary>,
    /// Annotated timeline
    pub rows: Vec<AnnotatedSample>,
    /// Sector or fetch failure for this spot; other spots are unaffected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SpotReport {
    fn from_analysis(spot: &SpotConfig, analysis: SpotAnalysis) -> Self {
        Self {
            spot: spot.clone(),
            status: analysis.status(),
            samples_received: analysis.samples_received,
            samples_dropped: analysis.samples_dropped,
            samples_evaluated: analysis.samples_evaluated,
            windows: analysis.windows,
            days: analysis.days,
            rows: analysis.timeline,
            error: None,
        }
    }

    fn failed(spot: &SpotConfig, error: String) -> Self {
        Self {
            spot: spot.clone(),
            status: SpotStatus::NoData,
            samples_received: 0,
            samples_dropped: 0,
            samples_evaluated: 0,
            windows: Vec::new(),
            days: Vec::new(),
            rows: Vec::new(),
            error: Some(error),
        }
    }
}

/// Complete output of one run across all spots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    pub generated_at: DateTime<Utc>,
    pub model_updates: BTreeMap<String, ModelRun>,
    pub spots: Vec<SpotReport>,
}

impl ForecastReport {
    /// All windows across spots, ordered by start time
    #[must_use]
    pub fn all_windows(&self) -> Vec<&KiteableWindow> {
        let mut windows: Vec<&KiteableWindow> =
            self.spots.iter().flat_map(|s| s.windows.iter()).collect();
        windows.sort_by_key(|w| (w.start_ts, w.spot_name.clone()));
        windows
    }

    /// Write the report as pretty JSON into `dir`, creating it if needed
    pub fn write_json(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(KiteWindowsError::from)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        let path = dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(&path, json)
            .map_err(KiteWindowsError::from)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote report to {}", path.display());
        Ok(path)
    }
}

/// Kitesurfing forecast service
pub struct KiteForecastService;

impl KiteForecastService {
    /// Fetch and analyze every configured spot.
    ///
    /// An invalid band ladder or rain limit aborts before any fetch. A
    /// contradictory sector or a failed fetch only marks that spot's report.
    #[instrument(skip_all, fields(spots = config.spots.len()))]
    pub async fn generate(
        provider: &dyn ForecastProvider,
        config: &KiteWindowsConfig,
    ) -> Result<ForecastReport> {
        check_conditions(&config.conditions)?;

        info!("Generating kite forecast for {} spots", config.spots.len());

        let (model_updates, spots) = futures::join!(
            provider.model_updates(),
            join_all(config.spots.iter().map(|spot| Self::spot_report(provider, config, spot)))
        );

        Ok(ForecastReport {
            generated_at: Utc::now(),
            model_updates,
            spots,
        })
    }

    async fn spot_report(
        provider: &dyn ForecastProvider,
        config: &KiteWindowsConfig,
        spot: &SpotConfig,
    ) -> SpotReport {
        if let Err(e) = check_inputs(spot, &config.conditions) {
            warn!(spot = %spot.name, "Skipping spot: {e}");
            return SpotReport::failed(spot, e.to_string());
        }

        let forecast = match provider.fetch_spot(spot).await {
            Ok(forecast) => forecast,
            Err(e) => {
                warn!(spot = %spot.name, "Failed to fetch forecast: {e:#}");
                return SpotReport::failed(spot, format!("{e:#}"));
            }
        };

        match analyze_spot(spot, &forecast, &config.conditions, &config.time_window) {
            Ok(analysis) => SpotReport::from_analysis(spot, analysis),
            Err(e) => {
                warn!(spot = %spot.name, "Analysis failed: {e}");
                SpotReport::failed(spot, e.to_string())
            }
        }
    }
}
