//! `OpenMeteo` forecast provider
//!
//! Fetches hourly and 15-minute AROME series plus marine wave heights for a
//! spot and converts them into resolution-tagged raw samples. Times are
//! requested as unix seconds in GMT, wind speeds in knots.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::{ForecastProvider, ModelRun};
use crate::KiteWindowsError;
use crate::config::ForecastConfig;
use crate::models::{RawSample, Resolution, ResolutionSeries, SpotConfig, SpotForecast};

/// 15-minute precipitation is a quarter-hour sum; scale it to mm/h
const QUARTER_HOURS_PER_HOUR: f64 = 4.0;

pub struct OpenMeteoProvider {
    client: ClientWithMiddleware,
    config: ForecastConfig,
}

impl OpenMeteoProvider {
    pub fn new(config: ForecastConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .build()
            .context("Failed to build HTTP client")?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { client, config })
    }

    fn forecast_url(&self, spot: &SpotConfig, block: &str, horizon_param: &str, horizon: u32) -> String {
        format!(
            "{}?latitude={}&longitude={}&models={}&{}={}&wind_speed_unit=kn&timezone=GMT&timeformat=unixtime&{}={}",
            self.config.base_url,
            spot.lat,
            spot.lon,
            urlencoding::encode(&self.config.model),
            block,
            urlencoding::encode(&self.config.hourly_vars),
            horizon_param,
            horizon
        )
    }

    fn marine_url(&self, spot: &SpotConfig) -> String {
        format!(
            "{}?latitude={}&longitude={}&hourly={}&timezone=GMT&timeformat=unixtime&forecast_hours={}&cell_selection=sea",
            self.config.marine_url,
            spot.lat,
            spot.lon,
            urlencoding::encode(&self.config.wave_vars),
            self.config.forecast_hours_hourly
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        debug!("Calling the API: {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| KiteWindowsError::api(format!("Request failed: {url}: {e}")))?
            .error_for_status()
            .map_err(|e| KiteWindowsError::api(e.to_string()))?;
        let body = response
            .json::<T>()
            .await
            .map_err(|e| KiteWindowsError::api(format!("Failed to parse OpenMeteo response: {e}")))?;
        Ok(body)
    }

    /// Model identifiers whose run metadata is published
    fn tracked_models(&self) -> Vec<(String, String)> {
        let base = format!("meteofrance_{}", self.config.model);
        let title = self.config.model.replace('_', " ").to_uppercase();
        vec![
            (base.clone(), format!("{title} (hourly)")),
            (format!("{base}_15min"), format!("{title} (15-min)")),
        ]
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    #[instrument(skip(self, spot), fields(spot = %spot.name))]
    async fn fetch_spot(&self, spot: &SpotConfig) -> Result<SpotForecast> {
        let hourly_url = self.forecast_url(
            spot,
            "hourly",
            "forecast_hours",
            self.config.forecast_hours_hourly,
        );
        let min15_url = self.forecast_url(
            spot,
            "minutely_15",
            "forecast_minutely_15",
            self.config.forecast_min15,
        );

        let (hourly, min15, marine) = tokio::join!(
            self.get_json::<ForecastResponse>(hourly_url),
            self.get_json::<ForecastResponse>(min15_url),
            self.get_json::<MarineResponse>(self.marine_url(spot)),
        );

        // Inland spots have no sea cell; wind alone is still useful
        let waves = match marine {
            Ok(marine) => marine.wave_heights(),
            Err(e) => {
                warn!("No wave data: {e:#}");
                HashMap::new()
            }
        };

        let mut series = Vec::new();
        if let Some(block) = hourly?.hourly {
            series.push(block.into_series(Resolution::Hourly, &waves, 1.0)?);
        }
        if let Some(block) = min15?.minutely_15 {
            series.push(block.into_series(Resolution::FifteenMin, &waves, QUARTER_HOURS_PER_HOUR)?);
        }

        let forecast = SpotForecast { series };
        debug!(samples = forecast.sample_count(), "Fetched forecast");
        Ok(forecast)
    }

    async fn model_updates(&self) -> BTreeMap<String, ModelRun> {
        let mut out = BTreeMap::new();
        for (model, title) in self.tracked_models() {
            let source = format!("{}/{model}/latest.json", self.config.model_meta_url);
            let run = match self.get_json::<LatestRun>(source.clone()).await {
                Ok(latest) => ModelRun {
                    title,
                    run: latest.reference_time,
                    last_modified_time: latest.last_modified_time,
                    source,
                    error: None,
                },
                Err(e) => {
                    warn!(%model, "Failed to fetch model run metadata: {e:#}");
                    ModelRun {
                        title,
                        run: None,
                        last_modified_time: None,
                        source,
                        error: Some(format!("{e:#}")),
                    }
                }
            };
            out.insert(model, run);
        }
        out
    }
}

/// Wind forecast response; only one of the blocks is requested at a time
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<VariableBlock>,
    minutely_15: Option<VariableBlock>,
}

#[derive(Debug, Deserialize)]
struct VariableBlock {
    time: Vec<i64>,
    wind_speed_10m: Option<Vec<Option<f64>>>,
    wind_gusts_10m: Option<Vec<Option<f64>>>,
    wind_direction_10m: Option<Vec<Option<f64>>>,
    precipitation: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct MarineResponse {
    hourly: Option<WaveBlock>,
}

#[derive(Debug, Deserialize)]
struct WaveBlock {
    time: Vec<i64>,
    wave_height: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct LatestRun {
    reference_time: Option<String>,
    last_modified_time: Option<String>,
}

fn value_at(values: &Option<Vec<Option<f64>>>, i: usize) -> Option<f64> {
    values.as_ref().and_then(|v| v.get(i).copied().flatten())
}

impl VariableBlock {
    fn into_series(
        self,
        resolution: Resolution,
        waves: &HashMap<i64, f64>,
        precipitation_factor: f64,
    ) -> Result<ResolutionSeries> {
        let samples = self
            .time
            .iter()
            .enumerate()
            .map(|(i, &secs)| {
                let timestamp = DateTime::<Utc>::from_timestamp(secs, 0)
                    .with_context(|| format!("Invalid timestamp {secs} in forecast"))?;
                Ok(RawSample {
                    timestamp,
                    wind_speed: value_at(&self.wind_speed_10m, i),
                    wind_gust: value_at(&self.wind_gusts_10m, i),
                    wind_direction: value_at(&self.wind_direction_10m, i),
                    precipitation: value_at(&self.precipitation, i).map(|p| p * precipitation_factor),
                    wave_height: waves.get(&secs).copied(),
                    resolution,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ResolutionSeries::new(resolution, samples))
    }
}

impl MarineResponse {
    fn wave_heights(&self) -> HashMap<i64, f64> {
        let Some(block) = &self.hourly else {
            return HashMap::new();
        };
        block
            .time
            .iter()
            .enumerate()
            .filter_map(|(i, &t)| value_at(&block.wave_height, i).map(|h| (t, h)))
            .collect()
    }
}
