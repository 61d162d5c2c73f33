use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rand::RngExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cache::ForecastCache;
use crate::models::{SpotConfig, SpotForecast};

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

/// Metadata about the latest completed model run
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelRun {
    pub title: String,
    /// Reference time of the run, as published
    pub run: Option<String>,
    pub last_modified_time: Option<String>,
    pub source: String,
    /// Set when the metadata could not be retrieved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Source of per-spot forecast series
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Fetch every resolution series available for one spot
    async fn fetch_spot(&self, spot: &SpotConfig) -> Result<SpotForecast>;

    /// Latest run metadata per model; empty when the provider has none
    async fn model_updates(&self) -> BTreeMap<String, ModelRun> {
        BTreeMap::new()
    }
}

/// Provider decorator that serves spot forecasts from the persistent cache
pub struct CachedProvider<P> {
    inner: P,
    cache: ForecastCache,
    namespace: String,
    ttl: Duration,
}

impl<P: ForecastProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: ForecastCache, namespace: impl Into<String>, ttl: Duration) -> Self {
        Self {
            inner,
            cache,
            namespace: namespace.into(),
            ttl,
        }
    }
}

#[async_trait]
impl<P: ForecastProvider> ForecastProvider for CachedProvider<P> {
    #[instrument(skip(self, spot), fields(spot = %spot.name))]
    async fn fetch_spot(&self, spot: &SpotConfig) -> Result<SpotForecast> {
        let key = spot.cache_key(&self.namespace);

        match self.cache.get::<SpotForecast>(&key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!("Ignoring unreadable cache entry: {e:#}"),
        }

        let forecast = self.inner.fetch_spot(spot).await?;

        // Spread expiries so spots do not all refetch at once
        let jitter: f32 = rand::rng().random_range(0.9..1.1);
        let ttl = self.ttl.mul_f32(jitter);
        if let Err(e) = self.cache.put(&key, forecast.clone(), ttl).await {
            warn!("Failed to cache forecast: {e:#}");
        } else {
            debug!(?ttl, "Cached forecast");
        }

        Ok(forecast)
    }

    async fn model_updates(&self) -> BTreeMap<String, ModelRun> {
        self.inner.model_updates().await
    }
}
