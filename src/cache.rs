use fjall::Keyspace;
use serde::Deserialize;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

use crate::{KiteWindowsError, Result};

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

/// Persistent TTL cache for fetched forecasts
#[derive(Clone)]
pub struct ForecastCache {
    store: Keyspace,
}

fn cache_error(e: impl std::fmt::Display) -> KiteWindowsError {
    KiteWindowsError::cache(e.to_string())
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key).map_err(cache_error)?.map(|v| v.to_vec()))
}

fn now_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(cache_error)?
        .as_secs())
}

impl ForecastCache {
    /// Open (or create) the cache database under `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path)
            .open()
            .map_err(|e| cache_error(format!("Failed to open cache database: {e}")))?;
        let items = db
            .keyspace("forecasts", fjall::KeyspaceCreateOptions::default)
            .map_err(cache_error)?;
        Ok(ForecastCache { store: items })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or_else(|| KiteWindowsError::cache("TTL overflow"))?
            .duration_since(UNIX_EPOCH)
            .map_err(cache_error)?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes = postcard::to_stdvec(&entry).map_err(cache_error)?;

        task::spawn_blocking(move || store.insert(key, bytes))
            .await
            .map_err(cache_error)?
            .map_err(cache_error)?;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes))
                .await
                .map_err(cache_error)??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<T> = postcard::from_bytes(&bytes)
            .map_err(|e| cache_error(format!("Unreadable entry for '{key}': {e}")))?;
        if now_secs()? < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key))
            .await
            .map_err(cache_error)?
            .map_err(cache_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawSample, Resolution, ResolutionSeries, SpotForecast};
    use chrono::{TimeZone, Utc};

    fn forecast() -> SpotForecast {
        let t = Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap();
        SpotForecast {
            series: vec![ResolutionSeries::new(
                Resolution::FifteenMin,
                vec![RawSample::wind(t, Resolution::FifteenMin, 18.5, 240.0).with_precipitation(0.1)],
            )],
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ForecastCache::open(dir.path()).unwrap();

        cache.put("spot", forecast(), Duration::from_secs(3600)).await.unwrap();
        let cached: Option<SpotForecast> = cache.get("spot").await.unwrap();
        assert_eq!(cached, Some(forecast()));
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ForecastCache::open(dir.path()).unwrap();

        cache.put("spot", forecast(), Duration::ZERO).await.unwrap();
        let cached: Option<SpotForecast> = cache.get("spot").await.unwrap();
        assert_eq!(cached, None);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_cache_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ForecastCache::open(dir.path()).unwrap();

        cache
            .put("spot", "not a forecast".to_string(), Duration::from_secs(3600))
            .await
            .unwrap();
        let err = cache.get::<SpotForecast>("spot").await.unwrap_err();
        assert!(matches!(err, KiteWindowsError::Cache { .. }));
        assert!(err.user_message().contains("clear your cache"));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ForecastCache::open(dir.path()).unwrap();
        let cached: Option<SpotForecast> = cache.get("nothing").await.unwrap();
        assert!(cached.is_none());
    }
}
