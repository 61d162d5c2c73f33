//! Configuration management for the `KiteWindows` application
//!
//! Handles loading the JSON configuration file, environment variable
//! overrides, and validation of every setting before analysis starts.

use crate::KiteWindowsError;
use crate::kitesurfing::check_conditions;
use crate::models::{ConditionsConfig, SpotConfig, TimeWindow};
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Root configuration structure for the `KiteWindows` application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KiteWindowsConfig {
    /// Spots to analyze, in report order
    pub spots: Vec<SpotConfig>,
    /// Forecast retrieval settings
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Daylight restriction
    #[serde(default)]
    pub time_window: TimeWindow,
    /// Band ladder, rain ceiling and minimum window length
    pub conditions: ConditionsConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Forecast API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Weather model requested from the provider
    #[serde(default = "default_model")]
    pub model: String,
    /// Comma-separated variables requested for hourly and 15-minute series
    #[serde(default = "default_hourly_vars")]
    pub hourly_vars: String,
    /// Comma-separated marine variables
    #[serde(default = "default_wave_vars")]
    pub wave_vars: String,
    /// Hourly forecast horizon in hours
    #[serde(default = "default_forecast_hours_hourly")]
    pub forecast_hours_hourly: u32,
    /// Number of 15-minute steps requested
    #[serde(default = "default_forecast_min15")]
    pub forecast_min15: u32,
    /// Base URL for the forecast API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Base URL for the marine API
    #[serde(default = "default_marine_url")]
    pub marine_url: String,
    /// Base URL of the open-data bucket with model run metadata
    #[serde(default = "default_model_meta_url")]
    pub model_meta_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether fetched forecasts are cached at all
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty, compact or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_model() -> String {
    "arome_france_hd".to_string()
}

fn default_hourly_vars() -> String {
    "wind_speed_10m,wind_gusts_10m,wind_direction_10m,precipitation".to_string()
}

fn default_wave_vars() -> String {
    "wave_height".to_string()
}

fn default_forecast_hours_hourly() -> u32 {
    48
}

fn default_forecast_min15() -> u32 {
    24
}

fn default_base_url() -> String {
    "https://api.open-meteo.com/v1/meteofrance".to_string()
}

fn default_marine_url() -> String {
    "https://marine-api.open-meteo.com/v1/marine".to_string()
}

fn default_model_meta_url() -> String {
    "https://openmeteo.s3.amazonaws.com/data_spatial".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u32 {
    1
}

fn default_cache_location() -> String {
    ".cache/kitewindows".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            hourly_vars: default_hourly_vars(),
            wave_vars: default_wave_vars(),
            forecast_hours_hourly: default_forecast_hours_hourly(),
            forecast_min15: default_forecast_min15(),
            base_url: default_base_url(),
            marine_url: default_marine_url(),
            model_meta_url: default_model_meta_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl KiteWindowsConfig {
    /// Load configuration from the given path, or the first config file found
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => path,
            None => Self::find_config_file().ok_or_else(|| {
                KiteWindowsError::config(
                    "Could not find config.json in the current directory or the user config directory",
                )
            })?,
        };

        if !config_file.exists() {
            return Err(KiteWindowsError::config(format!(
                "Config file not found: {}",
                config_file.display()
            ))
            .into());
        }
        debug!("Loading config from {}", config_file.display());

        let settings = Config::builder()
            .add_source(File::from(config_file.clone()).format(FileFormat::Json))
            // Environment variable overrides with KITEWINDOWS_ prefix
            .add_source(
                Environment::with_prefix("KITEWINDOWS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", config_file.display()))?;

        let mut config: KiteWindowsConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        debug!("Loaded configuration with {} spots", config.spots.len());
        for spot in &config.spots {
            debug!(spot = %spot.name, coordinates = %spot.format_coordinates(), "Configured spot");
        }
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: KiteWindowsConfig =
            serde_json::from_str(json).with_context(|| "Invalid JSON in configuration")?;
        config.apply_defaults();
        config.validate()?;
        Ok(config)
    }

    /// Search for config.json in the working directory, then the user config directory
    #[must_use]
    pub fn find_config_file() -> Option<PathBuf> {
        let local = Path::new("config.json").to_path_buf();
        if local.exists() {
            return Some(local);
        }
        Self::get_config_path().filter(|p| p.exists())
    }

    /// Get the per-user configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kitewindows").join("config.json"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.forecast.model.is_empty() {
            self.forecast.model = default_model();
        }
        if self.forecast.base_url.is_empty() {
            self.forecast.base_url = default_base_url();
        }
        if self.forecast.marine_url.is_empty() {
            self.forecast.marine_url = default_marine_url();
        }
        if self.forecast.timeout_seconds == 0 {
            self.forecast.timeout_seconds = default_timeout();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_spots()?;
        self.validate_conditions()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate spot names, coordinates and sectors
    fn validate_spots(&self) -> Result<()> {
        if self.spots.is_empty() {
            return Err(KiteWindowsError::config("At least one spot must be configured").into());
        }

        let mut names = HashSet::new();
        for spot in &self.spots {
            if spot.name.trim().is_empty() {
                return Err(KiteWindowsError::config("Spot name cannot be empty").into());
            }
            if !names.insert(spot.name.as_str()) {
                return Err(KiteWindowsError::config(format!(
                    "Duplicate spot name '{}'",
                    spot.name
                ))
                .into());
            }
            if !(-90.0..=90.0).contains(&spot.lat) {
                return Err(KiteWindowsError::config(format!(
                    "Spot '{}' latitude {} must be between -90 and 90",
                    spot.name, spot.lat
                ))
                .into());
            }
            if !(-180.0..=180.0).contains(&spot.lon) {
                return Err(KiteWindowsError::config(format!(
                    "Spot '{}' longitude {} must be between -180 and 180",
                    spot.name, spot.lon
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate the band ladder and thresholds shared by every spot.
    ///
    /// Sectors are checked per spot during analysis, so one bad sector only
    /// fails its own spot.
    fn validate_conditions(&self) -> Result<()> {
        check_conditions(&self.conditions).map_err(KiteWindowsError::from)?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let window = &self.time_window;
        if window.day_start > 23 || window.day_end > 23 {
            return Err(KiteWindowsError::config(
                "Time window hours must be between 0 and 23",
            )
            .into());
        }

        if window.day_end <= window.day_start {
            return Err(KiteWindowsError::config(
                "Time window day_end must be after day_start",
            )
            .into());
        }

        if self.forecast.forecast_hours_hourly == 0 || self.forecast.forecast_hours_hourly > 48 {
            return Err(KiteWindowsError::config(
                "Hourly forecast horizon must be between 1 and 48 hours",
            )
            .into());
        }

        if self.forecast.forecast_min15 == 0 || self.forecast.forecast_min15 > 24 {
            return Err(KiteWindowsError::config(
                "15-minute forecast steps must be between 1 and 24",
            )
            .into());
        }

        if self.forecast.timeout_seconds > 300 {
            return Err(KiteWindowsError::config(
                "Forecast API timeout cannot exceed 300 seconds",
            )
            .into());
        }

        if self.forecast.max_retries > 10 {
            return Err(KiteWindowsError::config(
                "Forecast API max retries cannot exceed 10",
            )
            .into());
        }

        if self.cache.ttl_hours > 168 {
            return Err(KiteWindowsError::config(
                "Cache TTL cannot exceed 168 hours (1 week)",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(KiteWindowsError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "compact", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(KiteWindowsError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let is_var_list = |s: &str| {
            !s.is_empty()
                && s.split(',').all(|v| {
                    !v.is_empty()
                        && v.chars()
                            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
                })
        };
        if !is_var_list(&self.forecast.hourly_vars) || !is_var_list(&self.forecast.wave_vars) {
            return Err(KiteWindowsError::config(
                "Forecast variables must be comma-separated lowercase names",
            )
            .into());
        }

        if !self
            .forecast
            .model
            .chars()
            .all(|c| c.is_ascii_lowercase() || c == '_')
        {
            return Err(KiteWindowsError::config(format!(
                "Invalid forecast model name '{}'",
                self.forecast.model
            ))
            .into());
        }

        for url in [&self.forecast.base_url, &self.forecast.marine_url, &self.forecast.model_meta_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(KiteWindowsError::config(format!(
                    "Forecast URL '{url}' must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "spots": [
            {"name": "Test Spot", "lat": 41.3948, "lon": 2.2105,
             "dir_sector": {"start": 225, "end": 45, "wrap": true}}
        ],
        "forecast": {
            "model": "arome_france_hd",
            "hourly_vars": "wind_speed_10m,wind_gusts_10m,wind_direction_10m,precipitation",
            "wave_vars": "wave_height",
            "forecast_hours_hourly": 48,
            "forecast_min15": 24
        },
        "time_window": {"day_start": 6, "day_end": 20},
        "conditions": {
            "bands": [["too much", 40], ["good", 17], ["light", 12], ["below", 0]],
            "rain_limit": 0.5
        }
    }"#;

    fn sample() -> KiteWindowsConfig {
        KiteWindowsConfig::from_json_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_sample_config_loads_with_defaults() {
        let config = sample();
        assert_eq!(config.spots.len(), 1);
        assert_eq!(config.conditions.bands.len(), 4);
        assert_eq!(config.conditions.min_run_hours, 2.0);
        assert_eq!(config.forecast.timeout_seconds, 30);
        assert_eq!(config.logging.level, "info");
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_non_descending_bands_rejected() {
        let json = SAMPLE.replace(r#"["good", 17]"#, r#"["good", 45]"#);
        let err = KiteWindowsConfig::from_json_str(&json).unwrap_err();
        assert!(err.to_string().contains("strictly descending"));
    }

    #[test]
    fn test_contradictory_sector_left_to_spot_analysis() {
        let json = SAMPLE.replace(r#""wrap": true"#, r#""wrap": false"#);
        let config = KiteWindowsConfig::from_json_str(&json).unwrap();
        assert!(config.spots[0].sector.validate().is_err());
    }

    #[test]
    fn test_negative_rain_limit_rejected() {
        let json = SAMPLE.replace(r#""rain_limit": 0.5"#, r#""rain_limit": -1"#);
        let err = KiteWindowsConfig::from_json_str(&json).unwrap_err();
        assert!(err.to_string().contains("rain limit"));
    }

    #[test]
    fn test_duplicate_spot_names_rejected() {
        let mut config = sample();
        config.spots.push(config.spots[0].clone());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate spot name"));
    }

    #[test]
    fn test_latitude_out_of_range_rejected() {
        let mut config = sample();
        config.spots[0].lat = 91.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_time_window_order_rejected() {
        let mut config = sample();
        config.time_window.day_start = 20;
        config.time_window.day_end = 6;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("day_end must be after day_start"));
    }

    #[test]
    fn test_forecast_horizon_limits() {
        let mut config = sample();
        config.forecast.forecast_hours_hourly = 72;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.forecast.forecast_min15 = 25;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = sample();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_invalid_json_reported() {
        let err = KiteWindowsConfig::from_json_str("{ not json").unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_missing_file_reported() {
        let err = KiteWindowsConfig::load_from_path(Some(PathBuf::from("/nonexistent/config.json")))
            .unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = KiteWindowsConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("kitewindows"));
            assert!(path.to_string_lossy().ends_with("config.json"));
        }
    }
}
