//! Spot model: identity, coordinates and usable wind sector

use serde::{Deserialize, Serialize};

/// Angular range of wind bearings ("from" direction) that works at a spot
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Sector {
    /// First bearing of the arc in degrees
    pub start: f64,
    /// Last bearing of the arc in degrees
    pub end: f64,
    /// Whether the arc crosses north (0°/360°)
    #[serde(default)]
    pub wrap: bool,
}

impl Sector {
    #[must_use]
    pub fn new(start: f64, end: f64, wrap: bool) -> Self {
        Self { start, end, wrap }
    }
}

/// A kitesurfing spot
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpotConfig {
    /// Unique spot name, used as the key in reports
    pub name: String,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
    /// Wind directions considered usable
    #[serde(alias = "dir_sector")]
    pub sector: Sector,
}

impl SpotConfig {
    /// Create a new spot
    #[must_use]
    pub fn new(name: impl Into<String>, lat: f64, lon: f64, sector: Sector) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            sector,
        }
    }

    /// Format spot as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lon)
    }

    /// Generate cache key for this spot's forecast
    #[must_use]
    pub fn cache_key(&self, model: &str) -> String {
        let lat = (self.lat * 100.0).round() / 100.0;
        let lon = (self.lon * 100.0).round() / 100.0;
        format!("forecast:{model}:{lat:.2}:{lon:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spot_cache_key() {
        let spot = SpotConfig::new("Bogatell", 41.394_812, 2.210_532, Sector::new(225.0, 45.0, true));
        assert_eq!(
            spot.cache_key("arome_france_hd"),
            "forecast:arome_france_hd:41.39:2.21"
        );
        assert_eq!(spot.format_coordinates(), "41.3948, 2.2105");
    }

    #[test]
    fn test_spot_deserializes_legacy_sector_key() {
        let json = r#"{"name":"Test Spot","lat":41.39,"lon":2.21,"dir_sector":{"start":225,"end":45,"wrap":true}}"#;
        let spot: SpotConfig = serde_json::from_str(json).unwrap();
        assert_eq!(spot.sector, Sector::new(225.0, 45.0, true));
    }

    #[test]
    fn test_sector_wrap_defaults_to_false() {
        let sector: Sector = serde_json::from_str(r#"{"start":90,"end":180}"#).unwrap();
        assert!(!sector.wrap);
    }
}
