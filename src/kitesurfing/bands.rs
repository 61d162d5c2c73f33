//! Wind speed band ladder
//!
//! The ladder is scanned front to back and the first rung whose threshold the
//! speed reaches wins. The last rung is the floor: it classifies light wind
//! but never makes a sample kiteable.

use serde::Serialize;

use crate::models::Band;

use super::error::{AnalysisError, Result};

/// Validated, strictly descending band ladder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandLadder {
    bands: Vec<Band>,
}

/// Result of classifying one speed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandMatch<'a> {
    /// Position in the ladder, 0 is the strongest rung
    pub position: usize,
    pub label: &'a str,
    floor: bool,
}

impl BandMatch<'_> {
    /// Whether this rung counts towards kiteability
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.floor
    }
}

impl BandLadder {
    /// Build a ladder, rejecting empty or non-descending threshold lists
    pub fn new(bands: Vec<Band>) -> Result<Self> {
        if bands.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "band ladder must contain at least one band".into(),
            ));
        }

        for band in &bands {
            if band.label.trim().is_empty() {
                return Err(AnalysisError::InvalidConfig("band label cannot be empty".into()));
            }
            if !band.min_speed.is_finite() || band.min_speed < 0.0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "band '{}' has invalid threshold {}",
                    band.label, band.min_speed
                )));
            }
        }

        if let Some(pair) = bands.windows(2).find(|w| w[0].min_speed <= w[1].min_speed) {
            return Err(AnalysisError::InvalidConfig(format!(
                "band thresholds must be strictly descending: '{}' ({}) is followed by '{}' ({})",
                pair[0].label, pair[0].min_speed, pair[1].label, pair[1].min_speed
            )));
        }

        Ok(Self { bands })
    }

    #[must_use]
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Strongest band the speed qualifies for; `None` below the floor threshold
    pub fn classify(&self, speed: f64) -> Result<Option<BandMatch<'_>>> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(AnalysisError::InvalidSample(format!(
                "wind speed must be a non-negative number, got {speed}"
            )));
        }

        let last = self.bands.len() - 1;
        Ok(self
            .bands
            .iter()
            .enumerate()
            .find(|(_, band)| speed >= band.min_speed)
            .map(|(position, band)| BandMatch {
                position,
                label: &band.label,
                floor: position == last,
            }))
    }

    /// Label lookup by ladder position
    #[must_use]
    pub fn label_at(&self, position: usize) -> Option<&str> {
        self.bands.get(position).map(|b| b.label.as_str())
    }
}
