//! Wind sector matching, with support for arcs that cross north.

use crate::models::Sector;

use super::error::{AnalysisError, Result};

/// Check if a wind bearing is inside a sector. Both bounds are inclusive.
#[must_use]
pub fn in_sector(direction: f64, sector: &Sector) -> bool {
    let normalize = |a: f64| a.rem_euclid(360.0);
    let direction = normalize(direction);
    let start = normalize(sector.start);
    let end = normalize(sector.end);

    if sector.wrap {
        // e.g. 225..360 and 0..45
        direction >= start || direction <= end
    } else {
        direction >= start && direction <= end
    }
}

impl Sector {
    /// Reject sectors whose bounds contradict their `wrap` flag
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("start", self.start), ("end", self.end)] {
            if !value.is_finite() || !(0.0..360.0).contains(&value) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "sector {name} must be in [0, 360), got {value}"
                )));
            }
        }

        if !self.wrap && self.start > self.end {
            return Err(AnalysisError::InvalidConfig(format!(
                "sector {}..{} crosses north but wrap is false",
                self.start, self.end
            )));
        }

        if self.wrap && self.start <= self.end {
            return Err(AnalysisError::InvalidConfig(format!(
                "sector {}..{} is marked as wrapping but does not cross north",
                self.start, self.end
            )));
        }

        Ok(())
    }
}
