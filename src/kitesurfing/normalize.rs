use crate::models::{NormalizedSample, RawSample};

use super::error::{AnalysisError, Result};

/// Validate a raw sample and project it onto the canonical record.
///
/// A direction of exactly 360° is folded to 0°. Optional fields stay absent
/// instead of defaulting to zero.
pub fn normalize(raw: &RawSample) -> Result<NormalizedSample> {
    let wind_speed = raw
        .wind_speed
        .ok_or_else(|| invalid(raw, "missing wind speed".into()))?;
    if !wind_speed.is_finite() || wind_speed < 0.0 {
        return Err(invalid(raw, format!("wind speed {wind_speed} out of range")));
    }

    let wind_direction = raw
        .wind_direction
        .ok_or_else(|| invalid(raw, "missing wind direction".into()))?;
    if !wind_direction.is_finite() || !(0.0..=360.0).contains(&wind_direction) {
        return Err(invalid(
            raw,
            format!("wind direction {wind_direction} out of range"),
        ));
    }
    let wind_direction = if wind_direction == 360.0 {
        0.0
    } else {
        wind_direction
    };

    Ok(NormalizedSample {
        timestamp: raw.timestamp,
        resolution: raw.resolution,
        wind_speed,
        wind_gust: non_negative(raw, "wind gust", raw.wind_gust)?,
        wind_direction,
        precipitation: non_negative(raw, "precipitation", raw.precipitation)?,
        wave_height: non_negative(raw, "wave height", raw.wave_height)?,
    })
}

fn non_negative(raw: &RawSample, field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            Err(invalid(raw, format!("{field} {v} out of range")))
        }
        other => Ok(other),
    }
}

fn invalid(raw: &RawSample, reason: String) -> AnalysisError {
    AnalysisError::InvalidSample(format!(
        "{} sample at {}: {reason}",
        raw.resolution,
        raw.timestamp.to_rfc3339()
    ))
}
