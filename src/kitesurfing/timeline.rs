//! Merging of mixed-resolution series into one per-spot timeline
//!
//! Every sample carries its own resolution tag and the merged sequence is
//! ordered by timestamp alone, so the sampling step is not uniform. Where an
//! hourly and a 15-minute sample share an instant, the 15-minute one wins.

use std::cmp::Reverse;

use tracing::{debug, warn};

use crate::models::{NormalizedSample, ResolutionSeries};

use super::normalize::normalize;

/// Ordered samples for one spot, strictly increasing by timestamp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    samples: Vec<NormalizedSample>,
}

impl Timeline {
    #[must_use]
    pub fn samples(&self) -> &[NormalizedSample] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Merge outcome with the count of samples that failed validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedTimeline {
    pub timeline: Timeline,
    /// Samples dropped because they failed normalization
    pub dropped: usize,
    /// Samples discarded in favour of a finer resolution at the same instant
    pub superseded: usize,
}

/// Merge all resolution series of one spot
pub fn merge(series: &[ResolutionSeries]) -> MergedTimeline {
    let mut dropped = 0;
    let mut samples: Vec<NormalizedSample> = Vec::new();

    for s in series {
        for raw in &s.samples {
            match normalize(raw) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    warn!(resolution = %s.resolution, "Dropping forecast sample: {e}");
                    dropped += 1;
                }
            }
        }
    }

    // Stable: among equal (timestamp, precedence) keys the input order is kept
    samples.sort_by_key(|s| (s.timestamp, Reverse(s.resolution.precedence())));

    let before = samples.len();
    samples.dedup_by_key(|s| s.timestamp);
    let superseded = before - samples.len();

    debug!(
        samples = samples.len(),
        dropped, superseded, "Merged forecast timeline"
    );

    MergedTimeline {
        timeline: Timeline { samples },
        dropped,
        superseded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawSample, Resolution};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, hour, minute, 0).unwrap()
    }

    fn hourly(ts: DateTime<Utc>, speed: f64) -> RawSample {
        RawSample::wind(ts, Resolution::Hourly, speed, 240.0)
    }

    fn quarter(ts: DateTime<Utc>, speed: f64) -> RawSample {
        RawSample::wind(ts, Resolution::FifteenMin, speed, 240.0)
    }

    #[test]
    fn test_fifteen_minute_wins_on_shared_timestamp() {
        let merged = merge(&[
            ResolutionSeries::new(Resolution::Hourly, vec![hourly(t(12, 0), 10.0)]),
            ResolutionSeries::new(Resolution::FifteenMin, vec![quarter(t(12, 0), 14.0)]),
        ]);

        let samples = merged.timeline.samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].resolution, Resolution::FifteenMin);
        assert_eq!(samples[0].wind_speed, 14.0);
        assert_eq!(merged.superseded, 1);
    }

    #[test]
    fn test_series_order_does_not_change_precedence() {
        let merged = merge(&[
            ResolutionSeries::new(Resolution::FifteenMin, vec![quarter(t(12, 0), 14.0)]),
            ResolutionSeries::new(Resolution::Hourly, vec![hourly(t(12, 0), 10.0)]),
        ]);
        assert_eq!(merged.timeline.samples()[0].wind_speed, 14.0);
    }

    #[test]
    fn test_disjoint_timestamps_interleave() {
        let merged = merge(&[
            ResolutionSeries::new(
                Resolution::Hourly,
                vec![hourly(t(12, 0), 10.0), hourly(t(13, 0), 11.0)],
            ),
            ResolutionSeries::new(
                Resolution::FifteenMin,
                vec![quarter(t(12, 15), 12.0), quarter(t(12, 30), 13.0)],
            ),
        ]);

        let times: Vec<_> = merged.timeline.samples().iter().map(|s| s.timestamp).collect();
        assert_eq!(times, vec![t(12, 0), t(12, 15), t(12, 30), t(13, 0)]);
        assert_eq!(merged.superseded, 0);
    }

    #[test]
    fn test_overlapping_day_keeps_strictly_increasing_times() {
        let start = t(0, 0);
        let hourly_series: Vec<_> = (0..48)
            .map(|h| hourly(start + Duration::hours(h), 10.0))
            .collect();
        let quarter_series: Vec<_> = (0..96)
            .map(|q| quarter(start + Duration::minutes(15 * q), 15.0))
            .collect();

        let merged = merge(&[
            ResolutionSeries::new(Resolution::Hourly, hourly_series),
            ResolutionSeries::new(Resolution::FifteenMin, quarter_series),
        ]);

        let samples = merged.timeline.samples();
        // 96 quarter-hours cover hours 0..24, the remaining 24 hourly points follow
        assert_eq!(samples.len(), 96 + 24);
        assert!(samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(samples[..96].iter().all(|s| s.resolution == Resolution::FifteenMin));
        assert_eq!(merged.superseded, 24);
    }

    #[test]
    fn test_invalid_samples_are_dropped_not_fatal() {
        let merged = merge(&[ResolutionSeries::new(
            Resolution::Hourly,
            vec![hourly(t(12, 0), -3.0), hourly(t(13, 0), 12.0)],
        )]);
        assert_eq!(merged.dropped, 1);
        assert_eq!(merged.timeline.len(), 1);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let input = vec![
            ResolutionSeries::new(
                Resolution::Hourly,
                vec![hourly(t(13, 0), 11.0), hourly(t(12, 0), 10.0)],
            ),
            ResolutionSeries::new(Resolution::FifteenMin, vec![quarter(t(12, 0), 14.0)]),
        ];
        assert_eq!(merge(&input), merge(&input));
    }

    #[test]
    fn test_empty_input() {
        let merged = merge(&[]);
        assert!(merged.timeline.is_empty());
        assert_eq!(merged.dropped, 0);
    }
}
