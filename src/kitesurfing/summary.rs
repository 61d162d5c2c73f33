//! Per-day summary of kiteable conditions at a spot

use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::models::{AnnotatedSample, DailySummary};

use super::bands::BandLadder;

/// Group kiteable samples by local date, days ascending.
///
/// Days without a single kiteable sample are left out.
#[must_use]
pub fn summarize_days(
    annotated: &[AnnotatedSample],
    ladder: &BandLadder,
    timezone: Tz,
) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, Vec<&AnnotatedSample>> = BTreeMap::new();
    for sample in annotated.iter().filter(|s| s.kiteable) {
        let date = sample.sample.timestamp.with_timezone(&timezone).date_naive();
        days.entry(date).or_default().push(sample);
    }

    days.into_iter()
        .filter_map(|(date, samples)| {
            let first = samples.first()?;
            let last = samples.last()?;
            let avg_wind =
                samples.iter().map(|s| s.sample.wind_speed).sum::<f64>() / samples.len() as f64;
            let max_gust = samples
                .iter()
                .filter_map(|s| s.sample.wind_gust)
                .reduce(f64::max);

            // Kiteable samples always carry a usable band
            let best_position = samples
                .iter()
                .filter_map(|s| s.band.as_deref())
                .filter_map(|label| ladder.bands().iter().position(|b| b.label == label))
                .min()?;

            Some(DailySummary {
                date,
                kiteable_samples: samples.len(),
                first_kiteable: first.sample.timestamp,
                last_kiteable: last.sample.timestamp,
                avg_wind,
                max_gust,
                best_band: ladder.label_at(best_position)?.to_string(),
            })
        })
        .collect()
}
