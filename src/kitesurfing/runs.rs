//! Run detection over an annotated timeline

use chrono::{DateTime, Utc};

use crate::models::{AnnotatedSample, KiteableWindow};

/// Collapse consecutive kiteable samples into windows.
///
/// Duration is the wall-clock span between the first and last sample of a
/// run, since the timeline mixes 15-minute and hourly steps. Runs shorter
/// than `min_run_hours` are discarded.
#[must_use]
pub fn build_runs(
    spot_name: &str,
    annotated: &[AnnotatedSample],
    min_run_hours: f64,
) -> Vec<KiteableWindow> {
    let mut windows = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, sample) in annotated.iter().enumerate() {
        match (sample.kiteable, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                windows.extend(close_run(spot_name, &annotated[start..i], min_run_hours));
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        windows.extend(close_run(spot_name, &annotated[start..], min_run_hours));
    }

    windows
}

fn close_run(
    spot_name: &str,
    run: &[AnnotatedSample],
    min_run_hours: f64,
) -> Option<KiteableWindow> {
    let first = run.first()?;
    let last = run.last()?;
    let duration_hours = span_hours(first.sample.timestamp, last.sample.timestamp);
    if duration_hours < min_run_hours {
        return None;
    }

    // Earliest sample wins a tie on speed
    let weakest = run.iter().fold(first, |weakest, s| {
        if s.sample.wind_speed < weakest.sample.wind_speed {
            s
        } else {
            weakest
        }
    });

    let max_wind = run
        .iter()
        .map(|s| s.sample.wind_speed)
        .fold(f64::MIN, f64::max);
    let max_gust = run
        .iter()
        .filter_map(|s| s.sample.wind_gust)
        .reduce(f64::max);

    Some(KiteableWindow {
        spot_name: spot_name.to_string(),
        start_ts: first.sample.timestamp,
        end_ts: last.sample.timestamp,
        duration_hours,
        weakest_band: weakest.band.clone().unwrap_or_default(),
        sample_count: run.len(),
        min_wind: weakest.sample.wind_speed,
        max_wind,
        max_gust,
    })
}

fn span_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}
