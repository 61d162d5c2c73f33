use std::collections::HashMap;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use sunrise::{Coordinates, SolarDay, SolarEvent};
use tracing::debug;

use crate::models::{
    AnnotatedSample, ConditionsConfig, SpotConfig, TimeWindow, direction_to_cardinal,
};

use super::bands::BandLadder;
use super::error::{AnalysisError, Result};
use super::sector::in_sector;
use super::timeline::Timeline;

/// Classify every timeline sample for a spot.
///
/// Output has the same order and length as the timeline. A sample is
/// kiteable when its direction is in the sector, its band is above the floor,
/// its precipitation is known and within the rain limit, and its local hour
/// is inside the time window.
pub fn annotate(
    timeline: &Timeline,
    spot: &SpotConfig,
    ladder: &BandLadder,
    conditions: &ConditionsConfig,
    window: &TimeWindow,
) -> Result<Vec<AnnotatedSample>> {
    let mut daylight = DaylightCache::new(spot);

    timeline
        .samples()
        .iter()
        .map(|sample| {
            let in_sector = in_sector(sample.wind_direction, &spot.sector);
            let band = ladder.classify(sample.wind_speed)?;
            let usable_band = band.is_some_and(|b| b.is_usable());
            let rain_ok = sample
                .precipitation
                .is_some_and(|p| p <= conditions.rain_limit);

            let local_hour = sample.timestamp.with_timezone(&window.timezone).hour();
            let in_time_window = window.contains_hour(local_hour)
                && (!window.sunlight_only || daylight.is_daylight(sample.timestamp));

            Ok(AnnotatedSample {
                direction_label: direction_to_cardinal(sample.wind_direction).to_string(),
                in_sector,
                band: band.map(|b| b.label.to_string()),
                usable_band,
                rain_ok,
                in_time_window,
                kiteable: in_sector && usable_band && rain_ok && in_time_window,
                sample: sample.clone(),
            })
        })
        .collect()
}

/// Sunrise/sunset per local solar date at one spot
struct DaylightCache<'a> {
    spot: &'a SpotConfig,
    days: HashMap<NaiveDate, Option<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl<'a> DaylightCache<'a> {
    fn new(spot: &'a SpotConfig) -> Self {
        Self {
            spot,
            days: HashMap::new(),
        }
    }

    fn is_daylight(&mut self, ts: DateTime<Utc>) -> bool {
        let spot = self.spot;
        let date = solar_date(ts, spot.lon);
        let bounds = self
            .days
            .entry(date)
            .or_insert_with(|| match sun_bounds(spot, date) {
                Ok(bounds) => bounds,
                Err(e) => {
                    debug!(spot = %spot.name, "No sunrise/sunset available: {e:#}");
                    None
                }
            });

        bounds.is_some_and(|(sunrise, sunset)| ts >= sunrise && ts <= sunset)
    }
}

/// Calendar date at the spot's mean solar time
fn solar_date(ts: DateTime<Utc>, lon: f64) -> NaiveDate {
    let offset = Duration::seconds((lon / 15.0 * 3600.0).round() as i64);
    (ts + offset).date_naive()
}

fn sun_bounds(
    spot: &SpotConfig,
    date: NaiveDate,
) -> anyhow::Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let coordinates = Coordinates::new(spot.lat, spot.lon)
        .with_context(|| format!("Invalid coordinates: lat={}, lng={}", spot.lat, spot.lon))?;
    let solar_day = SolarDay::new(coordinates, date);

    Ok(solar_day
        .event_time(SolarEvent::Sunrise)
        .zip(solar_day.event_time(SolarEvent::Sunset)))
}

/// Validate the spot and the ladder before any sample is classified
pub fn check_inputs(spot: &SpotConfig, conditions: &ConditionsConfig) -> Result<BandLadder> {
    spot.sector.validate().map_err(|e| match e {
        AnalysisError::InvalidConfig(msg) => {
            AnalysisError::InvalidConfig(format!("spot '{}': {msg}", spot.name))
        }
        other => other,
    })?;

    check_conditions(conditions)
}

/// Validate the thresholds shared by every spot and build the ladder
pub fn check_conditions(conditions: &ConditionsConfig) -> Result<BandLadder> {
    if !conditions.rain_limit.is_finite() || conditions.rain_limit < 0.0 {
        return Err(AnalysisError::InvalidConfig(format!(
            "rain limit must be a non-negative number, got {}",
            conditions.rain_limit
        )));
    }
    if !conditions.min_run_hours.is_finite() || conditions.min_run_hours < 0.0 {
        return Err(AnalysisError::InvalidConfig(format!(
            "minimum run length must be a non-negative number of hours, got {}",
            conditions.min_run_hours
        )));
    }

    BandLadder::new(conditions.bands.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kitesurfing::timeline::merge;
    use crate::models::{Band, RawSample, Resolution, ResolutionSeries, Sector};
    use chrono::TimeZone;
    use rstest::rstest;

    fn spot() -> SpotConfig {
        SpotConfig::new("Test Spot", 41.3948, 2.2105, Sector::new(225.0, 45.0, true))
    }

    fn conditions() -> ConditionsConfig {
        ConditionsConfig {
            bands: vec![
                Band::new("great", 25.0),
                Band::new("good", 17.0),
                Band::new("below", 0.0),
            ],
            rain_limit: 0.5,
            min_run_hours: 2.0,
        }
    }

    fn annotate_one(raw: RawSample, window: &TimeWindow) -> AnnotatedSample {
        let merged = merge(&[ResolutionSeries::new(raw.resolution, vec![raw])]);
        let conditions = conditions();
        let ladder = check_inputs(&spot(), &conditions).unwrap();
        annotate(&merged.timeline, &spot(), &ladder, &conditions, window)
            .unwrap()
            .remove(0)
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 14, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_good_sample_is_kiteable() {
        let raw = RawSample::wind(at(12), Resolution::Hourly, 20.0, 250.0).with_precipitation(0.0);
        let annotated = annotate_one(raw, &TimeWindow::hours(6, 20));
        assert!(annotated.in_sector);
        assert_eq!(annotated.band.as_deref(), Some("good"));
        assert_eq!(annotated.direction_label, "WSW");
        assert!(annotated.kiteable);
    }

    #[test]
    fn test_floor_band_is_not_kiteable() {
        let raw = RawSample::wind(at(12), Resolution::Hourly, 9.0, 250.0).with_precipitation(0.0);
        let annotated = annotate_one(raw, &TimeWindow::hours(6, 20));
        assert_eq!(annotated.band.as_deref(), Some("below"));
        assert!(!annotated.usable_band);
        assert!(!annotated.kiteable);
    }

    #[test]
    fn test_out_of_sector_is_not_kiteable() {
        let raw = RawSample::wind(at(12), Resolution::Hourly, 20.0, 120.0).with_precipitation(0.0);
        let annotated = annotate_one(raw, &TimeWindow::hours(6, 20));
        assert!(!annotated.in_sector);
        assert!(!annotated.kiteable);
    }

    #[test]
    fn test_rain_limit_is_inclusive_and_unknown_rain_fails() {
        let window = TimeWindow::hours(6, 20);
        let at_limit =
            RawSample::wind(at(12), Resolution::Hourly, 20.0, 250.0).with_precipitation(0.5);
        assert!(annotate_one(at_limit, &window).kiteable);

        let above = RawSample::wind(at(12), Resolution::Hourly, 20.0, 250.0).with_precipitation(0.6);
        assert!(!annotate_one(above, &window).rain_ok);

        let unknown = RawSample::wind(at(12), Resolution::Hourly, 20.0, 250.0);
        let annotated = annotate_one(unknown, &window);
        assert!(!annotated.rain_ok);
        assert!(!annotated.kiteable);
    }

    #[test]
    fn test_time_window_end_is_exclusive() {
        let window = TimeWindow::hours(6, 20);
        let evening =
            RawSample::wind(at(20), Resolution::Hourly, 20.0, 250.0).with_precipitation(0.0);
        let annotated = annotate_one(evening, &window);
        assert!(!annotated.in_time_window);
        assert!(!annotated.kiteable);
    }

    #[test]
    fn test_time_window_uses_configured_timezone() {
        let mut window = TimeWindow::hours(6, 20);
        window.timezone = chrono_tz::Europe::Madrid;
        // 19:00 UTC in June is 21:00 in Madrid
        let raw = RawSample::wind(at(19), Resolution::Hourly, 20.0, 250.0).with_precipitation(0.0);
        assert!(!annotate_one(raw, &window).in_time_window);
        // 05:00 UTC is 07:00 in Madrid
        let raw = RawSample::wind(at(5), Resolution::Hourly, 20.0, 250.0).with_precipitation(0.0);
        assert!(annotate_one(raw, &window).in_time_window);
    }

    #[test]
    fn test_sunlight_only_excludes_night() {
        let mut window = TimeWindow::hours(0, 23);
        window.sunlight_only = true;
        let night = RawSample::wind(at(1), Resolution::Hourly, 20.0, 250.0).with_precipitation(0.0);
        assert!(!annotate_one(night, &window).in_time_window);
        let noon = RawSample::wind(at(12), Resolution::Hourly, 20.0, 250.0).with_precipitation(0.0);
        assert!(annotate_one(noon, &window).in_time_window);
    }

    #[rstest]
    // Sydney, 08:00 and 22:00 local
    #[case(-33.87, 151.21, at(22), true)]
    #[case(-33.87, 151.21, at(12), false)]
    // Honolulu, 16:00 the previous local day and 00:00 local
    #[case(21.31, -157.86, at(2), true)]
    #[case(21.31, -157.86, at(10), false)]
    fn test_sunlight_only_far_from_greenwich(
        #[case] lat: f64,
        #[case] lon: f64,
        #[case] ts: DateTime<Utc>,
        #[case] daylight: bool,
    ) {
        let mut window = TimeWindow::hours(0, 24);
        window.sunlight_only = true;
        let far = SpotConfig::new("Far", lat, lon, Sector::new(0.0, 359.0, false));
        let merged = merge(&[ResolutionSeries::new(
            Resolution::Hourly,
            vec![RawSample::wind(ts, Resolution::Hourly, 20.0, 90.0).with_precipitation(0.0)],
        )]);
        let conditions = conditions();
        let ladder = check_inputs(&far, &conditions).unwrap();
        let annotated = annotate(&merged.timeline, &far, &ladder, &conditions, &window).unwrap();

        assert_eq!(annotated[0].in_time_window, daylight);
        assert_eq!(annotated[0].kiteable, daylight);
    }

    #[test]
    fn test_solar_date_follows_longitude() {
        let late = Utc.with_ymd_and_hms(2024, 6, 14, 22, 0, 0).unwrap();
        assert_eq!(solar_date(late, 151.21), NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(solar_date(late, 2.21), NaiveDate::from_ymd_opt(2024, 6, 14).unwrap());
        let early = Utc.with_ymd_and_hms(2024, 6, 14, 2, 0, 0).unwrap();
        assert_eq!(solar_date(early, -157.86), NaiveDate::from_ymd_opt(2024, 6, 13).unwrap());
    }

    #[test]
    fn test_annotation_preserves_length_and_order() {
        let samples: Vec<_> = (8..14)
            .map(|h| RawSample::wind(at(h), Resolution::Hourly, 5.0 + f64::from(h), 250.0))
            .collect();
        let merged = merge(&[ResolutionSeries::new(Resolution::Hourly, samples)]);
        let conditions = conditions();
        let ladder = check_inputs(&spot(), &conditions).unwrap();
        let annotated = annotate(
            &merged.timeline,
            &spot(),
            &ladder,
            &conditions,
            &TimeWindow::hours(6, 20),
        )
        .unwrap();
        assert_eq!(annotated.len(), 6);
        assert!(annotated.windows(2).all(|w| w[0].sample.timestamp < w[1].sample.timestamp));
    }

    #[test]
    fn test_check_inputs_rejects_bad_config() {
        let mut bad_spot = spot();
        bad_spot.sector = Sector::new(300.0, 10.0, false);
        assert!(matches!(
            check_inputs(&bad_spot, &conditions()),
            Err(AnalysisError::InvalidConfig(_))
        ));

        let mut bad_conditions = conditions();
        bad_conditions.bands.reverse();
        assert!(matches!(
            check_inputs(&spot(), &bad_conditions),
            Err(AnalysisError::InvalidConfig(_))
        ));

        let mut bad_conditions = conditions();
        bad_conditions.rain_limit = -1.0;
        assert!(check_inputs(&spot(), &bad_conditions).is_err());
    }
}
