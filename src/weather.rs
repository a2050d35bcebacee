//! Hourly weather collection for one venue over a date range.

use anyhow::{Result, bail};
use chrono::{NaiveDate, TimeZone, Utc};
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::join::dedup_observations;
use crate::model::WeatherObservation;
use crate::services::weather_api::{Place, WeatherSource};

/// UTC hours sampled on each day; racing happens in daylight.
pub const DEFAULT_HOURS: RangeInclusive<u32> = 8..=20;

/// What to fetch and how fast.
#[derive(Debug, Clone)]
pub struct CollectionPlan {
    pub place: Place,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub hours: RangeInclusive<u32>,
    /// Pause between requests to stay under the provider's rate limit.
    pub delay: Duration,
}

/// Fetches one observation per planned hour.
///
/// The place is geocoded once up front. Hours with no data or a failed
/// request are logged and skipped.
#[tracing::instrument(skip_all, fields(place = %plan.place.name, from = %plan.from, to = %plan.to))]
pub async fn collect_observations(
    source: &dyn WeatherSource,
    plan: &CollectionPlan,
) -> Result<Vec<WeatherObservation>> {
    if plan.to < plan.from {
        warn!("Empty date range, nothing to fetch");
        return Ok(Vec::new());
    }

    let mut place = plan.place.clone();
    if place.coordinates.is_none() {
        match source.geocode(&place.name).await? {
            Some(coords) => place.coordinates = Some(coords),
            None => bail!("Could not geocode place '{}'", place.name),
        }
    }

    let mut observations = Vec::new();
    let mut failures = 0usize;
    let mut first = true;

    for day in plan.from.iter_days().take_while(|d| *d <= plan.to) {
        for hour in plan.hours.clone() {
            let Some(at) = day
                .and_hms_opt(hour, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive))
            else {
                warn!(hour, "Invalid hour skipped");
                continue;
            };

            if !first && !plan.delay.is_zero() {
                tokio::time::sleep(plan.delay).await;
            }
            first = false;

            match source.observation(&place, at).await {
                Ok(Some(obs)) => {
                    debug!(at = %at, "Observation fetched");
                    observations.push(obs);
                }
                Ok(None) => {
                    debug!(at = %at, "No observation for hour");
                }
                Err(e) => {
                    failures += 1;
                    error!(at = %at, error = %e, "Weather request failed");
                }
            }
        }
    }

    info!(
        fetched = observations.len(),
        failures,
        "Weather collection finished"
    );
    Ok(observations)
}

/// Combines a previously saved file with fresh observations.
///
/// Fresh values win on duplicate `(location, date, time)`, with locations
/// compared at `precision` decimals; output is sorted.
pub fn merge_observations(
    existing: Vec<WeatherObservation>,
    fresh: Vec<WeatherObservation>,
    precision: u32,
) -> Vec<WeatherObservation> {
    let mut merged = dedup_observations(existing.into_iter().chain(fresh).collect(), precision);
    merged.sort_by(|a, b| {
        (&a.location, a.date, a.time).cmp(&(&b.location, b.date, b.time))
    });
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveTime, Timelike};
    use std::sync::Mutex;

    struct FakeSource {
        geocoded: Mutex<usize>,
        failing_hour: u32,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                geocoded: Mutex::new(0),
                failing_hour: 12,
            }
        }
    }

    fn observation(location: &str, at: DateTime<Utc>, wind: f64) -> WeatherObservation {
        WeatherObservation {
            location: location.to_string(),
            date: at.date_naive(),
            time: at.time(),
            wind_speed_kts: Some(wind),
            wind_direction_deg: None,
            temperature_c: None,
            pressure_hpa: None,
            humidity_pct: None,
            rain_mm: None,
            latitude: None,
            longitude: None,
        }
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        async fn geocode(&self, name: &str) -> Result<Option<(f64, f64)>, FetchError> {
            *self.geocoded.lock().unwrap() += 1;
            Ok((name != "Atlantis").then_some((48.0, -4.0)))
        }

        async fn observation(
            &self,
            place: &Place,
            at: DateTime<Utc>,
        ) -> Result<Option<WeatherObservation>, FetchError> {
            assert!(place.coordinates.is_some());
            match at.hour() {
                h if h == self.failing_hour => Err(FetchError::Status {
                    status: 500,
                    body: "boom".to_string(),
                }),
                20 => Ok(None),
                _ => Ok(Some(observation(&place.name, at, at.hour() as f64))),
            }
        }
    }

    fn plan(name: &str, days: u64) -> CollectionPlan {
        let from = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        CollectionPlan {
            place: Place::named(name),
            from,
            to: from + chrono::Days::new(days - 1),
            hours: DEFAULT_HOURS,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_collect_skips_failures_and_gaps() {
        let source = FakeSource::new();
        let obs = collect_observations(&source, &plan("Brest", 2)).await.unwrap();

        // 13 hours a day, minus one failure and one empty hour
        assert_eq!(obs.len(), 22);
        assert_eq!(*source.geocoded.lock().unwrap(), 1);
        assert_eq!(obs[0].time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert!(obs.iter().all(|o| o.time.hour() != 12 && o.time.hour() != 20));
    }

    #[tokio::test]
    async fn test_collect_fails_on_unknown_place() {
        let source = FakeSource::new();
        assert!(collect_observations(&source, &plan("Atlantis", 1)).await.is_err());
    }

    #[tokio::test]
    async fn test_collect_empty_range() {
        let source = FakeSource::new();
        let mut p = plan("Brest", 1);
        p.to = p.from.pred_opt().unwrap();
        assert!(collect_observations(&source, &p).await.unwrap().is_empty());
        assert_eq!(*source.geocoded.lock().unwrap(), 0);
    }

    #[test]
    fn test_merge_prefers_fresh_and_sorts() {
        let ten = Utc.with_ymd_and_hms(2024, 7, 9, 10, 0, 0).unwrap();
        let nine = Utc.with_ymd_and_hms(2024, 7, 9, 9, 0, 0).unwrap();

        let merged = merge_observations(
            vec![observation("Brest", ten, 1.0)],
            vec![observation("Brest", ten, 2.0), observation("Brest", nine, 3.0)],
            4,
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].time.hour(), 9);
        assert_eq!(merged[1].wind_speed_kts, Some(2.0));
    }

    #[test]
    fn test_merge_matches_existing_coordinates_spelled_differently() {
        let ten = Utc.with_ymd_and_hms(2024, 7, 9, 10, 0, 0).unwrap();

        let merged = merge_observations(
            vec![observation("48.38, -4.49", ten, 1.0)],
            vec![observation("48.3800,-4.4900", ten, 2.0)],
            4,
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].wind_speed_kts, Some(2.0));
    }
}
