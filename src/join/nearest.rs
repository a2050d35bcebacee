use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;

use super::location::LocationKey;
use crate::model::WeatherObservation;

type SampleKey = (Option<LocationKey>, NaiveDate, NaiveTime);

/// Drops repeated `(location, date, time)` samples, keeping the last one seen.
///
/// Locations are compared by their normalized key, so two spellings of the
/// same venue count as one. Order of first appearance is preserved.
pub fn dedup_observations(
    observations: Vec<WeatherObservation>,
    precision: u32,
) -> Vec<WeatherObservation> {
    let mut index: HashMap<SampleKey, usize> = HashMap::new();
    let mut kept: Vec<WeatherObservation> = Vec::with_capacity(observations.len());

    for obs in observations {
        let key = (
            LocationKey::normalize(&obs.location, precision),
            obs.date,
            obs.time,
        );
        match index.get(&key) {
            Some(&i) => kept[i] = obs,
            None => {
                index.insert(key, kept.len());
                kept.push(obs);
            }
        }
    }
    kept
}

/// The observation closest in time to `midpoint`; ties go to the earlier one.
pub fn nearest_observation<'a, I>(midpoint: NaiveDateTime, candidates: I) -> Option<&'a WeatherObservation>
where
    I: IntoIterator<Item = &'a WeatherObservation>,
{
    candidates
        .into_iter()
        .min_by_key(|obs| {
            let at = obs.observed_at();
            ((at - midpoint).num_milliseconds().abs(), at)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn obs(time: &str, wind: f64) -> WeatherObservation {
        obs_at("brest", time, wind)
    }

    fn obs_at(location: &str, time: &str, wind: f64) -> WeatherObservation {
        WeatherObservation {
            location: location.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 7, 9).unwrap(),
            time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
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

    fn at(time: &str) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 9)
            .unwrap()
            .and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
    }

    #[test]
    fn test_nearest_picks_closest() {
        let candidates = vec![obs("10:00", 1.0), obs("11:00", 2.0), obs("12:00", 3.0)];
        let found = nearest_observation(at("11:20"), &candidates).unwrap();
        assert_eq!(found.wind_speed_kts, Some(2.0));
    }

    #[test]
    fn test_nearest_tie_goes_to_earliest() {
        // listed out of order on purpose
        let candidates = vec![obs("11:00", 2.0), obs("10:00", 1.0)];
        let found = nearest_observation(at("10:30"), &candidates).unwrap();
        assert_eq!(found.wind_speed_kts, Some(1.0));
    }

    #[test]
    fn test_nearest_empty() {
        let candidates: Vec<WeatherObservation> = Vec::new();
        assert!(nearest_observation(at("10:30"), &candidates).is_none());
    }

    #[test]
    fn test_dedup_keeps_last() {
        let deduped = dedup_observations(vec![
            obs("10:00", 1.0),
            obs("11:00", 2.0),
            obs("10:00", 5.0),
        ], 4);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].wind_speed_kts, Some(5.0));
        assert_eq!(deduped[1].wind_speed_kts, Some(2.0));
    }

    #[test]
    fn test_dedup_matches_spellings_of_one_venue() {
        let deduped = dedup_observations(
            vec![
                obs_at("43.1234, 5.6789", "10:00", 5.0),
                obs_at("Location (43.12341,5.67889)", "10:00", 9.0),
                obs_at("Brest", "10:00", 1.0),
                obs_at("  brest ", "10:00", 2.0),
            ],
            4,
        );
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].wind_speed_kts, Some(9.0));
        assert_eq!(deduped[1].wind_speed_kts, Some(2.0));
    }
}
