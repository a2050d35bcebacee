//! Matches every segment with the weather sample nearest its midpoint.
//!
//! Segments and observations are grouped by normalized location and calendar
//! date; within a group the observation with the smallest absolute time
//! distance to the segment midpoint wins. This is a nearest-neighbour join,
//! so many segments may share one observation.

pub mod location;
pub mod nearest;

pub use location::{LocationKey, parse_coordinates};
pub use nearest::{dedup_observations, nearest_observation};

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

use crate::config::JoinConfig;
use crate::model::{ProcessedRow, WeatherObservation};
use crate::schema::{Column, ColumnSet};

#[derive(Debug, Default, Clone, Serialize)]
pub struct JoinReport {
    pub skipped: bool,
    pub matched: usize,
    /// Rows whose location/date had no observation.
    pub unmatched: usize,
    /// Rows without a usable location, date or start/end time.
    pub unjoinable: usize,
    pub locations_without_weather: Vec<String>,
}

/// Attaches the nearest observation to each row in place. Rows are never dropped.
#[tracing::instrument(skip_all, fields(rows = rows.len(), observations = observations.len()))]
pub fn join_weather(
    rows: &mut [ProcessedRow],
    observations: &[WeatherObservation],
    config: &JoinConfig,
    columns: &ColumnSet,
) -> JoinReport {
    let mut report = JoinReport::default();
    let required = [
        Column::Location,
        Column::RaceDate,
        Column::SegmentStart,
        Column::SegmentEnd,
    ];
    if !columns.ensure("join", &required) {
        report.skipped = true;
        return report;
    }

    let precision = config.coordinate_precision;
    let mut by_place: HashMap<(LocationKey, NaiveDate), Vec<&WeatherObservation>> = HashMap::new();
    for obs in observations {
        if let Some(key) = LocationKey::normalize(&obs.location, precision) {
            by_place.entry((key, obs.date)).or_default().push(obs);
        }
    }

    let mut warned: BTreeSet<LocationKey> = BTreeSet::new();
    for row in rows.iter_mut() {
        row.weather = None;
        let key = row
            .segment
            .location
            .as_deref()
            .and_then(|raw| LocationKey::normalize(raw, precision));
        let (Some(key), Some(window)) = (key, row.segment.window()) else {
            report.unjoinable += 1;
            continue;
        };

        let midpoint = window.midpoint();
        let candidates = by_place
            .get(&(key.clone(), window.start.date()))
            .map(Vec::as_slice)
            .unwrap_or_default();

        match nearest_observation(midpoint, candidates.iter().copied()) {
            Some(obs) => {
                row.weather = Some(obs.clone());
                report.matched += 1;
            }
            None => {
                report.unmatched += 1;
                if warned.insert(key.clone()) {
                    warn!(location = %key, "No weather observations for location");
                }
            }
        }
    }

    report.locations_without_weather = warned.iter().map(ToString::to_string).collect();
    info!(
        matched = report.matched,
        unmatched = report.unmatched,
        unjoinable = report.unjoinable,
        "Weather joined"
    );
    report
}
