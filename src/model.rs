//! Typed records that flow through the pipeline.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeCategory {
    U17,
    U19,
    Senior,
    #[default]
    Unknown,
}

impl AgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeCategory::U17 => "U17",
            AgeCategory::U19 => "U19",
            AgeCategory::Senior => "Senior",
            AgeCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a segment was sailed towards or away from the wind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointOfSail {
    Upwind,
    Downwind,
}

impl PointOfSail {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointOfSail::Upwind => "Upwind",
            PointOfSail::Downwind => "Downwind",
        }
    }
}

/// One athlete on one course segment, as reported by the timing platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentRecord {
    pub serial_number: Option<String>,
    pub athlete_name: String,
    pub event_name: Option<String>,
    /// Race label such as `"IQfoil U19 Women"`.
    pub race_label: Option<String>,
    /// Venue name or a `"lat, lon"` pair.
    pub location: Option<String>,
    pub race_date: Option<NaiveDate>,
    pub segment_index: Option<u32>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub distance_traveled_m: Option<f64>,
    pub ideal_length_m: Option<f64>,
    pub heading_deg: Option<f64>,
    pub rank_in: Option<u32>,
    pub rank_out: Option<u32>,
    pub segment_efficiency_pct: Option<f64>,
    pub course_efficiency_pct: Option<f64>,
    pub total_distance_m: Option<f64>,
    pub total_course_length_m: Option<f64>,
    pub vendor_wind_direction_deg: Option<f64>,
}

impl SegmentRecord {
    /// Start/end datetimes, or `None` if the date or either time is missing.
    pub fn window(&self) -> Option<SegmentWindow> {
        Some(SegmentWindow::new(
            self.race_date?,
            self.start_time?,
            self.end_time?,
        ))
    }
}

/// Absolute start and end of a segment with day rollover applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl SegmentWindow {
    /// An end time-of-day earlier than the start means the segment crossed midnight.
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        let start = date.and_time(start);
        let mut end = date.and_time(end);
        if end < start {
            end += Duration::days(1);
        }
        Self { start, end }
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }

    pub fn midpoint(&self) -> NaiveDateTime {
        self.start + (self.end - self.start) / 2
    }
}

/// One hourly weather sample for a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub location: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub wind_speed_kts: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub temperature_c: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub rain_mm: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl WeatherObservation {
    pub fn observed_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Resolved identity attached to every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AthleteIdentity {
    pub raw_name: String,
    pub canonical_name: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub age_category: AgeCategory,
}

/// Metrics recomputed from cleaned and joined fields.
///
/// Every field is `None` when one of its inputs is missing or when the
/// computation would divide by zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedMetrics {
    pub duration_s: Option<f64>,
    pub speed_kts: Option<f64>,
    pub vmc_kts: Option<f64>,
    pub apparent_wind_speed_kts: Option<f64>,
    pub apparent_wind_direction_deg: Option<f64>,
    pub current_speed_kts: Option<f64>,
    pub current_direction_deg: Option<f64>,
    pub vmg_kts: Option<f64>,
    pub wind_heading_angle_deg: Option<f64>,
    pub point_of_sail: Option<PointOfSail>,
    pub upwind_efficiency_pct: Option<f64>,
    pub downwind_efficiency_pct: Option<f64>,
    pub efficiency_per_wind_knot: Option<f64>,
}

/// A segment enriched by every pipeline stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedRow {
    pub segment: SegmentRecord,
    pub identity: AthleteIdentity,
    pub weather: Option<WeatherObservation>,
    pub metrics: DerivedMetrics,
}

impl ProcessedRow {
    pub fn new(segment: SegmentRecord) -> Self {
        let identity = AthleteIdentity {
            raw_name: segment.athlete_name.clone(),
            canonical_name: segment.athlete_name.trim().to_string(),
            ..Default::default()
        };
        Self {
            segment,
            identity,
            weather: None,
            metrics: DerivedMetrics::default(),
        }
    }
}
