//! CSV parser for segment and weather tables.
//!
//! Raw cells are parsed leniently: values that cannot be read become `None`
//! and are counted, they never abort the load.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::Deserialize;
use std::io::Read;
use tracing::{debug, warn};

use crate::model::{SegmentRecord, WeatherObservation};
use crate::schema::ColumnSet;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

/// Segment rows plus the columns the source actually carried.
#[derive(Debug, Default)]
pub struct SegmentTable {
    pub records: Vec<SegmentRecord>,
    pub columns: ColumnSet,
    /// Non-empty cells that could not be parsed.
    pub malformed_values: usize,
    /// Records the CSV reader could not split into fields.
    pub skipped_rows: usize,
}

#[derive(Debug, Default)]
pub struct WeatherTable {
    pub observations: Vec<WeatherObservation>,
    /// Rows without a location, date or time, or that could not be read.
    pub dropped_rows: usize,
    pub malformed_values: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSegmentRow {
    serial_number: Option<String>,
    athlete_name: Option<String>,
    event_name: Option<String>,
    race_label: Option<String>,
    location: Option<String>,
    race_date: Option<String>,
    segment_index: Option<String>,
    segment_start: Option<String>,
    segment_end: Option<String>,
    distance_traveled_m: Option<String>,
    ideal_length_m: Option<String>,
    heading_deg: Option<String>,
    rank_in: Option<String>,
    rank_out: Option<String>,
    segment_efficiency_pct: Option<String>,
    course_efficiency_pct: Option<String>,
    total_distance_m: Option<String>,
    total_course_length_m: Option<String>,
    vendor_wind_direction_deg: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawWeatherRow {
    location: Option<String>,
    date: Option<String>,
    time: Option<String>,
    wind_speed_kts: Option<String>,
    wind_direction_deg: Option<String>,
    temperature_c: Option<String>,
    pressure_hpa: Option<String>,
    humidity_pct: Option<String>,
    rain_mm: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
}

/// Counts cells that were present but unreadable.
#[derive(Default)]
struct Cells {
    malformed: usize,
}

impl Cells {
    fn text(&self, raw: Option<String>) -> Option<String> {
        raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    }

    fn parse<T>(&mut self, raw: &Option<String>, f: impl Fn(&str) -> Option<T>) -> Option<T> {
        let raw = raw.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let value = f(raw);
        if value.is_none() {
            self.malformed += 1;
            debug!(value = raw, "Unparseable cell coerced to empty");
        }
        value
    }
}

/// Passes I/O failures up; a record that cannot be read is counted and skipped.
fn readable<T>(result: csv::Result<T>, skipped: &mut usize) -> Result<Option<T>> {
    match result {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.is_io_error() => Err(e.into()),
        Err(e) => {
            *skipped += 1;
            debug!(error = %e, "Unreadable CSV record skipped");
            Ok(None)
        }
    }
}

/// Parses a decimal number, accepting `,` as the decimal separator.
pub fn parse_number(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parses a non-negative integer count, tolerating a `.0` suffix.
pub fn parse_count(raw: &str) -> Option<u32> {
    let value = parse_number(raw)?;
    (value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64).then_some(value as u32)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Spreadsheet exports often carry a trailing midnight time.
    let raw = raw.split_whitespace().next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Parses a time of day, or epoch seconds taken as UTC.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if let Some(time) = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
    {
        return Some(time);
    }
    let seconds = parse_number(raw)?;
    DateTime::from_timestamp(seconds.trunc() as i64, 0).map(|dt| dt.time())
}

/// Reads a segment table from any CSV source.
pub fn read_segments<R: Read>(reader: R) -> Result<SegmentTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let (columns, unknown) = ColumnSet::from_headers(headers.iter());
    if !unknown.is_empty() {
        warn!(columns = ?unknown, "Ignoring unknown segment columns");
    }

    let mut cells = Cells::default();
    let mut records = Vec::new();
    let mut skipped_rows = 0usize;

    for result in rdr.deserialize() {
        let Some(raw) = readable::<RawSegmentRow>(result, &mut skipped_rows)? else {
            continue;
        };
        records.push(SegmentRecord {
            serial_number: cells.text(raw.serial_number.clone()),
            athlete_name: cells.text(raw.athlete_name.clone()).unwrap_or_default(),
            event_name: cells.text(raw.event_name.clone()),
            race_label: cells.text(raw.race_label.clone()),
            location: cells.text(raw.location.clone()),
            race_date: cells.parse(&raw.race_date, parse_date),
            segment_index: cells.parse(&raw.segment_index, parse_count),
            start_time: cells.parse(&raw.segment_start, parse_time),
            end_time: cells.parse(&raw.segment_end, parse_time),
            distance_traveled_m: cells.parse(&raw.distance_traveled_m, parse_number),
            ideal_length_m: cells.parse(&raw.ideal_length_m, parse_number),
            heading_deg: cells.parse(&raw.heading_deg, parse_number),
            rank_in: cells.parse(&raw.rank_in, parse_count),
            rank_out: cells.parse(&raw.rank_out, parse_count),
            segment_efficiency_pct: cells.parse(&raw.segment_efficiency_pct, parse_number),
            course_efficiency_pct: cells.parse(&raw.course_efficiency_pct, parse_number),
            total_distance_m: cells.parse(&raw.total_distance_m, parse_number),
            total_course_length_m: cells.parse(&raw.total_course_length_m, parse_number),
            vendor_wind_direction_deg: cells.parse(&raw.vendor_wind_direction_deg, parse_number),
        });
    }

    if cells.malformed > 0 {
        warn!(malformed = cells.malformed, "Segment cells coerced to empty");
    }
    if skipped_rows > 0 {
        warn!(skipped = skipped_rows, "Unreadable segment rows skipped");
    }
    debug!(rows = records.len(), "Segment table parsed");

    Ok(SegmentTable {
        records,
        columns,
        malformed_values: cells.malformed,
        skipped_rows,
    })
}

pub fn read_segments_path(path: &str) -> Result<SegmentTable> {
    read_segments(crate::output::open_input(path)?)
}

/// Reads a weather table from any CSV source.
///
/// Rows without a location, date or time cannot be joined and are dropped.
pub fn read_weather<R: Read>(reader: R) -> Result<WeatherTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let mut cells = Cells::default();
    let mut table = WeatherTable::default();

    for result in rdr.deserialize() {
        let Some(raw) = readable::<RawWeatherRow>(result, &mut table.dropped_rows)? else {
            continue;
        };
        let location = cells.text(raw.location.clone());
        let date = cells.parse(&raw.date, parse_date);
        let time = cells.parse(&raw.time, parse_time);

        let (Some(location), Some(date), Some(time)) = (location, date, time) else {
            table.dropped_rows += 1;
            continue;
        };

        table.observations.push(WeatherObservation {
            location,
            date,
            time,
            wind_speed_kts: cells.parse(&raw.wind_speed_kts, parse_number),
            wind_direction_deg: cells.parse(&raw.wind_direction_deg, parse_number),
            temperature_c: cells.parse(&raw.temperature_c, parse_number),
            pressure_hpa: cells.parse(&raw.pressure_hpa, parse_number),
            humidity_pct: cells.parse(&raw.humidity_pct, parse_number),
            rain_mm: cells.parse(&raw.rain_mm, parse_number),
            latitude: cells.parse(&raw.latitude, parse_number),
            longitude: cells.parse(&raw.longitude, parse_number),
        });
    }

    if table.dropped_rows > 0 {
        warn!(dropped = table.dropped_rows, "Weather rows without location/date/time dropped");
    }
    table.malformed_values = cells.malformed;
    Ok(table)
}

pub fn read_weather_path(path: &str) -> Result<WeatherTable> {
    read_weather(crate::output::open_input(path)?)
}
