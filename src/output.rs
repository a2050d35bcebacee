//! Output formatting and persistence for processed rows and weather.
//!
//! Supports JSON run reports, CSV (optionally gzip-compressed) row files,
//! and reading those files back.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use csv::{ReaderBuilder, WriterBuilder};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::model::{ProcessedRow, WeatherObservation};

/// One processed row flattened for CSV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    pub serial_number: Option<String>,
    pub athlete_name: String,
    pub raw_name: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub age_category: String,
    pub event_name: Option<String>,
    pub race_label: Option<String>,
    pub location: Option<String>,
    pub race_date: Option<NaiveDate>,
    pub segment_index: Option<u32>,
    pub segment_start: Option<NaiveTime>,
    pub segment_end: Option<NaiveTime>,
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
    pub weather_time: Option<NaiveTime>,
    pub wind_speed_kts: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub temperature_c: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub rain_mm: Option<f64>,
    pub duration_s: Option<f64>,
    pub speed_kts: Option<f64>,
    pub vmc_kts: Option<f64>,
    pub vmg_kts: Option<f64>,
    pub apparent_wind_speed_kts: Option<f64>,
    pub apparent_wind_direction_deg: Option<f64>,
    pub current_speed_kts: Option<f64>,
    pub current_direction_deg: Option<f64>,
    pub wind_heading_angle_deg: Option<f64>,
    pub point_of_sail: Option<String>,
    pub upwind_efficiency_pct: Option<f64>,
    pub downwind_efficiency_pct: Option<f64>,
    pub efficiency_per_wind_knot: Option<f64>,
}

impl From<&ProcessedRow> for OutputRow {
    fn from(row: &ProcessedRow) -> Self {
        let s = &row.segment;
        let w = row.weather.as_ref();
        let m = &row.metrics;
        Self {
            serial_number: s.serial_number.clone(),
            athlete_name: row.identity.canonical_name.clone(),
            raw_name: row.identity.raw_name.clone(),
            first_name: row.identity.first_name.clone(),
            last_name: row.identity.last_name.clone(),
            gender: row.identity.gender.to_string(),
            age_category: row.identity.age_category.to_string(),
            event_name: s.event_name.clone(),
            race_label: s.race_label.clone(),
            location: s.location.clone(),
            race_date: s.race_date,
            segment_index: s.segment_index,
            segment_start: s.start_time,
            segment_end: s.end_time,
            distance_traveled_m: s.distance_traveled_m,
            ideal_length_m: s.ideal_length_m,
            heading_deg: s.heading_deg,
            rank_in: s.rank_in,
            rank_out: s.rank_out,
            segment_efficiency_pct: s.segment_efficiency_pct,
            course_efficiency_pct: s.course_efficiency_pct,
            total_distance_m: s.total_distance_m,
            total_course_length_m: s.total_course_length_m,
            vendor_wind_direction_deg: s.vendor_wind_direction_deg,
            weather_time: w.map(|w| w.time),
            wind_speed_kts: w.and_then(|w| w.wind_speed_kts),
            wind_direction_deg: w.and_then(|w| w.wind_direction_deg),
            temperature_c: w.and_then(|w| w.temperature_c),
            pressure_hpa: w.and_then(|w| w.pressure_hpa),
            humidity_pct: w.and_then(|w| w.humidity_pct),
            rain_mm: w.and_then(|w| w.rain_mm),
            duration_s: m.duration_s,
            speed_kts: m.speed_kts,
            vmc_kts: m.vmc_kts,
            vmg_kts: m.vmg_kts,
            apparent_wind_speed_kts: m.apparent_wind_speed_kts,
            apparent_wind_direction_deg: m.apparent_wind_direction_deg,
            current_speed_kts: m.current_speed_kts,
            current_direction_deg: m.current_direction_deg,
            wind_heading_angle_deg: m.wind_heading_angle_deg,
            point_of_sail: m.point_of_sail.map(|p| p.as_str().to_string()),
            upwind_efficiency_pct: m.upwind_efficiency_pct,
            downwind_efficiency_pct: m.downwind_efficiency_pct,
            efficiency_per_wind_knot: m.efficiency_per_wind_knot,
        }
    }
}

fn is_gzip(path: &str) -> bool {
    path.ends_with(".gz")
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a serializable report as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, value)?;
    debug!(path, "JSON report written");
    Ok(())
}

/// Serializes `records` to a CSV file at `path`, replacing it.
///
/// The file is gzip-compressed when `path` ends in `.gz`.
pub fn write_csv<T: Serialize>(path: &str, records: &[T]) -> Result<()> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = BufWriter::new(File::create(path)?);
    let gzip = is_gzip(path);
    debug!(path, gzip, rows = records.len(), "Writing CSV");

    if gzip {
        let encoder = GzEncoder::new(file, Compression::default());
        let mut writer = WriterBuilder::new().from_writer(encoder);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        let encoder = writer.into_inner().map_err(|e| e.into_error())?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = WriterBuilder::new().from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    Ok(())
}

/// Opens `path` for reading, decompressing `.gz` files.
pub fn open_input(path: &str) -> Result<Box<dyn Read>> {
    let file = BufReader::new(File::open(path)?);
    if is_gzip(path) {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

pub fn write_rows(path: &str, rows: &[ProcessedRow]) -> Result<()> {
    let records: Vec<OutputRow> = rows.iter().map(OutputRow::from).collect();
    write_csv(path, &records)?;
    info!(path, rows = records.len(), "Processed rows written");
    Ok(())
}

/// Reads a file produced by [`write_rows`].
pub fn read_rows(path: &str) -> Result<Vec<OutputRow>> {
    let mut reader = ReaderBuilder::new().from_reader(open_input(path)?);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Weather files use the same headers the weather reader expects.
pub fn write_observations(path: &str, observations: &[WeatherObservation]) -> Result<()> {
    write_csv(path, observations)?;
    info!(path, observations = observations.len(), "Weather observations written");
    Ok(())
}
