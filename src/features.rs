//! Model-ready feature table built from processed rows.
//!
//! The target is the rank at the end of the segment. Vendor wind orientation
//! is circular-encoded and categorical columns are one-hot encoded over a
//! fixed set of values so the layout does not depend on the data.

use serde::Serialize;
use tracing::info;

use crate::config::FeatureConfig;
use crate::model::{AgeCategory, Gender, PointOfSail};
use crate::output::OutputRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub rank_out: u32,
    pub rank_in: u32,
    pub wind_speed_kts: f64,
    pub vendor_wind_sin: f64,
    pub vendor_wind_cos: f64,
    pub temperature_c: f64,
    pub pressure_hpa: f64,
    pub humidity_pct: f64,
    pub rain_mm: f64,
    pub gender_male: u8,
    pub gender_female: u8,
    pub gender_unknown: u8,
    pub age_u17: u8,
    pub age_u19: u8,
    pub age_senior: u8,
    pub age_unknown: u8,
    pub point_of_sail_upwind: u8,
    pub point_of_sail_downwind: u8,
}

#[derive(Debug, Default, Serialize)]
pub struct FeatureReport {
    pub input_rows: usize,
    pub excluded_by_age: usize,
    pub incomplete: usize,
    pub output_rows: usize,
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

impl FeatureRow {
    /// `None` unless every feature is present.
    pub fn from_output(row: &OutputRow) -> Option<Self> {
        let gender = row.gender.as_str();
        let age = row.age_category.as_str();
        let point = row.point_of_sail.as_deref()?;
        let angle = row.vendor_wind_direction_deg?.to_radians();

        Some(Self {
            rank_out: row.rank_out?,
            rank_in: row.rank_in?,
            wind_speed_kts: row.wind_speed_kts?,
            vendor_wind_sin: angle.sin(),
            vendor_wind_cos: angle.cos(),
            temperature_c: row.temperature_c?,
            pressure_hpa: row.pressure_hpa?,
            humidity_pct: row.humidity_pct?,
            rain_mm: row.rain_mm?,
            gender_male: flag(gender == Gender::Male.as_str()),
            gender_female: flag(gender == Gender::Female.as_str()),
            gender_unknown: flag(gender == Gender::Unknown.as_str()),
            age_u17: flag(age == AgeCategory::U17.as_str()),
            age_u19: flag(age == AgeCategory::U19.as_str()),
            age_senior: flag(age == AgeCategory::Senior.as_str()),
            age_unknown: flag(age == AgeCategory::Unknown.as_str()),
            point_of_sail_upwind: flag(point == PointOfSail::Upwind.as_str()),
            point_of_sail_downwind: flag(point == PointOfSail::Downwind.as_str()),
        })
    }
}

/// Keeps rows in the configured age categories that have every feature.
pub fn build_features(rows: &[OutputRow], config: &FeatureConfig) -> (Vec<FeatureRow>, FeatureReport) {
    let mut report = FeatureReport {
        input_rows: rows.len(),
        ..Default::default()
    };
    let mut features = Vec::new();

    for row in rows {
        if !config.age_categories.is_empty()
            && !config.age_categories.iter().any(|c| c == &row.age_category)
        {
            report.excluded_by_age += 1;
            continue;
        }
        match FeatureRow::from_output(row) {
            Some(feature) => features.push(feature),
            None => report.incomplete += 1,
        }
    }

    report.output_rows = features.len();
    info!(
        input_rows = report.input_rows,
        excluded_by_age = report.excluded_by_age,
        incomplete = report.incomplete,
        output_rows = report.output_rows,
        "Features built"
    );
    (features, report)
}
