//! Column names recognised at the input boundary.
//!
//! Rows are parsed into typed records, but stages still need to know which
//! columns the source file actually carried: a column that was never present
//! is not the same thing as a column whose values are all empty.

use std::collections::BTreeSet;
use std::fmt;

use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    SerialNumber,
    AthleteName,
    EventName,
    RaceLabel,
    Location,
    RaceDate,
    SegmentIndex,
    SegmentStart,
    SegmentEnd,
    DistanceTraveled,
    IdealLength,
    Heading,
    RankIn,
    RankOut,
    SegmentEfficiency,
    CourseEfficiency,
    TotalDistance,
    TotalCourseLength,
    VendorWindDirection,
}

impl Column {
    pub const ALL: [Column; 19] = [
        Column::SerialNumber,
        Column::AthleteName,
        Column::EventName,
        Column::RaceLabel,
        Column::Location,
        Column::RaceDate,
        Column::SegmentIndex,
        Column::SegmentStart,
        Column::SegmentEnd,
        Column::DistanceTraveled,
        Column::IdealLength,
        Column::Heading,
        Column::RankIn,
        Column::RankOut,
        Column::SegmentEfficiency,
        Column::CourseEfficiency,
        Column::TotalDistance,
        Column::TotalCourseLength,
        Column::VendorWindDirection,
    ];

    /// Header used for this column in segment CSV files.
    pub fn header(self) -> &'static str {
        match self {
            Column::SerialNumber => "serial_number",
            Column::AthleteName => "athlete_name",
            Column::EventName => "event_name",
            Column::RaceLabel => "race_label",
            Column::Location => "location",
            Column::RaceDate => "race_date",
            Column::SegmentIndex => "segment_index",
            Column::SegmentStart => "segment_start",
            Column::SegmentEnd => "segment_end",
            Column::DistanceTraveled => "distance_traveled_m",
            Column::IdealLength => "ideal_length_m",
            Column::Heading => "heading_deg",
            Column::RankIn => "rank_in",
            Column::RankOut => "rank_out",
            Column::SegmentEfficiency => "segment_efficiency_pct",
            Column::CourseEfficiency => "course_efficiency_pct",
            Column::TotalDistance => "total_distance_m",
            Column::TotalCourseLength => "total_course_length_m",
            Column::VendorWindDirection => "vendor_wind_direction_deg",
        }
    }

    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim();
        Self::ALL.into_iter().find(|c| c.header() == header)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// The set of known columns present in an input table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet(BTreeSet<Column>);

impl ColumnSet {
    /// Every known column; used for tables built in memory.
    pub fn all() -> Self {
        Self(Column::ALL.into_iter().collect())
    }

    /// Splits raw headers into recognised columns and unknown header names.
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> (Self, Vec<String>) {
        let mut known = BTreeSet::new();
        let mut unknown = Vec::new();
        for header in headers {
            match Column::from_header(header) {
                Some(column) => {
                    known.insert(column);
                }
                None => unknown.push(header.trim().to_string()),
            }
        }
        (Self(known), unknown)
    }

    pub fn contains(&self, column: Column) -> bool {
        self.0.contains(&column)
    }

    pub fn without(mut self, column: Column) -> Self {
        self.0.remove(&column);
        self
    }

    pub fn missing(&self, required: &[Column]) -> Vec<Column> {
        required
            .iter()
            .copied()
            .filter(|c| !self.0.contains(c))
            .collect()
    }

    /// Returns `true` when every required column is present, otherwise logs
    /// the missing ones against `stage` and returns `false`.
    pub fn ensure(&self, stage: &str, required: &[Column]) -> bool {
        let missing = self.missing(required);
        if missing.is_empty() {
            return true;
        }
        let names: Vec<&str> = missing.iter().map(|c| c.header()).collect();
        error!(stage, missing = ?names, "Required columns missing, stage skipped");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_headers_splits_unknown() {
        let (columns, unknown) =
            ColumnSet::from_headers(["athlete_name", " race_date ", "Orientation vent"]);
        assert!(columns.contains(Column::AthleteName));
        assert!(columns.contains(Column::RaceDate));
        assert_eq!(unknown, vec!["Orientation vent".to_string()]);
    }

    #[test]
    fn test_missing_reports_absent_columns() {
        let (columns, _) = ColumnSet::from_headers(["distance_traveled_m"]);
        assert_eq!(
            columns.missing(&[Column::DistanceTraveled, Column::IdealLength]),
            vec![Column::IdealLength]
        );
        assert!(!columns.ensure("distance", &[Column::IdealLength]));
        assert!(ColumnSet::all().ensure("distance", &[Column::IdealLength]));
    }

    #[test]
    fn test_header_round_trip_for_every_column() {
        for column in Column::ALL {
            assert_eq!(Column::from_header(column.header()), Some(column));
        }
    }
}
