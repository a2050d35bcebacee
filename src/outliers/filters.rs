use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::metrics::angle_diff;
use crate::model::ProcessedRow;
use crate::schema::{Column, ColumnSet};

use super::stats::{mean, sample_stddev};

/// Variance below this never flags a row.
const MIN_STDDEV: f64 = 1e-9;

/// Metric columns the z-score filter can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZScoreColumn {
    Speed,
    Vmc,
    Vmg,
    SegmentEfficiency,
    CourseEfficiency,
    ApparentWindSpeed,
    /// Ideal length minus distance sailed.
    DistanceDelta,
}

impl ZScoreColumn {
    pub fn value(self, row: &ProcessedRow) -> Option<f64> {
        match self {
            ZScoreColumn::Speed => row.metrics.speed_kts,
            ZScoreColumn::Vmc => row.metrics.vmc_kts,
            ZScoreColumn::Vmg => row.metrics.vmg_kts,
            ZScoreColumn::SegmentEfficiency => row.segment.segment_efficiency_pct,
            ZScoreColumn::CourseEfficiency => row.segment.course_efficiency_pct,
            ZScoreColumn::ApparentWindSpeed => row.metrics.apparent_wind_speed_kts,
            ZScoreColumn::DistanceDelta => {
                Some(row.segment.ideal_length_m? - row.segment.distance_traveled_m?)
            }
        }
    }

    /// Input columns the metric is computed from.
    pub fn source_columns(self) -> &'static [Column] {
        match self {
            ZScoreColumn::Speed => &[Column::DistanceTraveled],
            ZScoreColumn::Vmc => &[Column::IdealLength],
            ZScoreColumn::Vmg => &[Column::DistanceTraveled, Column::Heading],
            ZScoreColumn::SegmentEfficiency => &[Column::SegmentEfficiency],
            ZScoreColumn::CourseEfficiency => &[Column::CourseEfficiency],
            ZScoreColumn::ApparentWindSpeed => &[Column::DistanceTraveled, Column::Heading],
            ZScoreColumn::DistanceDelta => &[Column::DistanceTraveled, Column::IdealLength],
        }
    }
}

/// Outcome of one filter stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterReport {
    pub stage: String,
    pub skipped: bool,
    pub initial: usize,
    pub removed: usize,
    pub remaining: usize,
}

impl FilterReport {
    fn skipped(stage: &str, rows: usize) -> Self {
        Self {
            stage: stage.to_string(),
            skipped: true,
            initial: rows,
            removed: 0,
            remaining: rows,
        }
    }
}

/// Removes rows not matching `keep` and logs how many went.
fn retain_logged<F>(stage: &str, rows: &mut Vec<ProcessedRow>, keep: F) -> FilterReport
where
    F: FnMut(&ProcessedRow) -> bool,
{
    let initial = rows.len();
    rows.retain(keep);
    let removed = initial - rows.len();
    info!(stage, removed, remaining = rows.len(), "Filter applied");
    FilterReport {
        stage: stage.to_string(),
        skipped: false,
        initial,
        removed,
        remaining: rows.len(),
    }
}

/// Drops rows where any listed metric lies more than `threshold` sample
/// standard deviations from its mean. Missing values never flag.
pub fn zscore_filter(
    rows: &mut Vec<ProcessedRow>,
    targets: &[ZScoreColumn],
    threshold: f64,
    columns: &ColumnSet,
) -> FilterReport {
    const STAGE: &str = "zscore";

    let usable: Vec<ZScoreColumn> = targets
        .iter()
        .copied()
        .filter(|c| columns.missing(c.source_columns()).is_empty())
        .collect();
    if usable.len() < targets.len() {
        let dropped: Vec<_> = targets.iter().filter(|c| !usable.contains(c)).collect();
        debug!(columns = ?dropped, "Z-score columns without source data ignored");
    }
    if usable.is_empty() {
        let required: Vec<Column> = targets
            .iter()
            .flat_map(|c| c.source_columns().iter().copied())
            .collect();
        columns.ensure(STAGE, &required);
        return FilterReport::skipped(STAGE, rows.len());
    }

    let bounds: Vec<(ZScoreColumn, f64, f64)> = usable
        .iter()
        .filter_map(|&column| {
            let values: Vec<f64> = rows.iter().filter_map(|r| column.value(r)).collect();
            let m = mean(&values);
            let sd = sample_stddev(&values, m);
            (sd > MIN_STDDEV).then_some((column, m, sd))
        })
        .collect();

    retain_logged(STAGE, rows, |row| {
        bounds.iter().all(|&(column, m, sd)| match column.value(row) {
            Some(v) => ((v - m) / sd).abs() <= threshold,
            None => true,
        })
    })
}

/// Drops rows that sailed noticeably less than the segment's ideal length.
pub fn distance_filter(
    rows: &mut Vec<ProcessedRow>,
    tolerance_m: f64,
    columns: &ColumnSet,
) -> FilterReport {
    const STAGE: &str = "distance";
    if !columns.ensure(STAGE, &[Column::DistanceTraveled, Column::IdealLength]) {
        return FilterReport::skipped(STAGE, rows.len());
    }
    retain_logged(STAGE, rows, |row| {
        match (row.segment.distance_traveled_m, row.segment.ideal_length_m) {
            (Some(sailed), Some(ideal)) => sailed >= ideal - tolerance_m,
            _ => true,
        }
    })
}

/// Same check as [`distance_filter`] on whole-course totals.
pub fn total_distance_filter(
    rows: &mut Vec<ProcessedRow>,
    tolerance_m: f64,
    columns: &ColumnSet,
) -> FilterReport {
    const STAGE: &str = "total_distance";
    if !columns.ensure(STAGE, &[Column::TotalDistance, Column::TotalCourseLength]) {
        return FilterReport::skipped(STAGE, rows.len());
    }
    retain_logged(STAGE, rows, |row| {
        match (row.segment.total_distance_m, row.segment.total_course_length_m) {
            (Some(sailed), Some(course)) => sailed >= course - tolerance_m,
            _ => true,
        }
    })
}

/// Drops rows below the given course and segment efficiency minimums.
/// A `None` minimum disables that check.
pub fn efficiency_filter(
    rows: &mut Vec<ProcessedRow>,
    min_course_pct: Option<f64>,
    min_segment_pct: Option<f64>,
    columns: &ColumnSet,
) -> FilterReport {
    const STAGE: &str = "efficiency";
    if min_course_pct.is_none() && min_segment_pct.is_none() {
        debug!("No efficiency minimums configured");
        return FilterReport::skipped(STAGE, rows.len());
    }

    let mut required = Vec::new();
    if min_course_pct.is_some() {
        required.push(Column::CourseEfficiency);
    }
    if min_segment_pct.is_some() {
        required.push(Column::SegmentEfficiency);
    }
    if !columns.ensure(STAGE, &required) {
        return FilterReport::skipped(STAGE, rows.len());
    }

    let below = |value: Option<f64>, min: Option<f64>| {
        matches!((value, min), (Some(v), Some(m)) if v < m)
    };
    retain_logged(STAGE, rows, |row| {
        !below(row.segment.course_efficiency_pct, min_course_pct)
            && !below(row.segment.segment_efficiency_pct, min_segment_pct)
    })
}

/// Drops rows where the vendor-reported wind direction disagrees with the
/// matched observation by more than `tolerance_deg`.
pub fn wind_direction_filter(
    rows: &mut Vec<ProcessedRow>,
    tolerance_deg: f64,
    columns: &ColumnSet,
) -> FilterReport {
    const STAGE: &str = "wind_direction";
    if !columns.ensure(STAGE, &[Column::VendorWindDirection]) {
        return FilterReport::skipped(STAGE, rows.len());
    }
    retain_logged(STAGE, rows, |row| {
        let observed = row.weather.as_ref().and_then(|w| w.wind_direction_deg);
        match (row.segment.vendor_wind_direction_deg, observed) {
            (Some(vendor), Some(observed)) => angle_diff(vendor, observed) <= tolerance_deg,
            _ => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SegmentRecord, WeatherObservation};
    use chrono::{NaiveDate, NaiveTime};

    fn row(speed: Option<f64>) -> ProcessedRow {
        let mut row = ProcessedRow::new(SegmentRecord {
            athlete_name: "Jane Doe".to_string(),
            ..Default::default()
        });
        row.metrics.speed_kts = speed;
        row
    }

    fn with_distance(sailed: f64, ideal: f64) -> ProcessedRow {
        let mut r = row(Some(10.0));
        r.segment.distance_traveled_m = Some(sailed);
        r.segment.ideal_length_m = Some(ideal);
        r
    }

    fn with_wind(vendor: Option<f64>, observed: Option<f64>) -> ProcessedRow {
        let mut r = row(None);
        r.segment.vendor_wind_direction_deg = vendor;
        r.weather = Some(WeatherObservation {
            location: "brest".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 7, 9).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            wind_speed_kts: None,
            wind_direction_deg: observed,
            temperature_c: None,
            pressure_hpa: None,
            humidity_pct: None,
            rain_mm: None,
            latitude: None,
            longitude: None,
        });
        r
    }

    #[test]
    fn test_zscore_removes_outlier() {
        let mut rows: Vec<_> = (0..9).map(|_| row(Some(10.0))).collect();
        rows.push(row(Some(30.0)));

        let report = zscore_filter(&mut rows, &[ZScoreColumn::Speed], 2.5, &ColumnSet::all());

        assert_eq!(report.removed, 1);
        assert_eq!(report.remaining, 9);
        assert!(rows.iter().all(|r| r.metrics.speed_kts == Some(10.0)));
    }

    #[test]
    fn test_zscore_small_sample_ceiling() {
        // one value in ten rows tops out at |z| = 9 / sqrt(10)
        let sample = || {
            let mut rows: Vec<_> = (0..9).map(|_| row(Some(10.0))).collect();
            rows.push(row(Some(1e6)));
            rows
        };

        let mut rows = sample();
        let report = zscore_filter(&mut rows, &[ZScoreColumn::Speed], 3.0, &ColumnSet::all());
        assert_eq!(report.removed, 0);

        let mut rows = sample();
        let report = zscore_filter(&mut rows, &[ZScoreColumn::Speed], 2.8, &ColumnSet::all());
        assert_eq!(report.removed, 1);
    }

    #[test]
    fn test_zscore_constant_column_never_flags() {
        let mut rows: Vec<_> = (0..5).map(|_| row(Some(7.0))).collect();
        let report = zscore_filter(&mut rows, &[ZScoreColumn::Speed], 0.1, &ColumnSet::all());
        assert_eq!(report.removed, 0);
    }

    #[test]
    fn test_zscore_missing_values_kept() {
        let mut rows: Vec<_> = (0..9).map(|_| row(Some(10.0))).collect();
        rows.push(row(Some(30.0)));
        rows.push(row(None));

        zscore_filter(&mut rows, &[ZScoreColumn::Speed], 2.5, &ColumnSet::all());
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().any(|r| r.metrics.speed_kts.is_none()));
    }

    #[test]
    fn test_zscore_skipped_without_source_column() {
        let mut rows = vec![row(Some(1.0)), row(Some(100.0))];
        let columns = ColumnSet::all().without(Column::DistanceTraveled);
        let report = zscore_filter(&mut rows, &[ZScoreColumn::Speed], 0.1, &columns);
        assert!(report.skipped);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_distance_filter_tolerance() {
        let mut rows = vec![
            with_distance(1000.0, 1000.0),
            with_distance(971.0, 1000.0),
            with_distance(969.0, 1000.0),
        ];
        let report = distance_filter(&mut rows, 30.0, &ColumnSet::all());
        assert_eq!(report.removed, 1);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_total_distance_filter() {
        let mut short = row(None);
        short.segment.total_distance_m = Some(4000.0);
        short.segment.total_course_length_m = Some(5000.0);
        let mut fine = row(None);
        fine.segment.total_distance_m = Some(5100.0);
        fine.segment.total_course_length_m = Some(5000.0);
        let mut rows = vec![short, fine, row(None)];

        let report = total_distance_filter(&mut rows, 30.0, &ColumnSet::all());
        assert_eq!(report.removed, 1);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_efficiency_filter_thresholds() {
        let mut low = row(None);
        low.segment.segment_efficiency_pct = Some(40.0);
        let mut ok = row(None);
        ok.segment.segment_efficiency_pct = Some(75.0);
        let mut rows = vec![low, ok];

        let disabled = efficiency_filter(&mut rows, None, None, &ColumnSet::all());
        assert!(disabled.skipped);

        let report = efficiency_filter(&mut rows, None, Some(50.0), &ColumnSet::all());
        assert_eq!(report.removed, 1);
        assert_eq!(rows[0].segment.segment_efficiency_pct, Some(75.0));
    }

    #[test]
    fn test_wind_direction_filter_is_circular() {
        let mut rows = vec![
            with_wind(Some(350.0), Some(10.0)),
            with_wind(Some(90.0), Some(180.0)),
            with_wind(None, Some(180.0)),
            with_wind(Some(90.0), None),
        ];
        let report = wind_direction_filter(&mut rows, 30.0, &ColumnSet::all());
        assert_eq!(report.removed, 1);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].segment.vendor_wind_direction_deg, Some(350.0));
    }

    #[test]
    fn test_zscore_on_distance_delta() {
        let mut rows: Vec<_> = (0..9).map(|_| with_distance(1010.0, 1000.0)).collect();
        rows.push(with_distance(900.0, 1000.0));

        let report = zscore_filter(
            &mut rows,
            &[ZScoreColumn::DistanceDelta],
            2.5,
            &ColumnSet::all(),
        );
        assert_eq!(report.removed, 1);
        assert!(rows.iter().all(|r| r.segment.distance_traveled_m == Some(1010.0)));
    }

    #[test]
    fn test_zscore_column_names() {
        let parsed: Vec<ZScoreColumn> =
            serde_json::from_str(r#"["speed", "segment_efficiency", "apparent_wind_speed"]"#)
                .unwrap();
        assert_eq!(
            parsed,
            vec![
                ZScoreColumn::Speed,
                ZScoreColumn::SegmentEfficiency,
                ZScoreColumn::ApparentWindSpeed
            ]
        );
    }
}
