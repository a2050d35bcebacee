//! Outlier removal.
//!
//! Each filter is independent and may be skipped when its source columns
//! are absent; they run in a fixed order and every stage reports how many
//! rows it removed.

pub mod filters;
pub mod stats;

pub use filters::{
    FilterReport, ZScoreColumn, distance_filter, efficiency_filter, total_distance_filter,
    wind_direction_filter, zscore_filter,
};

use serde::Serialize;
use tracing::info;

use crate::config::OutlierConfig;
use crate::model::ProcessedRow;
use crate::schema::ColumnSet;

#[derive(Debug, Clone, Default, Serialize)]
pub struct OutlierReport {
    pub initial: usize,
    pub removed: usize,
    pub remaining: usize,
    pub stages: Vec<FilterReport>,
}

/// Runs every filter in sequence: z-score, distance, total distance,
/// efficiency, then wind direction.
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub fn filter_outliers(
    rows: &mut Vec<ProcessedRow>,
    config: &OutlierConfig,
    columns: &ColumnSet,
) -> OutlierReport {
    let initial = rows.len();
    let stages = vec![
        zscore_filter(rows, &config.zscore_columns, config.zscore_threshold, columns),
        distance_filter(rows, config.distance_tolerance_m, columns),
        total_distance_filter(rows, config.total_distance_tolerance_m, columns),
        efficiency_filter(
            rows,
            config.min_course_efficiency_pct,
            config.min_segment_efficiency_pct,
            columns,
        ),
        wind_direction_filter(rows, config.wind_direction_tolerance_deg, columns),
    ];

    let report = OutlierReport {
        initial,
        removed: initial - rows.len(),
        remaining: rows.len(),
        stages,
    };
    info!(
        removed = report.removed,
        remaining = report.remaining,
        "Outlier filtering complete"
    );
    report
}
