//! Performance metrics derived from segment timing and matched weather.

pub mod angles;
pub mod derive;

pub use angles::{Vector, angle_diff, bearing_to_math, math_to_bearing};
pub use derive::derive_metrics;

use serde::Serialize;
use tracing::info;

use crate::model::ProcessedRow;
use crate::schema::{Column, ColumnSet};

/// Metres per second to knots.
pub const MS_TO_KNOTS: f64 = 1.94384;

#[derive(Debug, Default, Clone, Serialize)]
pub struct MetricsReport {
    pub skipped: bool,
    pub computed: usize,
    /// Rows with a zero or unknown duration.
    pub without_duration: usize,
}

/// Fills `metrics` on every row.
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub fn derive_all(rows: &mut [ProcessedRow], columns: &ColumnSet) -> MetricsReport {
    let mut report = MetricsReport::default();
    if !columns.ensure(
        "metrics",
        &[Column::RaceDate, Column::SegmentStart, Column::SegmentEnd],
    ) {
        report.skipped = true;
        return report;
    }

    for row in rows.iter_mut() {
        row.metrics = derive_metrics(row);
        if row.metrics.duration_s.is_some() {
            report.computed += 1;
        } else {
            report.without_duration += 1;
        }
    }

    info!(
        computed = report.computed,
        without_duration = report.without_duration,
        "Metrics derived"
    );
    report
}
