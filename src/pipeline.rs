//! Runs the processing stages in order over one segment table.

use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::identity::{IdentityReport, resolve_identities};
use crate::join::{JoinReport, dedup_observations, join_weather};
use crate::metrics::{MetricsReport, derive_all};
use crate::model::{ProcessedRow, WeatherObservation};
use crate::outliers::{OutlierReport, filter_outliers};
use crate::parser::SegmentTable;
use crate::services::name_lookup::NameLookup;

/// Summary of one run, printed as JSON at the end of `process`.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PipelineReport {
    pub input_rows: usize,
    pub malformed_values: usize,
    pub skipped_rows: usize,
    pub observations: usize,
    pub identity: IdentityReport,
    pub join: JoinReport,
    pub metrics: MetricsReport,
    pub outliers: OutlierReport,
    pub output_rows: usize,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub rows: Vec<ProcessedRow>,
    pub report: PipelineReport,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Identity, join, metrics, then outlier filtering.
    ///
    /// A stage whose required columns are missing is skipped; the run
    /// itself never fails on data.
    #[tracing::instrument(skip_all, fields(rows = table.records.len()))]
    pub fn run(
        &self,
        table: SegmentTable,
        observations: Vec<WeatherObservation>,
        lookup: Option<&dyn NameLookup>,
    ) -> PipelineOutput {
        let SegmentTable {
            records,
            columns,
            malformed_values,
            skipped_rows,
        } = table;

        let mut report = PipelineReport {
            input_rows: records.len(),
            malformed_values,
            skipped_rows,
            ..Default::default()
        };
        let mut rows: Vec<ProcessedRow> = records.into_iter().map(ProcessedRow::new).collect();
        let observations = dedup_observations(observations, self.config.join.coordinate_precision);
        report.observations = observations.len();

        report.identity = resolve_identities(&mut rows, lookup, &self.config.identity, &columns);
        report.join = join_weather(&mut rows, &observations, &self.config.join, &columns);
        report.metrics = derive_all(&mut rows, &columns);
        report.outliers = filter_outliers(&mut rows, &self.config.outliers, &columns);
        report.output_rows = rows.len();

        info!(
            input_rows = report.input_rows,
            output_rows = report.output_rows,
            "Pipeline finished"
        );
        PipelineOutput { rows, report }
    }
}
