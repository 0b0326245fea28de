//! Memory sweep report: quicksort vs mergesort as a function of `m`.

use super::{PipelineError, Stage};
use crate::charts::{ChartSpec, Series, StaticChartRenderer, YScale};
use crate::config::ReportConfig;
use crate::data::schema::{IO_OPERATIONS, M, TIME_SECONDS};
use crate::data::{DataLoader, TableSchema};
use crate::stats::{AggregatedSeries, Aggregator};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

pub const QUICKSORT: &str = "Quicksort";
pub const MERGESORT: &str = "Mergesort";

/// One output image of the sweep report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepChart {
    pub file: &'static str,
    pub metric: &'static str,
    pub y_label: &'static str,
    pub y_scale: YScale,
}

pub const CHARTS: [SweepChart; 3] = [
    SweepChart {
        file: "ios.png",
        metric: IO_OPERATIONS,
        y_label: "I/Os",
        y_scale: YScale::Linear,
    },
    SweepChart {
        file: "time.png",
        metric: TIME_SECONDS,
        y_label: "Time (s)",
        y_scale: YScale::Linear,
    },
    SweepChart {
        file: "log_ios.png",
        metric: IO_OPERATIONS,
        y_label: "I/Os (log)",
        y_scale: YScale::Log,
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub charts: Vec<PathBuf>,
    pub quicksort: AggregatedSeries,
    pub mergesort: AggregatedSeries,
}

impl SweepChart {
    pub fn spec(&self, config: &ReportConfig) -> ChartSpec {
        let (width, height) = config.sweep_chart_size;
        ChartSpec::new(M, self.y_label)
            .with_y_scale(self.y_scale)
            .with_size(width, height)
    }
}

pub fn run(config: &ReportConfig) -> Result<SweepReport, PipelineError> {
    info!(stage = %Stage::Start, "sweep report");

    let schema = TableSchema::sweep();
    let quicksort = DataLoader::load_csv(&config.quicksort_input_path(), &schema)?;
    let mergesort = DataLoader::load_csv(&config.mergesort_input_path(), &schema)?;
    info!(
        stage = %Stage::Loaded,
        quicksort_rows = quicksort.len(),
        mergesort_rows = mergesort.len(),
        "sweep report"
    );

    let quicksort = Aggregator::mean_by(&quicksort, M)?;
    let mergesort = Aggregator::mean_by(&mergesort, M)?;
    info!(
        stage = %Stage::Aggregated,
        quicksort_groups = quicksort.len(),
        mergesort_groups = mergesort.len(),
        "sweep report"
    );

    let charts = render_charts(config, &[(QUICKSORT, &quicksort), (MERGESORT, &mergesort)])?;
    info!(stage = %Stage::Rendered, charts = charts.len(), "sweep report");
    info!(stage = %Stage::Done, "sweep report");

    Ok(SweepReport {
        charts,
        quicksort,
        mergesort,
    })
}

/// Draw every chart in [`CHARTS`], one line per algorithm in the order given.
///
/// Stops at the first failing chart; charts written before it are kept.
pub fn render_charts(
    config: &ReportConfig,
    algorithms: &[(&str, &AggregatedSeries)],
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut written = Vec::with_capacity(CHARTS.len());

    for chart in &CHARTS {
        let series = chart_series(chart, algorithms)?;
        let path = config.graphics_path(chart.file);
        debug!(chart = chart.file, metric = chart.metric, "rendering");
        StaticChartRenderer::render(&chart.spec(config), &series, &path)
            .map_err(PipelineError::render(&path))?;
        written.push(path);
    }

    Ok(written)
}

/// One series per algorithm for `chart`, named and ordered as supplied.
pub fn chart_series(
    chart: &SweepChart,
    algorithms: &[(&str, &AggregatedSeries)],
) -> Result<Vec<Series>, PipelineError> {
    algorithms
        .iter()
        .map(|(name, aggregated)| {
            aggregated
                .points(chart.metric)
                .map(|points| Series::new(*name, points))
                .ok_or_else(|| PipelineError::MissingColumn {
                    input: (*name).to_string(),
                    column: chart.metric.to_string(),
                })
        })
        .collect()
}
