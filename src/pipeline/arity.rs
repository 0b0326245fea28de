//! Arity report: I/O count of external mergesort per merge arity.
//!
//! Rows are plotted as read, one point per row, without aggregation.

use super::{PipelineError, Stage};
use crate::charts::{ChartSpec, Series, StaticChartRenderer};
use crate::config::ReportConfig;
use crate::data::schema::{ARITY, ARITY_IO};
use crate::data::{DataLoader, TableSchema};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

pub const TITLE: &str = "I/O count vs arity in external mergesort";
pub const X_LABEL: &str = "Arity";
pub const Y_LABEL: &str = "I/O count";

/// Arity with the fewest I/Os.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BestArity {
    pub arity: u64,
    pub io_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArityReport {
    pub chart: PathBuf,
    pub points: Vec<(f64, f64)>,
    pub best: Option<BestArity>,
}

/// Lowest I/O count; the earliest row wins a tie.
pub fn best_arity(points: &[(f64, f64)]) -> Option<BestArity> {
    points
        .iter()
        .copied()
        .reduce(|best, p| if p.1 < best.1 { p } else { best })
        .map(|(arity, io)| BestArity {
            arity: arity as u64,
            io_count: io as u64,
        })
}

pub fn chart_spec(config: &ReportConfig) -> ChartSpec {
    let (width, height) = config.arity_chart_size;
    ChartSpec::new(X_LABEL, Y_LABEL)
        .with_title(TITLE)
        .with_grid(true)
        .with_size(width, height)
}

pub fn run(config: &ReportConfig) -> Result<ArityReport, PipelineError> {
    info!(stage = %Stage::Start, "arity report");

    let table = DataLoader::load_csv(&config.arity_input_path(), &TableSchema::arity())?;
    let points = table
        .points(ARITY, ARITY_IO)
        .ok_or_else(|| PipelineError::MissingColumn {
            input: table.input().to_string(),
            column: ARITY_IO.to_string(),
        })?;
    info!(stage = %Stage::Loaded, rows = points.len(), "arity report");

    let chart = config.arity_chart_path();
    let series = [Series::new(Y_LABEL, points.clone())];
    StaticChartRenderer::render(&chart_spec(config), &series, &chart)
        .map_err(PipelineError::render(&chart))?;
    info!(stage = %Stage::Rendered, chart = %chart.display(), "arity report");

    let best = best_arity(&points);
    if let Some(best) = best {
        info!(arity = best.arity, io = best.io_count, "best arity");
    }
    info!(stage = %Stage::Done, "arity report");

    Ok(ArityReport {
        chart,
        points,
        best,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_arity_is_the_minimum() {
        let points = [(2.0, 900.0), (64.0, 310.0), (8.0, 420.0)];
        assert_eq!(
            best_arity(&points),
            Some(BestArity {
                arity: 64,
                io_count: 310
            })
        );
    }

    #[test]
    fn best_arity_keeps_the_first_tie() {
        let points = [(16.0, 300.0), (32.0, 300.0)];
        assert_eq!(best_arity(&points).map(|b| b.arity), Some(16));
    }

    #[test]
    fn no_rows_no_best_arity() {
        assert_eq!(best_arity(&[]), None);
    }

    #[test]
    fn arity_chart_has_grid_and_title() {
        let spec = chart_spec(&ReportConfig::default());
        assert!(spec.grid);
        assert_eq!(spec.title.as_deref(), Some(TITLE));
        assert_eq!(spec.size, (1000, 600));
    }
}
