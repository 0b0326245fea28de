//! Renders `results/arity_plot.png` from `results/arity_results.txt`.

use anyhow::{Context, Result};
use sortplot::pipeline::arity;
use sortplot::ReportConfig;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let config = ReportConfig::default();
    info!(config = %serde_json::to_string(&config)?, "configuration");

    let report = arity::run(&config).context("arity report failed")?;
    info!(
        chart = %report.chart.display(),
        points = report.points.len(),
        best = %serde_json::to_string(&report.best)?,
        "arity report complete"
    );
    Ok(())
}
