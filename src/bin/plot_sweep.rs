//! Renders the quicksort vs mergesort charts under `results/graphics/`.

use anyhow::{Context, Result};
use sortplot::pipeline::sweep;
use sortplot::ReportConfig;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let config = ReportConfig::default();
    info!(config = %serde_json::to_string(&config)?, "configuration");

    let report = sweep::run(&config).context("sweep report failed")?;
    for chart in &report.charts {
        info!(chart = %chart.display(), "written");
    }
    info!(
        quicksort = %serde_json::to_string(&report.quicksort)?,
        mergesort = %serde_json::to_string(&report.mergesort)?,
        "sweep report complete"
    );
    Ok(())
}
