//! Pipeline module - the two report runs
//!
//! Both runs move through the same stages and stop at the first failure:
//! `Start -> Loaded -> Aggregated -> Rendered -> Done`. The arity run has no
//! aggregation stage.

pub mod arity;
pub mod sweep;

use crate::charts::RenderError;
use crate::data::LoadError;
use crate::stats::AggregateError;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("loading failed: {0}")]
    Load(#[from] LoadError),
    #[error("aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),
    #[error("{input}: column `{column}` has no plottable values")]
    MissingColumn { input: String, column: String },
    #[error("rendering {chart} failed: {source}")]
    Render {
        chart: String,
        #[source]
        source: RenderError,
    },
}

impl PipelineError {
    pub(crate) fn render(chart: &Path) -> impl FnOnce(RenderError) -> Self + '_ {
        move |source| PipelineError::Render {
            chart: chart.display().to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Loaded,
    Aggregated,
    Rendered,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Loaded => "loaded",
            Stage::Aggregated => "aggregated",
            Stage::Rendered => "rendered",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}
