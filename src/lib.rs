//! sortplot - external-sort experiment reports
//!
//! Loads the result tables written by the external quicksort/mergesort
//! experiment runner, averages repeated runs per memory budget `m`, and
//! renders the comparison charts as PNG images.
//!
//! Two reports are available, each a fixed sequence of load, aggregate and
//! render steps:
//!
//! * [`pipeline::arity`]: I/O count of external mergesort per merge arity.
//! * [`pipeline::sweep`]: I/Os and running time of both algorithms per `m`,
//!   on a linear and a logarithmic scale.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;

pub use config::ReportConfig;
pub use pipeline::PipelineError;
