//! Stats module - per-key aggregation of result tables

mod aggregator;

pub use aggregator::{AggregateError, AggregatedSeries, Aggregator, Group};
