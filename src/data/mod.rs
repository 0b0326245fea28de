//! Data module - result file loading and schema validation

mod loader;
pub mod schema;

pub use loader::{DataLoader, LoadError, ResultTable};
pub use schema::{ColumnKind, ColumnSpec, Domain, TableSchema};
