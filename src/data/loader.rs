//! CSV Data Loader Module
//! Reads experiment result files with Polars and validates them against a schema.

use crate::data::schema::{ColumnKind, ColumnSpec, TableSchema};
use polars::prelude::*;
use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("input file not found: {0}")]
    FileNotFound(String),
    #[error("failed to read {input}: {source}")]
    Io {
        input: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse CSV {input}: {source}")]
    Csv {
        input: String,
        #[source]
        source: PolarsError,
    },
    #[error("{input}: missing column(s) {missing:?}, header has {found:?}")]
    SchemaMismatch {
        input: String,
        missing: Vec<String>,
        found: Vec<String>,
    },
    #[error("{input}: row {row}, column `{column}`: {reason} (got {value:?})")]
    MalformedRow {
        input: String,
        row: usize,
        column: String,
        value: String,
        reason: String,
    },
}

/// A validated experiment result table.
///
/// Holds one typed Polars column per schema column (`Int64` or `Float64`),
/// in schema order, with rows in source order.
#[derive(Debug, Clone)]
pub struct ResultTable {
    input: String,
    schema: TableSchema,
    df: DataFrame,
}

impl ResultTable {
    /// Name of the file (or label) the table was read from.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Values of a column widened to `f64`; `None` if the column is unknown.
    /// Missing key cells come back as `None` entries.
    pub fn values(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let series = self.df.column(column).ok()?.as_materialized_series();
        let widened = series.cast(&DataType::Float64).ok()?;
        let ca = widened.f64().ok()?;
        Some(ca.into_iter().collect())
    }

    /// `(x, y)` pairs in row order, skipping rows where either cell is missing.
    pub fn points(&self, x: &str, y: &str) -> Option<Vec<(f64, f64)>> {
        let xs = self.values(x)?;
        let ys = self.values(y)?;
        Some(
            xs.into_iter()
                .zip(ys)
                .filter_map(|(x, y)| Some((x?, y?)))
                .collect(),
        )
    }
}

/// Loads result tables from delimited text.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file and validate it against `schema`.
    pub fn load_csv(path: &Path, schema: &TableSchema) -> Result<ResultTable, LoadError> {
        let input = path.display().to_string();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::FileNotFound(input.clone()),
            _ => LoadError::Io {
                input: input.clone(),
                source: e,
            },
        })?;

        let raw = Self::read_options()
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|source| LoadError::Csv {
                input: input.clone(),
                source,
            })?;

        let table = Self::validate(input, schema, &raw)?;
        info!(input = table.input(), rows = table.len(), "loaded result table");
        Ok(table)
    }

    /// Parse in-memory CSV text; `label` names the input in errors.
    pub fn parse_csv(label: &str, text: &str, schema: &TableSchema) -> Result<ResultTable, LoadError> {
        let raw = Self::read_options()
            .into_reader_with_file_handle(Cursor::new(text.as_bytes().to_vec()))
            .finish()
            .map_err(|source| LoadError::Csv {
                input: label.to_string(),
                source,
            })?;

        Self::validate(label.to_string(), schema, &raw)
    }

    /// Every column is read as text so parsing stays under our control.
    fn read_options() -> CsvReadOptions {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
    }

    fn validate(
        input: String,
        schema: &TableSchema,
        raw: &DataFrame,
    ) -> Result<ResultTable, LoadError> {
        let found: Vec<String> = raw
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let missing: Vec<String> = schema
            .columns()
            .iter()
            .filter(|spec| !found.iter().any(|name| name == spec.name()))
            .map(|spec| spec.name().to_string())
            .collect();

        if !missing.is_empty() {
            return Err(LoadError::SchemaMismatch {
                input,
                missing,
                found,
            });
        }

        let mut columns = Vec::with_capacity(schema.columns().len());
        for spec in schema.columns() {
            let text = raw
                .column(spec.name())
                .and_then(|c| c.as_materialized_series().str().cloned())
                .map_err(|source| LoadError::Csv {
                    input: input.clone(),
                    source,
                })?;

            let cells: Vec<Option<&str>> = text.into_iter().collect();
            let nullable = schema.is_key(spec.name());
            let column = match spec.kind() {
                ColumnKind::Integer => {
                    let values = parse_column::<i64>(&input, spec, &cells, nullable)?;
                    Column::new(spec.name().into(), values)
                }
                ColumnKind::Real => {
                    let values = parse_column::<f64>(&input, spec, &cells, nullable)?;
                    Column::new(spec.name().into(), values)
                }
            };
            debug!(input = %input, column = spec.name(), "parsed column");
            columns.push(column);
        }

        let df = DataFrame::new(columns).map_err(|source| LoadError::Csv {
            input: input.clone(),
            source,
        })?;

        Ok(ResultTable {
            input,
            schema: schema.clone(),
            df,
        })
    }
}

trait Cell: FromStr + Copy {
    fn as_f64(self) -> f64;
}

impl Cell for i64 {
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Cell for f64 {
    fn as_f64(self) -> f64 {
        self
    }
}

fn parse_column<T: Cell>(
    input: &str,
    spec: &ColumnSpec,
    cells: &[Option<&str>],
    nullable: bool,
) -> Result<Vec<Option<T>>, LoadError> {
    let malformed = |row: usize, value: &str, reason: &str| LoadError::MalformedRow {
        input: input.to_string(),
        row: row + 1,
        column: spec.name().to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    cells
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            let text = cell.map(str::trim).unwrap_or_default();
            if text.is_empty() {
                return if nullable {
                    Ok(None)
                } else {
                    Err(malformed(row, text, "missing value"))
                };
            }

            let value: T = text.parse().map_err(|_| {
                let expected = match spec.kind() {
                    ColumnKind::Integer => "expected an integer",
                    ColumnKind::Real => "expected a number",
                };
                malformed(row, text, expected)
            })?;

            let wide = value.as_f64();
            if !wide.is_finite() {
                return Err(malformed(row, text, "must be finite"));
            }
            if let Some(reason) = spec.domain().check(wide) {
                return Err(malformed(row, text, reason));
            }
            Ok(Some(value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{ARITY, ARITY_IO, IO_OPERATIONS, M, TIME_SECONDS};

    fn sweep(text: &str) -> Result<ResultTable, LoadError> {
        DataLoader::parse_csv("sweep.csv", text, &TableSchema::sweep())
    }

    #[test]
    fn loads_sweep_rows_in_source_order() {
        let table = sweep("m,sequence,IO_operations,time_seconds\n20,1,30,0.5\n10,1,50,1.0\n")
            .expect("valid table");

        assert_eq!(table.len(), 2);
        assert_eq!(table.values(M), Some(vec![Some(20.0), Some(10.0)]));
        assert_eq!(table.values(IO_OPERATIONS), Some(vec![Some(30.0), Some(50.0)]));
        assert_eq!(table.values(TIME_SECONDS), Some(vec![Some(0.5), Some(1.0)]));
        assert_eq!(table.values("sequence"), None);
    }

    #[test]
    fn typed_columns_follow_the_schema() {
        let table = sweep("m,IO_operations,time_seconds\n10,50,1.0\n").expect("valid table");
        let df = table.dataframe();
        assert_eq!(df.column(M).map(|c| c.dtype().clone()).ok(), Some(DataType::Float64));
        assert_eq!(
            df.column(IO_OPERATIONS).map(|c| c.dtype().clone()).ok(),
            Some(DataType::Int64)
        );
    }

    #[test]
    fn header_only_is_an_empty_table() {
        let table = sweep("m,IO_operations,time_seconds\n").expect("valid table");
        assert!(table.is_empty());
        assert_eq!(table.values(M), Some(Vec::new()));
    }

    #[test]
    fn column_names_are_case_sensitive() {
        let err = sweep("M,IO_operations,time_seconds\n10,50,1.0\n").unwrap_err();
        match err {
            LoadError::SchemaMismatch { missing, found, .. } => {
                assert_eq!(missing, vec![M.to_string()]);
                assert!(found.contains(&"M".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparseable_integer_is_malformed() {
        let err = sweep("m,IO_operations,time_seconds\n10,50,1.0\n10,6x,1.2\n").unwrap_err();
        match err {
            LoadError::MalformedRow { row, column, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, IO_OPERATIONS);
                assert_eq!(value, "6x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fractional_io_count_is_malformed() {
        let err = sweep("m,IO_operations,time_seconds\n10,50.5,1.0\n").unwrap_err();
        assert!(matches!(err, LoadError::MalformedRow { ref column, .. } if column == IO_OPERATIONS));
    }

    #[test]
    fn negative_time_is_out_of_domain() {
        let err = sweep("m,IO_operations,time_seconds\n10,50,-1.0\n").unwrap_err();
        assert!(err.to_string().contains("must not be negative"));
    }

    #[test]
    fn missing_key_cell_is_kept_as_null() {
        let table = sweep("m,IO_operations,time_seconds\n,50,1.0\n").expect("nullable key");
        assert_eq!(table.values(M), Some(vec![None]));
    }

    #[test]
    fn missing_value_cell_is_malformed() {
        let err = sweep("m,IO_operations,time_seconds\n10,,1.0\n").unwrap_err();
        assert!(err.to_string().contains("missing value"));
    }

    #[test]
    fn arity_points_keep_row_order() {
        let table = DataLoader::parse_csv(
            "arity.txt",
            "Arity,I/O's\n4,400\n1,1000\n2,600\n",
            &TableSchema::arity(),
        )
        .expect("valid table");

        assert_eq!(
            table.points(ARITY, ARITY_IO),
            Some(vec![(4.0, 400.0), (1.0, 1000.0), (2.0, 600.0)])
        );
    }

    #[test]
    fn zero_arity_is_rejected() {
        let err = DataLoader::parse_csv("arity.txt", "Arity,I/O's\n0,10\n", &TableSchema::arity())
            .unwrap_err();
        assert!(matches!(err, LoadError::MalformedRow { ref column, .. } if column == ARITY));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = DataLoader::load_csv(Path::new("does/not/exist.csv"), &TableSchema::sweep())
            .unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound(_)));
    }
}
