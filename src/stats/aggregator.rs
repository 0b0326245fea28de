//! Aggregator Module
//! Groups a result table by its key column and averages every other column.

use crate::data::ResultTable;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq)]
pub enum AggregateError {
    #[error("{input}: unknown grouping column `{column}`")]
    UnknownColumn { input: String, column: String },
    #[error("{input}: row {row} has no value for key column `{column}`")]
    EmptyGroupKey {
        input: String,
        column: String,
        row: usize,
    },
    #[error("{input}: row {row} has no value for column `{column}`")]
    MissingValue {
        input: String,
        column: String,
        row: usize,
    },
}

/// All rows sharing one key value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub key: f64,
    /// Number of rows averaged into this group.
    pub count: usize,
    /// One mean per value column, in `AggregatedSeries::columns` order.
    pub means: Vec<f64>,
}

/// Per-key means, sorted ascending by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedSeries {
    key: String,
    columns: Vec<String>,
    groups: Vec<Group>,
}

impl AggregatedSeries {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn keys(&self) -> Vec<f64> {
        self.groups.iter().map(|g| g.key).collect()
    }

    /// Means of `column` in key order.
    pub fn means(&self, column: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.groups.iter().map(|g| g.means[idx]).collect())
    }

    /// `(key, mean)` pairs for `column`, ready for plotting.
    pub fn points(&self, column: &str) -> Option<Vec<(f64, f64)>> {
        let means = self.means(column)?;
        Some(self.keys().into_iter().zip(means).collect())
    }
}

pub struct Aggregator;

impl Aggregator {
    /// Group `table` by the literal value of `key` and average the rest.
    ///
    /// Keys are compared bit for bit, never within a tolerance. Rows are
    /// ordered by key with `f64::total_cmp`; an empty table yields an empty
    /// series.
    pub fn mean_by(table: &ResultTable, key: &str) -> Result<AggregatedSeries, AggregateError> {
        let input = table.input();
        let unknown = || AggregateError::UnknownColumn {
            input: input.to_string(),
            column: key.to_string(),
        };

        if table.schema().column(key).is_none() {
            return Err(unknown());
        }
        let keys = table.values(key).ok_or_else(unknown)?;

        let columns: Vec<String> = table
            .schema()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .filter(|name| name != key)
            .collect();

        let mut values: Vec<Vec<f64>> = Vec::with_capacity(columns.len());
        for column in &columns {
            let cells = table.values(column).ok_or_else(|| AggregateError::UnknownColumn {
                input: input.to_string(),
                column: column.clone(),
            })?;
            let dense = cells
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.ok_or_else(|| AggregateError::MissingValue {
                        input: input.to_string(),
                        column: column.clone(),
                        row: row + 1,
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            values.push(dense);
        }

        let mut keyed = keys
            .into_iter()
            .enumerate()
            .map(|(row, k)| match k {
                Some(k) if !k.is_nan() => Ok((row, k)),
                _ => Err(AggregateError::EmptyGroupKey {
                    input: input.to_string(),
                    column: key.to_string(),
                    row: row + 1,
                }),
            })
            .collect::<Result<Vec<(usize, f64)>, _>>()?;

        // Stable, so rows within a group stay in source order.
        keyed.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut groups = Vec::new();
        let mut start = 0;
        while start < keyed.len() {
            let bits = keyed[start].1.to_bits();
            let end = keyed[start..]
                .iter()
                .position(|(_, k)| k.to_bits() != bits)
                .map_or(keyed.len(), |n| start + n);
            let rows = &keyed[start..end];

            // Plain sum over count, accumulated in source order.
            let means = values
                .iter()
                .map(|column| {
                    rows.iter().map(|&(row, _)| column[row]).sum::<f64>() / rows.len() as f64
                })
                .collect();

            debug!(key = keyed[start].1, count = rows.len(), "aggregated group");
            groups.push(Group {
                key: keyed[start].1,
                count: rows.len(),
                means,
            });
            start = end;
        }

        Ok(AggregatedSeries {
            key: key.to_string(),
            columns,
            groups,
        })
    }
}
