//! Table Schema Module
//! Declares the columns each experiment result file must carry.

/// Key column of the arity results file.
pub const ARITY: &str = "Arity";
/// I/O count column of the arity results file, as written by the runner.
pub const ARITY_IO: &str = "I/O's";
/// Memory-budget sweep parameter.
pub const M: &str = "m";
pub const IO_OPERATIONS: &str = "IO_operations";
pub const TIME_SECONDS: &str = "time_seconds";

/// How a cell is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Signed 64-bit integer.
    Integer,
    /// Finite 64-bit float.
    Real,
}

/// Range a parsed value must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Domain {
    #[default]
    Any,
    NonNegative,
    Positive,
}

impl Domain {
    /// Returns a description of the violation, if any.
    pub fn check(self, value: f64) -> Option<&'static str> {
        match self {
            Domain::Any => None,
            Domain::NonNegative if value < 0.0 => Some("must not be negative"),
            Domain::Positive if value <= 0.0 => Some("must be positive"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    name: String,
    kind: ColumnKind,
    domain: Domain,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind, domain: Domain) -> Self {
        Self {
            name: name.into(),
            kind,
            domain,
        }
    }

    pub fn integer(name: impl Into<String>, domain: Domain) -> Self {
        Self::new(name, ColumnKind::Integer, domain)
    }

    pub fn real(name: impl Into<String>, domain: Domain) -> Self {
        Self::new(name, ColumnKind::Real, domain)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }
}

/// Ordered set of required columns, optionally with a grouping key.
///
/// Column names are matched exactly (case- and spelling-sensitive). Columns
/// present in a file but absent from the schema are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<ColumnSpec>,
    key: Option<String>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns, key: None }
    }

    /// Mark `name` as the grouping key. Missing cells in the key column are
    /// kept as nulls instead of failing the load.
    pub fn with_key(mut self, name: impl Into<String>) -> Self {
        self.key = Some(name.into());
        self
    }

    /// Schema of `results/arity_results.txt`.
    pub fn arity() -> Self {
        Self::new(vec![
            ColumnSpec::integer(ARITY, Domain::Positive),
            ColumnSpec::integer(ARITY_IO, Domain::NonNegative),
        ])
    }

    /// Schema of the per-algorithm sweep result files, keyed by `m`.
    pub fn sweep() -> Self {
        Self::new(vec![
            ColumnSpec::real(M, Domain::Positive),
            ColumnSpec::integer(IO_OPERATIONS, Domain::NonNegative),
            ColumnSpec::real(TIME_SECONDS, Domain::NonNegative),
        ])
        .with_key(M)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_key(&self, name: &str) -> bool {
        self.key() == Some(name)
    }

    /// Column names in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}
