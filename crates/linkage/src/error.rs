use thiserror::Error;

/// Which input a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Profile,
    Payroll,
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Profile => write!(f, "profile"),
            Self::Payroll => write!(f, "payroll"),
        }
    }
}

/// Row-level failure. The row is skipped and counted; the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The row is shorter than a configured column position.
    #[error("{dataset} line {line}: missing field '{field}' (column {column})")]
    MissingField {
        dataset: Dataset,
        line: u64,
        field: &'static str,
        column: usize,
    },
    #[error("{dataset} line {line}: cannot parse {field} date '{value}'")]
    DateParse {
        dataset: Dataset,
        line: u64,
        field: &'static str,
        value: String,
    },
    #[error("payroll line {line}: cannot parse regular pay '{value}'")]
    PayParse { line: u64, value: String },
}

/// Run-level failure. Aborts the run.
#[derive(Debug, Error)]
pub enum LinkError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (duplicate columns, empty override, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// CSV framing error (not a per-row field problem).
    #[error("{dataset} CSV error: {message}")]
    Csv { dataset: Dataset, message: String },
    /// A payroll was removed from the candidate index but was not there.
    /// Indicates a double match or a bookkeeping bug.
    #[error("invariant violated: payroll row {row} is not indexed under last name '{last_name}'")]
    PayrollNotIndexed { last_name: String, row: usize },
    /// Strict tie policy: more than one candidate survived every stage.
    #[error("ambiguous match for tax id {tax_id}: {} candidates remain ({})", .candidates.len(), .candidates.join("; "))]
    AmbiguousMatch {
        tax_id: String,
        candidates: Vec<String>,
    },
    #[error("IO error: {0}")]
    Io(String),
}

impl LinkError {
    /// True for errors that indicate a correctness problem in the run itself
    /// rather than bad input.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::PayrollNotIndexed { .. })
    }
}
