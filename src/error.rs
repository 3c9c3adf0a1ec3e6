//! Error taxonomy for the entitlement analysis engine
//!
//! Validation failures (`Schema`, `Encoding`, `EmptyInput`) abort a run before
//! any table is built. Row failures are carried as [`RowError`] values so the
//! caller can report every bad row at once.

use crate::schema::Column;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a header failed the column contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaMismatch {
    /// Input had no header row at all
    MissingHeader,
    /// Header has a different number of columns
    ColumnCount,
    /// Column at `position` (zero-based) has the wrong name
    ColumnName { position: usize },
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaMismatch::MissingHeader => write!(f, "missing header"),
            SchemaMismatch::ColumnCount => write!(f, "column count differs"),
            SchemaMismatch::ColumnName { position } => {
                write!(f, "column {} differs", position + 1)
            }
        }
    }
}

/// What is wrong with a single data row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFault {
    /// A required field is empty after trimming
    BlankRequired,
    /// Row does not have one field per declared column
    FieldCount { expected: usize, found: usize },
}

/// A data row that violates a required-field constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// Zero-based index into the data rows (header excluded)
    pub row_index: usize,
    /// Offending column, when the fault is tied to one field
    pub field: Option<Column>,
    pub fault: RowFault,
    /// Line the row starts on in the source file, when read from one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_line: Option<u64>,
}

impl RowError {
    pub fn blank(row_index: usize, field: Column) -> Self {
        Self {
            row_index,
            field: Some(field),
            fault: RowFault::BlankRequired,
            source_line: None,
        }
    }

    pub fn field_count(row_index: usize, expected: usize, found: usize) -> Self {
        Self {
            row_index,
            field: None,
            fault: RowFault::FieldCount { expected, found },
            source_line: None,
        }
    }

    pub fn at_line(mut self, source_line: Option<u64>) -> Self {
        self.source_line = source_line;
        self
    }

    /// 1-based physical line in the source file (the header is line 1)
    ///
    /// Rows that did not come from a file are assumed to be one per line
    /// directly after the header.
    pub fn line(&self) -> u64 {
        self.source_line.unwrap_or(self.row_index as u64 + 2)
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.fault, self.field) {
            (RowFault::BlankRequired, Some(field)) => {
                write!(f, "row {} (line {}): {} is empty", self.row_index, self.line(), field)
            }
            (RowFault::BlankRequired, None) => {
                write!(f, "row {} (line {}): required field is empty", self.row_index, self.line())
            }
            (RowFault::FieldCount { expected, found }, _) => write!(
                f,
                "row {} (line {}): expected {} fields, found {}",
                self.row_index,
                self.line(),
                expected,
                found
            ),
        }
    }
}

impl std::error::Error for RowError {}

/// Errors that can occur while analysing an entitlement extract
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Schema mismatch ({reason}): expected columns {expected:?}, found {found:?}")]
    Schema {
        reason: SchemaMismatch,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Input is not valid UTF-8 (invalid byte sequence at offset {valid_up_to})")]
    Encoding { valid_up_to: usize },

    #[error("Input has a header but no data rows")]
    EmptyInput,

    #[error("{}", summarize_rows(.0))]
    Rows(Vec<RowError>),

    #[error("Invalid configuration: {option} = {value} ({reason})")]
    Config {
        option: &'static str,
        value: String,
        reason: String,
    },

    #[error("Peer group {group} has no members")]
    DegenerateGroup { group: String },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Row errors carried by this error, empty for every other variant
    pub fn row_errors(&self) -> &[RowError] {
        match self {
            AnalysisError::Rows(rows) => rows,
            _ => &[],
        }
    }
}

fn summarize_rows(rows: &[RowError]) -> String {
    match rows {
        [] => "Invalid rows".to_string(),
        [only] => format!("Invalid row: {}", only),
        [first, rest @ ..] => format!("{} invalid rows; first: {}", rest.len() + 1, first),
    }
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
