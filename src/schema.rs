//! Column contract and header validation for entitlement extracts
//!
//! The header must match the declared layout exactly: same count, same
//! names (case-sensitive), same order. Nothing is coerced or repaired.
//!
//! Standard layout:
//!
//! ```text
//! UserID,Username,Acc Priv Category,Role,Entitlement,Acc Priv Group,Title,Department
//! ```
//!
//! The TID variant inserts `TID` after `Username`. Which layout applies is a
//! configuration choice and is never auto-detected.

use crate::error::{AnalysisError, Result, SchemaMismatch};
use serde::{Deserialize, Serialize};
use std::fmt;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A column of the entitlement extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    UserId,
    Username,
    Tid,
    AccPrivCategory,
    Role,
    Entitlement,
    AccPrivGroup,
    Title,
    Department,
}

impl Column {
    /// Header text as it must appear in the file
    pub const fn header(self) -> &'static str {
        match self {
            Column::UserId => "UserID",
            Column::Username => "Username",
            Column::Tid => "TID",
            Column::AccPrivCategory => "Acc Priv Category",
            Column::Role => "Role",
            Column::Entitlement => "Entitlement",
            Column::AccPrivGroup => "Acc Priv Group",
            Column::Title => "Title",
            Column::Department => "Department",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

const STANDARD_COLUMNS: &[Column] = &[
    Column::UserId,
    Column::Username,
    Column::AccPrivCategory,
    Column::Role,
    Column::Entitlement,
    Column::AccPrivGroup,
    Column::Title,
    Column::Department,
];

const TID_COLUMNS: &[Column] = &[
    Column::UserId,
    Column::Username,
    Column::Tid,
    Column::AccPrivCategory,
    Column::Role,
    Column::Entitlement,
    Column::AccPrivGroup,
    Column::Title,
    Column::Department,
];

/// Declared column order for an extract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: &'static [Column],
}

impl ColumnLayout {
    pub fn standard() -> Self {
        Self {
            columns: STANDARD_COLUMNS,
        }
    }

    pub fn with_tid() -> Self {
        Self {
            columns: TID_COLUMNS,
        }
    }

    /// Pick the layout for the `include_tid` configuration flag
    pub fn for_tid(include_tid: bool) -> Self {
        if include_tid {
            Self::with_tid()
        } else {
            Self::standard()
        }
    }

    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn has_tid(&self) -> bool {
        self.columns.contains(&Column::Tid)
    }

    /// Position of `column` in this layout
    pub fn position(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header()).collect()
    }

    /// Check a header row against this layout
    pub fn validate_header<S: AsRef<str>>(&self, header: &[S]) -> Result<()> {
        let mismatch = if header.is_empty() {
            Some(SchemaMismatch::MissingHeader)
        } else if header.len() != self.columns.len() {
            Some(SchemaMismatch::ColumnCount)
        } else {
            self.columns
                .iter()
                .zip(header)
                .position(|(expected, found)| expected.header() != found.as_ref())
                .map(|position| SchemaMismatch::ColumnName { position })
        };

        match mismatch {
            None => Ok(()),
            Some(reason) => Err(AnalysisError::Schema {
                reason,
                expected: self.headers().into_iter().map(String::from).collect(),
                found: header.iter().map(|h| h.as_ref().to_string()).collect(),
            }),
        }
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Rows that passed header validation, unchanged, with their column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    layout: ColumnLayout,
    rows: Vec<Vec<String>>,
    /// Starting file line of each row; empty when rows were supplied directly
    lines: Vec<u64>,
}

impl ValidatedInput {
    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// File line on which data row `row_index` starts, if read from a file
    pub fn source_line(&self, row_index: usize) -> Option<u64> {
        self.lines.get(row_index).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Validate already-decoded rows against `layout`
///
/// Fails with `Schema` on a header mismatch and `EmptyInput` when there
/// are no data rows.
pub fn validate_rows(
    header: &[String],
    rows: Vec<Vec<String>>,
    layout: ColumnLayout,
) -> Result<ValidatedInput> {
    layout.validate_header(header)?;

    if rows.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    Ok(ValidatedInput {
        layout,
        rows,
        lines: Vec::new(),
    })
}

/// Decode raw bytes as UTF-8, dropping a leading byte-order mark
pub fn decode(bytes: &[u8]) -> Result<&str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|e| AnalysisError::Encoding {
        valid_up_to: e.valid_up_to(),
    })
}

/// Decode and parse a CSV extract, then validate it against `layout`
///
/// Rows are read flexibly: a row with the wrong field count is kept as-is
/// and reported later as a row error rather than aborting the parse.
pub fn read_csv(bytes: &[u8], layout: ColumnLayout) -> Result<ValidatedInput> {
    let text = decode(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    // A blank header line parses as one empty field
    let header = if header.len() == 1 && header[0].is_empty() {
        Vec::new()
    } else {
        header
    };
    layout.validate_header(&header)?;

    // A row may span lines (quoted newline) or follow skipped blank lines
    let mut rows = Vec::new();
    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(position) = record.position() {
            lines.push(position.line());
        }
        rows.push(record.iter().map(String::from).collect());
    }

    tracing::debug!(rows = rows.len(), tid = layout.has_tid(), "Validated CSV input");

    let mut validated = validate_rows(&header, rows, layout)?;
    if lines.len() == validated.rows.len() {
        validated.lines = lines;
    }
    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "UserID,Username,Acc Priv Category,Role,Entitlement,Acc Priv Group,Title,Department";

    #[test]
    fn test_standard_layout_headers() {
        let layout = ColumnLayout::standard();
        assert_eq!(layout.len(), 8);
        assert!(!layout.has_tid());
        assert_eq!(layout.headers().join(","), HEADER);
    }

    #[test]
    fn test_tid_follows_username() {
        let layout = ColumnLayout::with_tid();
        assert_eq!(layout.len(), 9);
        assert_eq!(layout.position(Column::Username), Some(1));
        assert_eq!(layout.position(Column::Tid), Some(2));
        assert_eq!(ColumnLayout::for_tid(false), ColumnLayout::standard());
    }

    #[test]
    fn test_read_valid_csv() {
        let input = format!("{}\nu1,alice,Priv,Clerk,Read,G1,Analyst,Finance\n", HEADER);
        let validated = read_csv(input.as_bytes(), ColumnLayout::standard()).unwrap();
        assert_eq!(validated.len(), 1);
        assert_eq!(validated.rows()[0][4], "Read");
    }

    #[test]
    fn test_missing_department_is_schema_error() {
        let input = "UserID,Username,Acc Priv Category,Role,Entitlement,Acc Priv Group,Title\n\
                     u1,alice,Priv,Clerk,Read,G1,Analyst\n";
        let err = read_csv(input.as_bytes(), ColumnLayout::standard()).unwrap_err();
        match err {
            AnalysisError::Schema { reason, found, .. } => {
                assert_eq!(reason, SchemaMismatch::ColumnCount);
                assert_eq!(found.len(), 7);
            }
            other => panic!("Expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_header_case_sensitive() {
        let header: Vec<String> = HEADER.replace("UserID", "UserId").split(',').map(String::from).collect();
        let err = ColumnLayout::standard().validate_header(&header).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Schema {
                reason: SchemaMismatch::ColumnName { position: 0 },
                ..
            }
        ));
    }

    #[test]
    fn test_header_order_matters() {
        let header: Vec<String> = "UserID,Username,Acc Priv Category,Role,Entitlement,Acc Priv Group,Department,Title"
            .split(',')
            .map(String::from)
            .collect();
        let err = ColumnLayout::standard().validate_header(&header).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Schema {
                reason: SchemaMismatch::ColumnName { position: 6 },
                ..
            }
        ));
    }

    #[test]
    fn test_tid_not_auto_detected() {
        let input = "UserID,Username,TID,Acc Priv Category,Role,Entitlement,Acc Priv Group,Title,Department\n\
                     u1,alice,T1,Priv,Clerk,Read,G1,Analyst,Finance\n";
        assert!(read_csv(input.as_bytes(), ColumnLayout::standard()).is_err());
        assert!(read_csv(input.as_bytes(), ColumnLayout::with_tid()).is_ok());
    }

    #[test]
    fn test_header_only_is_empty_input() {
        let input = format!("{}\n", HEADER);
        let err = read_csv(input.as_bytes(), ColumnLayout::standard()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput));
    }

    #[test]
    fn test_empty_bytes_is_missing_header() {
        let err = read_csv(b"", ColumnLayout::standard()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Schema {
                reason: SchemaMismatch::MissingHeader,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_utf8_is_encoding_error() {
        let mut input = HEADER.as_bytes().to_vec();
        input.extend_from_slice(b"\nu1,\xFF\xFE,Priv,Clerk,Read,G1,Analyst,Finance\n");
        let err = read_csv(&input, ColumnLayout::standard()).unwrap_err();
        match err {
            AnalysisError::Encoding { valid_up_to } => assert_eq!(valid_up_to, HEADER.len() + 4),
            other => panic!("Expected Encoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut input = UTF8_BOM.to_vec();
        input.extend_from_slice(format!("{}\nu1,a,P,R,E,G,T,D\n", HEADER).as_bytes());
        assert!(read_csv(&input, ColumnLayout::standard()).is_ok());
    }

    #[test]
    fn test_short_row_kept_for_row_validation() {
        let input = format!("{}\nu1,alice,Priv\n", HEADER);
        let validated = read_csv(input.as_bytes(), ColumnLayout::standard()).unwrap();
        assert_eq!(validated.rows()[0].len(), 3);
    }

    #[test]
    fn test_source_lines_follow_the_file() {
        let input = format!("{}\nu1,\"alice\nsmith\",P,R,E,G,T,D\n\nu2,bob,P,R,E,G,T,D\n", HEADER);
        let validated = read_csv(input.as_bytes(), ColumnLayout::standard()).unwrap();
        assert_eq!(validated.len(), 2);
        assert_eq!(validated.source_line(0), Some(2));
        assert_eq!(validated.source_line(1), Some(5));
    }

    #[test]
    fn test_supplied_rows_have_no_source_lines() {
        let header: Vec<String> = HEADER.split(',').map(String::from).collect();
        let row: Vec<String> = "u1,a,P,R,E,G,T,D".split(',').map(String::from).collect();
        let validated = validate_rows(&header, vec![row], ColumnLayout::standard()).unwrap();
        assert_eq!(validated.source_line(0), None);
    }
}
