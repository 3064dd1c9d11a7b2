//! Error types for table loading.
//!
//! Everything that can go wrong between a file on disk and a [`Table`](crate::Table)
//! in memory maps onto [`IngestError`]. Variants carry owned strings rather
//! than the underlying library errors so the enum stays `Clone + PartialEq`,
//! which keeps test assertions simple.
//!
//! # Error Categories
//!
//! | Category | Variants | Typical cause |
//! |----------|----------|---------------|
//! | Schema | [`MissingColumn`](IngestError::MissingColumn) | Column name typo, wrong file picked |
//! | File access | [`Io`](IngestError::Io) | Missing file, permissions |
//! | Parsing | [`Csv`](IngestError::Csv), [`Workbook`](IngestError::Workbook), [`Collinearity`](IngestError::Collinearity) | Malformed content |
//! | Routing | [`UnsupportedFormat`](IngestError::UnsupportedFormat) | Unknown file extension |
//!
//! Schema errors are the ones matching sessions care about: they are raised
//! before any index is built and abort the whole batch.

use thiserror::Error;

/// Errors produced while loading or inspecting tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// A designated column is not present in the table header.
    ///
    /// Both the table name and the column name are carried so the message can
    /// be shown to the user verbatim.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ingest::IngestError;
    ///
    /// let err = IngestError::MissingColumn {
    ///     table: "relations.csv".into(),
    ///     column: "GeneB".into(),
    /// };
    /// assert!(err.to_string().contains("GeneB"));
    /// assert!(err.to_string().contains("relations.csv"));
    /// ```
    #[error("table '{table}' has no column named '{column}'")]
    MissingColumn { table: String, column: String },

    /// The file could not be opened or read.
    #[error("failed to read '{path}': {message}")]
    Io { path: String, message: String },

    /// The CSV reader rejected a record.
    #[error("malformed CSV in '{table}': {message}")]
    Csv { table: String, message: String },

    /// The spreadsheet could not be opened or holds no readable sheet.
    #[error("failed to read workbook '{path}': {message}")]
    Workbook { path: String, message: String },

    /// A collinearity line could not be interpreted.
    ///
    /// `line` is 1-based.
    #[error("collinearity parse error at line {line}: {message}")]
    Collinearity { line: usize, message: String },

    /// The file extension maps to no known reader.
    #[error("unsupported table format '{0}' (expected csv, xlsx, xls or collinearity)")]
    UnsupportedFormat(String),
}

impl IngestError {
    /// Convenience constructor for schema errors.
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        IngestError::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// True when the error is a schema problem rather than a file problem.
    pub fn is_schema(&self) -> bool {
        matches!(self, IngestError::MissingColumn { .. })
    }
}
