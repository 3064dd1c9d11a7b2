//! In-memory tables.
//!
//! A [`Table`] is a named header plus rows of optional cells. Blank cells
//! (empty or whitespace only) are stored as `None` so every consumer sees the
//! same notion of null. Rows are padded to the header width on insert.

use canonical::{is_blank, Identifier};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// A single table cell; `None` is a null/blank cell.
pub type Cell = Option<String>;

/// Header plus rows, as loaded from a CSV, workbook or collinearity file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Empty table with the given header.
    pub fn new<S: Into<String>>(name: impl Into<String>, header: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            header: header.into_iter().map(|h| h.into().trim().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a table from text rows; blank strings become null cells.
    ///
    /// ```rust
    /// use ingest::Table;
    ///
    /// let t = Table::from_text_rows("info", ["L", "R"], [["a", "b"], ["c", " "]]);
    /// assert_eq!(t.len(), 2);
    /// assert_eq!(t.cell(1, 1), None);
    /// ```
    pub fn from_text_rows<H, R, C, S>(name: impl Into<String>, header: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Table::new(name, header);
        for row in rows {
            table.push_text_row(row);
        }
        table
    }

    /// Appends a row of optional cells, padding or truncating to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.header.len(), None);
        for cell in row.iter_mut() {
            if cell.as_deref().is_some_and(is_blank) {
                *cell = None;
            }
        }
        self.rows.push(row);
    }

    /// Appends a row of text cells; blank text becomes a null cell.
    pub fn push_text_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let row = cells
            .into_iter()
            .map(|c| Some(c.as_ref().to_string()))
            .collect();
        self.push_row(row);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Number of data rows (the header is not counted).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Position of a column by header name.
    ///
    /// Header names are compared after trimming. A missing column is a
    /// schema error naming both the column and this table.
    pub fn column(&self, name: &str) -> Result<usize, IngestError> {
        let wanted = name.trim();
        self.header
            .iter()
            .position(|h| h == wanted)
            .ok_or_else(|| IngestError::missing_column(&self.name, wanted))
    }

    /// Resolves several columns at once; fails on the first missing one.
    pub fn require_columns(&self, names: &[&str]) -> Result<Vec<usize>, IngestError> {
        names.iter().map(|n| self.column(n)).collect()
    }

    /// Cell text, `None` for null cells or out-of-range positions.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }

    /// Column values as identifiers, one entry per row.
    pub fn identifiers(&self, column: usize) -> impl Iterator<Item = Option<Identifier>> + '_ {
        self.rows
            .iter()
            .map(move |row| Identifier::from_cell(row.get(column).and_then(|c| c.as_deref())))
    }

    /// Row-wise `(left, right)` identifier pairs for two columns.
    pub fn column_pairs(
        &self,
        left: usize,
        right: usize,
    ) -> Vec<(Option<Identifier>, Option<Identifier>)> {
        self.identifiers(left).zip(self.identifiers(right)).collect()
    }
}
