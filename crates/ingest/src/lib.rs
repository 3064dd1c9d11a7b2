//! genelink ingest layer
//!
//! This is where tables enter the pipeline. We read target, relation and
//! reference tables from disk, normalize blank cells to null, and give the
//! matching layer a single [`Table`] type with schema-checked column lookup.
//!
//! ## What we do here
//!
//! - **Read CSV** - UTF-8 first, GBK fallback for files saved by Chinese-locale
//!   spreadsheet tools. Headers are trimmed, ragged rows are padded.
//! - **Read workbooks** - First sheet of `.xlsx`/`.xls`/`.ods` via calamine.
//! - **Parse MCScanX collinearity reports** - Into `Block, GeneA, GeneB, E-value`
//!   rows that work directly as a relation table.
//! - **Check schemas** - [`Table::column`] fails with
//!   [`IngestError::MissingColumn`] naming the table and the column.
//! - **Log everything** - Structured load events via tracing.
//!
//! ## Example
//!
//! ```
//! use ingest::{parse_csv, IngestError};
//!
//! let table = parse_csv("relations.csv", "GeneA,GeneB\nAT1G01010,AT2G01010\n").unwrap();
//! let left = table.column("GeneA").unwrap();
//! let right = table.column("GeneB").unwrap();
//! let pairs = table.column_pairs(left, right);
//! assert_eq!(pairs.len(), 1);
//!
//! let err = table.column("GeneC").unwrap_err();
//! assert!(matches!(err, IngestError::MissingColumn { .. }));
//! ```

mod collinearity;
mod error;
mod reader;
mod table;

pub use crate::collinearity::{
    parse_collinearity, read_collinearity, read_collinearity_with, Collinearity,
    CollinearityOptions, COLLINEARITY_HEADER, MISSING_PARTNER, UNASSIGNED_BLOCK,
};
pub use crate::error::IngestError;
pub use crate::reader::{
    decode_text, parse_csv, read_csv, read_table, read_text, read_workbook, TextEncoding,
};
pub use crate::table::{Cell, Table};
