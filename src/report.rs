//! Writers for rendered tables, raw tables and batch reports.
//!
//! CSV output keeps the rendered cell values only; fuzzy flags are a
//! presentation concern and are available through [`write_report_json`] or
//! the [`RenderedTable`] itself.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use ingest::Table;
use matcher::{BatchReport, RenderedTable};
use tracing::info;

use crate::PipelineError;

/// Writes `table` as CSV, header first.
pub fn write_csv<W: Write>(
    table: &RenderedTable,
    writer: W,
    delimiter: u8,
) -> Result<(), PipelineError> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(false)
        .from_writer(writer);
    out.write_record(&table.header)?;
    for row in &table.rows {
        out.write_record(row.iter().map(|cell| cell.value.as_str()))?;
    }
    out.flush()?;
    Ok(())
}

/// Writes `table` as CSV to `path`, replacing any existing file.
pub fn write_csv_file(
    table: &RenderedTable,
    path: &Path,
    delimiter: u8,
) -> Result<(), PipelineError> {
    let start = Instant::now();
    let file = File::create(path)?;
    write_csv(table, BufWriter::new(file), delimiter)?;
    info!(
        path = %path.display(),
        rows = table.len(),
        fuzzy_cells = table.fuzzy_cells(),
        elapsed_micros = start.elapsed().as_micros(),
        "csv_written"
    );
    Ok(())
}

/// Writes an ingested table as CSV; null cells become empty fields.
pub fn write_table_csv<W: Write>(
    table: &Table,
    writer: W,
    delimiter: u8,
) -> Result<(), PipelineError> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    out.write_record(table.header())?;
    for row in table.rows() {
        out.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or_default()))?;
    }
    out.flush()?;
    Ok(())
}

/// Serializes the full report, including scores, kinds and row hits.
pub fn write_report_json<W: Write>(report: &BatchReport, writer: W) -> Result<(), PipelineError> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}
