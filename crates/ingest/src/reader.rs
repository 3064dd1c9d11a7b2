//! File readers producing [`Table`]s.
//!
//! CSV is the main format. Files are decoded as UTF-8 first and fall back to
//! GBK, which is what spreadsheet tools on Chinese-locale Windows write by
//! default. Workbooks (`.xlsx`, `.xls`, `.xlsm`, `.ods`) are read through
//! calamine, first sheet only. Collinearity files go through
//! [`crate::collinearity`].

use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use tracing::{debug, info, warn};

use crate::collinearity;
use crate::error::IngestError;
use crate::table::{Cell, Table};

/// Text encodings the CSV reader can end up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Gbk,
}

/// Reads any supported table file, routing on the extension.
pub fn read_table(path: &Path) -> Result<Table, IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => read_csv(path),
        "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => read_workbook(path),
        "collinearity" | "txt" => collinearity::read_collinearity(path),
        other => Err(IngestError::UnsupportedFormat(other.to_string())),
    }
}

/// Reads a CSV file whose first row is the header.
pub fn read_csv(path: &Path) -> Result<Table, IngestError> {
    let start = Instant::now();
    let (content, encoding) = read_text(path)?;
    let table = parse_csv(&table_name(path), &content)?;
    info!(
        path = %path.display(),
        ?encoding,
        rows = table.len(),
        columns = table.width(),
        elapsed_micros = start.elapsed().as_micros(),
        "csv_loaded"
    );
    Ok(table)
}

/// Parses CSV text whose first row is the header.
///
/// Records may be ragged; short rows are padded with null cells.
pub fn parse_csv(name: &str, content: &str) -> Result<Table, IngestError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let csv_err = |e: csv::Error| IngestError::Csv {
        table: name.to_string(),
        message: e.to_string(),
    };

    let header = reader.headers().map_err(csv_err)?.clone();
    let mut table = Table::new(name, header.iter());
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        table.push_text_row(record.iter());
    }
    Ok(table)
}

/// Reads a whole file as text: UTF-8 first, GBK on failure.
pub fn read_text(path: &Path) -> Result<(String, TextEncoding), IngestError> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let (text, encoding) = decode_text(bytes);
    if encoding == TextEncoding::Gbk {
        warn!(path = %path.display(), "file is not valid UTF-8, decoded as GBK");
    }
    Ok((text, encoding))
}

/// Decodes raw bytes: UTF-8 first, GBK on failure.
pub fn decode_text(bytes: Vec<u8>) -> (String, TextEncoding) {
    match String::from_utf8(bytes) {
        Ok(s) => (s, TextEncoding::Utf8),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::GBK.decode(&bytes);
            (decoded.into_owned(), TextEncoding::Gbk)
        }
    }
}

/// Reads the first sheet of a workbook; its first row is the header.
pub fn read_workbook(path: &Path) -> Result<Table, IngestError> {
    let start = Instant::now();
    let workbook_err = |message: String| IngestError::Workbook {
        path: path.display().to_string(),
        message,
    };

    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| workbook_err(e.to_string()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| workbook_err("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| workbook_err(e.to_string()))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(|c| data_to_cell(c).unwrap_or_default()).collect())
        .unwrap_or_default();

    let mut table = Table::new(table_name(path), header);
    for row in rows {
        table.push_row(row.iter().map(data_to_cell).collect());
    }
    debug!(sheet = %sheet_name, "first sheet selected");
    info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.width(),
        elapsed_micros = start.elapsed().as_micros(),
        "workbook_loaded"
    );
    Ok(table)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        // Integral floats are printed without a fraction so numeric ids stay intact.
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
        Data::Float(n) => Some(n.to_string()),
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => Some(dt.as_f64().to_string()),
        Data::Error(e) => Some(format!("#{e:?}")),
    }
}

/// File name used as the table name in schema errors.
fn table_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
