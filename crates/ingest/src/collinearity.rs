//! MCScanX `.collinearity` parsing.
//!
//! The collinearity report lists syntenic gene pairs grouped into alignment
//! blocks:
//!
//! ```text
//! ############### Parameters ###############
//! ## Alignment 0: score=250.0 e_value=1.2e-10 N=5 At1&At2 plus
//!   0-  0:	AT1G01010	AT2G01010	  2e-80
//!   0-  1:	AT1G01020	AT2G01020	  1e-45
//! ```
//!
//! Each data row becomes one `Block, GeneA, GeneB, E-value` row. Rows with
//! an `N-  M:` prefix keep that prefix as their block label; bare three-column
//! rows take the id of the last `## Alignment N` header, and bare two-column
//! rows get `NA` as `GeneB`. The resulting [`Table`] can be fed straight into
//! a relation session using `GeneA`/`GeneB` as the designated columns.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

use regex::Regex;
use tracing::{info, warn};

use crate::error::IngestError;
use crate::reader::read_text;
use crate::table::Table;

/// Header of parsed collinearity tables.
pub const COLLINEARITY_HEADER: [&str; 4] = ["Block", "GeneA", "GeneB", "E-value"];

/// Block label used before the first alignment header.
pub const UNASSIGNED_BLOCK: &str = "Unassigned";

/// Placeholder partner for two-column rows.
pub const MISSING_PARTNER: &str = "NA";

fn pair_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+-\s*\d+:)\s+(\S+)\s+(\S+)\s+(\S+)$")
            .expect("collinearity row pattern is valid")
    })
}

fn alignment_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Alignment\s+(\d+)").expect("alignment header pattern is valid")
    })
}

/// Parser settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollinearityOptions {
    /// Reject lines that fit none of the known row shapes instead of
    /// skipping them.
    pub strict: bool,
}

/// Parsed rows plus the number of lines that were skipped as unrecognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collinearity {
    pub table: Table,
    pub skipped_lines: usize,
}

/// Reads and parses a collinearity file with default options.
pub fn read_collinearity(path: &Path) -> Result<Table, IngestError> {
    read_collinearity_with(path, CollinearityOptions::default()).map(|c| c.table)
}

/// Reads and parses a collinearity file.
pub fn read_collinearity_with(
    path: &Path,
    options: CollinearityOptions,
) -> Result<Collinearity, IngestError> {
    let start = Instant::now();
    let (content, _) = read_text(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let parsed = parse_collinearity(&name, &content, options)?;
    if parsed.skipped_lines > 0 {
        warn!(
            path = %path.display(),
            skipped = parsed.skipped_lines,
            "unrecognised collinearity lines skipped"
        );
    }
    info!(
        path = %path.display(),
        rows = parsed.table.len(),
        elapsed_micros = start.elapsed().as_micros(),
        "collinearity_loaded"
    );
    Ok(parsed)
}

/// Parses collinearity text into a `Block, GeneA, GeneB, E-value` table.
pub fn parse_collinearity(
    name: &str,
    content: &str,
    options: CollinearityOptions,
) -> Result<Collinearity, IngestError> {
    let mut table = Table::new(name, COLLINEARITY_HEADER);
    let mut block = UNASSIGNED_BLOCK.to_string();
    let mut skipped_lines = 0;

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("## Alignment") {
            if let Some(caps) = alignment_header().captures(line) {
                block = caps[1].to_string();
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        if let Some(caps) = pair_line().captures(line) {
            table.push_text_row([&caps[1], &caps[2], &caps[3], &caps[4]]);
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            &[gene_a, gene_b, evalue] => {
                table.push_text_row([block.as_str(), gene_a, gene_b, evalue]);
            }
            &[gene_a, evalue] => {
                table.push_text_row([block.as_str(), gene_a, MISSING_PARTNER, evalue]);
            }
            _ if options.strict => {
                return Err(IngestError::Collinearity {
                    line: idx + 1,
                    message: format!("unrecognised row with {} fields", parts.len()),
                });
            }
            _ => skipped_lines += 1,
        }
    }

    Ok(Collinearity {
        table,
        skipped_lines,
    })
}
