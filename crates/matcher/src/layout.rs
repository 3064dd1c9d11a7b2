//! Output layouts over a finished [`BatchReport`].
//!
//! A report is produced once per session; any number of layouts can render
//! it. Every rendered cell carries a `fuzzy` flag so hosts can highlight
//! approximate matches.

use ingest::Table;
use serde::Serialize;

use crate::types::{BatchReport, MatchError, MatchKind, MatchRecord, TargetMatches, TokenColumns};

/// One output cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedCell {
    pub value: String,
    pub fuzzy: bool,
}

impl RenderedCell {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            fuzzy: false,
        }
    }

    pub fn flagged(value: impl Into<String>, fuzzy: bool) -> Self {
        Self {
            value: value.into(),
            fuzzy,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Header plus rows, every row as wide as the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<RenderedCell>>,
}

impl RenderedTable {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or cutting it to the header width.
    pub fn push_row(&mut self, mut row: Vec<RenderedCell>) {
        row.resize_with(self.header.len(), RenderedCell::empty);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Cell values of one row.
    pub fn values(&self, row: usize) -> Vec<&str> {
        self.rows
            .get(row)
            .map(|cells| cells.iter().map(|c| c.value.as_str()).collect())
            .unwrap_or_default()
    }

    /// Number of cells flagged fuzzy.
    pub fn fuzzy_cells(&self) -> usize {
        self.rows.iter().flatten().filter(|c| c.fuzzy).count()
    }
}

/// Renders a report into a table.
pub trait Layout {
    fn render(&self, report: &BatchReport) -> RenderedTable;
}

fn target_cell(target: &TargetMatches) -> RenderedCell {
    RenderedCell::plain(target.target.as_ref().map(|t| t.as_str()).unwrap_or_default())
}

/// One output row per match, repeating every field of the target row.
/// Targets without matches keep one row with an empty match cell.
#[derive(Debug, Clone)]
pub struct VerticalLayout<'a> {
    targets: &'a Table,
    match_header: String,
}

impl<'a> VerticalLayout<'a> {
    pub fn new(targets: &'a Table) -> Self {
        Self {
            targets,
            match_header: "Match".to_string(),
        }
    }

    pub fn with_match_header(mut self, header: impl Into<String>) -> Self {
        self.match_header = header.into();
        self
    }

    fn row_prefix(&self, row: usize) -> Vec<RenderedCell> {
        (0..self.targets.width())
            .map(|col| RenderedCell::plain(self.targets.cell(row, col).unwrap_or_default()))
            .collect()
    }
}

impl Layout for VerticalLayout<'_> {
    fn render(&self, report: &BatchReport) -> RenderedTable {
        let mut header = self.targets.header().to_vec();
        header.push(self.match_header.clone());
        let mut table = RenderedTable::new(header);

        for target in &report.targets {
            if target.records.is_empty() {
                let mut row = self.row_prefix(target.row);
                row.push(RenderedCell::empty());
                table.push_row(row);
                continue;
            }
            for record in &target.records {
                let mut row = self.row_prefix(target.row);
                row.push(RenderedCell::flagged(
                    record.matched.as_str(),
                    record.is_fuzzy(),
                ));
                table.push_row(row);
            }
        }
        table
    }
}

/// One row per target: the target value followed by `Match 1..N`, where `N`
/// is the largest match count in the batch.
#[derive(Debug, Clone)]
pub struct HorizontalLayout {
    target_header: String,
}

impl HorizontalLayout {
    pub fn new(target_header: impl Into<String>) -> Self {
        Self {
            target_header: target_header.into(),
        }
    }
}

impl Layout for HorizontalLayout {
    fn render(&self, report: &BatchReport) -> RenderedTable {
        let width = report.max_matches();
        let mut header = Vec::with_capacity(width + 1);
        header.push(self.target_header.clone());
        header.extend((1..=width).map(|n| format!("Match {n}")));
        let mut table = RenderedTable::new(header);

        for target in &report.targets {
            let mut row = vec![target_cell(target)];
            row.extend(
                target
                    .records
                    .iter()
                    .map(|r| RenderedCell::flagged(r.matched.as_str(), r.is_fuzzy())),
            );
            table.push_row(row);
        }
        table
    }
}

/// One row per target with every match joined into a single cell.
///
/// The cell is flagged fuzzy when any joined value is fuzzy.
#[derive(Debug, Clone)]
pub struct JoinedLayout {
    target_header: String,
    separator: String,
}

impl JoinedLayout {
    pub fn new(target_header: impl Into<String>) -> Self {
        Self {
            target_header: target_header.into(),
            separator: ", ".to_string(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

impl Layout for JoinedLayout {
    fn render(&self, report: &BatchReport) -> RenderedTable {
        let mut table = RenderedTable::new(vec![self.target_header.clone(), "Matches".into()]);
        for target in &report.targets {
            let joined = target
                .records
                .iter()
                .map(|r| r.matched.as_str())
                .collect::<Vec<_>>()
                .join(&self.separator);
            let fuzzy = target.records.iter().any(MatchRecord::is_fuzzy);
            table.push_row(vec![target_cell(target), RenderedCell::flagged(joined, fuzzy)]);
        }
        table
    }
}

/// Token-mode detail rows: one row per reference row a match was found in,
/// with the counterpart value from the other designated column, the ratio,
/// and optionally every other reference column prefixed `B_`.
#[derive(Debug, Clone)]
pub struct DetailLayout<'a> {
    reference: &'a Table,
    left: usize,
    right: usize,
    others: Vec<usize>,
}

impl<'a> DetailLayout<'a> {
    pub const KIND_NONE: &'static str = "none";

    pub fn new(
        reference: &'a Table,
        columns: &TokenColumns,
        export_other_columns: bool,
    ) -> Result<Self, MatchError> {
        let left = reference.column(&columns.left)?;
        let right = reference.column(&columns.right)?;
        let others = if export_other_columns {
            (0..reference.width())
                .filter(|&c| c != left && c != right)
                .collect()
        } else {
            Vec::new()
        };
        Ok(Self {
            reference,
            left,
            right,
            others,
        })
    }

    fn designated(&self, side: index::Side) -> usize {
        match side {
            index::Side::Left => self.left,
            index::Side::Right => self.right,
        }
    }

    fn cell(&self, row: usize, col: usize) -> &str {
        self.reference.cell(row, col).unwrap_or_default()
    }
}

fn kind_label(kind: MatchKind) -> &'static str {
    match kind {
        MatchKind::Exact => "exact",
        MatchKind::Fuzzy => "fuzzy",
    }
}

impl Layout for DetailLayout<'_> {
    fn render(&self, report: &BatchReport) -> RenderedTable {
        let mut header: Vec<String> = ["Target", "Kind", "Matched", "Counterpart", "Ratio"]
            .into_iter()
            .map(String::from)
            .collect();
        header.extend(
            self.others
                .iter()
                .map(|&c| format!("B_{}", self.reference.header()[c])),
        );
        let mut table = RenderedTable::new(header);

        for target in &report.targets {
            if target.records.is_empty() {
                table.push_row(vec![target_cell(target), RenderedCell::plain(Self::KIND_NONE)]);
                continue;
            }
            for record in &target.records {
                let fuzzy = record.is_fuzzy();
                let ratio = RenderedCell::flagged(format!("{:.3}", record.score), fuzzy);
                let kind = RenderedCell::flagged(kind_label(record.kind), fuzzy);

                if record.hits.is_empty() {
                    table.push_row(vec![
                        target_cell(target),
                        kind,
                        RenderedCell::flagged(record.matched.as_str(), fuzzy),
                        RenderedCell::empty(),
                        ratio,
                    ]);
                    continue;
                }
                for hit in &record.hits {
                    let mut row = vec![
                        target_cell(target),
                        kind.clone(),
                        RenderedCell::flagged(
                            self.cell(hit.row, self.designated(hit.column)),
                            fuzzy,
                        ),
                        RenderedCell::flagged(
                            self.cell(hit.row, self.designated(hit.column.other())),
                            fuzzy,
                        ),
                        ratio.clone(),
                    ];
                    row.extend(
                        self.others
                            .iter()
                            .map(|&c| RenderedCell::plain(self.cell(hit.row, c))),
                    );
                    table.push_row(row);
                }
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use canonical::Identifier;
    use index::Side;

    use super::*;
    use crate::types::{BatchStatus, MatchMode, RowHit};

    fn targets() -> Table {
        Table::from_text_rows(
            "targets.csv",
            ["Gene", "Note"],
            [vec!["G1", "first"], vec!["G9", "second"]],
        )
    }

    fn report() -> BatchReport {
        let g1 = Identifier::new("G1");
        BatchReport {
            mode: MatchMode::Relation,
            status: BatchStatus::Done,
            processed: 2,
            total: 2,
            truncations: 0,
            targets: vec![
                TargetMatches {
                    row: 0,
                    target: Some(g1.clone()),
                    records: vec![
                        MatchRecord::exact(g1.clone(), "G2".into(), Side::Right),
                        MatchRecord::fuzzy(g1, "G10".into(), 0.5, Side::Left),
                    ],
                },
                TargetMatches {
                    row: 1,
                    target: Some(Identifier::new("G9")),
                    records: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn vertical_repeats_target_fields() {
        let table = VerticalLayout::new(&targets()).render(&report());
        assert_eq!(table.header, vec!["Gene", "Note", "Match"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.values(0), vec!["G1", "first", "G2"]);
        assert_eq!(table.values(1), vec!["G1", "first", "G10"]);
        assert_eq!(table.values(2), vec!["G9", "second", ""]);
        assert!(!table.rows[0][2].fuzzy);
        assert!(table.rows[1][2].fuzzy);
        assert_eq!(table.fuzzy_cells(), 1);
    }

    #[test]
    fn horizontal_uses_max_match_count() {
        let table = HorizontalLayout::new("Gene").render(&report());
        assert_eq!(table.header, vec!["Gene", "Match 1", "Match 2"]);
        assert_eq!(table.values(0), vec!["G1", "G2", "G10"]);
        assert_eq!(table.values(1), vec!["G9", "", ""]);
        assert!(table.rows[0][2].fuzzy);
    }

    #[test]
    fn horizontal_with_no_matches_has_only_target_column() {
        let mut report = report();
        report.targets[0].records.clear();
        let table = HorizontalLayout::new("Gene").render(&report);
        assert_eq!(table.header, vec!["Gene"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn joined_flags_any_fuzzy() {
        let table = JoinedLayout::new("Gene").render(&report());
        assert_eq!(table.values(0), vec!["G1", "G2, G10"]);
        assert!(table.rows[0][1].fuzzy);
        assert_eq!(table.values(1), vec!["G9", ""]);

        let table = JoinedLayout::new("Gene").with_separator(";").render(&report());
        assert_eq!(table.values(0)[1], "G2;G10");
    }

    fn reference() -> Table {
        Table::from_text_rows(
            "reference.csv",
            ["Symbol", "Alias", "Chrom"],
            [
                vec!["HSP70", "heat shock protein", "chr1"],
                vec!["RPL3", "Ribosomal protein L3", "chr2"],
            ],
        )
    }

    fn token_report() -> BatchReport {
        let query = Identifier::new("hsp70");
        BatchReport {
            mode: MatchMode::Token,
            status: BatchStatus::Done,
            processed: 2,
            total: 2,
            truncations: 0,
            targets: vec![
                TargetMatches {
                    row: 0,
                    target: Some(query.clone()),
                    records: vec![MatchRecord::exact(query, "HSP70".into(), Side::Left)
                        .with_hits(vec![RowHit {
                            row: 0,
                            column: Side::Left,
                        }])],
                },
                TargetMatches {
                    row: 1,
                    target: Some(Identifier::new("zzz")),
                    records: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn detail_expands_hits_with_counterpart() {
        let reference = reference();
        let columns = TokenColumns::new("Symbol", "Alias");
        let layout = DetailLayout::new(&reference, &columns, true).expect("columns exist");
        let table = layout.render(&token_report());
        assert_eq!(
            table.header,
            vec!["Target", "Kind", "Matched", "Counterpart", "Ratio", "B_Chrom"]
        );
        assert_eq!(
            table.values(0),
            vec!["hsp70", "exact", "HSP70", "heat shock protein", "1.000", "chr1"]
        );
        assert_eq!(table.values(1), vec!["zzz", "none", "", "", "", ""]);
    }

    #[test]
    fn detail_without_export_omits_other_columns() {
        let reference = reference();
        let columns = TokenColumns::new("Symbol", "Alias");
        let layout = DetailLayout::new(&reference, &columns, false).expect("columns exist");
        let table = layout.render(&token_report());
        assert_eq!(table.header.len(), 5);
    }

    #[test]
    fn detail_rejects_missing_column() {
        let reference = reference();
        let columns = TokenColumns::new("Symbol", "Description");
        let err = DetailLayout::new(&reference, &columns, true).expect_err("column is missing");
        assert!(matches!(err, MatchError::Schema(_)));
        assert!(err.to_string().contains("Description"));
    }
}
