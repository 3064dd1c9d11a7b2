//! Workspace umbrella crate for genelink.
//!
//! This crate stitches the table readers, the in-memory indexes and the
//! matching sessions together so callers can go from two tables to a
//! rendered report with three calls: [`relate`] or [`lookup`], then
//! [`render`], then [`report::write_csv`].
//!
//! ```
//! use genelink::{relate, render, ColumnPair, LayoutKind, RelationMatchConfig, RenderContext,
//!     RunContext, Table};
//!
//! let targets = Table::from_text_rows("targets.csv", ["Gene"], [["G1"], ["G9"]]);
//! let relations = Table::from_text_rows(
//!     "relations.csv",
//!     ["GeneA", "GeneB"],
//!     [["G1", "G2"], ["G2", "G3"]],
//! );
//!
//! let report = relate(
//!     &targets,
//!     "Gene",
//!     &relations,
//!     &ColumnPair::new("GeneA", "GeneB"),
//!     &RelationMatchConfig::default(),
//!     &RunContext::new(),
//! )
//! .unwrap();
//!
//! let table = render(&report, LayoutKind::Horizontal, &RenderContext::new(&targets, "Gene")).unwrap();
//! assert_eq!(table.values(0), vec!["G1", "G2", "G3"]);
//! assert_eq!(table.values(1), vec!["G9", "", ""]);
//! ```

pub mod config;
pub mod report;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

pub use canonical::{normalize_key, token_set, tokenize, Identifier, Token, TokenSet};
pub use config::{
    ConfigLoadError, GenelinkConfig, LayoutKind, LookupYamlConfig, OutputYamlConfig,
    RelationYamlConfig,
};
pub use index::{
    match_approx, search, ApproxConfig, RelationIndex, Side, TokenIndex, TraversalMode,
};
pub use ingest::{
    parse_collinearity, parse_csv, read_collinearity, read_table, Collinearity,
    CollinearityOptions, IngestError, Table,
};
pub use matcher::{
    BatchReport, BatchStatus, CancellationToken, ColumnPair, DetailLayout, FnObserver,
    HorizontalLayout, JoinedLayout, Layout, MatchError, MatchKind, MatchMode, MatchRecord,
    MatchSession, NoMatchPolicy, NoopObserver, ProgressObserver, RelationColumns,
    RelationMatchConfig, RenderedCell, RenderedTable, SessionState, TargetMatches, TokenColumns,
    TokenMatchConfig, VerticalLayout,
};

/// Errors that can occur while running the pipeline end to end.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("ingest failure: {0}")]
    Ingest(#[from] IngestError),

    #[error("matching failure: {0}")]
    Match(#[from] MatchError),

    #[error("configuration failure: {0}")]
    Config(#[from] ConfigLoadError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("layout {layout:?} cannot render this report: {reason}")]
    UnsupportedLayout { layout: LayoutKind, reason: String },
}

/// Observer and cancellation handle for one run.
#[derive(Clone, Default)]
pub struct RunContext {
    observer: Option<Arc<dyn ProgressObserver>>,
    cancel: CancellationToken,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle that cancels any run started from this context.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn session(&self) -> MatchSession {
        let session = MatchSession::new().with_cancellation(self.cancel.clone());
        match &self.observer {
            Some(observer) => session.with_observer(Arc::clone(observer)),
            None => session,
        }
    }
}

/// Relation-based matching of every `targets[target_column]` value.
pub fn relate(
    targets: &Table,
    target_column: &str,
    relations: &Table,
    columns: &RelationColumns,
    cfg: &RelationMatchConfig,
    ctx: &RunContext,
) -> Result<BatchReport, PipelineError> {
    let report = ctx
        .session()
        .run_relation(targets, target_column, relations, columns, cfg)?;
    info!(
        targets = targets.name(),
        relations = relations.name(),
        records = report.record_count(),
        "relate_complete"
    );
    Ok(report)
}

/// Token-index matching of every `targets[target_column]` value against two
/// columns of `reference`.
pub fn lookup(
    targets: &Table,
    target_column: &str,
    reference: &Table,
    columns: &TokenColumns,
    cfg: &TokenMatchConfig,
    ctx: &RunContext,
) -> Result<BatchReport, PipelineError> {
    let report = ctx
        .session()
        .run_token(targets, target_column, reference, columns, cfg)?;
    info!(
        targets = targets.name(),
        reference = reference.name(),
        records = report.record_count(),
        truncations = report.truncations,
        "lookup_complete"
    );
    Ok(report)
}

/// The reference side of a token-mode run, needed by the detail layout.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceView<'a> {
    pub table: &'a Table,
    pub columns: &'a TokenColumns,
    pub export_other_columns: bool,
}

/// Tables a layout may need besides the report itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub targets: &'a Table,
    pub target_column: &'a str,
    pub match_header: &'a str,
    pub reference: Option<ReferenceView<'a>>,
}

impl<'a> RenderContext<'a> {
    pub fn new(targets: &'a Table, target_column: &'a str) -> Self {
        Self {
            targets,
            target_column,
            match_header: "Match",
            reference: None,
        }
    }

    pub fn with_match_header(mut self, header: &'a str) -> Self {
        self.match_header = header;
        self
    }

    pub fn with_reference(mut self, reference: ReferenceView<'a>) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Renders `report` with the chosen layout.
pub fn render(
    report: &BatchReport,
    layout: LayoutKind,
    ctx: &RenderContext<'_>,
) -> Result<RenderedTable, PipelineError> {
    let table = match layout {
        LayoutKind::Vertical => VerticalLayout::new(ctx.targets)
            .with_match_header(ctx.match_header)
            .render(report),
        LayoutKind::Horizontal => HorizontalLayout::new(ctx.target_column).render(report),
        LayoutKind::Joined => JoinedLayout::new(ctx.target_column).render(report),
        LayoutKind::Detail => {
            if report.mode != MatchMode::Token {
                return Err(PipelineError::UnsupportedLayout {
                    layout,
                    reason: "detail rows exist only for token-mode reports".into(),
                });
            }
            let reference = ctx.reference.ok_or_else(|| PipelineError::UnsupportedLayout {
                layout,
                reason: "no reference table supplied".into(),
            })?;
            DetailLayout::new(
                reference.table,
                reference.columns,
                reference.export_other_columns,
            )?
            .render(report)
        }
    };
    Ok(table)
}
