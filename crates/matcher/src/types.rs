use canonical::Identifier;
use index::{ApproxConfig, IndexError, Side, DEFAULT_DEPTH};
use ingest::IngestError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::SessionState;

/// How a record was produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// Which matching mode produced a batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Multi-hop traversal over a two-column relation table.
    Relation,
    /// Token-index lookup against two columns of a reference table.
    Token,
}

/// A reference-table row holding a matched key, and the column it sits in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowHit {
    pub row: usize,
    pub column: Side,
}

/// One match for one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchRecord {
    /// The target value that was looked up.
    pub source: Identifier,
    /// The matched value, as it appears in the information/reference table.
    pub matched: Identifier,
    pub kind: MatchKind,
    /// `1.0` for exact records; traversal or overlap score for fuzzy ones.
    pub score: f64,
    /// Designated column the matched value was found in.
    pub matched_column: Side,
    /// Reference rows holding the matched key (token mode only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hits: Vec<RowHit>,
}

impl MatchRecord {
    pub fn exact(source: Identifier, matched: Identifier, matched_column: Side) -> Self {
        Self {
            source,
            matched,
            kind: MatchKind::Exact,
            score: index::EXACT_SCORE,
            matched_column,
            hits: Vec::new(),
        }
    }

    pub fn fuzzy(source: Identifier, matched: Identifier, score: f64, matched_column: Side) -> Self {
        Self {
            source,
            matched,
            kind: MatchKind::Fuzzy,
            score,
            matched_column,
            hits: Vec::new(),
        }
    }

    pub fn with_hits(mut self, hits: Vec<RowHit>) -> Self {
        self.hits = hits;
        self
    }

    pub fn is_fuzzy(&self) -> bool {
        self.kind == MatchKind::Fuzzy
    }
}

/// All records for one target row. An empty record list is the explicit
/// "no match" marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetMatches {
    /// Row index in the target table.
    pub row: usize,
    /// Target cell value; `None` for blank cells.
    pub target: Option<Identifier>,
    pub records: Vec<MatchRecord>,
}

impl TargetMatches {
    pub fn is_marker(&self) -> bool {
        self.records.is_empty()
    }
}

/// Terminal status of a batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Done,
    Cancelled,
}

/// Result of one matching session, consumed by the layouts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchReport {
    pub mode: MatchMode,
    pub status: BatchStatus,
    /// Target rows processed before completion or cancellation.
    pub processed: usize,
    /// Target rows in the input.
    pub total: usize,
    /// Lookups whose candidate list hit the cap.
    pub truncations: usize,
    /// Per-target results, in input order.
    pub targets: Vec<TargetMatches>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.status == BatchStatus::Done
    }

    /// Largest number of records any target has.
    pub fn max_matches(&self) -> usize {
        self.targets
            .iter()
            .map(|t| t.records.len())
            .max()
            .unwrap_or(0)
    }

    /// Every record in output order.
    pub fn records(&self) -> impl Iterator<Item = &MatchRecord> {
        self.targets.iter().flat_map(|t| t.records.iter())
    }

    /// Fuzzy flag of every record in output order.
    pub fn fuzzy_flags(&self) -> Vec<bool> {
        self.records().map(MatchRecord::is_fuzzy).collect()
    }

    pub fn record_count(&self) -> usize {
        self.targets.iter().map(|t| t.records.len()).sum()
    }
}

/// What to do with targets that produced no records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoMatchPolicy {
    /// Keep the target with an empty record list.
    #[default]
    Marker,
    /// Drop the target from the report.
    Omit,
}

/// The two designated columns of an information or reference table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ColumnPair {
    pub left: String,
    pub right: String,
}

impl ColumnPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn name(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// Designated columns of the information table in relation mode.
pub type RelationColumns = ColumnPair;

/// Designated columns of the reference table in token mode.
pub type TokenColumns = ColumnPair;

/// Configuration for relation-mode sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationMatchConfig {
    /// Number of traversal rounds.
    #[serde(default = "RelationMatchConfig::default_depth")]
    pub depth: usize,
    /// Also run fuzzy traversal and report its extra finds.
    #[serde(default)]
    pub fuzzy: bool,
    #[serde(default)]
    pub no_match: NoMatchPolicy,
    /// Process targets in parallel chunks.
    #[serde(default)]
    pub parallel: bool,
    /// Targets per chunk in parallel mode.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl RelationMatchConfig {
    pub(crate) fn default_depth() -> usize {
        DEFAULT_DEPTH
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.depth == 0 {
            return Err(MatchError::InvalidConfig(
                "depth must be at least 1".into(),
            ));
        }
        validate_chunk_size(self.chunk_size)
    }
}

impl Default for RelationMatchConfig {
    fn default() -> Self {
        Self {
            depth: Self::default_depth(),
            fuzzy: false,
            no_match: NoMatchPolicy::default(),
            parallel: false,
            chunk_size: default_chunk_size(),
        }
    }
}

/// Configuration for token-mode sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenMatchConfig {
    /// Threshold and candidate cap for approximate lookups.
    #[serde(default)]
    pub approx: ApproxConfig,
    /// Include every non-designated reference column in detail output.
    #[serde(default = "true_value")]
    pub export_other_columns: bool,
    #[serde(default)]
    pub no_match: NoMatchPolicy,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl TokenMatchConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        self.approx.validate().map_err(|e| match e {
            IndexError::InvalidConfig(msg) => MatchError::InvalidConfig(msg),
            other => MatchError::Index(other),
        })?;
        validate_chunk_size(self.chunk_size)
    }
}

impl Default for TokenMatchConfig {
    fn default() -> Self {
        Self {
            approx: ApproxConfig::default(),
            export_other_columns: true,
            no_match: NoMatchPolicy::default(),
            parallel: false,
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    256
}

fn true_value() -> bool {
    true
}

fn validate_chunk_size(chunk_size: usize) -> Result<(), MatchError> {
    if chunk_size == 0 {
        return Err(MatchError::InvalidConfig(
            "chunk_size must be greater than zero".into(),
        ));
    }
    Ok(())
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Invalid configuration.
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    /// A designated column is missing from its table.
    #[error("schema error: {0}")]
    Schema(#[from] IngestError),
    /// Index construction or lookup failed.
    #[error("index error: {0}")]
    Index(#[from] IndexError),
    /// A session was asked to run outside the `Idle` state.
    #[error("session cannot start from state {0:?}")]
    InvalidState(SessionState),
}
