//! # genelink matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` sits on top of the ingest layer (`ingest`) and the in-memory
//! indexes (`index`). It runs one matching session over every row of a
//! target table, assembles exact and fuzzy records per target, and renders
//! the finished batch into output tables.
//!
//! Two modes are supported:
//! - **Relation**: every identifier reachable from the target through the
//!   relation encoded by two columns of an information table, within a
//!   bounded number of hops. Fuzzy traversal optionally adds values reached
//!   through keys that contain the current one.
//! - **Token**: normalized exact lookup against two columns of a reference
//!   table, falling back to token-overlap / substring matching.
//!
//! ## Core Types
//!
//! - [`MatchSession`]: the `Idle → Building → Matching → Done | Cancelled`
//!   state machine (`Failed` on schema or config errors). Runs once.
//! - [`RelationMatchConfig`] / [`TokenMatchConfig`]: per-mode knobs such as
//!   `depth`, `fuzzy`, the approximate-match threshold and `no_match` policy.
//! - [`MatchRecord`], [`TargetMatches`], [`BatchReport`]: the results.
//! - [`TargetMatcher`]: the per-target strategy; [`RelationMatcher`] and
//!   [`TokenMatcher`] are the built-in ones.
//! - [`Layout`]: [`VerticalLayout`], [`HorizontalLayout`], [`JoinedLayout`]
//!   and [`DetailLayout`] render a report into a [`RenderedTable`].
//!
//! ## Example Usage
//!
//! ```
//! use ingest::Table;
//! use matcher::{
//!     ColumnPair, HorizontalLayout, Layout, MatchSession, RelationMatchConfig,
//! };
//!
//! let targets = Table::from_text_rows("targets.csv", ["Gene"], [["G1"]]);
//! let relations = Table::from_text_rows(
//!     "relations.csv",
//!     ["GeneA", "GeneB"],
//!     [["G1", "G2"], ["G2", "G3"]],
//! );
//!
//! let mut session = MatchSession::new();
//! let report = session
//!     .run_relation(
//!         &targets,
//!         "Gene",
//!         &relations,
//!         &ColumnPair::new("GeneA", "GeneB"),
//!         &RelationMatchConfig::default(),
//!     )
//!     .expect("columns exist");
//!
//! let table = HorizontalLayout::new("Gene").render(&report);
//! assert_eq!(table.values(0), vec!["G1", "G2", "G3"]);
//! ```
//!
//! ## Observability
//!
//! Sessions run inside a `match.session` tracing span and log index builds
//! and batch completion. Hosts that show progress install a
//! [`ProgressObserver`] with [`MatchSession::with_observer`] and cancel
//! through the [`CancellationToken`] returned by
//! [`MatchSession::cancellation_token`].

pub mod assemble;
pub mod cancel;
pub mod engine;
pub mod layout;
pub mod observer;
pub mod types;

pub use crate::assemble::{apply_policy, assemble};
pub use crate::cancel::CancellationToken;
pub use crate::engine::{
    MatchSession, RelationMatcher, RunOptions, SessionState, TargetMatcher, TargetOutcome,
    TokenMatcher,
};
pub use crate::layout::{
    DetailLayout, HorizontalLayout, JoinedLayout, Layout, RenderedCell, RenderedTable,
    VerticalLayout,
};
pub use crate::observer::{FnObserver, NoopObserver, ProgressObserver, ProgressTracker};
pub use crate::types::{
    BatchReport, BatchStatus, ColumnPair, MatchError, MatchKind, MatchMode, MatchRecord,
    NoMatchPolicy, RelationColumns, RelationMatchConfig, RowHit, TargetMatches, TokenColumns,
    TokenMatchConfig,
};
