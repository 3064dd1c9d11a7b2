use std::sync::Arc;
use std::time::Instant;

use canonical::Identifier;
use hashbrown::HashMap;
use index::{
    match_approx, search, ApproxConfig, IdSet, RelationIndex, RelationPair, Side, TokenIndex,
    TraversalMode, FUZZY_TRAVERSAL_SCORE,
};
use ingest::Table;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn, Level};

use crate::assemble::{apply_policy, assemble};
use crate::cancel::CancellationToken;
use crate::observer::{NoopObserver, ProgressObserver, ProgressTracker};
use crate::types::{
    BatchReport, BatchStatus, MatchError, MatchKind, MatchMode, MatchRecord, NoMatchPolicy,
    RelationColumns, RelationMatchConfig, RowHit, TargetMatches, TokenColumns, TokenMatchConfig,
};


/// Lifecycle of a [`MatchSession`].
///
/// ```text
/// Idle -> Building -> Matching -> Done
///            |           `-----> Cancelled
///            `--> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Building,
    Matching,
    Done,
    Cancelled,
    Failed,
}

/// Records produced for one target, plus whether its candidate list was capped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetOutcome {
    pub records: Vec<MatchRecord>,
    pub truncated: bool,
}

/// Per-target matching strategy driven by a [`MatchSession`].
///
/// Implementations hold their indexes read-only; `match_target` is called
/// concurrently from worker threads in parallel mode.
pub trait TargetMatcher: Send + Sync {
    fn mode(&self) -> MatchMode;

    fn match_target(&self, target: &Identifier) -> TargetOutcome;
}

/// Relation mode: exact traversal, optionally followed by fuzzy traversal.
#[derive(Debug, Clone)]
pub struct RelationMatcher {
    index: RelationIndex,
    depth: usize,
    fuzzy: bool,
}

impl RelationMatcher {
    pub fn new(index: RelationIndex, cfg: &RelationMatchConfig) -> Self {
        Self {
            index,
            depth: cfg.depth,
            fuzzy: cfg.fuzzy,
        }
    }

    /// Validates the designated columns and builds the relation index.
    pub fn from_table(
        relations: &Table,
        columns: &RelationColumns,
        cfg: &RelationMatchConfig,
    ) -> Result<Self, MatchError> {
        let left = relations.column(&columns.left)?;
        let right = relations.column(&columns.right)?;
        let pairs = relations
            .column_pairs(left, right)
            .into_iter()
            .map(|(l, r)| RelationPair::new(l, r));
        Ok(Self::new(RelationIndex::build(pairs), cfg))
    }

    pub fn index(&self) -> &RelationIndex {
        &self.index
    }

    fn records(&self, source: &Identifier, found: IdSet, kind: MatchKind) -> Vec<MatchRecord> {
        let mut found: Vec<Identifier> = found.into_iter().collect();
        found.sort_unstable();
        found
            .into_iter()
            .map(|matched| {
                let column = self.index.side_of(matched.as_str()).unwrap_or(Side::Right);
                match kind {
                    MatchKind::Exact => MatchRecord::exact(source.clone(), matched, column),
                    MatchKind::Fuzzy => {
                        MatchRecord::fuzzy(source.clone(), matched, FUZZY_TRAVERSAL_SCORE, column)
                    }
                }
            })
            .collect()
    }
}

impl TargetMatcher for RelationMatcher {
    fn mode(&self) -> MatchMode {
        MatchMode::Relation
    }

    fn match_target(&self, target: &Identifier) -> TargetOutcome {
        let seeds = [target.clone()];
        let exact_found = search(&seeds, &self.index, self.depth, TraversalMode::Exact);
        let exact = self.records(target, exact_found, MatchKind::Exact);
        let fuzzy = if self.fuzzy {
            let fuzzy_found = search(&seeds, &self.index, self.depth, TraversalMode::Fuzzy);
            self.records(target, fuzzy_found, MatchKind::Fuzzy)
        } else {
            Vec::new()
        };
        TargetOutcome {
            records: assemble(exact, fuzzy),
            truncated: false,
        }
    }
}

/// One designated reference column: its token index, the rows holding each
/// normalized key, and the raw cell values for display.
#[derive(Debug, Clone)]
struct ReferenceColumn {
    side: Side,
    index: TokenIndex,
    rows: HashMap<Identifier, Vec<usize>>,
    raw: Vec<Option<Identifier>>,
}

impl ReferenceColumn {
    fn build(table: &Table, column: usize, side: Side) -> Self {
        let raw: Vec<Option<Identifier>> = table.identifiers(column).collect();
        let mut rows: HashMap<Identifier, Vec<usize>> = HashMap::new();
        for (row, cell) in raw.iter().enumerate() {
            if let Some(key) = cell.as_ref().and_then(|c| Identifier::normalized(c.as_str())) {
                rows.entry(key).or_default().push(row);
            }
        }
        let index = TokenIndex::build(rows.keys().map(Identifier::as_str));
        Self {
            side,
            index,
            rows,
            raw,
        }
    }
}

/// Token mode: exact normalized lookup in either designated column, falling
/// back to approximate token matching when nothing matches exactly.
#[derive(Debug, Clone)]
pub struct TokenMatcher {
    columns: [ReferenceColumn; 2],
    approx: ApproxConfig,
}

impl TokenMatcher {
    /// Validates the designated columns and builds one token index per column.
    pub fn from_table(
        reference: &Table,
        columns: &TokenColumns,
        cfg: &TokenMatchConfig,
    ) -> Result<Self, MatchError> {
        let left = reference.column(&columns.left)?;
        let right = reference.column(&columns.right)?;
        Ok(Self {
            columns: [
                ReferenceColumn::build(reference, left, Side::Left),
                ReferenceColumn::build(reference, right, Side::Right),
            ],
            approx: cfg.approx,
        })
    }

    /// Distinct normalized keys in the column on `side`.
    pub fn key_count(&self, side: Side) -> usize {
        self.column(side).index.len()
    }

    fn column(&self, side: Side) -> &ReferenceColumn {
        match side {
            Side::Left => &self.columns[0],
            Side::Right => &self.columns[1],
        }
    }

    /// One record covering every reference row that holds `key`, left column first.
    fn record_for_key(
        &self,
        source: &Identifier,
        key: &Identifier,
        kind: MatchKind,
        score: f64,
    ) -> Option<MatchRecord> {
        let hits: Vec<RowHit> = self
            .columns
            .iter()
            .flat_map(|col| {
                col.rows
                    .get(key)
                    .into_iter()
                    .flatten()
                    .map(move |&row| RowHit {
                        row,
                        column: col.side,
                    })
            })
            .collect();
        let first = *hits.first()?;
        let matched = self
            .column(first.column)
            .raw
            .get(first.row)
            .cloned()
            .flatten()
            .unwrap_or_else(|| key.clone());
        let record = match kind {
            MatchKind::Exact => MatchRecord::exact(source.clone(), matched, first.column),
            MatchKind::Fuzzy => MatchRecord::fuzzy(source.clone(), matched, score, first.column),
        };
        Some(record.with_hits(hits))
    }
}

impl TargetMatcher for TokenMatcher {
    fn mode(&self) -> MatchMode {
        MatchMode::Token
    }

    fn match_target(&self, target: &Identifier) -> TargetOutcome {
        let Some(key) = Identifier::normalized(target.as_str()) else {
            return TargetOutcome::default();
        };

        let exact: Vec<MatchRecord> = self
            .record_for_key(target, &key, MatchKind::Exact, index::EXACT_SCORE)
            .into_iter()
            .collect();
        if !exact.is_empty() {
            return TargetOutcome {
                records: exact,
                truncated: false,
            };
        }

        let indexes = [&self.columns[0].index, &self.columns[1].index];
        let outcome = match_approx(target.as_str(), &indexes, &self.approx);
        let fuzzy = outcome
            .hits
            .iter()
            .filter_map(|hit| self.record_for_key(target, &hit.key, MatchKind::Fuzzy, hit.ratio))
            .collect();
        TargetOutcome {
            records: assemble(Vec::new(), fuzzy),
            truncated: outcome.truncated,
        }
    }
}

/// Execution knobs shared by both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub no_match: NoMatchPolicy,
    pub parallel: bool,
    pub chunk_size: usize,
}

impl From<&RelationMatchConfig> for RunOptions {
    fn from(cfg: &RelationMatchConfig) -> Self {
        Self {
            no_match: cfg.no_match,
            parallel: cfg.parallel,
            chunk_size: cfg.chunk_size,
        }
    }
}

impl From<&TokenMatchConfig> for RunOptions {
    fn from(cfg: &TokenMatchConfig) -> Self {
        Self {
            no_match: cfg.no_match,
            parallel: cfg.parallel,
            chunk_size: cfg.chunk_size,
        }
    }
}

/// One matching run: validates inputs, builds the index, and walks the
/// target rows in input order.
///
/// A session runs once. Cancellation is polled before every target, so a
/// cancelled report always holds a prefix of the input.
pub struct MatchSession {
    state: SessionState,
    cancel: CancellationToken,
    observer: Arc<dyn ProgressObserver>,
}

impl Default for MatchSession {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            cancel: CancellationToken::new(),
            observer: Arc::new(NoopObserver),
        }
    }
}

impl MatchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle that cancels this session when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Relation-based matching of `targets[target_column]` against the
    /// relation encoded by `columns` of `relations`.
    pub fn run_relation(
        &mut self,
        targets: &Table,
        target_column: &str,
        relations: &Table,
        columns: &RelationColumns,
        cfg: &RelationMatchConfig,
    ) -> Result<BatchReport, MatchError> {
        let span = tracing::span!(
            Level::INFO,
            "match.session",
            mode = "relation",
            targets = targets.len(),
            depth = cfg.depth,
            fuzzy = cfg.fuzzy
        );
        let _guard = span.enter();

        self.begin()?;
        let prepared = cfg.validate().and_then(|()| {
            let column = targets.column(target_column)?;
            let matcher = RelationMatcher::from_table(relations, columns, cfg)?;
            Ok((column, matcher))
        });
        let (column, matcher) = self.fail_on_err(prepared)?;
        info!(
            pairs = matcher.index().pair_count(),
            identifiers = matcher.index().len(),
            "relation_index_ready"
        );
        Ok(self.execute(targets, column, &matcher, cfg.into()))
    }

    /// Token-index matching of `targets[target_column]` against the two
    /// designated columns of `reference`.
    pub fn run_token(
        &mut self,
        targets: &Table,
        target_column: &str,
        reference: &Table,
        columns: &TokenColumns,
        cfg: &TokenMatchConfig,
    ) -> Result<BatchReport, MatchError> {
        let span = tracing::span!(
            Level::INFO,
            "match.session",
            mode = "token",
            targets = targets.len(),
            threshold = cfg.approx.threshold_ratio
        );
        let _guard = span.enter();

        self.begin()?;
        let prepared = cfg.validate().and_then(|()| {
            let column = targets.column(target_column)?;
            let matcher = TokenMatcher::from_table(reference, columns, cfg)?;
            Ok((column, matcher))
        });
        let (column, matcher) = self.fail_on_err(prepared)?;
        info!(
            left_keys = matcher.key_count(Side::Left),
            right_keys = matcher.key_count(Side::Right),
            "token_index_ready"
        );
        Ok(self.execute(targets, column, &matcher, cfg.into()))
    }

    /// Runs a prepared matcher over `targets[target_column]`.
    pub fn run_with<M: TargetMatcher>(
        &mut self,
        targets: &Table,
        target_column: &str,
        matcher: &M,
        options: RunOptions,
    ) -> Result<BatchReport, MatchError> {
        self.begin()?;
        let column = self.fail_on_err(targets.column(target_column).map_err(MatchError::from))?;
        if options.chunk_size == 0 {
            self.state = SessionState::Failed;
            return Err(MatchError::InvalidConfig(
                "chunk_size must be greater than zero".into(),
            ));
        }
        Ok(self.execute(targets, column, matcher, options))
    }

    fn begin(&mut self) -> Result<(), MatchError> {
        if self.state != SessionState::Idle {
            return Err(MatchError::InvalidState(self.state));
        }
        self.state = SessionState::Building;
        Ok(())
    }

    fn fail_on_err<T>(&mut self, result: Result<T, MatchError>) -> Result<T, MatchError> {
        result.inspect_err(|err| {
            warn!(error = %err, "session_failed");
            self.state = SessionState::Failed;
        })
    }

    fn execute<M: TargetMatcher>(
        &mut self,
        targets: &Table,
        column: usize,
        matcher: &M,
        options: RunOptions,
    ) -> BatchReport {
        let start = Instant::now();
        self.state = SessionState::Matching;

        let cells: Vec<Option<Identifier>> = targets.identifiers(column).collect();
        let total = cells.len();
        let tracker = ProgressTracker::new(Arc::clone(&self.observer));
        tracker.report(0);
        tracker.status(&format!("matching {total} targets"));

        let mut run = RunState::new(total, options.no_match);
        if options.parallel {
            self.run_parallel(&cells, matcher, options.chunk_size, &tracker, &mut run);
        } else {
            self.run_sequential(&cells, matcher, &tracker, &mut run);
        }

        let status = if run.cancelled {
            self.state = SessionState::Cancelled;
            tracker.status("cancelled");
            BatchStatus::Cancelled
        } else {
            self.state = SessionState::Done;
            tracker.report(100);
            tracker.status("done");
            BatchStatus::Done
        };

        info!(
            processed = run.processed,
            total,
            status = ?status,
            truncations = run.truncations,
            elapsed_micros = start.elapsed().as_micros(),
            "batch_complete"
        );

        BatchReport {
            mode: matcher.mode(),
            status,
            processed: run.processed,
            total,
            truncations: run.truncations,
            targets: run.targets,
        }
    }

    fn run_sequential<M: TargetMatcher>(
        &self,
        cells: &[Option<Identifier>],
        matcher: &M,
        tracker: &ProgressTracker,
        run: &mut RunState,
    ) {
        for (row, cell) in cells.iter().enumerate() {
            if self.cancel.is_cancelled() {
                run.cancelled = true;
                return;
            }
            let outcome = match_cell(matcher, cell.as_ref());
            run.push(row, cell.clone(), outcome, tracker);
        }
    }

    fn run_parallel<M: TargetMatcher>(
        &self,
        cells: &[Option<Identifier>],
        matcher: &M,
        chunk_size: usize,
        tracker: &ProgressTracker,
        run: &mut RunState,
    ) {
        for (chunk_idx, chunk) in cells.chunks(chunk_size).enumerate() {
            if self.cancel.is_cancelled() {
                run.cancelled = true;
                return;
            }
            let offset = chunk_idx * chunk_size;
            let cancel = &self.cancel;
            let outcomes: Vec<Option<TargetOutcome>> = chunk
                .par_iter()
                .map(|cell| {
                    if cancel.is_cancelled() {
                        None
                    } else {
                        Some(match_cell(matcher, cell.as_ref()))
                    }
                })
                .collect();

            // Keep only the prefix that ran before cancellation was observed.
            for (i, outcome) in outcomes.into_iter().enumerate() {
                match outcome {
                    Some(outcome) => run.push(offset + i, chunk[i].clone(), outcome, tracker),
                    None => {
                        run.cancelled = true;
                        return;
                    }
                }
            }
        }
    }
}

fn match_cell<M: TargetMatcher>(matcher: &M, cell: Option<&Identifier>) -> TargetOutcome {
    match cell {
        Some(target) => matcher.match_target(target),
        None => TargetOutcome::default(),
    }
}

/// Accumulates per-target results and drives progress reporting.
struct RunState {
    total: usize,
    policy: NoMatchPolicy,
    progress_step: usize,
    status_step: usize,
    processed: usize,
    truncations: usize,
    cancelled: bool,
    targets: Vec<TargetMatches>,
}

impl RunState {
    fn new(total: usize, policy: NoMatchPolicy) -> Self {
        let progress_step = (total / 100).max(1);
        Self {
            total,
            policy,
            progress_step,
            status_step: progress_step * 5,
            processed: 0,
            truncations: 0,
            cancelled: false,
            targets: Vec::with_capacity(total),
        }
    }

    fn push(
        &mut self,
        row: usize,
        target: Option<Identifier>,
        outcome: TargetOutcome,
        tracker: &ProgressTracker,
    ) {
        if outcome.truncated {
            self.truncations += 1;
            warn!(row, "candidate_cap_reached");
            tracker.status(&format!("row {}: candidate list truncated", row + 1));
        }
        let matches = TargetMatches {
            row,
            target,
            records: outcome.records,
        };
        if let Some(kept) = apply_policy(matches, self.policy) {
            self.targets.push(kept);
        }
        self.processed += 1;
        if self.processed % self.progress_step == 0 {
            tracker.report_fraction(self.processed, self.total);
        }
        if self.processed % self.status_step == 0 {
            tracker.status(&format!("processed {}/{}", self.processed, self.total));
        }
    }
}
