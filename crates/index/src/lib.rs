//! # genelink index
//!
//! In-memory indexes built once per matching session and dropped with it.
//! Nothing here touches disk and nothing is shared between sessions.
//!
//! ## Core Features
//!
//! - **Relation Index**: [`RelationIndex`] stores the symmetric relation
//!   encoded by two columns of an information table as two adjacency maps,
//!   `left_to_right` and `right_to_left`.
//! - **Bounded Traversal**: [`search`] collects every identifier reachable
//!   from a seed set within a fixed number of rounds, in [`TraversalMode::Exact`]
//!   (key lookup) or [`TraversalMode::Fuzzy`] (substring containment) mode. The
//!   loop stops early at a fixed point.
//! - **Token Index**: [`TokenIndex`] maps tokens to normalized keys for one
//!   reference column; [`match_approx`] scores candidates by token overlap or
//!   substring containment under an [`ApproxConfig`].
//!
//! All indexes are read-only after construction and `Send + Sync`, so a
//! session can share them across worker threads by reference.
//!
//! ## Example Usage
//!
//! ```
//! use canonical::Identifier;
//! use index::{match_approx, search, ApproxConfig, RelationIndex, TokenIndex, TraversalMode};
//!
//! let relations = RelationIndex::build([("G1", "G2"), ("G2", "G3")]);
//! let reachable = search(&[Identifier::new("G1")], &relations, 2, TraversalMode::Exact);
//! assert!(reachable.contains("G3"));
//!
//! let keys = TokenIndex::build(["heat shock protein 70", "ribosomal protein L3"]);
//! let outcome = match_approx("Heat Shock Protein", &[&keys], &ApproxConfig::default());
//! assert_eq!(outcome.hits[0].key.as_str(), "heat shock protein 70");
//! ```

mod relation;
mod token;
mod traverse;

use thiserror::Error;

pub use crate::relation::{Adjacency, IdSet, RelationIndex, RelationPair, Side};
pub use crate::token::{
    match_approx, score_candidate, token_ratio, ApproxConfig, ApproxHit, ApproxOutcome,
    MatchRule, TokenIndex, DEFAULT_MAX_CANDIDATES, DEFAULT_THRESHOLD_RATIO,
};
pub use crate::traverse::{
    search, search_with_stats, Traversal, TraversalMode, DEFAULT_DEPTH, EXACT_SCORE,
    FUZZY_TRAVERSAL_SCORE,
};

/// Custom error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IndexError {
    #[error("invalid index configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn indexes_are_send_and_sync() {
        assert_send_sync::<RelationIndex>();
        assert_send_sync::<TokenIndex>();
    }
}
