//! Bounded multi-hop traversal over a [`RelationIndex`].
//!
//! Traversal is an explicit loop over rounds with a frontier/found pair:
//!
//! ```text
//! frontier = seeds, found = seeds
//! for round in 1..=depth:
//!     next   = expand(frontier)
//!     newly  = next - found
//!     if newly is empty: stop (fixed point)
//!     found |= newly; frontier = newly
//! result = found - seeds
//! ```
//!
//! Exact mode expands through both adjacency maps by key lookup. Fuzzy mode
//! expands through every key that strictly contains a frontier identifier as
//! a case-sensitive substring, again in both maps.

use std::time::Instant;

use canonical::Identifier;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::relation::{Adjacency, IdSet, RelationIndex};

/// Score attached to records found by exact traversal.
pub const EXACT_SCORE: f64 = 1.0;

/// Score attached to records found only by fuzzy traversal.
pub const FUZZY_TRAVERSAL_SCORE: f64 = 0.5;

/// Default number of traversal rounds.
pub const DEFAULT_DEPTH: usize = 3;

/// How a frontier identifier is matched against index keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalMode {
    /// Key lookup by equality.
    #[default]
    Exact,
    /// Every other key containing the frontier identifier.
    Fuzzy,
}

/// Traversal result plus the bookkeeping callers log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    /// Reachable identifiers, seeds excluded.
    pub found: IdSet,
    /// Rounds that produced at least one new identifier.
    pub rounds: usize,
    /// True when the loop stopped because a round added nothing.
    pub fixed_point: bool,
}

/// Everything reachable from `seeds` within `depth` rounds, excluding the seeds.
///
/// Unknown seeds and seeds without edges give an empty set.
///
/// ```rust
/// use canonical::Identifier;
/// use index::{search, RelationIndex, TraversalMode};
///
/// let index = RelationIndex::build([("G1", "G2"), ("G2", "G3")]);
/// let seeds = [Identifier::new("G1")];
/// assert_eq!(search(&seeds, &index, 1, TraversalMode::Exact).len(), 1);
/// assert_eq!(search(&seeds, &index, 2, TraversalMode::Exact).len(), 2);
/// ```
pub fn search<'a, I>(seeds: I, index: &RelationIndex, depth: usize, mode: TraversalMode) -> IdSet
where
    I: IntoIterator<Item = &'a Identifier>,
{
    search_with_stats(seeds, index, depth, mode).found
}

/// Like [`search`], also reporting how many rounds ran and whether the loop
/// reached a fixed point before exhausting `depth`.
pub fn search_with_stats<'a, I>(
    seeds: I,
    index: &RelationIndex,
    depth: usize,
    mode: TraversalMode,
) -> Traversal
where
    I: IntoIterator<Item = &'a Identifier>,
{
    let start = Instant::now();
    let seeds: IdSet = seeds.into_iter().cloned().collect();
    let mut frontier = seeds.clone();
    let mut found = seeds.clone();
    let mut rounds = 0;
    let mut fixed_point = false;

    for _ in 0..depth {
        let next = expand(&frontier, index, mode);
        let newly: IdSet = next.into_iter().filter(|id| !found.contains(id)).collect();
        if newly.is_empty() {
            fixed_point = true;
            break;
        }
        rounds += 1;
        found.extend(newly.iter().cloned());
        frontier = newly;
    }

    found.retain(|id| !seeds.contains(id));
    trace!(
        ?mode,
        seeds = seeds.len(),
        found = found.len(),
        rounds,
        fixed_point,
        elapsed_micros = start.elapsed().as_micros(),
        "traversal"
    );
    Traversal {
        found,
        rounds,
        fixed_point,
    }
}

fn expand(frontier: &IdSet, index: &RelationIndex, mode: TraversalMode) -> IdSet {
    let mut next = IdSet::new();
    match mode {
        TraversalMode::Exact => {
            for key in frontier {
                extend_exact(&mut next, index.left_to_right(), key);
                extend_exact(&mut next, index.right_to_left(), key);
            }
        }
        TraversalMode::Fuzzy => {
            for key in frontier {
                // An empty needle is contained in every key.
                if key.is_empty() {
                    continue;
                }
                extend_fuzzy(&mut next, index.left_to_right(), key);
                extend_fuzzy(&mut next, index.right_to_left(), key);
            }
        }
    }
    next
}

fn extend_exact(next: &mut IdSet, map: &Adjacency, key: &Identifier) {
    if let Some(partners) = map.get(key) {
        next.extend(partners.iter().cloned());
    }
}

fn extend_fuzzy(next: &mut IdSet, map: &Adjacency, key: &Identifier) {
    for (candidate, partners) in map {
        if candidate != key && candidate.contains(key.as_str()) {
            next.extend(partners.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<Identifier> {
        values.iter().map(|v| Identifier::new(*v)).collect()
    }

    fn sorted(set: &IdSet) -> Vec<&str> {
        let mut out: Vec<&str> = set.iter().map(Identifier::as_str).collect();
        out.sort_unstable();
        out
    }

    fn chain() -> RelationIndex {
        RelationIndex::build([("G1", "G2"), ("G2", "G3"), ("G3", "G4")])
    }

    #[test]
    fn exact_depth_limits_hops() {
        let index = chain();
        let seeds = ids(&["G1"]);
        assert_eq!(sorted(&search(&seeds, &index, 1, TraversalMode::Exact)), ["G2"]);
        assert_eq!(
            sorted(&search(&seeds, &index, 2, TraversalMode::Exact)),
            ["G2", "G3"]
        );
        assert_eq!(
            sorted(&search(&seeds, &index, 3, TraversalMode::Exact)),
            ["G2", "G3", "G4"]
        );
    }

    #[test]
    fn depth_zero_finds_nothing() {
        let index = chain();
        let t = search_with_stats(&ids(&["G1"]), &index, 0, TraversalMode::Exact);
        assert!(t.found.is_empty());
        assert_eq!(t.rounds, 0);
        assert!(!t.fixed_point);
    }

    #[test]
    fn unknown_seed_is_empty_not_error() {
        let index = RelationIndex::build([("G1", "G2")]);
        assert!(search(&ids(&["G9"]), &index, 3, TraversalMode::Exact).is_empty());
    }

    #[test]
    fn seeds_are_never_reported() {
        let index = RelationIndex::build([("A", "B"), ("B", "A")]);
        let found = search(&ids(&["A"]), &index, 5, TraversalMode::Exact);
        assert_eq!(sorted(&found), ["B"]);
    }

    #[test]
    fn stops_at_fixed_point() {
        let index = RelationIndex::build([("A", "B")]);
        let t = search_with_stats(&ids(&["A"]), &index, 10, TraversalMode::Exact);
        assert!(t.fixed_point);
        assert_eq!(t.rounds, 1);
        assert_eq!(sorted(&t.found), ["B"]);
    }

    #[test]
    fn seeds_are_not_expanded_twice() {
        let index = RelationIndex::build([("A", "B")]);
        let t = search_with_stats(&ids(&["A"]), &index, 2, TraversalMode::Exact);
        assert!(t.fixed_point);
        assert_eq!(t.rounds, 1);

        let chain = chain();
        let t = search_with_stats(&ids(&["G2"]), &chain, 5, TraversalMode::Exact);
        assert_eq!(sorted(&t.found), ["G1", "G3", "G4"]);
        assert_eq!(t.rounds, 2);
        assert!(t.fixed_point);
    }

    #[test]
    fn fuzzy_follows_containing_keys_in_both_maps() {
        let index = RelationIndex::build([("AT1G01010.1", "X1"), ("Y1", "AT1G01010.2")]);
        let found = search(&ids(&["AT1G01010"]), &index, 1, TraversalMode::Fuzzy);
        assert_eq!(sorted(&found), ["X1", "Y1"]);
    }

    #[test]
    fn fuzzy_is_case_sensitive_and_skips_equal_keys() {
        let index = RelationIndex::build([("at1g01010.1", "X1"), ("AT1G01010", "Z1")]);
        let found = search(&ids(&["AT1G01010"]), &index, 1, TraversalMode::Fuzzy);
        assert!(found.is_empty());
    }

    #[test]
    fn fuzzy_keeps_expanding_from_new_identifiers() {
        let index = RelationIndex::build([("AB1", "CD"), ("CD2", "EF")]);
        let found = search(&ids(&["AB"]), &index, 2, TraversalMode::Fuzzy);
        assert_eq!(sorted(&found), ["CD", "EF"]);
    }
}
