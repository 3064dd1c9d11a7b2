use std::time::Instant;

use canonical::Identifier;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Set of identifiers as used for frontiers, found sets and adjacency values.
pub type IdSet = HashSet<Identifier>;

/// One direction of the relation: identifier to the set of its partners.
pub type Adjacency = HashMap<Identifier, IdSet>;

/// Which designated column of a two-column table something came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// The two designated cells of one information-table row.
///
/// Either side may be null; such pairs are kept by the caller but
/// contribute nothing to the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationPair {
    pub left: Option<Identifier>,
    pub right: Option<Identifier>,
}

impl RelationPair {
    pub fn new(left: Option<Identifier>, right: Option<Identifier>) -> Self {
        Self { left, right }
    }

    /// A pair with both sides present.
    pub fn linked(left: impl Into<Identifier>, right: impl Into<Identifier>) -> Self {
        Self {
            left: Some(left.into()),
            right: Some(right.into()),
        }
    }
}

impl<A: Into<Identifier>, B: Into<Identifier>> From<(A, B)> for RelationPair {
    fn from((left, right): (A, B)) -> Self {
        Self::linked(left, right)
    }
}

/// Symmetric relation between identifiers of two columns.
///
/// Built once per session from the information table and read-only
/// afterwards. Every stored pair `(l, r)` contributes `r` to
/// `left_to_right[l]` and `l` to `right_to_left[r]`; nothing else does.
#[derive(Debug, Clone, Default)]
pub struct RelationIndex {
    left_to_right: Adjacency,
    right_to_left: Adjacency,
    pair_count: usize,
}

impl RelationIndex {
    /// Builds the index from any sequence of pairs. Pairs with a null side are
    /// discarded; duplicates collapse under set semantics. Never fails.
    pub fn build<I, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<RelationPair>,
    {
        let start = Instant::now();
        let mut index = RelationIndex::default();
        let mut discarded = 0usize;

        for pair in pairs {
            match pair.into() {
                RelationPair {
                    left: Some(left),
                    right: Some(right),
                } => index.insert(left, right),
                _ => discarded += 1,
            }
        }

        debug!(
            pairs = index.pair_count,
            identifiers = index.len(),
            discarded,
            elapsed_micros = start.elapsed().as_micros(),
            "relation_index_built"
        );
        index
    }

    fn insert(&mut self, left: Identifier, right: Identifier) {
        let added = self
            .left_to_right
            .entry(left.clone())
            .or_default()
            .insert(right.clone());
        self.right_to_left.entry(right).or_default().insert(left);
        if added {
            self.pair_count += 1;
        }
    }

    pub fn left_to_right(&self) -> &Adjacency {
        &self.left_to_right
    }

    pub fn right_to_left(&self) -> &Adjacency {
        &self.right_to_left
    }

    /// Map for one direction, keyed by identifiers of `side`.
    pub fn direction(&self, side: Side) -> &Adjacency {
        match side {
            Side::Left => &self.left_to_right,
            Side::Right => &self.right_to_left,
        }
    }

    /// Partners of `id` in either direction.
    pub fn neighbors(&self, id: &str) -> IdSet {
        let mut out = IdSet::new();
        if let Some(partners) = self.left_to_right.get(id) {
            out.extend(partners.iter().cloned());
        }
        if let Some(partners) = self.right_to_left.get(id) {
            out.extend(partners.iter().cloned());
        }
        out
    }

    /// Column in which `id` occurs; the right column wins when it occurs in both.
    pub fn side_of(&self, id: &str) -> Option<Side> {
        if self.right_to_left.contains_key(id) {
            Some(Side::Right)
        } else if self.left_to_right.contains_key(id) {
            Some(Side::Left)
        } else {
            None
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.left_to_right.contains_key(id) || self.right_to_left.contains_key(id)
    }

    /// Number of distinct stored pairs.
    pub fn pair_count(&self) -> usize {
        self.pair_count
    }

    /// Number of distinct identifiers across both columns.
    pub fn len(&self) -> usize {
        self.left_to_right.len()
            + self
                .right_to_left
                .keys()
                .filter(|k| !self.left_to_right.contains_key(k.as_str()))
                .count()
    }

    pub fn is_empty(&self) -> bool {
        self.pair_count == 0
    }
}
