//! Token inverted index and approximate key matching.
//!
//! A [`TokenIndex`] is built once per designated reference column. Query
//! keys are normalized and tokenized the same way, candidates come from the
//! postings of the query's tokens, and each candidate is accepted either by
//! substring containment or by token overlap above a threshold.

use std::cmp::Ordering;
use std::time::Instant;

use canonical::{normalize_key, token_set, Identifier, TokenSet};
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::IndexError;

/// Default acceptance threshold for token overlap.
pub const DEFAULT_THRESHOLD_RATIO: f64 = 0.8;

/// Default candidate cap per query.
pub const DEFAULT_MAX_CANDIDATES: usize = 500;

/// Settings for [`match_approx`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApproxConfig {
    /// Minimum token-overlap ratio, in `[0, 1]`.
    #[serde(default = "default_threshold_ratio")]
    pub threshold_ratio: f64,
    /// Maximum number of candidates scored per query; at least 1.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

fn default_threshold_ratio() -> f64 {
    DEFAULT_THRESHOLD_RATIO
}

fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

impl Default for ApproxConfig {
    fn default() -> Self {
        Self {
            threshold_ratio: default_threshold_ratio(),
            max_candidates: default_max_candidates(),
        }
    }
}

impl ApproxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold_ratio: f64) -> Self {
        self.threshold_ratio = threshold_ratio;
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if !(0.0..=1.0).contains(&self.threshold_ratio) {
            return Err(IndexError::InvalidConfig(format!(
                "threshold_ratio must be within [0, 1], got {}",
                self.threshold_ratio
            )));
        }
        if self.max_candidates == 0 {
            return Err(IndexError::InvalidConfig(
                "max_candidates must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Which acceptance rule admitted a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// One normalized key contains the other.
    Substring,
    /// Token overlap ratio reached the threshold.
    TokenOverlap,
}

/// An accepted candidate key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproxHit {
    /// Normalized key as stored in the index.
    pub key: Identifier,
    pub ratio: f64,
    pub rule: MatchRule,
}

/// Result of one approximate lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApproxOutcome {
    /// Accepted keys, ratio descending then key ascending.
    pub hits: Vec<ApproxHit>,
    /// Distinct candidates before the cap was applied.
    pub candidates_considered: usize,
    /// True when the cap dropped candidates.
    pub truncated: bool,
}

/// Inverted index from token to normalized keys, plus each key's token set.
#[derive(Debug, Clone, Default)]
pub struct TokenIndex {
    postings: HashMap<String, HashSet<Identifier>>,
    key_tokens: HashMap<Identifier, TokenSet>,
}

impl TokenIndex {
    /// Builds the index from raw keys. Keys are normalized first; keys that
    /// normalize to nothing are skipped. A key without tokens is still known
    /// but has no postings.
    pub fn build<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let start = Instant::now();
        let mut index = TokenIndex::default();
        for raw in keys {
            let Some(key) = Identifier::normalized(raw.as_ref()) else {
                continue;
            };
            if index.key_tokens.contains_key(&key) {
                continue;
            }
            let tokens = token_set(key.as_str());
            for token in &tokens {
                index
                    .postings
                    .entry(token.clone())
                    .or_default()
                    .insert(key.clone());
            }
            index.key_tokens.insert(key, tokens);
        }
        debug!(
            keys = index.key_tokens.len(),
            tokens = index.postings.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "token_index_built"
        );
        index
    }

    /// Whether the normalized form of `raw` is a known key.
    pub fn contains(&self, raw: &str) -> bool {
        self.key_tokens.contains_key(normalize_key(raw).as_str())
    }

    /// Token set of a normalized key.
    pub fn tokens_of(&self, key: &str) -> Option<&TokenSet> {
        self.key_tokens.get(key)
    }

    /// Keys whose token sets contain `token`.
    pub fn postings(&self, token: &str) -> Option<&HashSet<Identifier>> {
        self.postings.get(token)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.key_tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_tokens.is_empty()
    }

    /// Number of distinct tokens.
    pub fn token_count(&self) -> usize {
        self.postings.len()
    }
}

/// `|q ∩ k| / max(1, min(|q|, |k|))`, or `0.0` when either set is empty.
pub fn token_ratio(query: &TokenSet, key: &TokenSet) -> f64 {
    if query.is_empty() || key.is_empty() {
        return 0.0;
    }
    let inter = query.intersection(key).count();
    inter as f64 / query.len().min(key.len()).max(1) as f64
}

/// Applies the acceptance rules to one normalized query/key pair.
fn accept(
    query: &str,
    query_tokens: &TokenSet,
    key: &str,
    key_tokens: &TokenSet,
    threshold: f64,
) -> Option<(f64, MatchRule)> {
    let ratio = token_ratio(query_tokens, key_tokens);
    if key.contains(query) || query.contains(key) {
        return Some((ratio, MatchRule::Substring));
    }
    let overlaps = query_tokens.intersection(key_tokens).next().is_some();
    if overlaps && ratio >= threshold {
        Some((ratio, MatchRule::TokenOverlap))
    } else {
        None
    }
}

/// Scores a single query against a single key, both given raw.
///
/// This is the acceptance test [`match_approx`] applies to every candidate;
/// it is exposed for callers that already know which key to compare against.
///
/// ```rust
/// use index::{score_candidate, MatchRule};
///
/// let hit = score_candidate("AT1G0101", "AT1G01010", 0.5).unwrap();
/// assert_eq!(hit.rule, MatchRule::Substring);
/// ```
pub fn score_candidate(query: &str, key: &str, threshold: f64) -> Option<ApproxHit> {
    let query = normalize_key(query);
    let key = Identifier::normalized(key)?;
    if query.is_empty() {
        return None;
    }
    let (ratio, rule) = accept(
        &query,
        &token_set(&query),
        key.as_str(),
        &token_set(key.as_str()),
        threshold,
    )?;
    Some(ApproxHit { key, ratio, rule })
}

/// Approximate lookup of `query` across one or more token indexes.
///
/// Candidates are the keys sharing at least one token with the query, plus
/// the keys that contain the normalized query or are contained in it (a
/// truncated identifier such as `AT1G0101` shares no token with
/// `AT1G01010`). If there are more than `cfg.max_candidates`, the ones with
/// the largest token intersection are kept (ties by ascending key), so
/// substring-only candidates go first. Accepted hits are sorted by
/// ratio descending, then key ascending.
pub fn match_approx(query: &str, indexes: &[&TokenIndex], cfg: &ApproxConfig) -> ApproxOutcome {
    let query = normalize_key(query);
    let query_tokens = token_set(&query);
    if query_tokens.is_empty() {
        return ApproxOutcome::default();
    }

    // Distinct candidates with their token sets; a key present in several
    // indexes has the same token set in each.
    let mut candidates: HashMap<&Identifier, &TokenSet> = HashMap::new();
    for index in indexes {
        for token in &query_tokens {
            let Some(keys) = index.postings.get(token.as_str()) else {
                continue;
            };
            for key in keys {
                if let Some(tokens) = index.key_tokens.get(key) {
                    candidates.entry(key).or_insert(tokens);
                }
            }
        }
        for (key, tokens) in &index.key_tokens {
            if key.contains(query.as_str()) || query.contains(key.as_str()) {
                candidates.entry(key).or_insert(tokens);
            }
        }
    }

    let candidates_considered = candidates.len();
    let mut ranked: Vec<(&Identifier, &TokenSet, usize)> = candidates
        .into_iter()
        .map(|(key, tokens)| (key, tokens, query_tokens.intersection(tokens).count()))
        .collect();

    let truncated = ranked.len() > cfg.max_candidates;
    if truncated {
        ranked.sort_unstable_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(cfg.max_candidates);
        debug!(
            candidates = candidates_considered,
            kept = cfg.max_candidates,
            "candidate cap reached, lowest-overlap candidates dropped"
        );
    }

    let mut hits: Vec<ApproxHit> = ranked
        .into_iter()
        .filter_map(|(key, tokens, _)| {
            accept(&query, &query_tokens, key.as_str(), tokens, cfg.threshold_ratio).map(
                |(ratio, rule)| ApproxHit {
                    key: key.clone(),
                    ratio,
                    rule,
                },
            )
        })
        .collect();

    hits.sort_unstable_by(|a, b| {
        b.ratio
            .partial_cmp(&a.ratio)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });

    ApproxOutcome {
        hits,
        candidates_considered,
        truncated,
    }
}
