use hashbrown::HashMap;

use crate::types::{MatchRecord, NoMatchPolicy, TargetMatches};

/// Merges exact and fuzzy records for one target.
///
/// Exact records come first, then fuzzy ones. A value that was matched
/// exactly never shows up again as fuzzy, and no value appears twice: the
/// first record wins and later duplicates only contribute their row hits.
///
/// ```rust
/// use canonical::Identifier;
/// use index::Side;
/// use matcher::{assemble, MatchRecord};
///
/// let src = Identifier::new("G1");
/// let exact = vec![MatchRecord::exact(src.clone(), "G2".into(), Side::Right)];
/// let fuzzy = vec![
///     MatchRecord::fuzzy(src.clone(), "G2".into(), 0.5, Side::Right),
///     MatchRecord::fuzzy(src.clone(), "G3".into(), 0.5, Side::Left),
/// ];
/// let merged = assemble(exact, fuzzy);
/// assert_eq!(merged.len(), 2);
/// assert!(!merged[0].is_fuzzy());
/// assert_eq!(merged[1].matched.as_str(), "G3");
/// ```
pub fn assemble(exact: Vec<MatchRecord>, fuzzy: Vec<MatchRecord>) -> Vec<MatchRecord> {
    let mut out: Vec<MatchRecord> = Vec::with_capacity(exact.len() + fuzzy.len());
    let mut seen: HashMap<canonical::Identifier, usize> = HashMap::new();

    for record in exact.into_iter().chain(fuzzy) {
        match seen.get(&record.matched) {
            Some(&pos) => {
                let kept = &mut out[pos];
                for hit in record.hits {
                    if !kept.hits.contains(&hit) {
                        kept.hits.push(hit);
                    }
                }
            }
            None => {
                seen.insert(record.matched.clone(), out.len());
                out.push(record);
            }
        }
    }
    out
}

/// Applies the no-match policy to one target's assembled records.
pub fn apply_policy(matches: TargetMatches, policy: NoMatchPolicy) -> Option<TargetMatches> {
    match policy {
        NoMatchPolicy::Omit if matches.is_marker() => None,
        _ => Some(matches),
    }
}
