// Property-based tests for traversal, token scoring and match assembly.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use genelink::{search, Identifier, MatchRecord, RelationIndex, Side, TraversalMode};
use index::{search_with_stats, token_ratio};
use matcher::assemble;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Small identifier space so random pairs form connected components.
fn arb_gene() -> impl Strategy<Value = String> {
    (0u8..12).prop_map(|n| format!("G{n}"))
}

fn arb_pairs() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((arb_gene(), arb_gene()), 0..30)
}

fn arb_mode() -> impl Strategy<Value = TraversalMode> {
    prop_oneof![Just(TraversalMode::Exact), Just(TraversalMode::Fuzzy)]
}

fn arb_words() -> impl Strategy<Value = std::collections::BTreeSet<String>> {
    prop::collection::btree_set(r"[a-d]{1,3}", 0..6)
}

fn build(pairs: &[(String, String)]) -> RelationIndex {
    RelationIndex::build(pairs.iter().map(|(l, r)| (l.as_str(), r.as_str())))
}

fn reach(index: &RelationIndex, seed: &str, depth: usize, mode: TraversalMode) -> HashSet<String> {
    search(&[Identifier::new(seed)], index, depth, mode)
        .into_iter()
        .map(|id| id.as_str().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn exact_reach_is_symmetric(pairs in arb_pairs(), a in arb_gene(), depth in 1usize..5) {
        let index = build(&pairs);
        for b in reach(&index, &a, depth, TraversalMode::Exact) {
            prop_assert!(
                reach(&index, &b, depth, TraversalMode::Exact).contains(&a),
                "{b} reachable from {a} but not the reverse"
            );
        }
    }

    #[test]
    fn exact_reach_grows_with_depth(pairs in arb_pairs(), seed in arb_gene(), depth in 1usize..5) {
        let index = build(&pairs);
        let shallow = reach(&index, &seed, depth, TraversalMode::Exact);
        let deep = reach(&index, &seed, depth + 1, TraversalMode::Exact);
        prop_assert!(shallow.is_subset(&deep));
    }

    #[test]
    fn fixed_point_is_stable(
        pairs in arb_pairs(),
        seed in arb_gene(),
        depth in 1usize..6,
        mode in arb_mode(),
    ) {
        let index = build(&pairs);
        let seeds = [Identifier::new(&seed)];
        let stats = search_with_stats(&seeds, &index, depth, mode);
        if stats.fixed_point {
            let further = search(&seeds, &index, depth + 5, mode);
            prop_assert_eq!(stats.found, further);
        }
    }

    #[test]
    fn seeds_never_reported(pairs in arb_pairs(), seed in arb_gene(), mode in arb_mode()) {
        let index = build(&pairs);
        prop_assert!(!reach(&index, &seed, 4, mode).contains(&seed));
    }
}

// ---------------------------------------------------------------------------
// Token ratio
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn ratio_is_bounded(q in arb_words(), k in arb_words()) {
        let ratio = token_ratio(&q, &k);
        prop_assert!((0.0..=1.0).contains(&ratio));
    }

    #[test]
    fn identical_sets_score_one(q in arb_words()) {
        prop_assume!(!q.is_empty());
        prop_assert_eq!(token_ratio(&q, &q), 1.0);
    }

    #[test]
    fn ratio_is_symmetric(q in arb_words(), k in arb_words()) {
        prop_assert_eq!(token_ratio(&q, &k), token_ratio(&k, &q));
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn assembled_values_are_unique_and_exact_first(
        exact in prop::collection::vec(arb_gene(), 0..8),
        fuzzy in prop::collection::vec(arb_gene(), 0..8),
    ) {
        let source = Identifier::new("Q");
        let exact_records: Vec<MatchRecord> = exact
            .iter()
            .map(|g| MatchRecord::exact(source.clone(), Identifier::new(g), Side::Right))
            .collect();
        let fuzzy_records: Vec<MatchRecord> = fuzzy
            .iter()
            .map(|g| MatchRecord::fuzzy(source.clone(), Identifier::new(g), 0.5, Side::Left))
            .collect();

        let merged = assemble(exact_records, fuzzy_records);

        let mut seen = HashSet::new();
        for record in &merged {
            prop_assert!(seen.insert(record.matched.clone()), "duplicate {}", record.matched.as_str());
        }
        let first_fuzzy = merged.iter().position(MatchRecord::is_fuzzy).unwrap_or(merged.len());
        prop_assert!(merged[first_fuzzy..].iter().all(MatchRecord::is_fuzzy));

        let exact_set: HashSet<&String> = exact.iter().collect();
        for record in merged.iter().filter(|r| r.is_fuzzy()) {
            prop_assert!(!exact_set.contains(&record.matched.as_str().to_string()));
        }
        let expected: HashSet<&String> = exact.iter().chain(fuzzy.iter()).collect();
        prop_assert_eq!(merged.len(), expected.len());
    }
}
