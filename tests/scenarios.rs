use std::sync::Arc;

use genelink::{
    lookup, match_approx, relate, search, ApproxConfig, BatchStatus, ColumnPair, FnObserver,
    Identifier, MatchKind, NoMatchPolicy, RelationIndex, RelationMatchConfig, RunContext, Side,
    Table, TokenIndex, TokenMatchConfig, TraversalMode,
};
use index::{score_candidate, MatchRule};

fn ids(values: &[&str]) -> Vec<Identifier> {
    values.iter().map(Identifier::new).collect()
}

fn sorted(found: index::IdSet) -> Vec<String> {
    let mut out: Vec<String> = found.into_iter().map(|id| id.as_str().to_string()).collect();
    out.sort();
    out
}

#[test]
fn scenario_1_depth_bounds_reach() {
    let index = RelationIndex::build([("G1", "G2"), ("G2", "G3")]);
    let seeds = ids(&["G1"]);
    assert_eq!(
        sorted(search(&seeds, &index, 1, TraversalMode::Exact)),
        vec!["G2"]
    );
    assert_eq!(
        sorted(search(&seeds, &index, 2, TraversalMode::Exact)),
        vec!["G2", "G3"]
    );
}

#[test]
fn scenario_2_unknown_seed_finds_nothing() {
    let index = RelationIndex::build([("G1", "G2")]);
    let found = search(&ids(&["G9"]), &index, 3, TraversalMode::Exact);
    assert!(found.is_empty());
}

#[test]
fn scenario_3_exact_key_scores_one() {
    let index = TokenIndex::build(["AT1G01010", "AT1G01020"]);
    let outcome = match_approx(
        "AT1G01010",
        &[&index],
        &ApproxConfig::new().with_threshold(0.8),
    );
    let hit = outcome
        .hits
        .iter()
        .find(|h| h.key.as_str() == "at1g01010")
        .expect("exact key is a hit");
    assert_eq!(hit.ratio, 1.0);
    assert_eq!(hit.rule, MatchRule::Substring);
    assert_eq!(outcome.hits[0].key.as_str(), "at1g01010");
}

#[test]
fn scenario_4_truncated_query_accepted_by_substring() {
    let hit = score_candidate("AT1G0101", "AT1G01010", 0.5).expect("substring accepted");
    assert_eq!(hit.rule, MatchRule::Substring);
    assert!((0.0..=1.0).contains(&hit.ratio));
}

#[test]
fn scenario_4_truncated_query_matches_through_lookup() {
    let targets = Table::from_text_rows("targets.csv", ["Query"], [["AT1G0101"]]);
    let reference = Table::from_text_rows(
        "reference.csv",
        ["L", "R"],
        [["AT1G01010", "NAC001"], ["AT5G99999", "XYZ9"]],
    );
    let report = lookup(
        &targets,
        "Query",
        &reference,
        &ColumnPair::new("L", "R"),
        &TokenMatchConfig {
            approx: ApproxConfig::new().with_threshold(0.5),
            ..TokenMatchConfig::default()
        },
        &RunContext::new(),
    )
    .unwrap();

    let records = &report.targets[0].records;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].matched.as_str(), "AT1G01010");
    assert_eq!(records[0].kind, MatchKind::Fuzzy);
    assert_eq!(records[0].matched_column, Side::Left);
    assert_eq!(records[0].hits[0].row, 0);
}

#[test]
fn scenario_5_candidate_cap_keeps_deterministic_subset() {
    let keys = [
        "kinase e", "kinase c", "kinase a", "kinase d", "kinase b",
    ];
    let index = TokenIndex::build(keys);
    let cfg = ApproxConfig::new().with_max_candidates(2);
    let outcome = match_approx("kinase", &[&index], &cfg);

    assert!(outcome.truncated);
    assert_eq!(outcome.candidates_considered, 5);
    let kept: Vec<&str> = outcome.hits.iter().map(|h| h.key.as_str()).collect();
    assert_eq!(kept, vec!["kinase a", "kinase b"]);

    let again = match_approx("kinase", &[&index], &cfg);
    assert_eq!(outcome, again);
}

#[test]
fn scenario_6_cancellation_after_third_target() {
    let mut targets = Table::new("targets.csv", ["Gene"]);
    for i in 0..10 {
        // every other target has no relation at all
        let value = if i % 2 == 0 { "G1" } else { "unknown" };
        targets.push_text_row([value]);
    }
    let relations = Table::from_text_rows(
        "relations.csv",
        ["GeneA", "GeneB"],
        [["G1", "G2"], ["G2", "G3"]],
    );

    let ctx = RunContext::new();
    let handle = ctx.cancellation_token();
    let observer = FnObserver::new(
        move |percent: u8| {
            if percent >= 30 {
                handle.cancel();
            }
        },
        |_status: &str| {},
    );
    let ctx = ctx.with_observer(Arc::new(observer));

    let cfg = RelationMatchConfig {
        no_match: NoMatchPolicy::Marker,
        ..RelationMatchConfig::default()
    };
    let report = relate(
        &targets,
        "Gene",
        &relations,
        &ColumnPair::new("GeneA", "GeneB"),
        &cfg,
        &ctx,
    )
    .expect("run succeeds");

    assert_eq!(report.status, BatchStatus::Cancelled);
    assert_eq!(report.processed, 3);
    assert_eq!(report.targets.len(), 3);
    assert!(report.targets[1].is_marker());
    assert_eq!(report.targets[0].records.len(), 2);
}
