use genelink::report::write_csv;
use genelink::{
    lookup, relate, render, ColumnPair, LayoutKind, RelationMatchConfig, RenderContext,
    RunContext, Table, TokenMatchConfig,
};

fn relations(rows: &[[&str; 2]]) -> Table {
    Table::from_text_rows("relations.csv", ["GeneA", "GeneB"], rows.iter().copied())
}

fn relate_csv(targets: &Table, relations: &Table, layout: LayoutKind) -> String {
    let report = relate(
        targets,
        "Gene",
        relations,
        &ColumnPair::new("GeneA", "GeneB"),
        &RelationMatchConfig {
            fuzzy: true,
            ..RelationMatchConfig::default()
        },
        &RunContext::new(),
    )
    .unwrap();
    let table = render(&report, layout, &RenderContext::new(targets, "Gene")).unwrap();
    let mut buf = Vec::new();
    write_csv(&table, &mut buf, b',').unwrap();
    String::from_utf8(buf).unwrap()
}

const ROWS: [[&str; 2]; 6] = [
    ["AT1G01010", "AT2G01010"],
    ["AT2G01010", "AT3G01010"],
    ["AT1G010100", "AT5G00001"],
    ["AT4G11111", "AT1G01010"],
    ["AT3G01010", "AT4G22222"],
    ["AT5G00001", "AT5G00002"],
];

fn targets() -> Table {
    Table::from_text_rows(
        "targets.csv",
        ["Gene", "Note"],
        [
            ["AT1G01010", "seed"],
            ["AT9G99999", "orphan"],
            ["AT3G01010", "middle"],
        ],
    )
}

#[test]
fn repeated_runs_produce_identical_output() {
    let relations = relations(&ROWS);
    for layout in [LayoutKind::Vertical, LayoutKind::Horizontal, LayoutKind::Joined] {
        let first = relate_csv(&targets(), &relations, layout);
        for _ in 0..5 {
            assert_eq!(first, relate_csv(&targets(), &relations, layout));
        }
    }
}

#[test]
fn pair_order_does_not_change_output() {
    let mut reversed = ROWS;
    reversed.reverse();
    assert_eq!(
        relate_csv(&targets(), &relations(&ROWS), LayoutKind::Vertical),
        relate_csv(&targets(), &relations(&reversed), LayoutKind::Vertical),
    );
}

#[test]
fn exact_records_precede_fuzzy_in_output() {
    let csv = relate_csv(&targets(), &relations(&ROWS), LayoutKind::Vertical);
    let seed_rows: Vec<&str> = csv.lines().filter(|l| l.starts_with("AT1G01010,")).collect();
    // AT1G010100 contains AT1G01010, so its partner arrives through fuzzy expansion.
    let fuzzy_pos = seed_rows
        .iter()
        .position(|l| l.ends_with("AT5G00001"))
        .expect("fuzzy match present");
    let exact_pos = seed_rows
        .iter()
        .position(|l| l.ends_with("AT2G01010"))
        .expect("exact match present");
    assert!(exact_pos < fuzzy_pos);
}

#[test]
fn lookup_output_is_stable() {
    let reference = Table::from_text_rows(
        "reference.csv",
        ["Symbol", "Alias"],
        [
            ["HSP70", "heat shock protein 70"],
            ["HSP90", "heat shock protein 90"],
            ["HSC70", "heat shock cognate 70"],
        ],
    );
    let targets = Table::from_text_rows("targets.csv", ["Query"], [["heat shock"], ["hsp90"]]);
    let columns = ColumnPair::new("Symbol", "Alias");

    let run = || {
        let report = lookup(
            &targets,
            "Query",
            &reference,
            &columns,
            &TokenMatchConfig::default(),
            &RunContext::new(),
        )
        .unwrap();
        serde_json::to_string(&report).unwrap()
    };
    let first = run();
    for _ in 0..5 {
        assert_eq!(first, run());
    }
}
