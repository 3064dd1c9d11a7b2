use std::fs;
use std::path::Path;

use genelink::report::{write_csv_file, write_report_json, write_table_csv};
use genelink::{
    lookup, read_table, relate, render, ColumnPair, GenelinkConfig, LayoutKind, ReferenceView,
    RenderContext, RunContext,
};

const COLLINEARITY: &str = "\
############### Parameters ###############
# MATCH_SCORE: 50
## Alignment 0: score=250.0 e_value=1.2e-10 N=2 At1&At2 plus
  0-  0:\tAT1G01010\tAT2G01010\t  2e-80
  0-  1:\tAT1G01020\tAT2G01020\t  1e-45
## Alignment 1: score=150.0 e_value=3e-5 N=1 At2&At3 minus
  1-  0:\tAT2G01010\tAT3G01010\t  4e-20
";

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn relate_from_collinearity_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let targets_path = write(dir.path(), "targets.csv", "Gene,Note\nAT1G01010,a\nAT9G00000,b\n");
    let relations_path = write(dir.path(), "pairs.collinearity", COLLINEARITY);

    let config = GenelinkConfig::from_yaml(
        "version: \"1.0\"\nrelation:\n  left_column: GeneA\n  right_column: GeneB\n  depth: 2\n",
    )
    .unwrap();
    let columns = config.relation.columns().unwrap();

    let targets = read_table(&targets_path).unwrap();
    let relations = read_table(&relations_path).unwrap();
    let report = relate(
        &targets,
        "Gene",
        &relations,
        &columns,
        &config.relation.to_match_config(),
        &RunContext::new(),
    )
    .unwrap();

    let table = render(
        &report,
        LayoutKind::Horizontal,
        &RenderContext::new(&targets, "Gene"),
    )
    .unwrap();
    let out = dir.path().join("out.csv");
    write_csv_file(&table, &out, b',').unwrap();

    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(
        written,
        "Gene,Match 1,Match 2\nAT1G01010,AT2G01010,AT3G01010\nAT9G00000,,\n"
    );
}

#[test]
fn converted_collinearity_reads_back_as_relation_table() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "pairs.collinearity", COLLINEARITY);
    let table = read_table(&source).unwrap();

    let converted = dir.path().join("pairs.csv");
    write_table_csv(&table, fs::File::create(&converted).unwrap(), b',').unwrap();

    let reread = read_table(&converted).unwrap();
    assert_eq!(reread.header(), table.header());
    assert_eq!(reread.rows(), table.rows());
    assert_eq!(reread.cell(0, 0), Some("0-  0:"));
}

#[test]
fn lookup_detail_with_bom_and_exported_columns() {
    let dir = tempfile::tempdir().unwrap();
    let targets_path = write(dir.path(), "queries.csv", "\u{feff}Query\nhsp70\nRibosomal Protein\nzzz\n");
    let reference_path = write(
        dir.path(),
        "reference.csv",
        "Symbol,Alias,Chrom\nHSP70,heat shock protein 70,chr1\nRPL3,ribosomal protein L3,chr2\n",
    );

    let targets = read_table(&targets_path).unwrap();
    let reference = read_table(&reference_path).unwrap();
    let columns = ColumnPair::new("Symbol", "Alias");
    let config = GenelinkConfig::default();
    let cfg = config.lookup.to_match_config();

    let report = lookup(
        &targets,
        "Query",
        &reference,
        &columns,
        &cfg,
        &RunContext::new(),
    )
    .unwrap();

    let ctx = RenderContext::new(&targets, "Query").with_reference(ReferenceView {
        table: &reference,
        columns: &columns,
        export_other_columns: cfg.export_other_columns,
    });
    let table = render(&report, LayoutKind::Detail, &ctx).unwrap();
    assert_eq!(
        table.header,
        vec!["Target", "Kind", "Matched", "Counterpart", "Ratio", "B_Chrom"]
    );
    assert_eq!(
        table.values(0),
        vec!["hsp70", "exact", "HSP70", "heat shock protein 70", "1.000", "chr1"]
    );
    assert_eq!(
        table.values(1),
        vec!["Ribosomal Protein", "fuzzy", "ribosomal protein L3", "RPL3", "1.000", "chr2"]
    );
    assert!(table.rows[1][2].fuzzy);
    assert_eq!(table.values(2)[..2], ["zzz", "none"]);

    let mut json = Vec::new();
    write_report_json(&report, &mut json).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(value["mode"], "token");
    assert_eq!(value["targets"][0]["records"][0]["kind"], "exact");
}
