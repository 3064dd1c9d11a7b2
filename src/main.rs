//! genelink command-line interface.
//!
//! `relate` runs multi-hop relation matching, `lookup` runs token-index
//! matching, `convert` turns an MCScanX collinearity report into a CSV
//! relation table.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use genelink::report::{write_csv_file, write_report_json, write_table_csv};
use genelink::{
    lookup, read_collinearity, read_table, relate, render, BatchReport, ColumnPair,
    ConfigLoadError, FnObserver, GenelinkConfig, LayoutKind, NoMatchPolicy, ReferenceView,
    RenderContext, RunContext,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genelink")]
#[command(about = "Resolve identifier relationships between tables")]
#[command(version)]
struct Cli {
    /// YAML file with defaults for every option
    #[arg(long, global = true, env = "GENELINK_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `genelink=debug` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Table holding the identifiers to look up
    #[arg(long)]
    targets: PathBuf,

    /// Column of the target table to match
    #[arg(long)]
    target_column: Option<String>,

    /// First designated column
    #[arg(long)]
    left: Option<String>,

    /// Second designated column
    #[arg(long)]
    right: Option<String>,

    /// What to do with targets that have no matches
    #[arg(long, value_enum)]
    no_match: Option<NoMatchArg>,

    /// Process targets in parallel chunks
    #[arg(long)]
    parallel: bool,

    /// Output layout
    #[arg(long, value_enum)]
    layout: Option<LayoutKind>,

    /// Output CSV path
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Also write the full report as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Multi-hop relation matching against a two-column information table
    Relate {
        #[command(flatten)]
        common: CommonArgs,

        /// Information table (CSV, workbook or .collinearity)
        #[arg(long)]
        relations: PathBuf,

        /// Number of traversal rounds
        #[arg(long)]
        depth: Option<usize>,

        /// Also report values reached through containing keys
        #[arg(long)]
        fuzzy: bool,
    },

    /// Token-index matching against two columns of a reference table
    Lookup {
        #[command(flatten)]
        common: CommonArgs,

        /// Reference table (CSV or workbook)
        #[arg(long)]
        reference: PathBuf,

        /// Minimum token-overlap ratio for fuzzy matches
        #[arg(long)]
        threshold: Option<f64>,

        /// Maximum candidates scored per query
        #[arg(long)]
        max_candidates: Option<usize>,

        /// Copy every other reference column into detail output
        #[arg(long)]
        export_other: Option<bool>,
    },

    /// Convert an MCScanX collinearity report into a CSV relation table
    Convert {
        #[arg(long, short = 'i')]
        input: PathBuf,

        #[arg(long, short = 'o')]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum NoMatchArg {
    Marker,
    Omit,
}

impl From<NoMatchArg> for NoMatchPolicy {
    fn from(arg: NoMatchArg) -> Self {
        match arg {
            NoMatchArg::Marker => NoMatchPolicy::Marker,
            NoMatchArg::Omit => NoMatchPolicy::Omit,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = match &cli.config {
        Some(path) => GenelinkConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GenelinkConfig::default(),
    };

    match cli.command {
        Commands::Relate {
            common,
            relations,
            depth,
            fuzzy,
        } => {
            let section = &config.relation;
            let mut cfg = section.to_match_config();
            if let Some(depth) = depth {
                cfg.depth = depth;
            }
            cfg.fuzzy |= fuzzy;
            cfg.parallel |= common.parallel;
            if let Some(policy) = common.no_match {
                cfg.no_match = policy.into();
            }
            let target_column =
                required(&common.target_column, &section.target_column, "target_column")?;
            let columns = designated(&common, section.columns())?;

            let targets = read_table(&common.targets)?;
            let relations = read_table(&relations)?;
            let report = relate(
                &targets,
                &target_column,
                &relations,
                &columns,
                &cfg,
                &run_context(),
            )?;

            let layout = common.layout.unwrap_or(config.output.relation_layout());
            let ctx = RenderContext::new(&targets, &target_column)
                .with_match_header(&config.output.match_header);
            finish(&report, layout, &ctx, &common, &config)?;
        }
        Commands::Lookup {
            common,
            reference,
            threshold,
            max_candidates,
            export_other,
        } => {
            let section = &config.lookup;
            let mut cfg = section.to_match_config();
            if let Some(threshold) = threshold {
                cfg.approx.threshold_ratio = threshold;
            }
            if let Some(max) = max_candidates {
                cfg.approx.max_candidates = max;
            }
            if let Some(export) = export_other {
                cfg.export_other_columns = export;
            }
            cfg.parallel |= common.parallel;
            if let Some(policy) = common.no_match {
                cfg.no_match = policy.into();
            }
            let target_column =
                required(&common.target_column, &section.target_column, "target_column")?;
            let columns = designated(&common, section.columns())?;

            let targets = read_table(&common.targets)?;
            let reference = read_table(&reference)?;
            let report = lookup(
                &targets,
                &target_column,
                &reference,
                &columns,
                &cfg,
                &run_context(),
            )?;

            let layout = common.layout.unwrap_or(config.output.lookup_layout());
            let ctx = RenderContext::new(&targets, &target_column)
                .with_match_header(&config.output.match_header)
                .with_reference(ReferenceView {
                    table: &reference,
                    columns: &columns,
                    export_other_columns: cfg.export_other_columns,
                });
            finish(&report, layout, &ctx, &common, &config)?;
        }
        Commands::Convert { input, output } => {
            let table = read_collinearity(&input)?;
            let file = File::create(&output)
                .with_context(|| format!("creating {}", output.display()))?;
            write_table_csv(&table, BufWriter::new(file), config.output.delimiter_byte())?;
            info!(
                input = %input.display(),
                output = %output.display(),
                pairs = table.len(),
                "converted"
            );
        }
    }

    Ok(())
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_context() -> RunContext {
    let observer = FnObserver::new(
        |percent: u8| debug!(percent, "progress"),
        |message: &str| info!(status = message, "status"),
    );
    RunContext::new().with_observer(Arc::new(observer))
}

fn required(
    flag: &Option<String>,
    fallback: &Option<String>,
    name: &str,
) -> Result<String, ConfigLoadError> {
    flag.clone()
        .or_else(|| fallback.clone())
        .ok_or_else(|| ConfigLoadError::MissingField(name.to_string()))
}

fn designated(
    common: &CommonArgs,
    fallback: Option<ColumnPair>,
) -> Result<ColumnPair, ConfigLoadError> {
    match (&common.left, &common.right) {
        (Some(left), Some(right)) => Ok(ColumnPair::new(left.as_str(), right.as_str())),
        (None, None) => fallback.ok_or_else(|| ConfigLoadError::MissingField("left/right".into())),
        (Some(_), None) => Err(ConfigLoadError::MissingField("right".into())),
        (None, Some(_)) => Err(ConfigLoadError::MissingField("left".into())),
    }
}

fn finish(
    report: &BatchReport,
    layout: LayoutKind,
    ctx: &RenderContext<'_>,
    common: &CommonArgs,
    config: &GenelinkConfig,
) -> anyhow::Result<()> {
    let table = render(report, layout, ctx)?;
    write_csv_file(&table, &common.output, config.output.delimiter_byte())
        .with_context(|| format!("writing {}", common.output.display()))?;
    if let Some(path) = &common.report_json {
        let file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_report_json(report, BufWriter::new(file))?;
    }
    info!(
        processed = report.processed,
        total = report.total,
        records = report.record_count(),
        status = ?report.status,
        "finished"
    );
    Ok(())
}
