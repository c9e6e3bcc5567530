//! satellite-radar CLI: find main stars of Q(n) = n^47 - (n-1)^47, census
//! their satellites, and compare the census with the prime models.
//!
//! Subcommands:
//!   run      --lo=<n> --hi=<n> | --list=<n,...> | --quadruplets [--log-dir=<dir>]
//!            [--radius=<R>] [--config=<file.json>] [--checkpoint=<file>] [--output=<file>]
//!   analyze  --checkpoint=<file> | --catalog=<file>  --radius=<R> [--output=<file>]
//!
//! Exit status: 0 on success, 2 on a configuration error, 1 otherwise.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use num_bigint::BigUint;

use landscape_core::{OracleConfig, PowerDifference};
use landscape_stats::{AggregationEngine, ModelParams, Report, StatsError};
use satellite_radar::catalog::{parse_pairs, Catalog};
use satellite_radar::{
    Checkpoint, Granularity, IndexSource, Pipeline, RadarError, Result, RunConfig, RunOutput,
    RunReport, ScanWindow,
};

#[derive(Debug, Parser)]
#[command(name = "satellite-radar", version, about = "Satellite primes around Q(n) = n^47 - (n-1)^47")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Locate main stars and census their satellites.
    Run(RunArgs),
    /// Recompute the statistics from a checkpoint or an (n, k) catalog.
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GranularityArg {
    Star,
    Candidate,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Star => Granularity::PerStar,
            GranularityArg::Candidate => Granularity::PerCandidate,
        }
    }
}

#[derive(Debug, Args)]
struct RunArgs {
    /// JSON run configuration; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    /// First index of the half-open range [lo, hi).
    #[arg(long, requires = "hi")]
    lo: Option<String>,
    #[arg(long, requires = "lo")]
    hi: Option<String>,
    /// Explicit indices, comma separated.
    #[arg(long, value_delimiter = ',')]
    list: Vec<String>,
    /// Scan the built-in quadruplet catalog.
    #[arg(long)]
    quadruplets: bool,
    /// Add quadruplet bases scraped from *.log and *.txt files in this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Scan radius R.
    #[arg(long, short = 'R')]
    radius: Option<u64>,
    /// Extra Miller-Rabin rounds per candidate.
    #[arg(long)]
    rounds: Option<u32>,
    /// Worker threads (default: all cores).
    #[arg(long)]
    threads: Option<usize>,
    /// Unit of parallel work for satellite scans.
    #[arg(long, value_enum)]
    granularity: Option<GranularityArg>,
    /// Test every even gap instead of the admissible ones only.
    #[arg(long)]
    no_filter: bool,
    /// Checkpoint file; an existing one for the same run is resumed.
    #[arg(long)]
    checkpoint: Option<PathBuf>,
    /// Indices between checkpoints.
    #[arg(long)]
    chunk_size: Option<usize>,
    #[arg(long, short, default_value = "satellites.json")]
    output: PathBuf,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Checkpoint written by `run`.
    #[arg(long, conflicts_with = "catalog", required_unless_present = "catalog")]
    checkpoint: Option<PathBuf>,
    /// Satellite catalog with one `n,k` pair per line.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Radius the data was scanned with.
    #[arg(long, short = 'R')]
    radius: u64,
    #[arg(long, default_value_t = PowerDifference::DEFAULT_EXPONENT)]
    exponent: u32,
    /// Write the report here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn parse_index(raw: &str) -> Result<BigUint> {
    BigUint::parse_bytes(raw.trim().as_bytes(), 10)
        .ok_or_else(|| RadarError::Config(format!("not a non-negative integer: {:?}", raw)))
}

fn index_source(args: &RunArgs) -> Result<Option<IndexSource>> {
    let mut sources = Vec::new();
    if let (Some(lo), Some(hi)) = (&args.lo, &args.hi) {
        sources.push(IndexSource::Range {
            lo: parse_index(lo)?,
            hi: parse_index(hi)?,
        });
    }
    if !args.list.is_empty() {
        let indices = args.list.iter().map(|s| parse_index(s)).collect::<Result<_>>()?;
        sources.push(IndexSource::List { indices });
    }
    if args.quadruplets || args.log_dir.is_some() {
        let mut catalog = Catalog::builtin();
        if let Some(dir) = &args.log_dir {
            catalog.load_log_dir(dir)?;
        }
        sources.push(catalog.to_source());
    }
    match sources.len() {
        0 => Ok(None),
        1 => Ok(sources.pop()),
        _ => Err(RadarError::Config(
            "give only one of --lo/--hi, --list, --quadruplets".into(),
        )),
    }
}

fn build_config(args: &RunArgs) -> Result<RunConfig> {
    let source = index_source(args)?;
    let mut config = match (&args.config, source) {
        (Some(path), source) => {
            let mut config = RunConfig::from_json_file(path)?;
            if let Some(source) = source {
                config.window.indices = source;
            }
            config
        }
        (None, Some(source)) => RunConfig::new(ScanWindow::new(100, source)),
        (None, None) => {
            return Err(RadarError::Config(
                "no indices: use --config, --lo/--hi, --list or --quadruplets".into(),
            ))
        }
    };

    if let Some(radius) = args.radius {
        config.window.radius = radius;
    }
    if let Some(rounds) = args.rounds {
        config.oracle = OracleConfig {
            rounds,
            ..config.oracle
        };
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    if let Some(granularity) = args.granularity {
        config.granularity = granularity.into();
    }
    if args.no_filter {
        config.admissibility_filter = false;
    }
    if args.checkpoint.is_some() {
        config.checkpoint = args.checkpoint.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    Ok(config)
}

/// Statistics of a run, or `None` when no star completed.
fn statistics_for(output: &RunOutput, family: &PowerDifference) -> Result<Option<Report>> {
    let engine = AggregationEngine::new(ModelParams::for_family(family))?;
    match engine.aggregate(&output.records, output.radius) {
        Ok(report) => Ok(Some(report)),
        Err(StatsError::NoStars) => {
            log::warn!("No complete stars; statistics skipped");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;
    let pipeline = Pipeline::new(config)?;
    let output = pipeline.run()?;

    let statistics = statistics_for(&output, pipeline.family())?;

    let report = RunReport::new(&output, statistics);
    report.write_json(&args.output)?;

    println!(
        "{} stars, {} satellites within R={} ({} failed, {} undecided) in {:.1}s",
        output.records.len(),
        output.satellite_count(),
        output.radius,
        output.failed_count(),
        output.undecided.len(),
        output.elapsed_secs
    );
    if let Some(stats) = &report.statistics {
        println!(
            "mean {:.3} satellites/star (Cramér {:.3}, HL {:.3}), dispersion {:.3}, χ² p = {:.4}, KS p = {:.4}",
            stats.mean_satellites,
            stats.cramer_mean,
            stats.hardy_littlewood_mean,
            stats.dispersion_index,
            stats.chi2_hardy_littlewood.p_value,
            stats.nearest.ks.p_value
        );
    }
    println!("Report: {}", args.output.display());
    Ok(())
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let family = PowerDifference::new(args.exponent)?;
    let engine = AggregationEngine::new(ModelParams::for_family(&family))?;

    let report = match (&args.checkpoint, &args.catalog) {
        (Some(path), _) => {
            let contents = std::fs::read_to_string(path)?;
            let checkpoint: Checkpoint = serde_json::from_str(&contents)?;
            engine.aggregate(&checkpoint.records, args.radius)?
        }
        (None, Some(path)) => {
            let pairs = parse_pairs(&std::fs::read_to_string(path)?)?;
            engine.aggregate_catalog(&pairs, args.radius, args.exponent)?
        }
        (None, None) => return Err(RadarError::Config("give --checkpoint or --catalog".into())),
    };

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Report: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run(args),
        Command::Analyze(args) => analyze(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(if e.is_config_error() { 2 } else { 1 });
    }
}
