//! Momentum CLI: screen a configured universe and print JSON reports.
//!
//! Commands:
//! - `scan`: run the full batch (regime, scores, picks, signals, alerts)
//! - `analyze`: full-history replay and status for one symbol
//! - `score`: horizon scores and picks, or better alternatives for a ticker
//! - `regime`: classify the current market regime
//!
//! Reports go to stdout as JSON; logs go to stderr (`RUST_LOG`, default `info`).

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use momentum_core::scoring::{better_alternatives, Horizon};
use momentum_runner::export::{export_json, save_report};
use momentum_runner::{
    analyze_symbol, current_regime, run_batch, BarSource, CsvDirSource, ScanMode, ScreenerConfig,
    SyntheticSource,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "momentum",
    about = "Momentum screener: signals, horizon scores and market regime"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Path to a TOML screener config. Defaults to an empty universe.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of `<SYMBOL>.csv` files (and optional fundamentals.csv).
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Use deterministic synthetic bars instead of the data directory.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Synthetic sessions per symbol.
    #[arg(long, default_value_t = 400)]
    sessions: usize,

    /// Synthetic start date (YYYY-MM-DD). Defaults to far enough back to end near today.
    #[arg(long)]
    start: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Latest,
    Full,
}

impl From<ModeArg> for ScanMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Latest => ScanMode::Latest,
            ModeArg::Full => ScanMode::Full,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum HorizonArg {
    Short,
    Mid,
    Long,
}

impl From<HorizonArg> for Horizon {
    fn from(h: HorizonArg) -> Self {
        match h {
            HorizonArg::Short => Horizon::Short,
            HorizonArg::Mid => Horizon::Mid,
            HorizonArg::Long => Horizon::Long,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full batch and print the report.
    Scan {
        #[command(flatten)]
        source: SourceArgs,

        /// Override `batch.mode` from the config.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Override `batch.workers` from the config (1-9).
        #[arg(long)]
        workers: Option<usize>,

        /// Replay full history alongside the latest-day scan and report disagreements.
        #[arg(long, default_value_t = false)]
        verify_latest: bool,

        /// Also write report.json, picks.csv and signals.csv under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Replay one symbol's full history and report its status.
    Analyze {
        /// Ticker to analyze (e.g. NVDA).
        symbol: String,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print horizon scores and top picks.
    Score {
        #[command(flatten)]
        source: SourceArgs,

        /// Only this horizon's picks.
        #[arg(long, value_enum)]
        horizon: Option<HorizonArg>,

        /// Rank other members of this ticker's sector instead.
        #[arg(long)]
        alternatives_for: Option<String>,

        /// Number of alternatives to list.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Classify the current market regime.
    Regime {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            source,
            mode,
            workers,
            verify_latest,
            output_dir,
        } => run_scan(source, mode, workers, verify_latest, output_dir),
        Commands::Analyze { symbol, source } => run_analyze(&symbol, source),
        Commands::Score {
            source,
            horizon,
            alternatives_for,
            top,
        } => run_score(source, horizon, alternatives_for, top),
        Commands::Regime { source } => run_regime(source),
    }
}

fn load_config(args: &SourceArgs) -> Result<ScreenerConfig> {
    match &args.config {
        Some(path) => ScreenerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ScreenerConfig::default()),
    }
}

fn open_source(args: &SourceArgs) -> Result<Box<dyn BarSource>> {
    if args.synthetic {
        if args.sessions == 0 {
            bail!("--sessions must be at least 1");
        }
        let start = match args.start.as_deref() {
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid --start '{s}'"))?,
            None => {
                // five sessions per seven calendar days
                let days = (args.sessions * 7 / 5 + 7) as i64;
                chrono::Local::now().date_naive() - chrono::Duration::days(days)
            }
        };
        return Ok(Box::new(SyntheticSource::new(start, args.sessions)));
    }

    if !args.data_dir.is_dir() {
        bail!(
            "data directory {} does not exist (use --synthetic for synthetic data)",
            args.data_dir.display()
        );
    }
    Ok(Box::new(CsvDirSource::open(&args.data_dir)?))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_scan(
    args: SourceArgs,
    mode: Option<ModeArg>,
    workers: Option<usize>,
    verify_latest: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(&args)?;
    if let Some(mode) = mode {
        config.batch.mode = mode.into();
    }
    if let Some(workers) = workers {
        config.batch.workers = workers;
    }
    config.batch.verify_latest |= verify_latest;
    config.validate()?;

    let source = open_source(&args)?;
    let report = run_batch(&config, source.as_ref())?;
    println!("{}", export_json(&report)?);

    if let Some(dir) = output_dir {
        let run_dir = save_report(&report, &dir)?;
        info!(path = %run_dir.display(), "report saved");
    }
    Ok(())
}

fn run_analyze(symbol: &str, args: SourceArgs) -> Result<()> {
    let config = load_config(&args)?;
    let source = open_source(&args)?;
    match analyze_symbol(&config, source.as_ref(), symbol)? {
        Some(report) => print_json(&report),
        None => bail!("no bars for '{symbol}'"),
    }
}

fn run_score(
    args: SourceArgs,
    horizon: Option<HorizonArg>,
    alternatives_for: Option<String>,
    top: usize,
) -> Result<()> {
    let config = load_config(&args)?;
    let sectors = config.sector_map()?;
    let source = open_source(&args)?;
    let report = run_batch(&config, source.as_ref())?;

    if let Some(symbol) = alternatives_for {
        if sectors.sector_of(&symbol).is_none() {
            bail!("'{symbol}' is not a member of any configured sector");
        }
        let alternatives = report.with_context(&sectors, |ctx| {
            better_alternatives(&symbol, &report.snapshots, ctx, top)
        });
        return print_json(&serde_json::json!({
            "symbol": symbol.to_uppercase(),
            "sector": sectors.sector_of(&symbol),
            "regime": report.regime.level,
            "alternatives": alternatives,
        }));
    }

    match horizon {
        Some(h) => {
            let h = Horizon::from(h);
            print_json(&serde_json::json!({
                "as_of": report.as_of,
                "regime": report.regime.level,
                "horizon": h,
                "picks": report.picks.get(h),
            }))
        }
        None => print_json(&serde_json::json!({
            "as_of": report.as_of,
            "regime": report.regime.level,
            "scores": report.scores,
            "picks": report.picks,
        })),
    }
}

fn run_regime(args: SourceArgs) -> Result<()> {
    let config = load_config(&args)?;
    let source = open_source(&args)?;
    let regime = current_regime(&config, source.as_ref())?;
    print_json(&regime)
}
