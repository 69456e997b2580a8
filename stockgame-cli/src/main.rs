//! Stock game CLI — sample a game window, play it, and maintain the CSV corpus.
//!
//! Commands:
//! - `sample`: draw one (instrument, game-start) window and print it as JSON
//! - `play`: run a scripted trading session over a drawn window and settle it
//! - `sort`: rewrite every corpus file in ascending date order
//! - `check`: report which files can satisfy the sampling constraints

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use stockgame_core::data::sort_directory;
use stockgame_core::session::INITIAL_CASH;
use stockgame_core::{
    Command, FileStatus, SamplerConfig, ServiceConfig, SettlementReport, Step, StockService,
    TradingSession,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit status when the corpus cannot satisfy the constraints.
const EXIT_EXHAUSTED: i32 = 2;

#[derive(Parser)]
#[command(
    name = "stockgame",
    about = "Stock game sampler: pick a random instrument and game-start date"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw one game window and print it as JSON.
    Sample {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[command(flatten)]
        overrides: ConstraintArgs,

        /// Seed for a reproducible draw.
        #[arg(long)]
        seed: Option<u64>,

        /// Pretty-print the JSON output.
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Draw a window and play it with a scripted list of moves.
    Play {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[command(flatten)]
        overrides: ConstraintArgs,

        /// Seed for a reproducible draw.
        #[arg(long)]
        seed: Option<u64>,

        /// Moves in order, e.g. `buy:1000,hold:5,sell:1000`.
        #[arg(long, value_delimiter = ',')]
        actions: Vec<Command>,

        /// Starting cash.
        #[arg(long, default_value_t = INITIAL_CASH)]
        cash: f64,

        /// Keep holding after the last move until the window ends.
        #[arg(long, default_value_t = false)]
        to_end: bool,

        /// Emit the settlement report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Rewrite every CSV file in the data directory sorted by date.
    Sort {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// Report the eligible start range (or rejection reason) of every file.
    Check {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[command(flatten)]
        overrides: ConstraintArgs,

        /// Emit JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args)]
struct CorpusArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory. Overrides the config file; defaults to ./stockinfo.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Args)]
struct ConstraintArgs {
    /// Game starts must be dated after this day (YYYY-MM-DD).
    #[arg(long)]
    threshold_date: Option<NaiveDate>,

    /// Minimum rows of history before the game-start row.
    #[arg(long)]
    min_lookback: Option<usize>,

    /// Minimum rows from the game-start row to the end of the file.
    #[arg(long)]
    min_forward: Option<usize>,

    /// History rows included before the game-start row.
    #[arg(long)]
    lookback_window: Option<usize>,

    /// Files to try before giving up.
    #[arg(long)]
    max_attempts: Option<usize>,
}

impl ConstraintArgs {
    fn apply(&self, config: &mut SamplerConfig) {
        if let Some(date) = self.threshold_date {
            config.threshold_date = date;
        }
        if let Some(n) = self.min_lookback {
            config.min_lookback = n;
        }
        if let Some(n) = self.min_forward {
            config.min_forward = n;
        }
        if let Some(n) = self.lookback_window {
            config.lookback_window = n;
        }
        if let Some(n) = self.max_attempts {
            config.max_attempts = n;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sample {
            corpus,
            overrides,
            seed,
            pretty,
        } => run_sample(&corpus, &overrides, seed, pretty),
        Commands::Play {
            corpus,
            overrides,
            seed,
            actions,
            cash,
            to_end,
            json,
        } => run_play(
            &corpus,
            &overrides,
            PlayOptions {
                seed,
                actions,
                cash,
                to_end,
                json,
            },
        ),
        Commands::Sort { corpus } => run_sort(&corpus),
        Commands::Check {
            corpus,
            overrides,
            json,
        } => run_check(&corpus, &overrides, json),
    }
}

/// Resolve the service config: file (if any), then command-line overrides.
fn resolve_config(
    corpus: &CorpusArgs,
    overrides: Option<&ConstraintArgs>,
) -> Result<ServiceConfig> {
    let mut config = match &corpus.config {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(dir) = &corpus.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(overrides) = overrides {
        overrides.apply(&mut config.sampler);
    }
    config.sampler.validate()?;
    debug!(?config, "resolved configuration");
    Ok(config)
}

fn run_sample(
    corpus: &CorpusArgs,
    overrides: &ConstraintArgs,
    seed: Option<u64>,
    pretty: bool,
) -> Result<()> {
    let config = resolve_config(corpus, Some(overrides))?;
    let service = StockService::from_config(&config)?;

    let mut rng = make_rng(seed);
    let window = match service.sample_with(&mut rng) {
        Ok(window) => window,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_EXHAUSTED);
        }
    };

    let json = if pretty {
        serde_json::to_string_pretty(&window)?
    } else {
        serde_json::to_string(&window)?
    };
    println!("{json}");
    Ok(())
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

struct PlayOptions {
    seed: Option<u64>,
    actions: Vec<Command>,
    cash: f64,
    to_end: bool,
    json: bool,
}

fn run_play(corpus: &CorpusArgs, overrides: &ConstraintArgs, opts: PlayOptions) -> Result<()> {
    if !(opts.cash.is_finite() && opts.cash > 0.0) {
        bail!("--cash must be a positive amount, got {}", opts.cash);
    }
    let config = resolve_config(corpus, Some(overrides))?;
    let service = StockService::from_config(&config)?;

    let mut rng = make_rng(opts.seed);
    let window = match service.sample_with(&mut rng) {
        Ok(window) => window,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_EXHAUSTED);
        }
    };
    info!(
        ticker = %window.ticker(),
        start = %window.start_date(),
        days = window.forward_len(),
        "game started"
    );

    let mut session = TradingSession::with_cash(window, opts.cash);
    for command in opts.actions {
        match session.apply(command) {
            Ok(Step::Advanced) => {}
            Ok(Step::Finished) => break,
            Err(e) => warn!(day = session.day(), %command, "move refused: {e}"),
        }
    }
    if opts.to_end && !session.is_finished() {
        session.hold(usize::MAX)?;
    }

    let report = session.settle();
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_session(&session);
        print_settlement(&report);
    }
    Ok(())
}

fn print_session(session: &TradingSession) {
    let bar = session.current_bar();
    println!("Ticker: {}", session.window().ticker());
    println!("Day: T+{} ({})", session.day(), bar.date);
    println!("Close: {:.2}", bar.close);
    let mas: Vec<String> = session
        .moving_averages()
        .into_iter()
        .map(|(period, value)| match value {
            Some(v) => format!("MA{period} {v:.2}"),
            None => format!("MA{period} -"),
        })
        .collect();
    println!("{}", mas.join("  "));
    println!(
        "Cash: {:.2}  Shares: {}  Avg cost: {:.3}  Position: {:.1}%",
        session.cash(),
        session.holdings(),
        session.avg_cost(),
        session.position_ratio() * 100.0
    );
    if session.is_finished() {
        println!("Game over.");
    }
    println!();
}

fn print_settlement(report: &SettlementReport) {
    println!("Initial assets: {:.2}", report.initial_assets);
    println!("Final assets:   {:.2}", report.final_assets);
    println!("Total return:   {:+.2}%", report.total_return * 100.0);
    println!("Max drawdown:   {:.2}%", report.max_drawdown * 100.0);
    println!("Trading days:   {}", report.trading_days);
    println!("Sells:          {}", report.sells);
    println!("Win rate:       {:.1}%", report.win_rate * 100.0);
    println!("Avg win:        {:+.2}%", report.avg_win * 100.0);
    println!("Avg loss:       {:+.2}%", report.avg_loss * 100.0);

    if report.trades.is_empty() {
        return;
    }
    println!();
    println!("{:<8} {:<6} {:>10} {:>8} {:>9}", "Day", "Action", "Price", "Volume", "Profit");
    println!("{}", "-".repeat(45));
    for trade in &report.trades {
        let profit = trade
            .profit_rate
            .map_or_else(|| "-".to_string(), |r| format!("{:+.2}%", r * 100.0));
        println!(
            "{:<8} {:<6} {:>10.2} {:>8} {:>9}",
            format!("T+{}", trade.day),
            format!("{:?}", trade.action).to_lowercase(),
            trade.price,
            trade.volume,
            profit
        );
    }
}

fn run_sort(corpus: &CorpusArgs) -> Result<()> {
    let config = resolve_config(corpus, None)?;
    let summary = sort_directory(&config.data_dir)?;

    println!("Data directory: {}", config.data_dir.display());
    println!("Sorted: {}", summary.sorted);
    println!("Skipped (empty): {}", summary.skipped.len());
    println!("Failed: {}", summary.failed.len());
    for (ticker, err) in &summary.failed {
        eprintln!("Error for {ticker}: {err}");
    }

    if !summary.failed.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_check(corpus: &CorpusArgs, overrides: &ConstraintArgs, json: bool) -> Result<()> {
    let config = resolve_config(corpus, Some(overrides))?;
    let service = StockService::from_config(&config)?;
    let reports = service.check();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    let eligible = reports.iter().filter(|r| r.is_eligible()).count();
    print_check_header(service.corpus().dir(), reports.len(), eligible);
    for report in &reports {
        match &report.status {
            FileStatus::Eligible {
                rows,
                min_idx,
                max_idx,
                starts,
                encoding,
                dropped_rows,
                missing_columns,
            } => println!(
                "{:<12} {:<10} {:>8} {:>12} {:>7} {:<5} {:>7}  {}",
                report.ticker,
                "ok",
                rows,
                format!("{min_idx}..={max_idx}"),
                starts,
                encoding.as_str(),
                dropped_rows,
                missing_columns.join(",")
            ),
            FileStatus::Rejected { reason } => {
                println!("{:<12} {:<10} {}", report.ticker, "rejected", reason)
            }
        }
    }
    Ok(())
}

fn print_check_header(data_dir: &Path, files: usize, eligible: usize) {
    println!("Data directory: {}", data_dir.display());
    println!("Files: {files}");
    println!("Eligible: {eligible}");
    println!();
    println!(
        "{:<12} {:<10} {:>8} {:>12} {:>7} {:<5} {:>7}  {}",
        "Ticker", "Status", "Rows", "Range", "Starts", "Enc", "Dropped", "Missing"
    );
    println!("{}", "-".repeat(80));
}
