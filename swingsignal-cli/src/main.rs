//! SwingSignal CLI: analyze, backtest and signal-tape commands.
//!
//! Commands:
//! - `analyze`: classify the latest bar and size a trade setup
//! - `backtest`: replay, cluster buy periods, report hit rates
//! - `signals`: write the per-day signal tape as CSV
//!
//! Logs go to stderr (`RUST_LOG` wins over `--log-level`), so stdout stays
//! machine-readable.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use swingsignal_core::composite::{StockProfile, TradingStatus};
use swingsignal_core::plan::TradePlan;
use swingsignal_core::{Analyzer, TradeSetup};
use swingsignal_runner::export::{export_signals_csv, save_artifacts};
use swingsignal_runner::{
    analyze_latest, load_csv, run_backtest, BacktestReport, EvaluationMode, RunConfig,
    SignalGenerator, Snapshot,
};

#[derive(Parser)]
#[command(
    name = "swingsignal",
    about = "SwingSignal CLI: indicator-driven swing-trading signals and backtests"
)]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Composite vote preset, overriding the `[profile]` config section.
#[derive(Args)]
struct ProfileArgs {
    /// Stock category: growth, value, cyclical, defensive, volatile, momentum.
    #[arg(long)]
    profile: Option<StockProfile>,

    /// Trading status: momentum, volatile or none.
    #[arg(long)]
    status: Option<TradingStatus>,
}

impl ProfileArgs {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(profile) = self.profile {
            config.profile.stock_profile = Some(profile);
        }
        if let Some(status) = self.status {
            config.profile.trading_status = status;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the latest bar: readings, regime, decision, entry quality, trade setup.
    Analyze {
        /// CSV file with Date, prices and indicator columns.
        #[arg(long)]
        data: PathBuf,

        /// Symbol. Defaults to the file stem.
        #[arg(long)]
        symbol: Option<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        preset: ProfileArgs,

        /// Account size for position sizing.
        #[arg(long)]
        account_size: Option<f64>,

        /// Risk per trade in percent of the account.
        #[arg(long)]
        risk_pct: Option<f64>,

        /// Print JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Replay the signal history, cluster buy periods and evaluate hit rates.
    Backtest {
        /// CSV file with Date, prices and indicator columns.
        #[arg(long)]
        data: PathBuf,

        /// Symbol. Defaults to the file stem.
        #[arg(long)]
        symbol: Option<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        preset: ProfileArgs,

        /// Signal source: decision or composite.
        #[arg(long)]
        mode: Option<EvaluationMode>,

        /// Bars after a period's end searched for the maximum close.
        #[arg(long)]
        evaluation_days: Option<usize>,

        /// Minimum rise that counts as a hit (0.05 = 5%).
        #[arg(long)]
        min_change: Option<f64>,

        /// Maximum calendar-day gap inside one buy period.
        #[arg(long)]
        max_gap_days: Option<i64>,

        /// Save manifest.json, CSVs and report.md under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Write the per-day signal tape as CSV.
    Signals {
        /// CSV file with Date, prices and indicator columns.
        #[arg(long)]
        data: PathBuf,

        /// Symbol. Defaults to the file stem.
        #[arg(long)]
        symbol: Option<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        preset: ProfileArgs,

        /// Signal source: decision or composite.
        #[arg(long)]
        mode: Option<EvaluationMode>,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Analyze {
            data,
            symbol,
            config,
            preset,
            account_size,
            risk_pct,
            json,
        } => {
            let mut run_config = load_config(config.as_deref())?;
            preset.apply(&mut run_config);
            if let Some(size) = account_size {
                run_config.account.account_size = size;
            }
            if let Some(pct) = risk_pct {
                run_config.account.risk_pct = pct;
            }
            run_analyze(&data, symbol, &run_config, json)
        }
        Commands::Backtest {
            data,
            symbol,
            config,
            preset,
            mode,
            evaluation_days,
            min_change,
            max_gap_days,
            output_dir,
        } => {
            let mut run_config = load_config(config.as_deref())?;
            preset.apply(&mut run_config);
            let bt = &mut run_config.backtest;
            if let Some(mode) = mode {
                bt.mode = mode;
            }
            if let Some(days) = evaluation_days {
                bt.evaluation_days = days;
            }
            if let Some(change) = min_change {
                bt.min_change = change;
            }
            if let Some(gap) = max_gap_days {
                bt.max_gap_days = gap;
            }
            run_backtest_cmd(&data, symbol, &run_config, output_dir)
        }
        Commands::Signals {
            data,
            symbol,
            config,
            preset,
            mode,
            output,
        } => {
            let mut run_config = load_config(config.as_deref())?;
            preset.apply(&mut run_config);
            if let Some(mode) = mode {
                run_config.backtest.mode = mode;
            }
            run_signals(&data, symbol, &run_config, output)
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn run_analyze(data: &Path, symbol: Option<String>, config: &RunConfig, json: bool) -> Result<()> {
    config.validate()?;

    let loaded = load_csv(data, symbol.as_deref())?;
    info!(
        symbol = loaded.series.symbol(),
        bars = loaded.series.len(),
        "analyzing latest bar"
    );
    let snapshot = analyze_latest(&loaded.series, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn run_backtest_cmd(
    data: &Path,
    symbol: Option<String>,
    config: &RunConfig,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    config.validate()?;
    let loaded = load_csv(data, symbol.as_deref())?;
    let report = run_backtest(&loaded, config)?;

    print_backtest(&report);

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_signals(
    data: &Path,
    symbol: Option<String>,
    config: &RunConfig,
    output: Option<PathBuf>,
) -> Result<()> {
    config.validate()?;
    let loaded = load_csv(data, symbol.as_deref())?;
    let generator = SignalGenerator::new(
        Analyzer::new(config.analysis_config()),
        config.replay.min_window,
        config.backtest.mode,
    );
    let records = generator.generate(&loaded.series);
    let csv = export_signals_csv(&records)?;

    match output {
        Some(path) => {
            std::fs::write(&path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(records = records.len(), "signal tape written to {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

// ─── Text output ────────────────────────────────────────────────────

fn pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

fn print_snapshot(s: &Snapshot) {
    let a = &s.analysis;

    println!();
    println!("=== {} as of {} ===", s.symbol, s.as_of);
    if let Some(close) = a.close {
        println!("Close:          {close:.2}");
    }
    println!();
    println!("--- Indicators ---");
    for summary in a.summaries() {
        println!(
            "{:<12} {:<22} {:<5} strength {:.2}  {}",
            summary.indicator.name(),
            summary.label,
            summary.signal.label(),
            summary.strength,
            summary.headline
        );
    }
    if let Some(h) = &s.rsi_history {
        println!(
            "RSI history:   {} samples, mean {:.1}, range {:.1}..{:.1}, {:.1}% oversold, {:.1}% overbought",
            h.samples, h.mean, h.min, h.max, h.oversold_pct, h.overbought_pct
        );
    }

    println!();
    println!("--- Regime ---");
    println!(
        "Regime:         {} (confidence {:.2})",
        a.regime.market_regime, a.regime.confidence
    );
    println!("Bias:           {}", a.regime.trade_bias.label());
    println!("Summary:        {}", a.regime.narrative.summary);

    println!();
    println!("--- Decision ---");
    println!(
        "Action:         {} (confidence {:.2}, risk {})",
        a.decision.action,
        a.decision.confidence,
        a.decision.risk_level.label()
    );
    println!("Reason:         {}", a.decision.reason);
    println!("Hint:           {}", a.decision.narrative.action_hint);

    println!();
    println!("--- Entry ---");
    println!(
        "Entry quality:  {} (score {:.2})",
        a.entry.grade, a.entry.score
    );
    for note in &a.entry.notes {
        println!("                - {note}");
    }
    match &a.plan {
        TradePlan::Execute { size_factor, .. } => {
            println!("Plan:           execute, size factor {size_factor:.1}")
        }
        TradePlan::Skip { reason } => println!("Plan:           skip ({})", reason.describe()),
    }
    if let Some(setup) = &s.setup {
        print_setup(setup);
    }
    if let Some(err) = &s.setup_error {
        println!("Setup error:    {err}");
    }

    println!();
    println!(
        "Composite vote: {} (score {:.3})",
        s.composite.signal.label(),
        s.composite.score
    );
}

fn print_setup(setup: &TradeSetup) {
    let l = &setup.levels;
    println!(
        "Setup:          {} @ {:.2}, stop {:.2}, target {:.2}",
        l.side, l.entry, l.stop_loss, l.take_profit
    );
    println!(
        "Size:           {:.2} shares ({:.2} before entry factor), risk {:.2}",
        setup.scaled_position_size, setup.sizing.position_size, setup.sizing.risk_amount
    );
}

fn print_backtest(r: &BacktestReport) {
    let s = &r.summary;
    let h = &r.signal_hit_rate;

    println!();
    println!("=== Signal Backtest ===");
    println!("Symbol:         {}", r.symbol);
    println!("Period:         {} to {}", r.first_date, r.last_date);
    println!("Bars:           {} ({} warmup)", r.bar_count, r.min_window);
    println!("Mode:           {}", r.mode);
    println!(
        "Lookahead:      {} days, min change {:.1}%, max gap {} days",
        r.rule.evaluation_days,
        r.rule.min_change * 100.0,
        r.max_gap_days
    );
    if !r.skipped_rows.is_empty() {
        println!("Skipped rows:   {}", r.skipped_rows.len());
    }
    println!();
    println!("--- Signals ---");
    println!("Signal days:    {}", r.record_count);
    println!("Buy signals:    {}", r.buy_signal_count);
    println!(
        "Signal hits:    {} of {} ({} pending) = {}",
        h.hits,
        h.evaluated,
        h.pending,
        pct(h.hit_rate)
    );
    println!();
    println!("--- Buy Periods ---");
    println!(
        "Periods:        {} ({} closed, {} open, {} missing)",
        s.periods, s.closed, s.open, s.not_found
    );
    println!("Hits:           {}", s.hits);
    println!("Hit rate:       {}", pct(s.hit_rate));
    for e in &r.evaluations {
        println!(
            "  {} .. {}  {:<14} {:>8}  {}",
            e.period.start,
            e.period.end,
            format!("{:?}", e.status).to_lowercase(),
            pct(e.pct_change),
            e.comment.as_deref().unwrap_or(match e.hit {
                Some(true) => "hit",
                Some(false) => "miss",
                None => "",
            })
        );
    }
    println!();
    println!("Dataset hash:   {}", r.dataset_hash);
}
