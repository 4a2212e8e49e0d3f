//! tradebot CLI: run and check backtest configurations.
//!
//! Commands:
//! - `run`: backtest one or more TOML configs (in parallel) and save artifacts
//! - `check`: parse and validate a config without running it
//! - `default-config`: print a config with every default filled in

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tradebot_core::RuleSetKind;
use tradebot_runner::{run_batch, save_artifacts, BacktestConfig, BacktestResult, LoadOptions};

#[derive(Parser)]
#[command(
    name = "tradebot",
    about = "tradebot CLI: rule-based signal evaluator backtests"
)]
struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one or more TOML config files.
    Run {
        /// Config files. Several files run in parallel.
        #[arg(long = "config", required = true, num_args = 1..)]
        configs: Vec<PathBuf>,

        /// Use synthetic data instead of each config's data file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Override the rule set of every config: trend_confirm, momentum_slope.
        #[arg(long)]
        rule_set: Option<RuleSetKind>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Skip writing artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Parse and validate a config file.
    Check {
        #[arg(long)]
        config: PathBuf,
    },
    /// Print a config with every default filled in.
    DefaultConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json);

    match cli.command {
        Commands::Run {
            configs,
            synthetic,
            rule_set,
            output_dir,
            no_save,
        } => run_cmd(configs, synthetic, rule_set, output_dir, no_save),
        Commands::Check { config } => check_cmd(config),
        Commands::DefaultConfig => {
            print!("{}", BacktestConfig::example().to_toml()?);
            Ok(())
        }
    }
}

/// Human-readable logs by default; JSON lines with `--json`. Level from `RUST_LOG`.
fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn run_cmd(
    paths: Vec<PathBuf>,
    synthetic: bool,
    rule_set: Option<RuleSetKind>,
    output_dir: PathBuf,
    no_save: bool,
) -> Result<()> {
    let mut configs = Vec::with_capacity(paths.len());
    for path in &paths {
        let mut config = BacktestConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
        if let Some(kind) = rule_set {
            config.strategy.rule_set = kind;
        }
        configs.push(config);
    }

    let opts = LoadOptions { synthetic };
    let mut failures = 0usize;

    for (path, outcome) in paths.iter().zip(run_batch(&configs, &opts)) {
        match outcome {
            Ok(result) => {
                print_summary(&result);
                if !no_save {
                    let run_dir = save_artifacts(&result, &output_dir)?;
                    println!("Artifacts saved to: {}", run_dir.display());
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("Error for {}: {e}", path.display());
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} backtests failed", paths.len());
    }
    Ok(())
}

fn check_cmd(path: PathBuf) -> Result<()> {
    let config =
        BacktestConfig::from_file(&path).with_context(|| format!("loading {}", path.display()))?;
    let bt = &config.backtest;
    println!("Config OK:      {}", path.display());
    println!("Symbol:         {}", bt.symbol);
    println!("Period:         {} to {}", bt.start_date, bt.end_date);
    match &bt.data {
        Some(data) => println!("Data:           {}", data.display()),
        None => println!("Data:           (none; run with --synthetic)"),
    }
    println!("Rule set:       {}", config.strategy.rule_set);
    println!("Warmup bars:    {}", config.strategy.warmup_bars());
    println!("Run id:         {}", config.run_id());
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {}", result.symbol);
    println!("Rule set:       {}", result.rule_set);
    println!("Period:         {} to {}", result.start_date, result.end_date);
    println!(
        "Bars:           {} ({} warmup)",
        result.bar_count, result.warmup_bars
    );
    println!("Starting Portfolio Value: {:.2}", result.initial_cash);
    println!("Final Portfolio Value:    {:.2}", result.final_value);
    println!();
    println!("--- Performance ---");
    println!(
        "Total Return:   {:.2}%",
        result.metrics.total_return * 100.0
    );
    println!(
        "Max Drawdown:   {:.2}%",
        result.metrics.max_drawdown * 100.0
    );
    println!("Trades:         {}", result.metrics.trade_count);
    println!("Win Rate:       {:.1}%", result.metrics.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", result.metrics.profit_factor);
    println!("Exposure:       {:.1}%", result.metrics.exposure * 100.0);
    println!(
        "Orders:         {} submitted, {} filled, {} cancelled, {} unaffordable",
        result.stats.intents,
        result.stats.fills,
        result.stats.cancellations,
        result.stats.unaffordable
    );
    if result.final_position > 0 {
        println!("Open position:  {} units", result.final_position);
    }
    if result.is_synthetic() {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
