//! Backtest runner: wires data, the simulated broker, and the evaluator.
//!
//! Entry points:
//! - `run_config()`: loads data for a `BacktestConfig`, then runs. Used by the CLI.
//! - `run_backtest()`: takes pre-loaded bars. No I/O.
//! - `run_batch()`: several configs in parallel, one evaluator each.
//!
//! Per bar the order is fixed: broker executes what is due at this bar and
//! its events are relayed to the evaluator, then the evaluator sees the bar
//! and may submit one intent, then the portfolio is marked at the close.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradebot_core::{Bar, BrokerEvent, EvaluatorError, EvaluatorStats, SignalEvaluator, StrategyParams};

use crate::broker::SimBroker;
use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_bars, DataSource, LoadError, LoadOptions, LoadedData};
use crate::metrics::PerformanceMetrics;
use crate::trades::{extract_trades, TradeRecord};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),
    #[error("no bars to run")]
    NoBars,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol: String,
    pub rule_set: String,
    pub params: StrategyParams,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_cash: f64,
    pub commission: f64,
    pub final_value: f64,
    /// Units still held after the last bar.
    pub final_position: u64,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub journal: Vec<String>,
    pub stats: EvaluatorStats,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub data_source: DataSource,
    pub dataset_hash: String,
}

impl BacktestResult {
    pub fn is_synthetic(&self) -> bool {
        self.data_source == DataSource::Synthetic
    }
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load data for `config` and run it.
pub fn run_config(config: &BacktestConfig, opts: &LoadOptions) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let loaded = load_bars(config, opts)?;
    run_backtest(config, &loaded)
}

/// Run a backtest over pre-loaded bars: no I/O.
pub fn run_backtest(config: &BacktestConfig, data: &LoadedData) -> Result<BacktestResult, RunError> {
    let bars: &[Bar] = &data.bars;
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return Err(RunError::NoBars);
    };

    let bt = &config.backtest;
    let mut evaluator = SignalEvaluator::new(config.strategy.clone()).map_err(ConfigError::from)?;
    let mut broker = SimBroker::new(bt.initial_cash, bt.commission);

    tracing::info!(
        symbol = %bt.symbol,
        rule_set = evaluator.rule_set_name(),
        "Starting Portfolio Value: {:.2}",
        bt.initial_cash
    );

    let mut executions = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut bars_in_market = 0usize;

    for bar in bars {
        for event in broker.process_bar(bar) {
            if let BrokerEvent::Filled(execution) = event {
                executions.push(execution);
            }
            evaluator.on_broker_event(&event, &mut broker);
        }

        evaluator.on_bar(bar, &mut broker)?;

        let equity = broker.mark_to_market(bar);
        if broker.position() > 0 {
            bars_in_market += 1;
        }
        equity_curve.push(EquityPoint {
            date: bar.date,
            equity,
        });
    }

    let final_value = broker.portfolio_value(last.close);
    tracing::info!(symbol = %bt.symbol, "Final Portfolio Value: {:.2}", final_value);

    let trades = extract_trades(&bt.symbol, &executions);
    // Drawdown and return are measured from the starting cash, not the first mark.
    let mut curve = Vec::with_capacity(equity_curve.len() + 1);
    curve.push(bt.initial_cash);
    curve.extend(equity_curve.iter().map(|p| p.equity));
    let metrics = PerformanceMetrics::compute(&curve, &trades, bars_in_market, bars.len());

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        symbol: bt.symbol.clone(),
        rule_set: evaluator.rule_set_name().to_string(),
        params: config.strategy.clone(),
        start_date: first.date,
        end_date: last.date,
        initial_cash: bt.initial_cash,
        commission: bt.commission,
        final_value,
        final_position: broker.position(),
        metrics,
        trades,
        equity_curve,
        stats: evaluator.stats(),
        bar_count: bars.len(),
        warmup_bars: config.strategy.warmup_bars(),
        data_source: data.source.clone(),
        dataset_hash: data.dataset_hash.clone(),
        journal: evaluator.into_journal().into_lines(),
    })
}

/// Run several configurations in parallel. Results keep the input order.
pub fn run_batch(configs: &[BacktestConfig], opts: &LoadOptions) -> Vec<Result<BacktestResult, RunError>> {
    configs.par_iter().map(|config| run_config(config, opts)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::compute_dataset_hash;
    use crate::config::BacktestSection;

    fn config(strategy: StrategyParams) -> BacktestConfig {
        BacktestConfig {
            backtest: BacktestSection {
                symbol: "RAMP".into(),
                data: None,
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
                initial_cash: 100_000.0,
                commission: 0.0,
                adjust_prices: false,
            },
            strategy,
        }
    }

    fn loaded(closes: &[f64]) -> LoadedData {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                symbol: "RAMP".into(),
                date: base + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect();
        let dataset_hash = compute_dataset_hash(&bars);
        LoadedData {
            bars,
            source: DataSource::Synthetic,
            dataset_hash,
        }
    }

    #[test]
    fn empty_data_is_an_error() {
        let data = LoadedData {
            bars: Vec::new(),
            source: DataSource::Synthetic,
            dataset_hash: String::new(),
        };
        assert!(matches!(
            run_backtest(&config(StrategyParams::default()), &data),
            Err(RunError::NoBars)
        ));
    }

    #[test]
    fn flat_market_keeps_cash() {
        let result = run_backtest(&config(StrategyParams::default()), &loaded(&[100.0; 150])).unwrap();
        assert_eq!(result.final_value, 100_000.0);
        assert!(result.trades.is_empty());
        assert!(result.journal.is_empty());
        assert_eq!(result.bar_count, 150);
        assert_eq!(result.equity_curve.len(), 150);
        assert_eq!(result.metrics.exposure, 0.0);
        assert_eq!(result.schema_version, SCHEMA_VERSION);
    }
}
