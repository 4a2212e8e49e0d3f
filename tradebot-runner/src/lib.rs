//! tradebot runner: the reference host around `tradebot-core`.
//!
//! This crate provides:
//! - TOML backtest configuration with a content-addressed run id
//! - Yahoo-style CSV loading with a synthetic fallback
//! - A simulated broker (next-open fills, commission, margin, trailing stop)
//! - The backtest loop, trade extraction, and metrics
//! - Artifact export and parallel batch runs

pub mod broker;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod synthetic;
pub mod trades;

pub use broker::SimBroker;
pub use config::{BacktestConfig, BacktestSection, ConfigError, RunId};
pub use data_loader::{load_bars, DataSource, LoadError, LoadOptions, LoadedData};
pub use export::{load_manifest, save_artifacts};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest, run_batch, run_config, BacktestResult, EquityPoint, RunError};
pub use trades::{ExitReason, TradeRecord};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
        assert_send::<TradeRecord>();
        assert_sync::<TradeRecord>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn broker_is_send() {
        assert_send::<SimBroker>();
    }
}
