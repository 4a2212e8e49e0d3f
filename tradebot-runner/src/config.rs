//! Serializable backtest configuration.
//!
//! A config file has two tables: `[backtest]` for the host settings (symbol,
//! data file, date range, starting cash, commission) and `[strategy]` for the
//! evaluator's `StrategyParams`. The strategy table may be omitted entirely.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradebot_core::StrategyParams;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

// Invalid literals fail const evaluation at build time.
const EXAMPLE_START: NaiveDate = match NaiveDate::from_ymd_opt(2000, 1, 1) {
    Some(date) => date,
    None => panic!("invalid example start date"),
};
const EXAMPLE_END: NaiveDate = match NaiveDate::from_ymd_opt(2014, 12, 31) {
    Some(date) => date,
    None => panic!("invalid example end date"),
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid strategy parameters: {0}")]
    Strategy(#[from] tradebot_core::ConfigError),

    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("start_date {start} is after end_date {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },

    #[error("initial_cash must be positive (got {0})")]
    InitialCash(f64),

    #[error("commission must be within [0, 1) (got {0})")]
    Commission(f64),
}

/// Host settings for one backtest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BacktestSection {
    pub symbol: String,
    /// Yahoo-style CSV file. Optional when running on synthetic data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,
    /// Fraction of traded value charged on every fill.
    #[serde(default = "default_commission")]
    pub commission: f64,
    /// Scale OHLC by `Adj Close / Close` when reading CSV data.
    #[serde(default = "default_adjust")]
    pub adjust_prices: bool,
}

fn default_initial_cash() -> f64 {
    100_000.0
}

fn default_commission() -> f64 {
    0.001
}

fn default_adjust() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub strategy: StrategyParams,
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    ///
    /// A relative `data` path is resolved against the config file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let (Some(data), Some(dir)) = (config.backtest.data.as_mut(), path.parent()) {
            if data.is_relative() {
                *data = dir.join(&*data);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if bt.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if bt.start_date > bt.end_date {
            return Err(ConfigError::DateRange {
                start: bt.start_date,
                end: bt.end_date,
            });
        }
        if !(bt.initial_cash.is_finite() && bt.initial_cash > 0.0) {
            return Err(ConfigError::InitialCash(bt.initial_cash));
        }
        if !(0.0..1.0).contains(&bt.commission) {
            return Err(ConfigError::Commission(bt.commission));
        }
        self.strategy.validate()?;
        Ok(())
    }

    /// Deterministic hash of the full configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        let mut hasher = blake3::Hasher::new();
        // Plain data with string keys always serializes.
        hasher.update(&serde_json::to_vec(self).unwrap_or_default());
        hasher.finalize().to_hex().to_string()
    }

    /// Settings of the original ORCL backtest, with every strategy default.
    pub fn example() -> Self {
        Self {
            backtest: BacktestSection {
                symbol: "ORCL".into(),
                data: Some(PathBuf::from("data/orcl-1995-2014.txt")),
                start_date: EXAMPLE_START,
                end_date: EXAMPLE_END,
                initial_cash: default_initial_cash(),
                commission: default_commission(),
                adjust_prices: default_adjust(),
            },
            strategy: StrategyParams::default(),
        }
    }

    /// Render as TOML, the format `from_toml` reads.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
