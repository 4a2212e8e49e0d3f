//! Bar loading for the runner.
//!
//! Reads Yahoo-style daily CSV (`Date,Open,High,Low,Close,Adj Close,Volume`),
//! keeps the bars inside the configured date range, and validates them before
//! anything reaches the evaluator. Rows whose fields read `null` (Yahoo's
//! marker for a missing session) are skipped with a warning.
//!
//! Fallback policy:
//! 1. `data` path configured and `synthetic` not requested → read the CSV
//! 2. `synthetic` requested → generate synthetic bars (tagged)
//! 3. Otherwise → fail with a clear error

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradebot_core::Bar;

use crate::config::BacktestConfig;
use crate::synthetic::generate_synthetic_bars;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file configured for '{symbol}' (use --synthetic for synthetic data)")]
    NoDataSource { symbol: String },

    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: cannot parse {field} from '{value}'")]
    Parse {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("bar {date}: {reason}")]
    InvalidBar { date: NaiveDate, reason: String },

    #[error("bar dated {current} does not follow {previous}")]
    OutOfOrder {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("no bars for '{symbol}' between {start} and {end}")]
    Empty {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Where the bars of a run came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv(PathBuf),
    Synthetic,
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Generate synthetic bars instead of reading the data file.
    pub synthetic: bool,
}

/// Bars for one symbol, with provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub bars: Vec<Bar>,
    pub source: DataSource,
    /// BLAKE3 over all bar data, for fingerprinting runs.
    pub dataset_hash: String,
}

impl LoadedData {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Raw CSV row. Prices stay textual so `null` rows can be skipped.
#[derive(Debug, Deserialize)]
struct YahooRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: String,
    #[serde(rename = "High")]
    high: String,
    #[serde(rename = "Low")]
    low: String,
    #[serde(rename = "Close")]
    close: String,
    #[serde(rename = "Adj Close", default)]
    adj_close: Option<String>,
    #[serde(rename = "Volume")]
    volume: String,
}

/// Load the bars for `config`, honoring the fallback policy.
pub fn load_bars(config: &BacktestConfig, opts: &LoadOptions) -> Result<LoadedData, LoadError> {
    let bt = &config.backtest;

    let (bars, source) = if opts.synthetic {
        tracing::warn!(symbol = %bt.symbol, "generating synthetic data; results are tagged as synthetic");
        (
            generate_synthetic_bars(&bt.symbol, bt.start_date, bt.end_date),
            DataSource::Synthetic,
        )
    } else {
        let path = bt.data.as_ref().ok_or_else(|| LoadError::NoDataSource {
            symbol: bt.symbol.clone(),
        })?;
        let bars = read_csv_file(path, &bt.symbol, bt.adjust_prices)?;
        (bars, DataSource::Csv(path.clone()))
    };

    let bars: Vec<Bar> = bars
        .into_iter()
        .filter(|b| b.date >= bt.start_date && b.date <= bt.end_date)
        .collect();

    if bars.is_empty() {
        return Err(LoadError::Empty {
            symbol: bt.symbol.clone(),
            start: bt.start_date,
            end: bt.end_date,
        });
    }

    validate_bars(&bars)?;
    let dataset_hash = compute_dataset_hash(&bars);
    tracing::info!(symbol = %bt.symbol, bars = bars.len(), "data loaded");

    Ok(LoadedData {
        bars,
        source,
        dataset_hash,
    })
}

pub fn read_csv_file(path: &Path, symbol: &str, adjust: bool) -> Result<Vec<Bar>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file, symbol, adjust)
}

/// Parse Yahoo-style CSV from any reader.
///
/// With `adjust`, open/high/low/close are scaled by `Adj Close / Close` so
/// splits and dividends do not show up as price gaps.
pub fn read_csv<R: Read>(reader: R, symbol: &str, adjust: bool) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();

    for (i, row) in rdr.deserialize::<YahooRow>().enumerate() {
        let row = row?;
        let line = i + 2;

        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|_| LoadError::Parse {
            row: line,
            field: "Date",
            value: row.date.clone(),
        })?;

        let fields = [
            ("Open", &row.open),
            ("High", &row.high),
            ("Low", &row.low),
            ("Close", &row.close),
        ];
        if fields.iter().any(|(_, v)| v.eq_ignore_ascii_case("null")) {
            tracing::warn!(%date, "skipping row with missing prices");
            continue;
        }

        let mut prices = [0.0_f64; 4];
        for (slot, (field, value)) in prices.iter_mut().zip(fields) {
            *slot = parse_number(value, field, line)?;
        }
        let [mut open, mut high, mut low, mut close] = prices;

        if adjust {
            if let Some(adj) = row.adj_close.as_deref().filter(|v| !v.eq_ignore_ascii_case("null")) {
                let adj_close = parse_number(adj, "Adj Close", line)?;
                if close != 0.0 {
                    let factor = adj_close / close;
                    open *= factor;
                    high *= factor;
                    low *= factor;
                    close = adj_close;
                }
            }
        }

        let volume = parse_number(&row.volume, "Volume", line)?.max(0.0) as u64;

        bars.push(Bar {
            symbol: symbol.to_string(),
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    Ok(bars)
}

fn parse_number(value: &str, field: &'static str, row: usize) -> Result<f64, LoadError> {
    value.parse::<f64>().map_err(|_| LoadError::Parse {
        row,
        field,
        value: value.to_string(),
    })
}

/// Reject non-finite or inconsistent prices and non-increasing dates.
pub fn validate_bars(bars: &[Bar]) -> Result<(), LoadError> {
    for bar in bars {
        if !bar.is_finite() {
            return Err(LoadError::InvalidBar {
                date: bar.date,
                reason: "non-finite price".into(),
            });
        }
        if !bar.is_sane() {
            return Err(LoadError::InvalidBar {
                date: bar.date,
                reason: format!(
                    "inconsistent OHLC (o={} h={} l={} c={})",
                    bar.open, bar.high, bar.low, bar.close
                ),
            });
        }
    }
    for pair in bars.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(LoadError::OutOfOrder {
                previous: pair[0].date,
                current: pair[1].date,
            });
        }
    }
    Ok(())
}

/// Deterministic BLAKE3 hash over dates and OHLCV values.
pub fn compute_dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.symbol.as_bytes());
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
