//! Rolling indicators, updated one close at a time.
//!
//! Each indicator owns its window state and does O(1) amortized work per bar.
//! Before its warm-up count of values has been seen, an indicator reports
//! `None`. Undefined values never take part in a comparison downstream.

pub mod ema;
pub mod engine;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::Ema;
pub use engine::{IndicatorEngine, IndicatorSnapshot};
pub use macd::{Macd, MacdValue};
pub use rsi::Rsi;
pub use sma::{Sma, SmaTrend};

/// Streaming single-series indicator.
///
/// # Look-ahead guard
/// `update` only ever sees values up to and including the current bar, so the
/// output at bar t cannot depend on bar t+1.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of values consumed before the first defined output.
    fn lookback(&self) -> usize;

    /// Feed the next value and return the updated output.
    fn update(&mut self, value: f64) -> Option<f64>;

    /// Latest output without feeding anything.
    fn value(&self) -> Option<f64>;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// Feed a series through an indicator and collect every output.
#[cfg(test)]
pub fn run_series(indicator: &mut dyn Indicator, values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|&v| indicator.update(v)).collect()
}
