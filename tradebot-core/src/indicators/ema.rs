//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = EMA[t-1] + alpha * (x[t] - EMA[t-1]), alpha = 2 / (period + 1).
//! Seed: EMA[period-1] = simple mean of the first `period` values.
//! Lookback: period - 1.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
    name: String,
    seed_sum: f64,
    seen: usize,
    current: Option<f64>,
}

impl Ema {
    /// `period` must be >= 1; `StrategyParams::validate` guarantees it for configured EMAs.
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            name: format!("ema_{period}"),
            seed_sum: 0.0,
            seen: 0,
            current: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn update(&mut self, value: f64) -> Option<f64> {
        match self.current {
            // Written as prev + alpha * delta so a flat input stays exactly flat.
            Some(prev) => self.current = Some(prev + self.alpha * (value - prev)),
            None => {
                self.seed_sum += value;
                self.seen += 1;
                if self.seen == self.period {
                    self.current = Some(self.seed_sum / self.period as f64);
                }
            }
        }
        self.current
    }

    fn value(&self) -> Option<f64> {
        self.current
    }
}
