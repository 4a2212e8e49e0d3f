//! Simple Moving Average (SMA) and its lagged trend.
//!
//! SMA: rolling mean of the trailing `period` values. Lookback: period - 1.
//! Trend: SMA[t] - SMA[t - lag]. Lookback: period - 1 + lag.

use std::collections::VecDeque;

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
    window: VecDeque<f64>,
    sum: f64,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn update(&mut self, value: f64) -> Option<f64> {
        self.window.push_back(value);
        self.sum += value;
        if self.window.len() > self.period {
            if let Some(leaving) = self.window.pop_front() {
                self.sum -= leaving;
            }
        }
        self.value()
    }

    fn value(&self) -> Option<f64> {
        (self.window.len() == self.period).then(|| self.sum / self.period as f64)
    }
}

/// Direction of an SMA over `lag` bars.
///
/// Positive when the average is higher than it was `lag` bars ago.
#[derive(Debug, Clone)]
pub struct SmaTrend {
    sma: Sma,
    lag: usize,
    name: String,
    history: VecDeque<f64>,
}

impl SmaTrend {
    pub fn new(period: usize, lag: usize) -> Self {
        assert!(lag >= 1, "SMA trend lag must be >= 1");
        Self {
            sma: Sma::new(period),
            lag,
            name: format!("sma_trend_{period}_{lag}"),
            history: VecDeque::with_capacity(lag + 2),
        }
    }

    /// The underlying SMA value for the current bar.
    pub fn sma(&self) -> Option<f64> {
        self.sma.value()
    }
}

impl Indicator for SmaTrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.sma.lookback() + self.lag
    }

    fn update(&mut self, value: f64) -> Option<f64> {
        if let Some(avg) = self.sma.update(value) {
            self.history.push_back(avg);
            if self.history.len() > self.lag + 1 {
                self.history.pop_front();
            }
        }
        self.value()
    }

    fn value(&self) -> Option<f64> {
        if self.history.len() < self.lag + 1 {
            return None;
        }
        Some(self.history.back()? - self.history.front()?)
    }
}
