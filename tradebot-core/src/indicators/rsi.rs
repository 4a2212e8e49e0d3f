//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Seed: simple mean of the first `period` gains and losses.
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0; both → 50.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
    prev_close: Option<f64>,
    changes_seen: usize,
    avg_gain: f64,
    avg_loss: f64,
    current: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
            prev_close: None,
            changes_seen: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            current: None,
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn update(&mut self, value: f64) -> Option<f64> {
        let Some(prev) = self.prev_close.replace(value) else {
            return None;
        };

        let change = value - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        self.changes_seen += 1;

        if self.changes_seen <= self.period {
            // Seed window: accumulate, then average once full.
            self.avg_gain += gain;
            self.avg_loss += loss;
            if self.changes_seen == self.period {
                self.avg_gain /= self.period as f64;
                self.avg_loss /= self.period as f64;
                self.current = Some(compute_rsi(self.avg_gain, self.avg_loss));
            }
        } else {
            let alpha = 1.0 / self.period as f64;
            self.avg_gain += alpha * (gain - self.avg_gain);
            self.avg_loss += alpha * (loss - self.avg_loss);
            self.current = Some(compute_rsi(self.avg_gain, self.avg_loss));
        }

        self.current
    }

    fn value(&self) -> Option<f64> {
        self.current
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
