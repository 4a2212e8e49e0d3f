//! Moving Average Convergence Divergence (MACD).
//!
//! Line = EMA(fast) - EMA(slow), defined once the slow EMA is seeded.
//! Signal = EMA(signal) of the line, seeded by the mean of its first `signal` values.
//! Lookback: slow - 1 for the line, slow + signal - 2 for the signal.

use serde::{Deserialize, Serialize};

use super::{Ema, Indicator};

/// MACD line and signal line for one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub line: Option<f64>,
    pub signal: Option<f64>,
}

impl MacdValue {
    /// Line minus signal, when both are defined.
    pub fn histogram(&self) -> Option<f64> {
        Some(self.line? - self.signal?)
    }
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    current: MacdValue,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
            current: MacdValue::default(),
        }
    }

    pub fn update(&mut self, close: f64) -> MacdValue {
        let fast = self.fast.update(close);
        let slow = self.slow.update(close);
        if let (Some(fast), Some(slow)) = (fast, slow) {
            let line = fast - slow;
            self.current = MacdValue {
                line: Some(line),
                signal: self.signal.update(line),
            };
        }
        self.current
    }

    pub fn value(&self) -> MacdValue {
        self.current
    }

    /// Bars consumed before the signal line is first defined.
    pub fn lookback(&self) -> usize {
        self.slow.lookback().max(self.fast.lookback()) + self.signal.lookback()
    }
}
