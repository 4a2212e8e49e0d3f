//! Bar: one price observation for one instrument.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for a single symbol.
///
/// Bars are immutable once ingested and arrive in strictly increasing date order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if every price field is finite.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }

    /// Basic OHLC sanity check: finite, positive, and high/low bracket open and close.
    pub fn is_sane(&self) -> bool {
        if !self.is_finite() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar {
            symbol: "ORCL".into(),
            date: NaiveDate::from_ymd_opt(2004, 3, 1).unwrap(),
            open: 12.0,
            high: 12.6,
            low: 11.8,
            close: 12.4,
            volume: 30_000_000,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn nan_close_is_not_sane() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(!bar.is_finite());
        assert!(!bar.is_sane());
    }

    #[test]
    fn inverted_high_low_is_not_sane() {
        let mut bar = sample_bar();
        bar.high = 11.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn non_positive_low_is_not_sane() {
        let mut bar = sample_bar();
        bar.low = 0.0;
        assert!(!bar.is_sane());
    }
}
