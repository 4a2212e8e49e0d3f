//! Indicator engine: owns every rolling indicator the policy reads.
//!
//! One `update` per bar advances all series and returns a read-only snapshot.

use serde::{Deserialize, Serialize};

use crate::config::StrategyParams;
use crate::domain::Bar;

use super::{Ema, Indicator, Macd, Rsi, SmaTrend};

/// Indicator values for one bar. `None` means still warming up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub fast_ema: Option<f64>,
    pub slow_ema: Option<f64>,
    pub sma: Option<f64>,
    /// sma[t] - sma[t - lag].
    pub sma_trend: Option<f64>,
    pub rsi: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
}

impl IndicatorSnapshot {
    /// True once every indicator field is defined.
    pub fn is_warm(&self) -> bool {
        self.fast_ema.is_some()
            && self.slow_ema.is_some()
            && self.sma.is_some()
            && self.sma_trend.is_some()
            && self.rsi.is_some()
            && self.macd_line.is_some()
            && self.macd_signal.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    fast_ema: Ema,
    slow_ema: Ema,
    sma_trend: SmaTrend,
    rsi: Rsi,
    macd: Macd,
    bars_seen: usize,
}

impl IndicatorEngine {
    /// Build the engine from validated parameters.
    ///
    /// Zero periods panic here; call `StrategyParams::validate` first.
    pub fn new(params: &StrategyParams) -> Self {
        Self {
            fast_ema: Ema::new(params.fast),
            slow_ema: Ema::new(params.slow),
            sma_trend: SmaTrend::new(params.sma_period, params.sma_trend_lag),
            rsi: Rsi::new(params.rsi_period),
            macd: Macd::new(params.macd_fast, params.macd_slow, params.macd_signal),
            bars_seen: 0,
        }
    }

    pub fn update(&mut self, bar: &Bar) -> IndicatorSnapshot {
        let close = bar.close;
        self.bars_seen += 1;

        let fast_ema = self.fast_ema.update(close);
        let slow_ema = self.slow_ema.update(close);
        let sma_trend = self.sma_trend.update(close);
        let rsi = self.rsi.update(close);
        let macd = self.macd.update(close);

        IndicatorSnapshot {
            close,
            fast_ema,
            slow_ema,
            sma: self.sma_trend.sma(),
            sma_trend,
            rsi,
            macd_line: macd.line,
            macd_signal: macd.signal,
        }
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(i: usize, close: f64) -> Bar {
        Bar {
            symbol: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    fn small_params() -> StrategyParams {
        StrategyParams {
            fast: 2,
            slow: 4,
            rsi_period: 3,
            macd_fast: 2,
            macd_slow: 3,
            macd_signal: 2,
            sma_period: 3,
            sma_trend_lag: 2,
            ..Default::default()
        }
    }

    #[test]
    fn warms_up_at_param_warmup() {
        let params = small_params();
        let mut engine = IndicatorEngine::new(&params);
        let warmup = params.warmup_bars();
        for i in 0..warmup {
            let snap = engine.update(&bar(i, 100.0 + i as f64));
            assert_eq!(snap.is_warm(), i + 1 >= warmup, "bar {i}");
        }
        assert_eq!(engine.bars_seen(), warmup);
    }

    #[test]
    fn first_snapshot_is_all_undefined() {
        let mut engine = IndicatorEngine::new(&StrategyParams::default());
        let snap = engine.update(&bar(0, 50.0));
        assert_eq!(snap.close, 50.0);
        assert_eq!(
            snap,
            IndicatorSnapshot {
                close: 50.0,
                ..Default::default()
            }
        );
    }
}
