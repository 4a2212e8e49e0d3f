//! Trend-confirm rule set.
//!
//! Entry: golden cross of the EMAs; otherwise, in an SMA uptrend with the SMA
//! above the close, an RSI cross up through oversold or a MACD cross up.
//! Exit: death cross of the EMAs; otherwise, in an SMA downtrend with the SMA
//! below the close, an RSI cross down through overbought or a MACD cross down.
//! Entries arm a trailing stop.

use super::{RuleSet, SignalContext};

#[derive(Debug, Clone)]
pub struct TrendConfirm {
    pub oversold: f64,
    pub overbought: f64,
}

impl TrendConfirm {
    pub fn new(oversold: f64, overbought: f64) -> Self {
        Self {
            oversold,
            overbought,
        }
    }

    fn rsi_crossed_up(&self, ctx: &SignalContext<'_>) -> bool {
        ctx.rsi_pair()
            .is_some_and(|(prev, cur)| prev <= self.oversold && cur > self.oversold)
    }

    fn rsi_crossed_down(&self, ctx: &SignalContext<'_>) -> bool {
        ctx.rsi_pair()
            .is_some_and(|(prev, cur)| prev >= self.overbought && cur < self.overbought)
    }
}

impl RuleSet for TrendConfirm {
    fn name(&self) -> &str {
        "trend_confirm"
    }

    fn should_enter(&self, ctx: &SignalContext<'_>) -> bool {
        if ctx.crosses.ema_cross.is_above() {
            return true;
        }
        let (Some(trend), Some(sma)) = (ctx.cur.sma_trend, ctx.cur.sma) else {
            return false;
        };
        if trend > 0.0 && sma > ctx.cur.close {
            return self.rsi_crossed_up(ctx) || ctx.crosses.macd_cross.is_above();
        }
        false
    }

    fn should_exit(&self, ctx: &SignalContext<'_>) -> bool {
        if ctx.crosses.ema_cross.is_below() {
            return true;
        }
        let (Some(trend), Some(sma)) = (ctx.cur.sma_trend, ctx.cur.sma) else {
            return false;
        };
        if trend < 0.0 && sma < ctx.cur.close {
            return self.rsi_crossed_down(ctx) || ctx.crosses.macd_cross.is_below();
        }
        false
    }

    fn arms_trailing_stop(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorSnapshot;

    fn rules() -> TrendConfirm {
        TrendConfirm::new(30.0, 70.0)
    }

    /// Snapshot with EMAs parked apart (no EMA cross) and the given trend state.
    fn snap(close: f64, sma: f64, trend: f64, rsi: f64, macd: (f64, f64)) -> IndicatorSnapshot {
        IndicatorSnapshot {
            close,
            fast_ema: Some(10.0),
            slow_ema: Some(20.0),
            sma: Some(sma),
            sma_trend: Some(trend),
            rsi: Some(rsi),
            macd_line: Some(macd.0),
            macd_signal: Some(macd.1),
        }
    }

    #[test]
    fn rsi_cross_up_in_uptrend_enters() {
        let prev = snap(95.0, 100.0, 1.0, 28.0, (0.0, 1.0));
        let cur = snap(96.0, 100.0, 1.0, 31.0, (0.0, 1.0));
        assert!(rules().should_enter(&SignalContext::new(&prev, &cur)));
    }

    #[test]
    fn rsi_staying_above_oversold_does_not_enter() {
        let prev = snap(95.0, 100.0, 1.0, 31.0, (0.0, 1.0));
        let cur = snap(96.0, 100.0, 1.0, 35.0, (0.0, 1.0));
        assert!(!rules().should_enter(&SignalContext::new(&prev, &cur)));
    }

    #[test]
    fn macd_cross_up_in_uptrend_enters() {
        let prev = snap(95.0, 100.0, 1.0, 45.0, (0.5, 1.0));
        let cur = snap(96.0, 100.0, 1.0, 46.0, (1.5, 1.0));
        assert!(rules().should_enter(&SignalContext::new(&prev, &cur)));
    }

    #[test]
    fn confirmation_ignored_without_trend_gate() {
        // Close above SMA: the gate is closed.
        let prev = snap(105.0, 100.0, 1.0, 28.0, (0.5, 1.0));
        let cur = snap(106.0, 100.0, 1.0, 31.0, (1.5, 1.0));
        assert!(!rules().should_enter(&SignalContext::new(&prev, &cur)));

        // Falling SMA: the gate is closed.
        let prev = snap(95.0, 100.0, -1.0, 28.0, (0.5, 1.0));
        let cur = snap(96.0, 100.0, -1.0, 31.0, (1.5, 1.0));
        assert!(!rules().should_enter(&SignalContext::new(&prev, &cur)));
    }

    #[test]
    fn rsi_cross_down_in_downtrend_exits() {
        let prev = snap(105.0, 100.0, -1.0, 72.0, (1.0, 0.5));
        let cur = snap(104.0, 100.0, -1.0, 69.0, (1.0, 0.5));
        assert!(rules().should_exit(&SignalContext::new(&prev, &cur)));
    }

    #[test]
    fn macd_cross_down_in_downtrend_exits() {
        let prev = snap(105.0, 100.0, -1.0, 50.0, (1.0, 0.5));
        let cur = snap(104.0, 100.0, -1.0, 50.0, (0.2, 0.5));
        assert!(rules().should_exit(&SignalContext::new(&prev, &cur)));
    }

    #[test]
    fn undefined_trend_blocks_confirmation() {
        let mut prev = snap(95.0, 100.0, 1.0, 28.0, (0.5, 1.0));
        let mut cur = snap(96.0, 100.0, 1.0, 31.0, (1.5, 1.0));
        prev.sma_trend = None;
        cur.sma_trend = None;
        assert!(!rules().should_enter(&SignalContext::new(&prev, &cur)));
    }

    #[test]
    fn ema_cross_enters_regardless_of_trend() {
        let mut prev = snap(105.0, 100.0, -1.0, 50.0, (1.0, 1.0));
        let mut cur = prev;
        prev.fast_ema = Some(19.0);
        cur.fast_ema = Some(21.0);
        assert!(rules().should_enter(&SignalContext::new(&prev, &cur)));
    }
}
