//! Momentum-slope rule set.
//!
//! Entry: golden cross of the EMAs; otherwise RSI rising while still below
//! oversold, or a MACD cross up.
//! Exit: death cross of the EMAs; otherwise RSI falling while still above
//! overbought, or a MACD cross down.
//! No SMA-trend gate and no trailing stop.
//!
//! The RSI condition is a slope check, not a threshold crossing: it fires on
//! every rising bar below oversold.

use super::{RuleSet, SignalContext};

#[derive(Debug, Clone)]
pub struct MomentumSlope {
    pub oversold: f64,
    pub overbought: f64,
}

impl MomentumSlope {
    pub fn new(oversold: f64, overbought: f64) -> Self {
        Self {
            oversold,
            overbought,
        }
    }
}

impl RuleSet for MomentumSlope {
    fn name(&self) -> &str {
        "momentum_slope"
    }

    fn should_enter(&self, ctx: &SignalContext<'_>) -> bool {
        if ctx.crosses.ema_cross.is_above() {
            return true;
        }
        let rsi_rising = ctx
            .rsi_pair()
            .is_some_and(|(prev, cur)| prev < cur && cur < self.oversold);
        rsi_rising || ctx.crosses.macd_cross.is_above()
    }

    fn should_exit(&self, ctx: &SignalContext<'_>) -> bool {
        if ctx.crosses.ema_cross.is_below() {
            return true;
        }
        let rsi_falling = ctx
            .rsi_pair()
            .is_some_and(|(prev, cur)| prev > cur && cur > self.overbought);
        rsi_falling || ctx.crosses.macd_cross.is_below()
    }

    fn arms_trailing_stop(&self) -> bool {
        false
    }
}
