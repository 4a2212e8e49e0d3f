//! Signal policy: turns indicator state into Buy / Close / Hold.
//!
//! The policy is a pure function of two consecutive snapshots, the guard, and
//! the broker's available cash. Which conditions trigger an entry or exit is
//! delegated to a swappable `RuleSet`; the guard gate, sizing, and the
//! flat/position split are shared by every rule set.

pub mod momentum_slope;
pub mod trend_confirm;

pub use momentum_slope::MomentumSlope;
pub use trend_confirm::TrendConfirm;

use crate::config::{RuleSetKind, StrategyParams};
use crate::crossover::CrossoverState;
use crate::domain::OrderIntent;
use crate::guard::GuardState;
use crate::indicators::IndicatorSnapshot;

/// Everything a rule set may look at for one bar.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    pub prev: &'a IndicatorSnapshot,
    pub cur: &'a IndicatorSnapshot,
    pub crosses: CrossoverState,
}

impl<'a> SignalContext<'a> {
    pub fn new(prev: &'a IndicatorSnapshot, cur: &'a IndicatorSnapshot) -> Self {
        Self {
            prev,
            cur,
            crosses: CrossoverState::from_snapshots(prev, cur),
        }
    }

    /// (previous, current) RSI when both are defined.
    pub fn rsi_pair(&self) -> Option<(f64, f64)> {
        Some((self.prev.rsi?, self.cur.rsi?))
    }
}

/// Entry and exit conditions of one strategy variant.
///
/// Rule sets never see portfolio or order state; the policy gates them.
pub trait RuleSet: Send + Sync {
    /// Human-readable name (e.g., "trend_confirm").
    fn name(&self) -> &str;

    /// Should a flat instrument be bought on this bar?
    fn should_enter(&self, ctx: &SignalContext<'_>) -> bool;

    /// Should the open position be closed on this bar?
    fn should_exit(&self, ctx: &SignalContext<'_>) -> bool;

    /// Whether an entry fill arms a trailing stop.
    fn arms_trailing_stop(&self) -> bool;
}

/// Build the rule set named by the parameters.
pub fn create_rule_set(params: &StrategyParams) -> Box<dyn RuleSet> {
    match params.rule_set {
        RuleSetKind::TrendConfirm => Box::new(TrendConfirm::new(
            params.rsi_oversold,
            params.rsi_overbought,
        )),
        RuleSetKind::MomentumSlope => Box::new(MomentumSlope::new(
            params.rsi_oversold,
            params.rsi_overbought,
        )),
    }
}

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Hold,
    /// An entry fired but the cash fraction buys less than one unit.
    Unaffordable { cash: f64, close: f64 },
    Submit(OrderIntent),
}

impl Decision {
    pub fn intent(&self) -> Option<&OrderIntent> {
        match self {
            Self::Submit(intent) => Some(intent),
            _ => None,
        }
    }
}

/// Guard-aware decision function wrapping a rule set.
pub struct SignalPolicy {
    rules: Box<dyn RuleSet>,
    order_percentage: f64,
}

impl SignalPolicy {
    pub fn new(rules: Box<dyn RuleSet>, order_percentage: f64) -> Self {
        Self {
            rules,
            order_percentage,
        }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        Self::new(create_rule_set(params), params.order_percentage)
    }

    pub fn rules(&self) -> &dyn RuleSet {
        self.rules.as_ref()
    }

    pub fn decide(
        &self,
        prev: &IndicatorSnapshot,
        cur: &IndicatorSnapshot,
        guard: &GuardState,
        available_cash: f64,
    ) -> Decision {
        if guard.has_open_order {
            return Decision::Hold;
        }

        let ctx = SignalContext::new(prev, cur);

        if !guard.has_open_position {
            if !self.rules.should_enter(&ctx) {
                return Decision::Hold;
            }
            let size = order_size(self.order_percentage, available_cash, cur.close);
            if size == 0 {
                return Decision::Unaffordable {
                    cash: available_cash,
                    close: cur.close,
                };
            }
            Decision::Submit(OrderIntent::buy(size, cur.close))
        } else if self.rules.should_exit(&ctx) {
            Decision::Submit(OrderIntent::close(cur.close))
        } else {
            Decision::Hold
        }
    }
}

/// floor(order_percentage * cash / close). Zero for non-positive inputs.
pub fn order_size(order_percentage: f64, cash: f64, close: f64) -> u64 {
    if close <= 0.0 || cash <= 0.0 || !close.is_finite() || !cash.is_finite() {
        return 0;
    }
    (order_percentage * cash / close).floor() as u64
}
