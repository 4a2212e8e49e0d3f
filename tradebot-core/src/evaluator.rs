//! Signal evaluator: the per-bar pipeline for one instrument.
//!
//! Each bar runs, in order: indicator update → crossover detection → policy
//! decision → (maybe) intent submission. Broker notifications are relayed in
//! through `on_broker_event` before the next bar is evaluated.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::broker::{Broker, BrokerEvent};
use crate::config::{ConfigError, StrategyParams};
use crate::domain::{Bar, Execution, ExecutionOrigin, OrderAction, OrderIntent};
use crate::guard::{FillEffect, GuardError, GuardState};
use crate::indicators::{IndicatorEngine, IndicatorSnapshot};
use crate::journal::Journal;
use crate::policy::{Decision, SignalPolicy};

#[derive(Debug, Error, PartialEq)]
pub enum EvaluatorError {
    #[error("bar dated {current} does not follow previous bar dated {previous}")]
    OutOfOrder {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error(transparent)]
    Guard(#[from] GuardError),
}

/// Running counts, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorStats {
    pub bars: usize,
    pub intents: usize,
    pub fills: usize,
    pub cancellations: usize,
    pub unaffordable: usize,
}

pub struct SignalEvaluator {
    params: StrategyParams,
    engine: IndicatorEngine,
    policy: SignalPolicy,
    guard: GuardState,
    prev: Option<IndicatorSnapshot>,
    last_date: Option<NaiveDate>,
    journal: Journal,
    stats: EvaluatorStats,
}

impl SignalEvaluator {
    /// Validate `params` and build the evaluator.
    pub fn new(params: StrategyParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            engine: IndicatorEngine::new(&params),
            policy: SignalPolicy::from_params(&params),
            guard: GuardState::new(),
            prev: None,
            last_date: None,
            journal: Journal::new(),
            stats: EvaluatorStats::default(),
            params,
        })
    }

    /// Evaluate one bar and submit at most one intent to `broker`.
    pub fn on_bar(
        &mut self,
        bar: &Bar,
        broker: &mut dyn Broker,
    ) -> Result<Option<OrderIntent>, EvaluatorError> {
        if let Some(previous) = self.last_date {
            if bar.date <= previous {
                return Err(EvaluatorError::OutOfOrder {
                    previous,
                    current: bar.date,
                });
            }
        }
        self.last_date = Some(bar.date);
        self.stats.bars += 1;

        let snapshot = self.engine.update(bar);
        tracing::debug!(date = %bar.date, symbol = %bar.symbol, "Close, {:.2}", bar.close);

        let Some(prev) = self.prev.replace(snapshot) else {
            return Ok(None);
        };

        let decision = self
            .policy
            .decide(&prev, &snapshot, &self.guard, broker.available_cash());

        match decision {
            Decision::Hold => Ok(None),
            Decision::Unaffordable { cash, close } => {
                self.stats.unaffordable += 1;
                self.journal.record(
                    bar.date,
                    format!("BUY SKIPPED, cash {cash:.2} buys no units at {close:.2}"),
                );
                Ok(None)
            }
            Decision::Submit(intent) => {
                self.guard.on_submit(&intent)?;
                let handle = broker.submit(&intent);
                self.stats.intents += 1;
                let message = match intent.action {
                    OrderAction::Buy => {
                        format!("BUY CREATE, {} @ {:.2}", intent.size, intent.reference_price)
                    }
                    _ => format!(
                        "SELL CREATE, {} @ {:.2}",
                        broker.current_position_size(),
                        intent.reference_price
                    ),
                };
                self.journal.record(bar.date, message);
                tracing::debug!(%handle, rules = self.policy.rules().name(), "intent submitted");
                Ok(Some(intent))
            }
        }
    }

    /// Apply a fill or cancellation reported by the broker.
    pub fn on_broker_event(&mut self, event: &BrokerEvent, broker: &mut dyn Broker) {
        match event {
            BrokerEvent::Filled(execution) => self.on_fill(execution, broker),
            BrokerEvent::Cancelled {
                handle,
                reason,
                date,
            } => {
                self.guard.on_cancelled();
                self.stats.cancellations += 1;
                self.journal.record(*date, "Order Canceled/Margin/Rejected");
                tracing::warn!(%handle, %reason, "order dropped by broker");
            }
        }
    }

    fn on_fill(&mut self, execution: &Execution, broker: &mut dyn Broker) {
        self.stats.fills += 1;
        let effect = self.guard.on_fill(execution);

        let label = if execution.action.is_buy() { "BUY" } else { "SELL" };
        let suffix = match execution.origin {
            ExecutionOrigin::TrailingStop => " (trailing stop)",
            ExecutionOrigin::Signal => "",
        };
        self.journal.record(
            execution.date,
            format!("{label} EXECUTED, {:.2}{suffix}", execution.price),
        );

        if effect == FillEffect::Opened
            && self.policy.rules().arms_trailing_stop()
            && self.params.stop_loss > 0.0
        {
            let handle = broker.place_trailing_stop(self.params.stop_loss, execution.size);
            self.guard.arm_trailing_stop();
            tracing::debug!(%handle, offset = self.params.stop_loss, "trailing stop armed");
        }
    }

    pub fn guard(&self) -> &GuardState {
        &self.guard
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn rule_set_name(&self) -> &str {
        self.policy.rules().name()
    }

    /// Snapshot of the most recent bar.
    pub fn last_snapshot(&self) -> Option<&IndicatorSnapshot> {
        self.prev.as_ref()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn into_journal(self) -> Journal {
        self.journal
    }

    pub fn stats(&self) -> EvaluatorStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSetKind;
    use crate::domain::{CancelReason, OrderHandle};

    /// Broker stub that records calls and never fills on its own.
    #[derive(Default)]
    struct RecordingBroker {
        cash: f64,
        position: u64,
        submitted: Vec<OrderIntent>,
        stops: Vec<(f64, u64)>,
        next_id: u64,
    }

    impl Broker for RecordingBroker {
        fn submit(&mut self, intent: &OrderIntent) -> OrderHandle {
            self.submitted.push(*intent);
            self.next_id += 1;
            OrderHandle(self.next_id)
        }

        fn place_trailing_stop(&mut self, offset: f64, size: u64) -> OrderHandle {
            self.stops.push((offset, size));
            self.next_id += 1;
            OrderHandle(self.next_id)
        }

        fn available_cash(&self) -> f64 {
            self.cash
        }

        fn current_position_size(&self) -> u64 {
            self.position
        }
    }

    fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    fn bar(i: usize, close: f64) -> Bar {
        Bar {
            symbol: "TEST".into(),
            date: day(i),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1000,
        }
    }

    fn params(rule_set: RuleSetKind) -> StrategyParams {
        StrategyParams {
            fast: 2,
            slow: 4,
            rule_set,
            ..Default::default()
        }
    }

    /// Flat, then a jump: the fast EMA overtakes the slow EMA on the jump bar.
    fn golden_cross_closes() -> Vec<f64> {
        vec![50.0, 50.0, 50.0, 50.0, 50.0, 55.0]
    }

    fn fill(handle: u64, action: OrderAction, date: NaiveDate, size: u64) -> BrokerEvent {
        BrokerEvent::Filled(Execution {
            handle: OrderHandle(handle),
            action,
            origin: ExecutionOrigin::Signal,
            date,
            price: 55.0,
            size,
            commission: 0.0,
        })
    }

    #[test]
    fn invalid_params_rejected_at_construction() {
        let bad = StrategyParams {
            fast: 0,
            ..Default::default()
        };
        assert!(SignalEvaluator::new(bad).is_err());
    }

    #[test]
    fn out_of_order_bar_rejected() {
        let mut eval = SignalEvaluator::new(StrategyParams::default()).unwrap();
        let mut broker = RecordingBroker::default();
        eval.on_bar(&bar(5, 10.0), &mut broker).unwrap();
        assert_eq!(
            eval.on_bar(&bar(5, 10.0), &mut broker),
            Err(EvaluatorError::OutOfOrder {
                previous: day(5),
                current: day(5)
            })
        );
    }

    #[test]
    fn buy_submitted_and_journaled() {
        let mut eval = SignalEvaluator::new(params(RuleSetKind::TrendConfirm)).unwrap();
        let mut broker = RecordingBroker {
            cash: 100_000.0,
            ..Default::default()
        };
        let mut intents = Vec::new();
        for (i, close) in golden_cross_closes().into_iter().enumerate() {
            intents.extend(eval.on_bar(&bar(i, close), &mut broker).unwrap());
        }
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].action, OrderAction::Buy);
        // floor(0.95 * 100000 / 55)
        assert_eq!(intents[0].size, 1727);
        assert!(eval.guard().has_open_order);
        assert_eq!(eval.journal().lines(), ["2024-01-06, BUY CREATE, 1727 @ 55.00"]);
    }

    #[test]
    fn no_second_intent_while_order_in_flight() {
        let mut eval = SignalEvaluator::new(params(RuleSetKind::TrendConfirm)).unwrap();
        let mut broker = RecordingBroker {
            cash: 100_000.0,
            ..Default::default()
        };
        let closes = [50.0, 50.0, 50.0, 50.0, 50.0, 55.0, 40.0, 60.0, 30.0, 70.0];
        for (i, close) in closes.into_iter().enumerate() {
            eval.on_bar(&bar(i, close), &mut broker).unwrap();
        }
        assert_eq!(broker.submitted.len(), 1);
    }

    #[test]
    fn fill_arms_trailing_stop_for_trend_confirm() {
        let mut eval = SignalEvaluator::new(params(RuleSetKind::TrendConfirm)).unwrap();
        let mut broker = RecordingBroker {
            cash: 100_000.0,
            ..Default::default()
        };
        for (i, close) in golden_cross_closes().into_iter().enumerate() {
            eval.on_bar(&bar(i, close), &mut broker).unwrap();
        }
        eval.on_broker_event(&fill(1, OrderAction::Buy, day(6), 1727), &mut broker);

        assert!(eval.guard().has_open_position);
        assert!(!eval.guard().has_open_order);
        assert!(eval.guard().stop_armed);
        assert_eq!(broker.stops, vec![(0.1, 1727)]);
        assert_eq!(eval.journal().lines()[1], "2024-01-07, BUY EXECUTED, 55.00");
    }

    #[test]
    fn momentum_slope_never_arms_stop() {
        let mut eval = SignalEvaluator::new(params(RuleSetKind::MomentumSlope)).unwrap();
        let mut broker = RecordingBroker {
            cash: 100_000.0,
            ..Default::default()
        };
        for (i, close) in golden_cross_closes().into_iter().enumerate() {
            eval.on_bar(&bar(i, close), &mut broker).unwrap();
        }
        eval.on_broker_event(&fill(1, OrderAction::Buy, day(6), 1727), &mut broker);
        assert!(broker.stops.is_empty());
        assert!(!eval.guard().stop_armed);
        assert_eq!(eval.rule_set_name(), "momentum_slope");
    }

    #[test]
    fn cancellation_resumes_from_flat() {
        let mut eval = SignalEvaluator::new(params(RuleSetKind::TrendConfirm)).unwrap();
        let mut broker = RecordingBroker {
            cash: 100_000.0,
            ..Default::default()
        };
        for (i, close) in golden_cross_closes().into_iter().enumerate() {
            eval.on_bar(&bar(i, close), &mut broker).unwrap();
        }
        eval.on_broker_event(
            &BrokerEvent::Cancelled {
                handle: OrderHandle(1),
                reason: CancelReason::Margin,
                date: day(6),
            },
            &mut broker,
        );
        assert!(!eval.guard().has_open_order);
        assert!(!eval.guard().has_open_position);
        assert_eq!(eval.stats().cancellations, 1);
        assert_eq!(
            eval.journal().lines().last().unwrap(),
            "2024-01-07, Order Canceled/Margin/Rejected"
        );
    }

    #[test]
    fn unaffordable_entry_is_journaled_not_submitted() {
        let mut eval = SignalEvaluator::new(params(RuleSetKind::TrendConfirm)).unwrap();
        let mut broker = RecordingBroker {
            cash: 10.0,
            ..Default::default()
        };
        for (i, close) in golden_cross_closes().into_iter().enumerate() {
            assert!(eval.on_bar(&bar(i, close), &mut broker).unwrap().is_none());
        }
        assert!(broker.submitted.is_empty());
        assert!(!eval.guard().has_open_order);
        assert_eq!(eval.stats().unaffordable, 1);
    }
}
