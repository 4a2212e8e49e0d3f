//! Position/order guard: at most one order in flight, explicit transitions.
//!
//! ```text
//! Flat --submit(Buy)--> OrderPending --fill--> Position --submit(Close)--> OrderPending --fill--> Flat
//!                            |                                                 |
//!                            +--cancel--> Flat                                 +--cancel--> Position
//! ```
//!
//! The guard is mutated only by the evaluator when it submits an intent and by
//! execution notifications relayed from the broker.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Execution, ExecutionOrigin, OrderAction, OrderIntent};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("an order ({0}) is already in flight")]
    OrderInFlight(OrderAction),

    #[error("cannot {0}: no open position")]
    NoPosition(OrderAction),

    #[error("cannot buy: a position is already open")]
    AlreadyInPosition,
}

/// Coarse lifecycle state of one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeState {
    Flat,
    Position,
    /// An order is in flight; `had_position` is the state before submission.
    OrderPending { had_position: bool },
}

/// What a fill did to the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillEffect {
    Opened,
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardState {
    pub has_open_order: bool,
    pub has_open_position: bool,
    /// Size of the last buy submitted or filled.
    pub last_size: u64,
    /// Action of the in-flight order.
    pub pending: Option<OrderAction>,
    /// True while a trailing stop stands against the open position.
    pub stop_armed: bool,
}

impl GuardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TradeState {
        if self.has_open_order {
            TradeState::OrderPending {
                had_position: self.has_open_position,
            }
        } else if self.has_open_position {
            TradeState::Position
        } else {
            TradeState::Flat
        }
    }

    /// Record a submitted intent.
    pub fn on_submit(&mut self, intent: &OrderIntent) -> Result<(), GuardError> {
        if let Some(pending) = self.pending.filter(|_| self.has_open_order) {
            return Err(GuardError::OrderInFlight(pending));
        }
        match intent.action {
            OrderAction::Buy if self.has_open_position => return Err(GuardError::AlreadyInPosition),
            OrderAction::Buy => self.last_size = intent.size,
            action if !self.has_open_position => return Err(GuardError::NoPosition(action)),
            _ => {}
        }
        self.has_open_order = true;
        self.pending = Some(intent.action);
        Ok(())
    }

    /// Apply a fill.
    ///
    /// Fills of the standing trailing stop close the position but leave any
    /// in-flight signal order alone; the broker cancels that one separately.
    pub fn on_fill(&mut self, execution: &Execution) -> FillEffect {
        if execution.origin == ExecutionOrigin::Signal {
            if !self.has_open_order {
                tracing::warn!(action = %execution.action, "fill without an order in flight");
            }
            self.has_open_order = false;
            self.pending = None;
        }

        if execution.action.is_buy() {
            self.has_open_position = true;
            self.last_size = execution.size;
            FillEffect::Opened
        } else {
            self.has_open_position = false;
            self.stop_armed = false;
            FillEffect::Closed
        }
    }

    /// Clear the in-flight flag after a cancel, margin failure, or rejection.
    pub fn on_cancelled(&mut self) {
        self.has_open_order = false;
        self.pending = None;
    }

    /// Mark a trailing stop as standing. Ignored when flat.
    pub fn arm_trailing_stop(&mut self) -> bool {
        self.stop_armed = self.has_open_position;
        self.stop_armed
    }
}
