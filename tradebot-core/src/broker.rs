//! Broker boundary: the execution collaborator the evaluator talks to.
//!
//! The core never routes orders itself. It submits intents through this trait
//! and is told about fills and cancellations through `BrokerEvent`s that the
//! host relays to `SignalEvaluator::on_broker_event`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{CancelReason, Execution, OrderHandle, OrderIntent};

pub trait Broker {
    /// Queue an intent for execution.
    fn submit(&mut self, intent: &OrderIntent) -> OrderHandle;

    /// Place a standing sell of `size` units trailing the price by `offset`.
    fn place_trailing_stop(&mut self, offset: f64, size: u64) -> OrderHandle;

    fn available_cash(&self) -> f64;

    fn current_position_size(&self) -> u64;
}

/// Notification from the broker about an order's fate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BrokerEvent {
    Filled(Execution),
    /// Cancel, margin failure, or rejection.
    Cancelled {
        handle: OrderHandle,
        reason: CancelReason,
        date: NaiveDate,
    },
}
