//! Order intents, broker handles, and execution reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an order intent asks the broker to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    /// Open a long position of `size` units.
    Buy,
    /// Sell `size` units. Used by the standing trailing stop.
    Sell,
    /// Flatten the whole open position, whatever its size.
    Close,
}

impl OrderAction {
    pub fn is_buy(self) -> bool {
        matches!(self, Self::Buy)
    }

    /// Sell and Close both reduce the position.
    pub fn is_exit(self) -> bool {
        matches!(self, Self::Sell | Self::Close)
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Close => write!(f, "CLOSE"),
        }
    }
}

/// An order the signal policy wants submitted.
///
/// Produced at decision time and handed to the broker; the core does not retain it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub action: OrderAction,
    /// Units to buy. Zero for `Close`, which always flattens the full position.
    pub size: u64,
    /// Close of the decision bar, for journaling.
    pub reference_price: f64,
}

impl OrderIntent {
    pub fn buy(size: u64, reference_price: f64) -> Self {
        Self {
            action: OrderAction::Buy,
            size,
            reference_price,
        }
    }

    pub fn close(reference_price: f64) -> Self {
        Self {
            action: OrderAction::Close,
            size: 0,
            reference_price,
        }
    }
}

/// Opaque handle the broker returns for a submitted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderHandle(pub u64);

impl fmt::Display for OrderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which order produced an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOrigin {
    /// An intent emitted by the signal policy.
    Signal,
    /// The standing trailing stop.
    TrailingStop,
}

/// Fill report delivered by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub handle: OrderHandle,
    pub action: OrderAction,
    pub origin: ExecutionOrigin,
    pub date: NaiveDate,
    pub price: f64,
    pub size: u64,
    pub commission: f64,
}

/// Why the broker dropped an order. All reasons are handled the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    Cancelled,
    Margin,
    Rejected,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::Margin => write!(f, "margin"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}
