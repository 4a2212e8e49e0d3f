//! Trailing stop: a standing sell that trails the price by a fixed offset.
//!
//! stop = max(previous stop, price - offset). The ratchet only tightens: a
//! falling price never lowers the stop.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    /// Trail distance in price units.
    pub offset: f64,
    /// Current stop level.
    pub stop_price: f64,
}

impl TrailingStop {
    /// Arm a stop `offset` below `reference_price` (usually the entry fill).
    pub fn new(offset: f64, reference_price: f64) -> Self {
        Self {
            offset,
            stop_price: reference_price - offset,
        }
    }

    /// Trail a new price. Returns the (possibly unchanged) stop.
    pub fn update(&mut self, price: f64) -> f64 {
        let candidate = price - self.offset;
        if candidate > self.stop_price {
            self.stop_price = candidate;
        }
        self.stop_price
    }

    /// Fill price if a bar with this open and low reaches the stop.
    ///
    /// A gap through the stop fills at the open; otherwise at the stop.
    pub fn trigger_price(&self, open: f64, low: f64) -> Option<f64> {
        if open <= self.stop_price {
            Some(open)
        } else if low <= self.stop_price {
            Some(self.stop_price)
        } else {
            None
        }
    }
}
