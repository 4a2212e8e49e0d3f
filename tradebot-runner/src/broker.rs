//! Simulated broker for backtests.
//!
//! Fill model:
//! - A submitted market order fills at the next bar's open.
//! - A Buy whose cost plus commission exceeds cash is cancelled with `Margin`.
//! - Close sells the whole position; Sell sells at most the position.
//! - Zero-size orders and exits while flat are `Rejected`.
//! - Commission is `rate * traded value`, charged on both sides.
//!
//! The trailing stop is referenced to the close of the entry fill's bar and
//! stands against the position from the next bar on. It ratchets on every
//! close and is checked against each bar's open and low. A Close fill cancels
//! it silently.

use chrono::NaiveDate;
use tradebot_core::{
    Bar, Broker, BrokerEvent, CancelReason, Execution, ExecutionOrigin, OrderAction, OrderHandle,
    OrderIntent, TrailingStop,
};

#[derive(Debug, Clone, Copy)]
struct WorkingOrder {
    handle: OrderHandle,
    intent: OrderIntent,
}

#[derive(Debug, Clone, Copy)]
struct StandingStop {
    handle: OrderHandle,
    size: u64,
    trail: TrailingStop,
}

#[derive(Debug, Clone)]
pub struct SimBroker {
    cash: f64,
    commission_rate: f64,
    position: u64,
    working: Option<WorkingOrder>,
    stop: Option<StandingStop>,
    last_close: Option<f64>,
    next_id: u64,
}

impl SimBroker {
    pub fn new(cash: f64, commission_rate: f64) -> Self {
        Self {
            cash,
            commission_rate,
            position: 0,
            working: None,
            stop: None,
            last_close: None,
            next_id: 0,
        }
    }

    /// Execute whatever is due on `bar`: the working market order at the
    /// open, then the trailing stop.
    pub fn process_bar(&mut self, bar: &Bar) -> Vec<BrokerEvent> {
        let mut events = Vec::new();
        self.last_close = Some(bar.close);

        if let Some(order) = self.working.take() {
            events.push(self.execute_market(order, bar));
        }

        if let Some(stop) = self.stop {
            if let Some(price) = stop.trail.trigger_price(bar.open, bar.low) {
                self.stop = None;
                let size = stop.size.min(self.position);
                if size > 0 {
                    let commission = self.sell(size, price);
                    tracing::debug!(date = %bar.date, price, stop = stop.trail.stop_price, "trailing stop hit");
                    events.push(BrokerEvent::Filled(Execution {
                        handle: stop.handle,
                        action: OrderAction::Sell,
                        origin: ExecutionOrigin::TrailingStop,
                        date: bar.date,
                        price,
                        size,
                        commission,
                    }));
                }
            }
        }

        events
    }

    /// End-of-bar bookkeeping: ratchet the stop and return the portfolio value.
    pub fn mark_to_market(&mut self, bar: &Bar) -> f64 {
        self.last_close = Some(bar.close);
        if let Some(stop) = self.stop.as_mut() {
            stop.trail.update(bar.close);
        }
        self.portfolio_value(bar.close)
    }

    pub fn portfolio_value(&self, price: f64) -> f64 {
        self.cash + self.position as f64 * price
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn has_working_order(&self) -> bool {
        self.working.is_some()
    }

    /// Current trailing stop level, if one stands.
    pub fn stop_price(&self) -> Option<f64> {
        self.stop.map(|s| s.trail.stop_price)
    }

    fn execute_market(&mut self, order: WorkingOrder, bar: &Bar) -> BrokerEvent {
        let WorkingOrder { handle, intent } = order;
        let price = bar.open;

        let size = match intent.action {
            OrderAction::Buy => intent.size,
            OrderAction::Sell => intent.size.min(self.position),
            OrderAction::Close => self.position,
        };
        if size == 0 {
            return self.cancelled(handle, CancelReason::Rejected, bar.date);
        }

        let commission = match intent.action {
            OrderAction::Buy => {
                let cost = size as f64 * price;
                let commission = cost * self.commission_rate;
                if cost + commission > self.cash {
                    return self.cancelled(handle, CancelReason::Margin, bar.date);
                }
                self.cash -= cost + commission;
                self.position += size;
                commission
            }
            OrderAction::Sell | OrderAction::Close => {
                let commission = self.sell(size, price);
                if self.position == 0 {
                    if let Some(stop) = self.stop.take() {
                        tracing::debug!(handle = %stop.handle, "trailing stop cancelled by exit fill");
                    }
                }
                commission
            }
        };

        BrokerEvent::Filled(Execution {
            handle,
            action: intent.action,
            origin: ExecutionOrigin::Signal,
            date: bar.date,
            price,
            size,
            commission,
        })
    }

    fn sell(&mut self, size: u64, price: f64) -> f64 {
        let value = size as f64 * price;
        let commission = value * self.commission_rate;
        self.cash += value - commission;
        self.position -= size;
        commission
    }

    fn cancelled(&self, handle: OrderHandle, reason: CancelReason, date: NaiveDate) -> BrokerEvent {
        tracing::debug!(%handle, %reason, %date, "order not executed");
        BrokerEvent::Cancelled {
            handle,
            reason,
            date,
        }
    }

    fn next_handle(&mut self) -> OrderHandle {
        self.next_id += 1;
        OrderHandle(self.next_id)
    }
}

impl Broker for SimBroker {
    fn submit(&mut self, intent: &OrderIntent) -> OrderHandle {
        let handle = self.next_handle();
        if let Some(replaced) = self.working.replace(WorkingOrder {
            handle,
            intent: *intent,
        }) {
            tracing::warn!(old = %replaced.handle, new = %handle, "working order replaced");
        }
        handle
    }

    fn place_trailing_stop(&mut self, offset: f64, size: u64) -> OrderHandle {
        let handle = self.next_handle();
        let reference = self.last_close.unwrap_or(0.0);
        self.stop = Some(StandingStop {
            handle,
            size,
            trail: TrailingStop::new(offset, reference),
        });
        handle
    }

    fn available_cash(&self) -> f64 {
        self.cash
    }

    fn current_position_size(&self) -> u64 {
        self.position
    }
}
