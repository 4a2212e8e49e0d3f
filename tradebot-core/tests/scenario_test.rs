//! End-to-end scenarios through `SignalEvaluator` with an instant-fill broker.

use chrono::NaiveDate;
use tradebot_core::indicators::{Ema, Indicator};
use tradebot_core::{
    Bar, Broker, BrokerEvent, Execution, ExecutionOrigin, OrderAction, OrderHandle, OrderIntent,
    RuleSetKind, SignalEvaluator, StrategyParams,
};

/// Fills every intent at the decision bar's close, with no commission.
struct InstantBroker {
    cash: f64,
    position: u64,
    next_id: u64,
    stops_placed: usize,
}

impl InstantBroker {
    fn new(cash: f64) -> Self {
        Self {
            cash,
            position: 0,
            next_id: 0,
            stops_placed: 0,
        }
    }

    fn execute(&mut self, intent: &OrderIntent, date: NaiveDate) -> BrokerEvent {
        let price = intent.reference_price;
        let size = match intent.action {
            OrderAction::Buy => {
                self.cash -= intent.size as f64 * price;
                self.position = intent.size;
                intent.size
            }
            _ => {
                let size = self.position;
                self.cash += size as f64 * price;
                self.position = 0;
                size
            }
        };
        BrokerEvent::Filled(Execution {
            handle: OrderHandle(self.next_id),
            action: intent.action,
            origin: ExecutionOrigin::Signal,
            date,
            price,
            size,
            commission: 0.0,
        })
    }
}

impl Broker for InstantBroker {
    fn submit(&mut self, _intent: &OrderIntent) -> OrderHandle {
        self.next_id += 1;
        OrderHandle(self.next_id)
    }

    fn place_trailing_stop(&mut self, _offset: f64, _size: u64) -> OrderHandle {
        self.stops_placed += 1;
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

fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            symbol: "RAMP".into(),
            date: base + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        })
        .collect()
}

/// 20 flat bars at 100, ramp to 150 over 30 bars, ramp to 80 over 30 bars.
fn ramp_closes() -> Vec<f64> {
    let mut closes = vec![100.0; 20];
    closes.extend((1..=30).map(|i| 100.0 + 50.0 * i as f64 / 30.0));
    closes.extend((1..=30).map(|i| 150.0 - 70.0 * i as f64 / 30.0));
    closes
}

fn run(params: StrategyParams, closes: &[f64]) -> (Vec<(usize, OrderIntent)>, SignalEvaluator, InstantBroker) {
    let mut eval = SignalEvaluator::new(params).unwrap();
    let mut broker = InstantBroker::new(100_000.0);
    let mut intents = Vec::new();
    for (i, bar) in make_bars(closes).iter().enumerate() {
        if let Some(intent) = eval.on_bar(bar, &mut broker).unwrap() {
            let event = broker.execute(&intent, bar.date);
            eval.on_broker_event(&event, &mut broker);
            intents.push((i, intent));
        }
    }
    (intents, eval, broker)
}

/// First bar index after `from` where the fast EMA crosses the slow EMA in `direction`.
fn ema_cross_bar(closes: &[f64], fast: usize, slow: usize, from: usize, above: bool) -> Option<usize> {
    let mut f = Ema::new(fast);
    let mut s = Ema::new(slow);
    let mut prev: Option<(f64, f64)> = None;
    for (i, &c) in closes.iter().enumerate() {
        let cur = f.update(c).zip(s.update(c));
        if let (Some((pf, ps)), Some((cf, cs))) = (prev, cur) {
            let crossed = if above { pf <= ps && cf > cs } else { pf >= ps && cf < cs };
            if crossed && i > from {
                return Some(i);
            }
        }
        prev = cur;
    }
    None
}

#[test]
fn ramp_up_then_down_trades_once_each_way() {
    let closes = ramp_closes();
    let params = StrategyParams {
        fast: 5,
        slow: 10,
        ..Default::default()
    };
    let (intents, eval, _) = run(params, &closes);

    let golden = ema_cross_bar(&closes, 5, 10, 0, true).unwrap();
    let death = ema_cross_bar(&closes, 5, 10, golden, false).unwrap();
    assert_eq!(golden, 20, "golden cross on the first ramp bar");
    assert!((50..80).contains(&death), "death cross during the ramp down");

    let actions: Vec<(usize, OrderAction)> = intents.iter().map(|(i, it)| (*i, it.action)).collect();
    assert_eq!(actions, vec![(golden, OrderAction::Buy), (death, OrderAction::Close)]);
    assert!(intents.iter().all(|(i, _)| *i >= 20), "no intents during the flat warm-up");

    assert!(!eval.guard().has_open_position);
    assert!(!eval.guard().has_open_order);
}

#[test]
fn ramp_buy_is_sized_from_cash() {
    let closes = ramp_closes();
    let params = StrategyParams {
        fast: 5,
        slow: 10,
        ..Default::default()
    };
    let (intents, _, _) = run(params, &closes);
    let (_, buy) = intents[0];
    let expected = (0.95 * 100_000.0 / closes[20]).floor() as u64;
    assert_eq!(buy.size, expected);
}

#[test]
fn ramp_journal_records_decisions_and_fills() {
    let params = StrategyParams {
        fast: 5,
        slow: 10,
        ..Default::default()
    };
    let (_, eval, broker) = run(params, &ramp_closes());
    let lines = eval.journal().lines();
    // create + execute for each side
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("2024-01-22, BUY CREATE, "));
    assert!(lines[1].starts_with("2024-01-22, BUY EXECUTED, "));
    assert!(lines[2].contains("SELL CREATE"));
    assert!(lines[3].contains("SELL EXECUTED"));
    assert_eq!(broker.stops_placed, 1);
}

#[test]
fn momentum_slope_exits_on_first_rsi_downturn_above_overbought() {
    let params = StrategyParams {
        fast: 5,
        slow: 10,
        rule_set: RuleSetKind::MomentumSlope,
        ..Default::default()
    };
    let (intents, _, broker) = run(params, &ramp_closes());
    let actions: Vec<(usize, OrderAction)> = intents.iter().map(|(i, it)| (*i, it.action)).collect();
    // RSI sits at 100 through the ramp up and turns down on the first falling bar.
    assert_eq!(actions, vec![(20, OrderAction::Buy), (50, OrderAction::Close)]);
    assert_eq!(broker.stops_placed, 0);
}

#[test]
fn flat_series_never_trades() {
    let (intents, eval, _) = run(StrategyParams::default(), &[100.0; 300]);
    assert!(intents.is_empty());
    let snap = eval.last_snapshot().unwrap();
    assert_eq!(snap.rsi, Some(50.0));
    assert_eq!(snap.fast_ema, Some(100.0));
    assert_eq!(snap.slow_ema, Some(100.0));
}

#[test]
fn sizing_scenario() {
    assert_eq!(tradebot_core::policy::order_size(0.95, 100_000.0, 50.0), 1900);
}
