//! tradebot core: rolling indicators, crossover detection, rule-based signal
//! policy, and the one-order-at-a-time guard.
//!
//! The crate owns only the decision logic. Data feeds, order execution, and
//! cash accounting belong to the host, which drives a `SignalEvaluator` one
//! bar at a time and relays broker notifications back to it:
//! - Domain types (bars, order intents, executions)
//! - Streaming indicators (EMA, SMA + trend, Wilder RSI, MACD)
//! - Crossover detector
//! - Swappable rule sets behind one `SignalPolicy`
//! - `GuardState` with explicit Flat / OrderPending / Position transitions
//! - `Broker` trait at the execution boundary

pub mod broker;
pub mod config;
pub mod crossover;
pub mod domain;
pub mod evaluator;
pub mod guard;
pub mod indicators;
pub mod journal;
pub mod policy;
pub mod trailing_stop;

pub use broker::{Broker, BrokerEvent};
pub use config::{ConfigError, RuleSetKind, StrategyParams};
pub use crossover::{cross, Cross, CrossoverState};
pub use domain::{Bar, CancelReason, Execution, ExecutionOrigin, OrderAction, OrderHandle, OrderIntent};
pub use evaluator::{EvaluatorError, EvaluatorStats, SignalEvaluator};
pub use guard::{GuardError, GuardState, TradeState};
pub use indicators::{IndicatorEngine, IndicatorSnapshot};
pub use journal::Journal;
pub use policy::{Decision, RuleSet, SignalPolicy};
pub use trailing_stop::TrailingStop;
