//! Round-trip trade extraction from the execution tape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tradebot_core::{Execution, ExecutionOrigin};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Signal,
    TrailingStop,
}

impl From<ExecutionOrigin> for ExitReason {
    fn from(origin: ExecutionOrigin) -> Self {
        match origin {
            ExecutionOrigin::Signal => Self::Signal,
            ExecutionOrigin::TrailingStop => Self::TrailingStop,
        }
    }
}

/// One completed long round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub size: u64,
    pub gross_pnl: f64,
    /// Entry plus exit commission.
    pub commission: f64,
    pub net_pnl: f64,
    pub exit_reason: ExitReason,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    pub fn return_pct(&self) -> f64 {
        let cost = self.entry_price * self.size as f64;
        if cost <= 0.0 {
            return 0.0;
        }
        self.net_pnl / cost
    }
}

/// Pair each entry fill with the exit fill that closes it.
///
/// An entry still open at the end of the tape produces no record.
pub fn extract_trades(symbol: &str, executions: &[Execution]) -> Vec<TradeRecord> {
    let mut trades = Vec::new();
    let mut open: Option<&Execution> = None;

    for exec in executions {
        if exec.action.is_buy() {
            open = Some(exec);
            continue;
        }
        let Some(entry) = open.take() else {
            continue;
        };
        let size = exec.size.min(entry.size);
        let gross_pnl = (exec.price - entry.price) * size as f64;
        let commission = entry.commission + exec.commission;
        trades.push(TradeRecord {
            symbol: symbol.to_string(),
            entry_date: entry.date,
            entry_price: entry.price,
            exit_date: exec.date,
            exit_price: exec.price,
            size,
            gross_pnl,
            commission,
            net_pnl: gross_pnl - commission,
            exit_reason: exec.origin.into(),
        });
    }

    trades
}
