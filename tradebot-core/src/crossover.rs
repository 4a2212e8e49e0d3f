//! Crossover detection: golden cross and death cross between two series.
//!
//! A crossover is a sign change of (A - B) between the previous and the
//! current bar. Undefined operands never produce an event.

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSnapshot;

/// Signed crossover event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cross {
    /// A crossed below B (-1).
    Below,
    /// No transition (0).
    #[default]
    None,
    /// A crossed above B (+1).
    Above,
}

impl Cross {
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Below => -1,
            Self::None => 0,
            Self::Above => 1,
        }
    }

    pub fn is_above(self) -> bool {
        self == Self::Above
    }

    pub fn is_below(self) -> bool {
        self == Self::Below
    }
}

/// Compare two consecutive (A, B) pairs.
///
/// Above iff `prev_a <= prev_b` and `cur_a > cur_b`.
/// Below iff `prev_a >= prev_b` and `cur_a < cur_b`.
pub fn cross(
    prev_a: Option<f64>,
    prev_b: Option<f64>,
    cur_a: Option<f64>,
    cur_b: Option<f64>,
) -> Cross {
    let (Some(prev_a), Some(prev_b), Some(cur_a), Some(cur_b)) = (prev_a, prev_b, cur_a, cur_b)
    else {
        return Cross::None;
    };

    if prev_a <= prev_b && cur_a > cur_b {
        Cross::Above
    } else if prev_a >= prev_b && cur_a < cur_b {
        Cross::Below
    } else {
        Cross::None
    }
}

/// Crossover events for one bar, derived from two consecutive snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverState {
    /// Fast EMA vs slow EMA.
    pub ema_cross: Cross,
    /// MACD line vs MACD signal.
    pub macd_cross: Cross,
}

impl CrossoverState {
    pub fn from_snapshots(prev: &IndicatorSnapshot, cur: &IndicatorSnapshot) -> Self {
        Self {
            ema_cross: cross(prev.fast_ema, prev.slow_ema, cur.fast_ema, cur.slow_ema),
            macd_cross: cross(
                prev.macd_line,
                prev.macd_signal,
                cur.macd_line,
                cur.macd_signal,
            ),
        }
    }
}
