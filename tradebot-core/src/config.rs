//! Strategy parameters and their validation.
//!
//! `StrategyParams` is the plain configuration record passed to the evaluator at
//! construction. Every field has a default, so a TOML `[strategy]` table only
//! needs to list what it overrides. Validation rejects bad values; nothing is
//! clamped.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from strategy parameter validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be >= 1 (got {value})")]
    NonPositivePeriod { name: &'static str, value: usize },

    #[error("{fast_name} ({fast}) must be shorter than {slow_name} ({slow})")]
    PeriodOrder {
        fast_name: &'static str,
        fast: usize,
        slow_name: &'static str,
        slow: usize,
    },

    #[error("order_percentage must be in (0, 1] (got {0})")]
    OrderPercentage(f64),

    #[error("{name} must be within [0, 100] (got {value})")]
    ThresholdRange { name: &'static str, value: f64 },

    #[error("rsi_oversold ({oversold}) must be below rsi_overbought ({overbought})")]
    ThresholdOrder { oversold: f64, overbought: f64 },

    #[error("stop_loss must be a finite, non-negative price offset (got {0})")]
    StopLoss(f64),

    #[error("unknown rule set '{0}' (valid: trend_confirm, momentum_slope)")]
    UnknownRuleSet(String),
}

/// Which decision rule set the signal policy runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSetKind {
    /// EMA cross, else SMA-trend gate with RSI threshold crossing or MACD cross.
    /// Arms a trailing stop on entry.
    #[default]
    TrendConfirm,
    /// EMA cross, else RSI slope beyond a threshold or MACD cross. No stop.
    MomentumSlope,
}

impl RuleSetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TrendConfirm => "trend_confirm",
            Self::MomentumSlope => "momentum_slope",
        }
    }
}

impl fmt::Display for RuleSetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleSetKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trend_confirm" => Ok(Self::TrendConfirm),
            "momentum_slope" => Ok(Self::MomentumSlope),
            other => Err(ConfigError::UnknownRuleSet(other.to_string())),
        }
    }
}

/// Indicator periods, thresholds, sizing, and stop settings for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyParams {
    /// Fast EMA period.
    pub fast: usize,
    /// Slow EMA period.
    pub slow: usize,
    /// Fraction of available cash committed to a buy.
    pub order_percentage: f64,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub sma_period: usize,
    /// Bars between the two SMA values whose difference gives the trend.
    pub sma_trend_lag: usize,
    /// Trailing stop offset in price units. Zero disables the stop.
    pub stop_loss: f64,
    pub rule_set: RuleSetKind,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            fast: 20,
            slow: 100,
            order_percentage: 0.95,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            sma_period: 30,
            sma_trend_lag: 10,
            stop_loss: 0.1,
            rule_set: RuleSetKind::TrendConfirm,
        }
    }
}

impl StrategyParams {
    /// Check every parameter. Returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("fast", self.fast),
            ("slow", self.slow),
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("sma_period", self.sma_period),
            ("sma_trend_lag", self.sma_trend_lag),
        ] {
            if value == 0 {
                return Err(ConfigError::NonPositivePeriod { name, value });
            }
        }

        if self.fast >= self.slow {
            return Err(ConfigError::PeriodOrder {
                fast_name: "fast",
                fast: self.fast,
                slow_name: "slow",
                slow: self.slow,
            });
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::PeriodOrder {
                fast_name: "macd_fast",
                fast: self.macd_fast,
                slow_name: "macd_slow",
                slow: self.macd_slow,
            });
        }

        // NaN fails this comparison and is rejected too.
        if !(self.order_percentage > 0.0 && self.order_percentage <= 1.0) {
            return Err(ConfigError::OrderPercentage(self.order_percentage));
        }

        for (name, value) in [
            ("rsi_overbought", self.rsi_overbought),
            ("rsi_oversold", self.rsi_oversold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::ThresholdRange { name, value });
            }
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(ConfigError::ThresholdOrder {
                oversold: self.rsi_oversold,
                overbought: self.rsi_overbought,
            });
        }

        if !self.stop_loss.is_finite() || self.stop_loss < 0.0 {
            return Err(ConfigError::StopLoss(self.stop_loss));
        }

        Ok(())
    }

    /// Bars needed before every indicator the policy reads is defined.
    pub fn warmup_bars(&self) -> usize {
        [
            self.slow,
            self.rsi_period + 1,
            self.macd_slow + self.macd_signal - 1,
            self.sma_period + self.sma_trend_lag,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}
