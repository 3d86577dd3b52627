//! Per-cycle performance record.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of the performance log.
///
/// `trend` and `bias` are -1/0/1. Optional fields are `null` when the cycle
/// had no value for them (no profile yet, no grid, no signal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub atr: Decimal,
    pub trend: i8,
    pub bias: i8,
    pub volatility_ratio: f64,
    pub rsi: f64,
    pub portfolio_risk_pct: Decimal,
    pub active_trade_count: u32,
    pub can_trade: bool,
    pub restriction_reason: Option<String>,
    pub grid_trades: u64,
    pub grid_profit: Decimal,
    pub launch_trades: u64,
    pub launch_profit: Decimal,
    pub total_pnl: Decimal,
    pub daily_pnl: Decimal,
    pub poc: Option<Decimal>,
    pub grid_base: Option<Decimal>,
    /// "long" or "short" when a launch signal was emitted this cycle.
    pub signal: Option<String>,
}

impl PerformanceRecord {
    /// UTC date used to pick the daily file.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}
