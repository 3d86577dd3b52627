//! Reconciliation of execution events into trade statistics.
//!
//! The executor reports fills and closes as [`ExecutionEvent`]s. The host
//! drains them once per cycle into the [`TradeLedger`], which produces the
//! [`TradeStats`] the risk gate reads.

use chrono::{DateTime, NaiveDate, Utc};
use hybrid_core::{Direction, OrderSide, Price, Size};
use hybrid_risk::TradeStats;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Execution report from the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// A grid level was filled. `profit` is the PnL realized by this fill,
    /// zero for an opening leg.
    GridFill {
        side: OrderSide,
        price: Price,
        size: Size,
        profit: Decimal,
    },
    /// A launch trade was closed.
    LaunchClosed {
        direction: Direction,
        entry_price: Price,
        exit_price: Price,
        size: Size,
    },
    /// An order was refused by the venue.
    OrderRejected { reason: String },
}

impl ExecutionEvent {
    /// Realized PnL carried by the event.
    pub fn pnl(&self) -> Decimal {
        match self {
            Self::GridFill { profit, .. } => *profit,
            Self::LaunchClosed {
                direction,
                entry_price,
                exit_price,
                size,
            } => {
                let sign = Decimal::from(direction.sign());
                (exit_price.inner() - entry_price.inner()) * size.inner() * sign
            }
            Self::OrderRejected { .. } => Decimal::ZERO,
        }
    }
}

/// Running totals kept by the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub total_pnl: Decimal,
    pub daily_pnl: Decimal,
    pub consecutive_losses: u32,
    pub peak_equity: Decimal,
    pub max_drawdown_pct: Decimal,
    pub grid_trades: u64,
    pub grid_profit: Decimal,
    pub launch_trades: u64,
    pub launch_profit: Decimal,
    pub rejected_orders: u64,
}

impl LedgerTotals {
    /// Winning trades over all trades, 0 before the first trade.
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.winning_trades as f64 / self.total_trades as f64
    }
}

/// Accumulates realized results.
#[derive(Debug, Clone)]
pub struct TradeLedger {
    initial_equity: Decimal,
    totals: LedgerTotals,
    day: Option<NaiveDate>,
}

impl TradeLedger {
    /// `initial_equity` anchors the peak used for drawdown.
    pub fn new(initial_equity: Decimal) -> Self {
        Self {
            initial_equity,
            totals: LedgerTotals {
                peak_equity: initial_equity,
                ..LedgerTotals::default()
            },
            day: None,
        }
    }

    pub fn totals(&self) -> &LedgerTotals {
        &self.totals
    }

    /// `initial_equity + total_pnl`.
    pub fn equity(&self) -> Decimal {
        self.initial_equity + self.totals.total_pnl
    }

    /// Statistics read by the risk gate.
    pub fn stats(&self) -> TradeStats {
        TradeStats {
            consecutive_losses: self.totals.consecutive_losses,
            daily_pnl: self.totals.daily_pnl,
            max_drawdown_pct: self.totals.max_drawdown_pct,
        }
    }

    /// Reset the daily PnL when `now` falls on a new UTC day.
    pub fn roll_day(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        match self.day {
            Some(day) if day == today => {}
            Some(day) => {
                info!(
                    previous = %day,
                    daily_pnl = %self.totals.daily_pnl,
                    "Daily PnL reset"
                );
                self.totals.daily_pnl = Decimal::ZERO;
                self.day = Some(today);
            }
            None => self.day = Some(today),
        }
    }

    /// Fold one execution event into the totals.
    pub fn apply(&mut self, event: &ExecutionEvent, now: DateTime<Utc>) {
        self.roll_day(now);

        let pnl = event.pnl();
        match event {
            ExecutionEvent::OrderRejected { reason } => {
                self.totals.rejected_orders += 1;
                warn!(reason = %reason, "Order rejected");
                return;
            }
            ExecutionEvent::GridFill { side, price, .. } => {
                self.totals.grid_trades += 1;
                self.totals.grid_profit += pnl;
                debug!(%side, price = %price, profit = %pnl, "Grid fill");
            }
            ExecutionEvent::LaunchClosed { direction, .. } => {
                self.totals.launch_trades += 1;
                self.totals.launch_profit += pnl;
                info!(%direction, pnl = %pnl, "Launch trade closed");
            }
        }
        self.record_result(pnl);
    }

    fn record_result(&mut self, pnl: Decimal) {
        let t = &mut self.totals;
        t.total_trades += 1;
        t.total_pnl += pnl;
        t.daily_pnl += pnl;

        if pnl > Decimal::ZERO {
            t.winning_trades += 1;
            t.consecutive_losses = 0;
        } else if pnl < Decimal::ZERO {
            t.losing_trades += 1;
            t.consecutive_losses += 1;
        }

        let equity = self.initial_equity + t.total_pnl;
        if equity > t.peak_equity {
            t.peak_equity = equity;
        }
        if t.peak_equity > Decimal::ZERO {
            let drawdown = (t.peak_equity - equity) / t.peak_equity * Decimal::ONE_HUNDRED;
            if drawdown > t.max_drawdown_pct {
                t.max_drawdown_pct = drawdown;
            }
        }
    }
}
