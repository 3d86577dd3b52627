//! Portfolio risk gates.
//!
//! The gate is a pure function of the account facts and trade statistics
//! gathered for a cycle. It never holds state between cycles except through
//! the shared [`EmergencyStopLatch`].
//!
//! # Check Order
//! 1. emergency_stop - latch is set
//! 2. min_balance - balance below floor
//! 3. portfolio_risk - exposure / balance * 100 above limit
//! 4. concurrent_trades - open trades at or above limit
//! 5. consecutive_losses - losing streak at or above limit
//! 6. daily_loss - today's loss fraction above limit
//! 7. emergency_drawdown - drawdown above emergency threshold
//!
//! The first failing check decides the reason; later checks are not run.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RiskError, RiskResult};
use crate::hard_stop::{EmergencyStopLatch, StopReason};

/// Risk gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskGateConfig {
    /// Minimum account balance in quote currency.
    #[serde(default = "default_min_balance_threshold")]
    pub min_balance_threshold: Decimal,
    /// Maximum exposure as a percentage of balance. 12 = 12%.
    #[serde(default = "default_max_portfolio_risk")]
    pub max_portfolio_risk: Decimal,
    #[serde(default = "default_max_concurrent_trades")]
    pub max_concurrent_trades: u32,
    #[serde(default = "default_max_consecutive_losses")]
    pub max_consecutive_losses: u32,
    /// Maximum daily loss as a fraction of balance. 0.05 = 5%.
    #[serde(default = "default_daily_loss_limit")]
    pub daily_loss_limit: Decimal,
    /// Drawdown percentage that blocks trading. 20 = 20%.
    #[serde(default = "default_emergency_stop_drawdown")]
    pub emergency_stop_drawdown: Decimal,
    /// Latch the emergency stop when the drawdown check fails.
    #[serde(default = "default_true")]
    pub latch_on_emergency_drawdown: bool,
    /// Fraction of balance risked per position. 0.04 = 4%.
    #[serde(default = "default_max_single_position_pct")]
    pub max_single_position_pct: Decimal,
    /// Notional cap per position in quote currency.
    #[serde(default = "default_max_position_value")]
    pub max_position_value: Decimal,
    #[serde(default = "default_lot_size")]
    pub lot_size: Decimal,
}

fn default_min_balance_threshold() -> Decimal {
    Decimal::from(50)
}

fn default_max_portfolio_risk() -> Decimal {
    Decimal::from(12)
}

fn default_max_concurrent_trades() -> u32 {
    10
}

fn default_max_consecutive_losses() -> u32 {
    5
}

fn default_daily_loss_limit() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

fn default_emergency_stop_drawdown() -> Decimal {
    Decimal::from(20)
}

fn default_true() -> bool {
    true
}

fn default_max_single_position_pct() -> Decimal {
    Decimal::new(4, 2) // 0.04
}

fn default_max_position_value() -> Decimal {
    Decimal::from(1000)
}

fn default_lot_size() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

impl Default for RiskGateConfig {
    fn default() -> Self {
        Self {
            min_balance_threshold: default_min_balance_threshold(),
            max_portfolio_risk: default_max_portfolio_risk(),
            max_concurrent_trades: default_max_concurrent_trades(),
            max_consecutive_losses: default_max_consecutive_losses(),
            daily_loss_limit: default_daily_loss_limit(),
            emergency_stop_drawdown: default_emergency_stop_drawdown(),
            latch_on_emergency_drawdown: true,
            max_single_position_pct: default_max_single_position_pct(),
            max_position_value: default_max_position_value(),
            lot_size: default_lot_size(),
        }
    }
}

impl RiskGateConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_balance_threshold.is_sign_negative() {
            return Err(format!(
                "min_balance_threshold ({}) must be non-negative",
                self.min_balance_threshold
            ));
        }
        if self.max_portfolio_risk <= Decimal::ZERO {
            return Err(format!(
                "max_portfolio_risk ({}) must be positive",
                self.max_portfolio_risk
            ));
        }
        if self.max_concurrent_trades == 0 {
            return Err("max_concurrent_trades must be positive".to_string());
        }
        if self.max_consecutive_losses == 0 {
            return Err("max_consecutive_losses must be positive".to_string());
        }
        if self.daily_loss_limit <= Decimal::ZERO || self.daily_loss_limit > Decimal::ONE {
            return Err(format!(
                "daily_loss_limit ({}) must be in (0, 1]",
                self.daily_loss_limit
            ));
        }
        if self.emergency_stop_drawdown <= Decimal::ZERO
            || self.emergency_stop_drawdown > Decimal::ONE_HUNDRED
        {
            return Err(format!(
                "emergency_stop_drawdown ({}) must be in (0, 100]",
                self.emergency_stop_drawdown
            ));
        }
        if self.max_single_position_pct <= Decimal::ZERO
            || self.max_single_position_pct > Decimal::ONE
        {
            return Err(format!(
                "max_single_position_pct ({}) must be in (0, 1]",
                self.max_single_position_pct
            ));
        }
        if self.max_position_value <= Decimal::ZERO {
            return Err(format!(
                "max_position_value ({}) must be positive",
                self.max_position_value
            ));
        }
        if self.lot_size.is_sign_negative() {
            return Err(format!("lot_size ({}) must be non-negative", self.lot_size));
        }
        Ok(())
    }
}

/// Account facts gathered by the host for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFacts {
    /// Total balance in quote currency.
    pub balance: Decimal,
    /// Notional currently committed to open orders and positions.
    pub exposure: Decimal,
    pub active_trade_count: u32,
}

/// Realized trade statistics produced by reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeStats {
    pub consecutive_losses: u32,
    /// Today's realized PnL (negative = loss).
    pub daily_pnl: Decimal,
    /// Peak-to-trough drawdown in percent.
    pub max_drawdown_pct: Decimal,
}

/// Which check blocked trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCheck {
    EmergencyStop,
    MinBalance,
    PortfolioRisk,
    ConcurrentTrades,
    ConsecutiveLosses,
    DailyLoss,
    EmergencyDrawdown,
}

impl RiskCheck {
    /// Evaluation order.
    pub const ALL: [RiskCheck; 7] = [
        Self::EmergencyStop,
        Self::MinBalance,
        Self::PortfolioRisk,
        Self::ConcurrentTrades,
        Self::ConsecutiveLosses,
        Self::DailyLoss,
        Self::EmergencyDrawdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmergencyStop => "emergency_stop",
            Self::MinBalance => "min_balance",
            Self::PortfolioRisk => "portfolio_risk",
            Self::ConcurrentTrades => "concurrent_trades",
            Self::ConsecutiveLosses => "consecutive_losses",
            Self::DailyLoss => "daily_loss",
            Self::EmergencyDrawdown => "emergency_drawdown",
        }
    }
}

impl std::fmt::Display for RiskCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single check.
#[derive(Debug, Clone, PartialEq)]
pub enum GateResult {
    Pass,
    Block(String),
}

impl GateResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block(_))
    }
}

/// Risk picture for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    pub balance: Decimal,
    pub exposure: Decimal,
    pub portfolio_risk_pct: Decimal,
    pub active_trade_count: u32,
    pub consecutive_losses: u32,
    pub daily_pnl: Decimal,
    pub max_drawdown_pct: Decimal,
    pub can_trade: bool,
    pub reason: Option<String>,
    pub blocked_by: Option<RiskCheck>,
}

impl RiskState {
    fn from_inputs(facts: &AccountFacts, stats: &TradeStats) -> Self {
        Self {
            balance: facts.balance,
            exposure: facts.exposure,
            portfolio_risk_pct: portfolio_risk_pct(facts),
            active_trade_count: facts.active_trade_count,
            consecutive_losses: stats.consecutive_losses,
            daily_pnl: stats.daily_pnl,
            max_drawdown_pct: stats.max_drawdown_pct,
            can_trade: true,
            reason: None,
            blocked_by: None,
        }
    }
}

/// `exposure / balance * 100`, 0 for a non-positive balance.
pub fn portfolio_risk_pct(facts: &AccountFacts) -> Decimal {
    if facts.balance <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    facts.exposure / facts.balance * Decimal::ONE_HUNDRED
}

/// Multi-condition risk gate.
///
/// When in doubt, block.
#[derive(Debug)]
pub struct RiskGate {
    config: RiskGateConfig,
    latch: Arc<EmergencyStopLatch>,
}

impl RiskGate {
    pub fn new(config: RiskGateConfig) -> Self {
        Self::with_latch(config, Arc::new(EmergencyStopLatch::new()))
    }

    /// Create a gate after validating the configuration.
    pub fn try_new(config: RiskGateConfig) -> RiskResult<Self> {
        config.validate().map_err(RiskError::ConfigError)?;
        Ok(Self::new(config))
    }

    /// Create a gate sharing an existing latch.
    pub fn with_latch(config: RiskGateConfig, latch: Arc<EmergencyStopLatch>) -> Self {
        Self { config, latch }
    }

    pub fn config(&self) -> &RiskGateConfig {
        &self.config
    }

    /// Handle to the emergency stop latch.
    pub fn latch(&self) -> Arc<EmergencyStopLatch> {
        Arc::clone(&self.latch)
    }

    /// Evaluate the gate into a [`RiskState`].
    ///
    /// Checks are lazy: once one blocks, later checks are never computed.
    pub fn evaluate(&self, facts: &AccountFacts, stats: &TradeStats) -> RiskState {
        let mut state = RiskState::from_inputs(facts, stats);

        if let Some((check, GateResult::Block(reason))) =
            self.checks(facts, stats).find(|(_, r)| r.is_block())
        {
            debug!(gate = check.as_str(), reason = %reason, "Trading blocked");
            state.can_trade = false;
            state.reason = Some(reason);
            state.blocked_by = Some(check);
        }

        state
    }

    fn checks<'a>(
        &'a self,
        facts: &'a AccountFacts,
        stats: &'a TradeStats,
    ) -> impl Iterator<Item = (RiskCheck, GateResult)> + 'a {
        RiskCheck::ALL
            .into_iter()
            .map(move |check| (check, self.run_check(check, facts, stats)))
    }

    fn run_check(&self, check: RiskCheck, facts: &AccountFacts, stats: &TradeStats) -> GateResult {
        match check {
            RiskCheck::EmergencyStop => self.check_emergency_stop(),
            RiskCheck::MinBalance => self.check_min_balance(facts.balance),
            RiskCheck::PortfolioRisk => self.check_portfolio_risk(portfolio_risk_pct(facts)),
            RiskCheck::ConcurrentTrades => self.check_concurrent_trades(facts.active_trade_count),
            RiskCheck::ConsecutiveLosses => {
                self.check_consecutive_losses(stats.consecutive_losses)
            }
            RiskCheck::DailyLoss => self.check_daily_loss(stats.daily_pnl, facts.balance),
            RiskCheck::EmergencyDrawdown => self.check_emergency_drawdown(stats.max_drawdown_pct),
        }
    }

    /// Trigger the latch if `state` was blocked by the drawdown check and
    /// latching is enabled. Returns true if the latch was set by this call.
    pub fn latch_if_emergency(&self, state: &RiskState) -> bool {
        if !self.config.latch_on_emergency_drawdown
            || state.blocked_by != Some(RiskCheck::EmergencyDrawdown)
        {
            return false;
        }
        self.latch.trigger(StopReason::EmergencyDrawdown {
            drawdown_pct: state.max_drawdown_pct,
            limit_pct: self.config.emergency_stop_drawdown,
        })
    }

    pub fn check_emergency_stop(&self) -> GateResult {
        match self.latch.reason() {
            Some(reason) => GateResult::Block(format!("Emergency stop active ({})", reason)),
            None if self.latch.is_triggered() => {
                GateResult::Block("Emergency stop active".to_string())
            }
            None => GateResult::Pass,
        }
    }

    pub fn check_min_balance(&self, balance: Decimal) -> GateResult {
        if balance < self.config.min_balance_threshold {
            return GateResult::Block(format!(
                "Balance below minimum: {} < {}",
                balance, self.config.min_balance_threshold
            ));
        }
        GateResult::Pass
    }

    pub fn check_portfolio_risk(&self, portfolio_risk_pct: Decimal) -> GateResult {
        if portfolio_risk_pct > self.config.max_portfolio_risk {
            return GateResult::Block(format!(
                "Portfolio risk too high: {}% > {}%",
                portfolio_risk_pct.round_dp(2),
                self.config.max_portfolio_risk
            ));
        }
        GateResult::Pass
    }

    pub fn check_concurrent_trades(&self, active: u32) -> GateResult {
        if active >= self.config.max_concurrent_trades {
            return GateResult::Block(format!(
                "Too many concurrent trades: {} >= {}",
                active, self.config.max_concurrent_trades
            ));
        }
        GateResult::Pass
    }

    pub fn check_consecutive_losses(&self, losses: u32) -> GateResult {
        if losses >= self.config.max_consecutive_losses {
            return GateResult::Block(format!(
                "Too many consecutive losses: {} >= {}",
                losses, self.config.max_consecutive_losses
            ));
        }
        GateResult::Pass
    }

    /// Only losses count; a non-positive balance with any loss blocks.
    pub fn check_daily_loss(&self, daily_pnl: Decimal, balance: Decimal) -> GateResult {
        if !daily_pnl.is_sign_negative() || daily_pnl.is_zero() {
            return GateResult::Pass;
        }
        if balance <= Decimal::ZERO {
            return GateResult::Block(format!(
                "Daily loss {} with no balance",
                daily_pnl.abs()
            ));
        }
        let fraction = daily_pnl.abs() / balance;
        if fraction > self.config.daily_loss_limit {
            return GateResult::Block(format!(
                "Daily loss limit exceeded: {}% > {}%",
                (fraction * Decimal::ONE_HUNDRED).round_dp(2),
                self.config.daily_loss_limit * Decimal::ONE_HUNDRED
            ));
        }
        GateResult::Pass
    }

    pub fn check_emergency_drawdown(&self, drawdown_pct: Decimal) -> GateResult {
        if drawdown_pct > self.config.emergency_stop_drawdown {
            return GateResult::Block(format!(
                "Emergency drawdown: {}% > {}%",
                drawdown_pct.round_dp(2),
                self.config.emergency_stop_drawdown
            ));
        }
        GateResult::Pass
    }
}
