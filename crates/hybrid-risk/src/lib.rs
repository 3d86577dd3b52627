//! Portfolio risk gates for the hybrid trading core.
//!
//! Checks evaluated in order before any new risk is taken:
//! - EmergencyStop: latch triggered and not yet reset
//! - MinBalance: account balance above the floor
//! - PortfolioRisk: exposure as a percentage of balance within limit
//! - ConcurrentTrades: open trade count below limit
//! - ConsecutiveLosses: losing streak below limit
//! - DailyLoss: today's loss as a fraction of balance within limit
//! - EmergencyDrawdown: peak-to-trough drawdown within limit
//!
//! Also provides:
//! - PositionSizer: risk-based sizing with a notional cap
//! - EmergencyStopLatch: sticky stop that only an operator reset clears

pub mod error;
pub mod gates;
pub mod hard_stop;
pub mod sizing;

pub use error::{RiskError, RiskResult};
pub use gates::{AccountFacts, GateResult, RiskCheck, RiskGate, RiskGateConfig, RiskState, TradeStats};
pub use hard_stop::{EmergencyStopLatch, StopReason};
pub use sizing::PositionSizer;
