//! Launch signal types.

use chrono::{DateTime, Utc};
use hybrid_core::{Direction, Price, SignalId, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A breakout entry intent produced by a session-extreme rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchSignal {
    pub direction: Direction,
    /// Session extreme that was rejected (high for short, low for long).
    pub level: Price,
    pub entry_price: Price,
    pub stop_loss: Price,
    pub take_profit: Price,
    /// Confidence score in [0, 1].
    pub confidence: f64,
    pub size: Size,
    pub wick_body_ratio: f64,
    pub signal_id: SignalId,
    pub emitted_at: DateTime<Utc>,
}

impl LaunchSignal {
    /// Notional value of the suggested entry.
    pub fn notional(&self) -> Decimal {
        self.size.notional(self.entry_price)
    }

    /// Reward over risk, `None` when the stop sits on the entry.
    pub fn reward_risk(&self) -> Option<Decimal> {
        let risk = self.entry_price.abs_diff(self.stop_loss);
        if risk.is_zero() {
            return None;
        }
        Some(self.entry_price.abs_diff(self.take_profit) / risk)
    }
}

/// Why a detected pattern was not emitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    LowConfidence { confidence: f64 },
    ZeroSize,
    LowVolatility { scaled: f64 },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowConfidence { confidence } => write!(f, "low confidence {confidence:.2}"),
            Self::ZeroSize => write!(f, "position size is zero"),
            Self::LowVolatility { scaled } => write!(f, "volatility {scaled:.2} below threshold"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reward_risk() {
        let signal = LaunchSignal {
            direction: Direction::Short,
            level: Price::new(dec!(2.60)),
            entry_price: Price::new(dec!(2.59)),
            stop_loss: Price::new(dec!(2.626)),
            take_profit: Price::new(dec!(2.50)),
            confidence: 0.7,
            size: Size::new(dec!(100)),
            wick_body_ratio: 3.0,
            signal_id: SignalId::new(0),
            emitted_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        // reward 0.09 / risk 0.036 = 2.5
        assert_eq!(signal.reward_risk(), Some(dec!(2.5)));
        assert_eq!(signal.notional(), dec!(259));
    }
}
