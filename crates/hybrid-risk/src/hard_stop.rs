//! Emergency stop latch.
//!
//! Once triggered the latch stays set across cycles until an operator calls
//! [`EmergencyStopLatch::reset`]. Every other risk block is recomputed each
//! cycle; this is the only sticky one.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

/// Why the latch was triggered.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// Drawdown crossed the emergency threshold.
    EmergencyDrawdown {
        drawdown_pct: Decimal,
        limit_pct: Decimal,
    },
    /// Operator request.
    Manual { message: String },
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmergencyDrawdown {
                drawdown_pct,
                limit_pct,
            } => write!(
                f,
                "Emergency drawdown: {}% > {}%",
                drawdown_pct.round_dp(2),
                limit_pct
            ),
            Self::Manual { message } => write!(f, "Manual: {}", message),
        }
    }
}

/// Sticky emergency stop.
///
/// Thread-safe: share via `Arc<EmergencyStopLatch>` with an operator handle.
pub struct EmergencyStopLatch {
    triggered: AtomicBool,
    /// Unix milliseconds, 0 when not triggered.
    triggered_at: AtomicI64,
    reason: RwLock<Option<StopReason>>,
}

impl Default for EmergencyStopLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EmergencyStopLatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmergencyStopLatch")
            .field("triggered", &self.is_triggered())
            .field("reason", &self.reason())
            .finish()
    }
}

impl EmergencyStopLatch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            triggered: AtomicBool::new(false),
            triggered_at: AtomicI64::new(0),
            reason: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Trigger the latch.
    ///
    /// If already triggered this is a no-op and the original reason is kept.
    /// Returns true if this call set the latch.
    pub fn trigger(&self, reason: StopReason) -> bool {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.triggered_at
                .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
            *self.reason.write() = Some(reason.clone());

            error!(reason = %reason, "EMERGENCY STOP TRIGGERED");
            true
        } else {
            warn!(new_reason = %reason, "Emergency stop already triggered, ignoring");
            false
        }
    }

    /// When the latch was triggered, `None` if it is not.
    #[must_use]
    pub fn triggered_at(&self) -> Option<DateTime<Utc>> {
        if !self.is_triggered() {
            return None;
        }
        match self.triggered_at.load(Ordering::SeqCst) {
            0 => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }

    #[must_use]
    pub fn reason(&self) -> Option<StopReason> {
        if self.is_triggered() {
            self.reason.read().clone()
        } else {
            None
        }
    }

    /// Clear the latch. Operator action only; nothing in the engine calls this.
    pub fn reset(&self) {
        if self.is_triggered() {
            let previous = self.reason.read().clone();
            info!(previous_reason = ?previous, "Emergency stop manually reset");

            self.triggered.store(false, Ordering::SeqCst);
            self.triggered_at.store(0, Ordering::SeqCst);
            *self.reason.write() = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[test]
    fn test_latch_initial_state() {
        let latch = EmergencyStopLatch::new();
        assert!(!latch.is_triggered());
        assert!(latch.triggered_at().is_none());
        assert!(latch.reason().is_none());
    }

    #[test]
    fn test_latch_trigger_keeps_first_reason() {
        let latch = EmergencyStopLatch::new();
        let first = StopReason::EmergencyDrawdown {
            drawdown_pct: dec!(21.5),
            limit_pct: dec!(20),
        };

        assert!(latch.trigger(first.clone()));
        assert!(latch.is_triggered());
        assert!(latch.triggered_at().is_some());

        assert!(!latch.trigger(StopReason::Manual {
            message: "second".to_string()
        }));
        assert_eq!(latch.reason(), Some(first));
    }

    #[test]
    fn test_latch_reset() {
        let latch = EmergencyStopLatch::new();
        latch.trigger(StopReason::Manual {
            message: "test".to_string(),
        });
        latch.reset();

        assert!(!latch.is_triggered());
        assert!(latch.triggered_at().is_none());
        assert!(latch.reason().is_none());
    }

    #[test]
    fn test_latch_shared_handle() {
        let latch = Arc::new(EmergencyStopLatch::new());
        let operator = Arc::clone(&latch);

        operator.trigger(StopReason::Manual {
            message: "operator".to_string(),
        });
        assert!(latch.is_triggered());
    }

    #[test]
    fn test_reason_display() {
        let reason = StopReason::EmergencyDrawdown {
            drawdown_pct: dec!(21.456),
            limit_pct: dec!(20),
        };
        assert_eq!(reason.to_string(), "Emergency drawdown: 21.46% > 20%");
    }
}
