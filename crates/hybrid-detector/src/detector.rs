//! Launch signal detector.
//!
//! Strategy: record the session range inside the daily window, then after
//! the window closes trade rejections of the session extremes.
//! - Short: price within `proximity_pct` below the session high, latest move
//!   down, upper wick/body >= `needle_body_ratio`
//! - Long: the mirror image at the session low
//!
//! At most one signal per cooldown, regardless of how many patterns appear.

use chrono::{DateTime, Duration, Utc};
use hybrid_core::{Direction, Price, SignalId};
use hybrid_indicators::IndicatorSnapshot;
use hybrid_risk::PositionSizer;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::LaunchConfig;
use crate::error::{DetectorError, DetectorResult};
use crate::needle::{confidence, latest_move_agrees, wick_body_ratio};
use crate::session::{LaunchSession, SessionPhase, SessionTracker, SessionTransition};
use crate::signal::{LaunchSignal, RejectReason};

/// Inputs for one scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanInput<'a> {
    pub now: DateTime<Utc>,
    /// Latest closes, oldest first, ending with the cycle price.
    pub recent: &'a [Price],
    pub snapshot: &'a IndicatorSnapshot,
    /// Balance the position is sized against.
    pub balance: Decimal,
}

/// Outcome of a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchDecision {
    Disabled,
    /// Window open; the range is still being recorded.
    InWindow,
    /// No completed session with a confirmed range.
    RangeUnconfirmed,
    CoolingDown { remaining: Duration },
    NoPattern,
    Rejected {
        direction: Direction,
        reason: RejectReason,
    },
    Signal(LaunchSignal),
}

impl LaunchDecision {
    pub fn signal(&self) -> Option<&LaunchSignal> {
        match self {
            Self::Signal(signal) => Some(signal),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::InWindow => "in_window",
            Self::RangeUnconfirmed => "range_unconfirmed",
            Self::CoolingDown { .. } => "cooling_down",
            Self::NoPattern => "no_pattern",
            Self::Rejected { .. } => "rejected",
            Self::Signal(_) => "signal",
        }
    }
}

/// Session needle detector.
#[derive(Debug)]
pub struct LaunchSignalDetector {
    config: LaunchConfig,
    tracker: SessionTracker,
    sizer: PositionSizer,
    trade_count: u64,
}

impl LaunchSignalDetector {
    pub fn new(config: LaunchConfig, sizer: PositionSizer) -> Self {
        let tracker = SessionTracker::new(
            config.window.clone(),
            config.min_range_pct,
            config.max_range_pct,
        );
        Self {
            config,
            tracker,
            sizer,
            trade_count: 0,
        }
    }

    /// Create a detector after validating the configuration.
    pub fn try_new(config: LaunchConfig, sizer: PositionSizer) -> DetectorResult<Self> {
        config.window.validate()?;
        config.validate().map_err(DetectorError::ConfigError)?;
        Ok(Self::new(config, sizer))
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.tracker.phase()
    }

    pub fn session(&self) -> Option<&LaunchSession> {
        self.tracker.session()
    }

    /// Signals emitted since start.
    pub fn trade_count(&self) -> u64 {
        self.trade_count
    }

    pub fn last_signal_time(&self) -> Option<DateTime<Utc>> {
        self.tracker.last_signal_time()
    }

    /// Time left before another signal may fire, `None` when free.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.tracker.last_signal_time()?;
        let cooldown = i64::try_from(self.config.cooldown_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .unwrap_or(Duration::MAX);
        let elapsed = now - last;
        if elapsed >= cooldown {
            return None;
        }
        Some(cooldown.checked_sub(&elapsed).unwrap_or(Duration::MAX))
    }

    /// Advance the session state machine. Runs every cycle, whether or not
    /// trading is allowed, so the range is never missed.
    pub fn track(&mut self, now: DateTime<Utc>, price: Price) -> SessionTransition {
        self.tracker.update(now, price)
    }

    /// Look for a rejection of the last session's extremes.
    pub fn scan(&mut self, input: &ScanInput<'_>) -> LaunchDecision {
        if !self.config.enabled {
            return LaunchDecision::Disabled;
        }
        if self.tracker.phase() == SessionPhase::InWindow {
            return LaunchDecision::InWindow;
        }
        let (high, low) = match self.tracker.session() {
            Some(s) if s.range_confirmed => (s.high, s.low),
            _ => return LaunchDecision::RangeUnconfirmed,
        };
        if let Some(remaining) = self.cooldown_remaining(input.now) {
            return LaunchDecision::CoolingDown { remaining };
        }

        let price = input.snapshot.price;
        let Some((direction, ratio)) = self.find_rejection(price, high, low, input.recent) else {
            return LaunchDecision::NoPattern;
        };

        let (level, stop_loss, take_profit) = match direction {
            Direction::Short => (
                high,
                high * (Decimal::ONE + self.config.stop_buffer_pct),
                low,
            ),
            Direction::Long => (
                low,
                low * (Decimal::ONE - self.config.stop_buffer_pct),
                high,
            ),
        };

        let score = confidence(
            direction,
            input.snapshot.bias,
            input.snapshot.volatility_ratio,
            input.snapshot.volume_ratio,
            &self.config,
        );
        let size = self.sizer.size(input.balance, price, stop_loss);

        if let Err(reason) = self.validate(score, size.is_positive(), input.snapshot) {
            debug!(%direction, reason = %reason, "Launch pattern rejected");
            return LaunchDecision::Rejected { direction, reason };
        }

        let signal = LaunchSignal {
            direction,
            level,
            entry_price: price,
            stop_loss,
            take_profit,
            confidence: score,
            size,
            wick_body_ratio: ratio,
            signal_id: SignalId::new(input.now.timestamp_millis()),
            emitted_at: input.now,
        };

        self.tracker.mark_signal(input.now);
        self.trade_count += 1;

        info!(
            signal_id = %signal.signal_id,
            %direction,
            level = %level,
            entry = %price,
            stop_loss = %stop_loss,
            take_profit = %take_profit,
            size = %size,
            confidence = score,
            wick_body_ratio = ratio,
            "Launch signal emitted"
        );

        LaunchDecision::Signal(signal)
    }

    /// Short at the high is checked before long at the low.
    fn find_rejection(
        &self,
        price: Price,
        high: Price,
        low: Price,
        recent: &[Price],
    ) -> Option<(Direction, f64)> {
        let proximity = self.config.proximity_pct;

        let near_high = price <= high && price >= high * (Decimal::ONE - proximity);
        if near_high && latest_move_agrees(recent, Direction::Short) {
            let ratio = wick_body_ratio(recent, Direction::Short);
            if ratio >= self.config.needle_body_ratio {
                return Some((Direction::Short, ratio));
            }
        }

        let near_low = price >= low && price <= low * (Decimal::ONE + proximity);
        if near_low && latest_move_agrees(recent, Direction::Long) {
            let ratio = wick_body_ratio(recent, Direction::Long);
            if ratio >= self.config.needle_body_ratio {
                return Some((Direction::Long, ratio));
            }
        }

        None
    }

    fn validate(
        &self,
        score: f64,
        has_size: bool,
        snapshot: &IndicatorSnapshot,
    ) -> Result<(), RejectReason> {
        if score < self.config.min_confidence {
            return Err(RejectReason::LowConfidence { confidence: score });
        }
        if !has_size {
            return Err(RejectReason::ZeroSize);
        }
        if self.config.volatility_filter_enabled {
            let scaled = self.config.scaled_volatility(snapshot.volatility_ratio);
            if scaled < self.config.volatility_threshold {
                return Err(RejectReason::LowVolatility { scaled });
            }
        }
        Ok(())
    }
}
