//! Launch session state machine.
//!
//! ```text
//! OutsideWindow ──(now enters window)──▶ InWindow ──(now leaves window)──▶ OutsideWindow
//!                   new session:            extrema track price
//!                   high = low = price      range_confirmed recomputed
//! ```
//!
//! One session per window occurrence, keyed by the local date on which the
//! window opened. The cooldown anchor survives session resets.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use hybrid_core::{Price, SessionWindow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Where the clock sits relative to the session window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    OutsideWindow,
    InWindow,
}

/// Phase change produced by a session update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTransition {
    None,
    Opened { session_date: NaiveDate },
    Closed { range_confirmed: bool },
}

/// Range recorded for one window occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSession {
    pub session_date: NaiveDate,
    pub window_start_time: NaiveTime,
    pub window_end_time: NaiveTime,
    pub high: Price,
    pub low: Price,
    pub range_confirmed: bool,
    pub sample_count: u32,
    pub last_signal_time: Option<DateTime<Utc>>,
}

impl LaunchSession {
    fn open(
        session_date: NaiveDate,
        window: &SessionWindow,
        price: Price,
        last_signal_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            session_date,
            window_start_time: window.start_time().unwrap_or_default(),
            window_end_time: window.end_time().unwrap_or_default(),
            high: price,
            low: price,
            range_confirmed: false,
            sample_count: 1,
            last_signal_time,
        }
    }

    /// `high - low`.
    pub fn range(&self) -> Decimal {
        self.high.inner() - self.low.inner()
    }

    /// `(high - low) / price`, `None` for a non-positive price.
    pub fn range_fraction(&self, price: Price) -> Option<Decimal> {
        if !price.is_positive() {
            return None;
        }
        Some(self.range() / price.inner())
    }

    fn observe(&mut self, price: Price, min_range_pct: Decimal, max_range_pct: Decimal) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.sample_count += 1;
        self.range_confirmed = self
            .range_fraction(price)
            .is_some_and(|r| r >= min_range_pct && r <= max_range_pct);
    }
}

/// Tracks the session window and the current [`LaunchSession`].
#[derive(Debug, Clone)]
pub struct SessionTracker {
    window: SessionWindow,
    min_range_pct: Decimal,
    max_range_pct: Decimal,
    phase: SessionPhase,
    session: Option<LaunchSession>,
    /// Cooldown anchor, carried into every new session.
    last_signal_time: Option<DateTime<Utc>>,
}

impl SessionTracker {
    pub fn new(window: SessionWindow, min_range_pct: Decimal, max_range_pct: Decimal) -> Self {
        Self {
            window,
            min_range_pct,
            max_range_pct,
            phase: SessionPhase::OutsideWindow,
            session: None,
            last_signal_time: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&LaunchSession> {
        self.session.as_ref()
    }

    pub fn last_signal_time(&self) -> Option<DateTime<Utc>> {
        self.last_signal_time
    }

    pub fn mark_signal(&mut self, now: DateTime<Utc>) {
        self.last_signal_time = Some(now);
        if let Some(session) = &mut self.session {
            session.last_signal_time = Some(now);
        }
    }

    /// Advance the state machine with the cycle's price.
    pub fn update(&mut self, now: DateTime<Utc>, price: Price) -> SessionTransition {
        match self.window.occurrence_at(now) {
            Some(date) => {
                let is_new = self.session.as_ref().map_or(true, |s| s.session_date != date);
                self.phase = SessionPhase::InWindow;
                if is_new {
                    let carried = self.last_signal_time();
                    self.session = Some(LaunchSession::open(date, &self.window, price, carried));
                    info!(session_date = %date, price = %price, "Launch session opened");
                    return SessionTransition::Opened { session_date: date };
                }
                if let Some(session) = &mut self.session {
                    session.observe(price, self.min_range_pct, self.max_range_pct);
                }
                SessionTransition::None
            }
            None if self.phase == SessionPhase::InWindow => {
                self.phase = SessionPhase::OutsideWindow;
                let range_confirmed = self.session.as_ref().is_some_and(|s| s.range_confirmed);
                if let Some(session) = &self.session {
                    info!(
                        session_date = %session.session_date,
                        high = %session.high,
                        low = %session.low,
                        samples = session.sample_count,
                        range_confirmed,
                        "Launch session closed"
                    );
                }
                SessionTransition::Closed { range_confirmed }
            }
            None => SessionTransition::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn tracker() -> SessionTracker {
        // 01:00-08:00 at UTC+3 is 22:00-05:00 UTC
        SessionTracker::new(SessionWindow::default(), dec!(0.005), dec!(0.05))
    }

    fn p(v: Decimal) -> Price {
        Price::new(v)
    }

    #[test]
    fn test_opens_and_tracks_extrema() {
        let mut t = tracker();
        assert_eq!(t.update(utc(2026, 3, 1, 21, 0), p(dec!(2.5))), SessionTransition::None);
        assert_eq!(t.phase(), SessionPhase::OutsideWindow);

        let opened = t.update(utc(2026, 3, 1, 22, 0), p(dec!(2.50)));
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(opened, SessionTransition::Opened { session_date: date });
        assert_eq!(t.phase(), SessionPhase::InWindow);

        t.update(utc(2026, 3, 1, 23, 0), p(dec!(2.55)));
        t.update(utc(2026, 3, 2, 1, 0), p(dec!(2.48)));
        t.update(utc(2026, 3, 2, 2, 0), p(dec!(2.52)));

        let s = t.session().unwrap();
        assert_eq!(s.high, p(dec!(2.55)));
        assert_eq!(s.low, p(dec!(2.48)));
        assert_eq!(s.sample_count, 4);
        // 0.07 / 2.52 ≈ 2.8%
        assert!(s.range_confirmed);
    }

    #[test]
    fn test_closes_on_exit() {
        let mut t = tracker();
        t.update(utc(2026, 3, 1, 22, 0), p(dec!(2.50)));
        t.update(utc(2026, 3, 2, 1, 0), p(dec!(2.55)));

        let closed = t.update(utc(2026, 3, 2, 5, 0), p(dec!(2.53)));
        assert_eq!(closed, SessionTransition::Closed { range_confirmed: true });
        assert_eq!(t.phase(), SessionPhase::OutsideWindow);

        // Outside the window extrema are frozen
        t.update(utc(2026, 3, 2, 6, 0), p(dec!(3.00)));
        assert_eq!(t.session().unwrap().high, p(dec!(2.55)));
    }

    #[test]
    fn test_wide_range_not_confirmed() {
        let mut t = tracker();
        t.update(utc(2026, 3, 1, 22, 0), p(dec!(2.50)));
        t.update(utc(2026, 3, 1, 23, 0), p(dec!(2.60)));
        t.update(utc(2026, 3, 2, 0, 0), p(dec!(2.40)));
        t.update(utc(2026, 3, 2, 1, 0), p(dec!(2.50)));

        // 0.20 / 2.50 = 8% > 5%
        assert!(!t.session().unwrap().range_confirmed);
        assert_eq!(
            t.update(utc(2026, 3, 2, 5, 0), p(dec!(2.50))),
            SessionTransition::Closed { range_confirmed: false }
        );
    }

    #[test]
    fn test_new_day_resets_extrema_keeps_cooldown_anchor() {
        let mut t = tracker();
        t.update(utc(2026, 3, 1, 22, 0), p(dec!(2.50)));
        t.update(utc(2026, 3, 1, 23, 0), p(dec!(2.60)));
        t.update(utc(2026, 3, 2, 5, 0), p(dec!(2.55)));
        t.mark_signal(utc(2026, 3, 2, 21, 50));

        let opened = t.update(utc(2026, 3, 2, 22, 0), p(dec!(2.40)));
        assert!(matches!(opened, SessionTransition::Opened { .. }));

        let s = t.session().unwrap();
        assert_eq!(s.high, p(dec!(2.40)));
        assert_eq!(s.low, p(dec!(2.40)));
        assert_eq!(s.last_signal_time, Some(utc(2026, 3, 2, 21, 50)));
    }
}
