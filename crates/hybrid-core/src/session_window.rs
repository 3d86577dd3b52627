//! Daily time-of-day windows.
//!
//! A window is expressed as `HH:MM` wall-clock bounds in a fixed UTC
//! offset, e.g. 01:00–08:00 at UTC+03:00. Windows whose end is earlier than
//! their start wrap midnight (22:00–02:00). The start bound is inclusive and
//! the end bound exclusive.

use crate::error::{CoreError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

fn default_utc_offset_minutes() -> i32 {
    180
}

/// A daily window in a fixed UTC offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    /// Start time in HH:MM format (local to `utc_offset_minutes`).
    pub start: String,
    /// End time in HH:MM format (local to `utc_offset_minutes`).
    pub end: String,
    /// Offset of the local clock from UTC, in minutes.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self {
            start: "01:00".to_string(),
            end: "08:00".to_string(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

impl SessionWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>, utc_offset_minutes: i32) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            utc_offset_minutes,
        }
    }

    /// Parse start time as NaiveTime.
    pub fn start_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.start, "%H:%M").ok()
    }

    /// Parse end time as NaiveTime.
    pub fn end_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.end, "%H:%M").ok()
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }

    pub fn validate(&self) -> Result<()> {
        let start = self
            .start_time()
            .ok_or_else(|| CoreError::InvalidWindow(format!("bad start '{}'", self.start)))?;
        let end = self
            .end_time()
            .ok_or_else(|| CoreError::InvalidWindow(format!("bad end '{}'", self.end)))?;
        if start == end {
            return Err(CoreError::InvalidWindow(format!(
                "start and end are both {}",
                self.start
            )));
        }
        if self.offset().is_none() {
            return Err(CoreError::InvalidWindow(format!(
                "utc offset out of range: {} minutes",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }

    /// Wall-clock time in the window's offset. Falls back to UTC when the
    /// offset is out of range.
    pub fn local_datetime(&self, dt: DateTime<Utc>) -> NaiveDateTime {
        match self.offset() {
            Some(offset) => dt.with_timezone(&offset).naive_local(),
            None => dt.naive_utc(),
        }
    }

    /// Check if a local wall-clock time is within this window.
    pub fn contains_time(&self, time: NaiveTime) -> bool {
        let (start, end) = match (self.start_time(), self.end_time()) {
            (Some(s), Some(e)) => (s, e),
            _ => return false,
        };

        if start <= end {
            time >= start && time < end
        } else {
            // Wraps midnight, e.g. 22:00-02:00
            time >= start || time < end
        }
    }

    /// Check if a UTC instant falls inside the window.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.contains_time(self.local_datetime(dt).time())
    }

    /// Local calendar date on which the window containing `dt` opened.
    ///
    /// `None` when `dt` is outside the window. For windows that wrap
    /// midnight, the early-morning part belongs to the previous date.
    pub fn occurrence_at(&self, dt: DateTime<Utc>) -> Option<NaiveDate> {
        if !self.contains(dt) {
            return None;
        }
        let local = self.local_datetime(dt);
        let start = self.start_time()?;
        if local.time() >= start {
            Some(local.date())
        } else {
            local.date().pred_opt()
        }
    }
}
