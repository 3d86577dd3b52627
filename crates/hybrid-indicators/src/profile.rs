//! Market profile: volume-at-price histogram over a rolling window.
//!
//! The window's price range is split into `price_levels` equally spaced
//! bucket centres; each sample's volume goes to its nearest centre.
//!
//! - **POC** (point of control): centre with the most volume. Ties go to the
//!   lowest price.
//! - **Value area**: buckets taken in descending volume order until they
//!   hold at least `tpo_percent` of the total. VAH/VAL are its highest and
//!   lowest centres.
//!
//! A sample without volume (zero) counts as one unit, so a volume-less feed
//! degrades to a time-at-price histogram.

use crate::config::ProfileConfig;
use chrono::{DateTime, Duration, Utc};
use hybrid_core::{Price, Sample};
use hybrid_feed::SampleBuffer;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Price-distribution summary of the rolling window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketProfile {
    pub poc: Price,
    pub vah: Price,
    pub val: Price,
    /// `vah - val`.
    pub value_area_range: Decimal,
    /// Share of total volume inside the value area.
    pub coverage_fraction: Decimal,
    pub total_volume: Decimal,
    pub bucket_count: usize,
    pub sample_count: usize,
    pub built_at: DateTime<Utc>,
    /// Enough samples in window and the coverage target met.
    pub is_valid: bool,
}

/// Builds and caches [`MarketProfile`]s at a fixed refresh interval.
#[derive(Debug, Clone)]
pub struct MarketProfileBuilder {
    config: ProfileConfig,
    current: Option<MarketProfile>,
    last_refresh: Option<DateTime<Utc>>,
}

impl MarketProfileBuilder {
    pub fn new(config: ProfileConfig) -> Self {
        Self {
            config,
            current: None,
            last_refresh: None,
        }
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Last built profile, valid or not.
    pub fn current(&self) -> Option<&MarketProfile> {
        self.current.as_ref()
    }

    /// Last built profile, only when usable.
    pub fn valid_profile(&self) -> Option<&MarketProfile> {
        self.current.as_ref().filter(|p| p.is_valid)
    }

    /// Whether the refresh interval has elapsed since the last build.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_refresh {
            None => true,
            Some(at) => {
                let interval = i64::try_from(self.config.update_interval_secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .unwrap_or(Duration::MAX);
                now - at >= interval
            }
        }
    }

    /// Rebuild if due, then return the cached profile.
    pub fn maybe_refresh(&mut self, buffer: &SampleBuffer, now: DateTime<Utc>) -> Option<&MarketProfile> {
        if self.is_due(now) {
            self.refresh(buffer, now);
        }
        self.current.as_ref()
    }

    /// Rebuild unconditionally from the samples inside the session window.
    pub fn refresh(&mut self, buffer: &SampleBuffer, now: DateTime<Utc>) -> Option<&MarketProfile> {
        let cutoff = Duration::try_hours(i64::from(self.config.session_length_hours))
            .and_then(|length| now.checked_sub_signed(length))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let window = buffer.window_since(cutoff);

        self.last_refresh = Some(now);
        self.current = self.build(&window, now);

        if let Some(p) = &self.current {
            debug!(
                poc = %p.poc,
                vah = %p.vah,
                val = %p.val,
                coverage = %p.coverage_fraction,
                samples = p.sample_count,
                valid = p.is_valid,
                "Market profile rebuilt"
            );
        }
        self.current.as_ref()
    }

    /// Histogram computation. `None` for an empty window.
    pub fn build(&self, samples: &[Sample], now: DateTime<Utc>) -> Option<MarketProfile> {
        let first = samples.first()?;
        let (min, max) = samples.iter().fold((first.price, first.price), |(lo, hi), s| {
            (lo.min(s.price), hi.max(s.price))
        });

        let enough_samples = samples.len() >= self.config.min_samples;
        let weight = |s: &Sample| {
            if s.volume.is_zero() {
                Decimal::ONE
            } else {
                s.volume
            }
        };

        if min == max {
            return Some(MarketProfile {
                poc: min,
                vah: min,
                val: min,
                value_area_range: Decimal::ZERO,
                coverage_fraction: Decimal::ONE,
                total_volume: samples.iter().map(weight).sum(),
                bucket_count: 1,
                sample_count: samples.len(),
                built_at: now,
                is_valid: enough_samples,
            });
        }

        let levels = self.config.price_levels.max(2);
        let range = max.inner() - min.inner();
        let intervals = Decimal::from(levels - 1);
        let mut volumes = vec![Decimal::ZERO; levels];
        for s in samples {
            let offset = (s.price.inner() - min.inner()) * intervals / range;
            let idx = offset
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_usize()
                .unwrap_or(0)
                .min(levels - 1);
            volumes[idx] += weight(s);
        }
        let centre = |idx: usize| Price::new(min.inner() + range * Decimal::from(idx) / intervals);

        let total: Decimal = volumes.iter().sum();

        // Descending volume, ascending price on ties. The first entry is the POC.
        let mut order: Vec<usize> = (0..levels).collect();
        order.sort_by(|a, b| volumes[*b].cmp(&volumes[*a]).then(a.cmp(b)));
        let poc_idx = order[0];

        let target = total * self.config.target_fraction();
        let mut covered = Decimal::ZERO;
        let (mut lo_idx, mut hi_idx) = (poc_idx, poc_idx);
        for idx in order {
            if covered >= target && idx != poc_idx {
                break;
            }
            covered += volumes[idx];
            lo_idx = lo_idx.min(idx);
            hi_idx = hi_idx.max(idx);
        }

        let coverage_fraction = if total.is_zero() {
            Decimal::ONE
        } else {
            covered / total
        };
        let (val, vah) = (centre(lo_idx), centre(hi_idx));

        Some(MarketProfile {
            poc: centre(poc_idx),
            vah,
            val,
            value_area_range: vah.inner() - val.inner(),
            coverage_fraction,
            total_volume: total,
            bucket_count: levels,
            sample_count: samples.len(),
            built_at: now,
            is_valid: enough_samples && coverage_fraction >= self.config.target_fraction(),
        })
    }
}

impl Default for MarketProfileBuilder {
    fn default() -> Self {
        Self::new(ProfileConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()
    }

    fn s(minute: i64, price: Decimal, volume: Decimal) -> Sample {
        Sample::new(t0() + Duration::minutes(minute), Price::new(price), volume)
    }

    fn builder(levels: usize, min_samples: usize) -> MarketProfileBuilder {
        MarketProfileBuilder::new(ProfileConfig {
            price_levels: levels,
            min_samples,
            ..Default::default()
        })
    }

    #[test]
    fn test_known_distribution() {
        let b = builder(5, 1);
        let samples = vec![
            s(0, dec!(100), dec!(10)),
            s(1, dec!(101), dec!(20)),
            s(2, dec!(102), dec!(50)),
            s(3, dec!(103), dec!(15)),
            s(4, dec!(104), dec!(5)),
        ];

        let p = b.build(&samples, t0()).unwrap();
        assert_eq!(p.poc, Price::new(dec!(102)));
        // 50 + 20 = 70 reaches 70%
        assert_eq!(p.val, Price::new(dec!(101)));
        assert_eq!(p.vah, Price::new(dec!(102)));
        assert_eq!(p.value_area_range, dec!(1));
        assert_eq!(p.coverage_fraction, dec!(0.7));
        assert_eq!(p.total_volume, dec!(100));
        assert!(p.is_valid);
    }

    #[test]
    fn test_nearest_bucket_assignment() {
        let b = builder(3, 1);
        // Centres at 100, 101, 102. 101.4 goes to 101, 101.6 to 102.
        let samples = vec![
            s(0, dec!(100), dec!(1)),
            s(1, dec!(101.4), dec!(10)),
            s(2, dec!(101.6), dec!(3)),
            s(3, dec!(102), dec!(1)),
        ];

        let p = b.build(&samples, t0()).unwrap();
        assert_eq!(p.poc, Price::new(dec!(101)));
    }

    #[test]
    fn test_poc_tie_goes_to_lowest_price() {
        let b = builder(3, 1);
        let samples = vec![
            s(0, dec!(100), dec!(5)),
            s(1, dec!(101), dec!(5)),
            s(2, dec!(102), dec!(5)),
        ];

        let p = b.build(&samples, t0()).unwrap();
        assert_eq!(p.poc, Price::new(dec!(100)));
        assert!(p.val <= p.poc && p.poc <= p.vah);
    }

    #[test]
    fn test_single_price_degenerate() {
        let b = builder(20, 3);
        let samples: Vec<Sample> = (0..5).map(|i| s(i, dec!(2.5), dec!(100))).collect();

        let p = b.build(&samples, t0()).unwrap();
        assert_eq!(p.poc, Price::new(dec!(2.5)));
        assert_eq!(p.vah, p.poc);
        assert_eq!(p.val, p.poc);
        assert_eq!(p.value_area_range, Decimal::ZERO);
        assert_eq!(p.bucket_count, 1);
        assert!(p.is_valid);
    }

    #[test]
    fn test_missing_volume_counts_as_one() {
        let b = builder(3, 1);
        let samples = vec![
            s(0, dec!(100), Decimal::ZERO),
            s(1, dec!(102), Decimal::ZERO),
            s(2, dec!(102), Decimal::ZERO),
            s(3, dec!(102), Decimal::ZERO),
        ];

        let p = b.build(&samples, t0()).unwrap();
        assert_eq!(p.poc, Price::new(dec!(102)));
        assert_eq!(p.total_volume, dec!(4));
    }

    #[test]
    fn test_empty_window() {
        let b = builder(20, 10);
        assert!(b.build(&[], t0()).is_none());
    }

    #[test]
    fn test_too_few_samples_is_invalid() {
        let b = builder(5, 10);
        let samples: Vec<Sample> = (0..5).map(|i| s(i, Decimal::from(100 + i), dec!(1))).collect();

        let p = b.build(&samples, t0()).unwrap();
        assert!(!p.is_valid);
    }

    #[test]
    fn test_refresh_interval() {
        let mut b = MarketProfileBuilder::default();
        let mut buffer = SampleBuffer::new(500);
        for i in 0..30 {
            buffer
                .push(s(i, Decimal::from(100 + (i % 5)), dec!(10)))
                .unwrap();
        }

        let now = t0() + Duration::minutes(30);
        let first_built = b.maybe_refresh(&buffer, now).unwrap().built_at;
        assert_eq!(first_built, now);

        // Within 300s: cached profile returned
        let later = now + Duration::seconds(120);
        assert_eq!(b.maybe_refresh(&buffer, later).unwrap().built_at, first_built);
        assert!(!b.is_due(later));

        // After 300s: rebuilt
        let much_later = now + Duration::seconds(300);
        assert!(b.is_due(much_later));
        assert_eq!(b.maybe_refresh(&buffer, much_later).unwrap().built_at, much_later);
    }

    #[test]
    fn test_session_window_excludes_old_samples() {
        let mut b = MarketProfileBuilder::new(ProfileConfig {
            session_length_hours: 1,
            min_samples: 1,
            ..Default::default()
        });
        let mut buffer = SampleBuffer::new(500);
        buffer.push(s(0, dec!(50), dec!(1000))).unwrap();
        buffer.push(s(120, dec!(100), dec!(1))).unwrap();
        buffer.push(s(121, dec!(101), dec!(2))).unwrap();

        let p = b.refresh(&buffer, t0() + Duration::minutes(125)).unwrap();
        assert_eq!(p.sample_count, 2);
        assert_eq!(p.poc, Price::new(dec!(101)));
    }

    #[test]
    fn test_oversized_durations_do_not_overflow() {
        let mut b = MarketProfileBuilder::new(ProfileConfig {
            update_interval_secs: u64::MAX,
            session_length_hours: u32::MAX,
            min_samples: 1,
            ..Default::default()
        });
        let mut buffer = SampleBuffer::new(500);
        buffer.push(s(0, dec!(100), dec!(10))).unwrap();
        buffer.push(s(1, dec!(101), dec!(10))).unwrap();

        let now = t0() + Duration::minutes(2);
        let p = b.refresh(&buffer, now).unwrap();
        assert_eq!(p.sample_count, 2);
        assert!(!b.is_due(now + Duration::days(3650)));
    }
}
