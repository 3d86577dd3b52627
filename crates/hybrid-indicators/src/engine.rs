//! Indicator engine.
//!
//! Recomputes the full [`IndicatorSnapshot`] from the sample window on every
//! call. There is no incremental state, so a snapshot depends only on the
//! samples it was computed from.

use crate::config::IndicatorConfig;
use crate::error::{IndicatorError, IndicatorResult};
use crate::series;
use chrono::{DateTime, Utc};
use hybrid_core::{Price, Sample, Trend};
use hybrid_feed::SampleBuffer;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Indicator values for one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Latest sample price; the single price snapshot of the cycle.
    pub price: Price,
    /// Average true range in price units.
    pub atr: Decimal,
    pub sma_short: Price,
    pub sma_long: Price,
    pub ema_fast: Price,
    pub ema_slow: Price,
    /// Wilder RSI in [0, 100].
    pub rsi: f64,
    pub trend: Trend,
    pub bias: Trend,
    /// Long-period rate of change.
    pub momentum: f64,
    /// Short-period rate of change.
    pub momentum_short: f64,
    /// `atr / price`.
    pub volatility_ratio: f64,
    /// Last volume over the recent mean volume.
    pub volume_ratio: f64,
    /// Bollinger band width relative to the mean.
    pub bb_width: f64,
    pub sample_count: usize,
    /// Timestamp of the newest sample used.
    pub as_of: DateTime<Utc>,
}

impl IndicatorSnapshot {
    /// Placeholder snapshot for cycles without enough data.
    pub fn neutral(price: Price, as_of: DateTime<Utc>) -> Self {
        Self {
            price,
            atr: Decimal::ZERO,
            sma_short: price,
            sma_long: price,
            ema_fast: price,
            ema_slow: price,
            rsi: 50.0,
            trend: Trend::Neutral,
            bias: Trend::Neutral,
            momentum: 0.0,
            momentum_short: 0.0,
            volatility_ratio: 0.0,
            volume_ratio: 1.0,
            bb_width: 0.0,
            sample_count: 0,
            as_of,
        }
    }
}

/// Computes [`IndicatorSnapshot`]s from sample windows.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Minimum number of samples before a snapshot can be produced.
    pub fn min_samples(&self) -> usize {
        self.config.min_samples.max(self.config.required_samples())
    }

    /// Compute from the most recent `lookback` samples of a buffer.
    pub fn compute(&self, buffer: &SampleBuffer) -> IndicatorResult<IndicatorSnapshot> {
        self.compute_samples(&buffer.last_n(self.config.lookback))
    }

    /// Compute from an explicit, time-ordered sample slice.
    pub fn compute_samples(&self, samples: &[Sample]) -> IndicatorResult<IndicatorSnapshot> {
        let need = self.min_samples();
        let last = match samples.last() {
            Some(s) if samples.len() >= need => *s,
            _ => {
                return Err(IndicatorError::InsufficientData {
                    have: samples.len(),
                    need,
                })
            }
        };

        let cfg = &self.config;
        let prices: Vec<Decimal> = samples.iter().map(|s| s.price.inner()).collect();
        let volumes: Vec<Decimal> = samples.iter().map(|s| s.volume).collect();
        let prices_f64: Vec<f64> = prices.iter().map(|p| p.to_f64().unwrap_or(0.0)).collect();

        let insufficient = || IndicatorError::InsufficientData {
            have: samples.len(),
            need,
        };

        let price = last.price;
        let atr = series::average_true_range(&prices, cfg.atr_period).ok_or_else(insufficient)?;
        let sma_short = series::sma(&prices, cfg.sma_short_period).ok_or_else(insufficient)?;
        let sma_long = series::sma(&prices, cfg.sma_long_period).ok_or_else(insufficient)?;
        let ema_fast = series::ema(&prices, cfg.ema_fast_period).ok_or_else(insufficient)?;
        let ema_slow = series::ema(&prices, cfg.ema_slow_period).ok_or_else(insufficient)?;
        let rsi = series::rsi(&prices_f64, cfg.rsi_period).ok_or_else(insufficient)?;
        let momentum = series::momentum(&prices, cfg.momentum_period).unwrap_or(0.0);
        let momentum_short = series::momentum(&prices, cfg.momentum_short_period).unwrap_or(0.0);
        let volume_ratio = series::last_over_mean(&volumes, cfg.volume_period).unwrap_or(1.0);
        let bb_width = series::bollinger_width(&prices, cfg.volume_period).unwrap_or(0.0);

        let volatility_ratio = if price.is_positive() {
            (atr / price.inner()).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };

        let trend = self.classify_trend(price.inner(), sma_long);
        let bias = self.classify_bias(price.inner(), sma_short, sma_long);

        debug!(
            price = %price,
            atr = %atr,
            rsi,
            trend = %trend,
            bias = %bias,
            volatility_ratio,
            "Indicators computed"
        );

        Ok(IndicatorSnapshot {
            price,
            atr,
            sma_short: Price::new(sma_short),
            sma_long: Price::new(sma_long),
            ema_fast: Price::new(ema_fast),
            ema_slow: Price::new(ema_slow),
            rsi,
            trend,
            bias,
            momentum,
            momentum_short,
            volatility_ratio,
            volume_ratio,
            bb_width,
            sample_count: samples.len(),
            as_of: last.timestamp,
        })
    }

    /// Trend relative to the long SMA with a symmetric dead band.
    fn classify_trend(&self, price: Decimal, sma_long: Decimal) -> Trend {
        let t = self.config.trend_threshold;
        if price > sma_long * (Decimal::ONE + t) {
            Trend::Bullish
        } else if price < sma_long * (Decimal::ONE - t) {
            Trend::Bearish
        } else {
            Trend::Neutral
        }
    }

    /// Bias requires the SMA ordering and the price position to agree.
    fn classify_bias(&self, price: Decimal, sma_short: Decimal, sma_long: Decimal) -> Trend {
        if !self.config.bias_filter_enabled {
            return Trend::Neutral;
        }
        if sma_short > sma_long && price > sma_short {
            Trend::Bullish
        } else if sma_short < sma_long && price < sma_short {
            Trend::Bearish
        } else {
            Trend::Neutral
        }
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(IndicatorConfig::default())
    }
}
