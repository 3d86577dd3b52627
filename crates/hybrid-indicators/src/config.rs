//! Indicator and market profile configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const MAX_SESSION_LENGTH_HOURS: u32 = 24 * 7;
const MAX_UPDATE_INTERVAL_SECS: u64 = 86_400;

/// Indicator engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    /// Samples required before any indicator is produced.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Maximum samples read from the buffer per computation.
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    #[serde(default = "default_sma_short_period")]
    pub sma_short_period: usize,

    /// Also the trend reference period.
    #[serde(default = "default_sma_long_period")]
    pub sma_long_period: usize,

    #[serde(default = "default_ema_fast_period")]
    pub ema_fast_period: usize,

    #[serde(default = "default_ema_slow_period")]
    pub ema_slow_period: usize,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    #[serde(default = "default_momentum_period")]
    pub momentum_period: usize,

    #[serde(default = "default_momentum_short_period")]
    pub momentum_short_period: usize,

    /// Window for the volume ratio and Bollinger width.
    #[serde(default = "default_volume_period")]
    pub volume_period: usize,

    /// Fractional distance from the long SMA that counts as a trend.
    /// 0.015 = 1.5%.
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold: Decimal,

    /// When false, bias is always neutral.
    #[serde(default = "default_true")]
    pub bias_filter_enabled: bool,
}

fn default_true() -> bool {
    true
}

fn default_min_samples() -> usize {
    50
}

fn default_lookback() -> usize {
    500
}

fn default_atr_period() -> usize {
    14
}

fn default_sma_short_period() -> usize {
    20
}

fn default_sma_long_period() -> usize {
    50
}

fn default_ema_fast_period() -> usize {
    12
}

fn default_ema_slow_period() -> usize {
    26
}

fn default_rsi_period() -> usize {
    14
}

fn default_momentum_period() -> usize {
    14
}

fn default_momentum_short_period() -> usize {
    7
}

fn default_volume_period() -> usize {
    20
}

fn default_trend_threshold() -> Decimal {
    Decimal::new(15, 3) // 0.015
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            lookback: default_lookback(),
            atr_period: default_atr_period(),
            sma_short_period: default_sma_short_period(),
            sma_long_period: default_sma_long_period(),
            ema_fast_period: default_ema_fast_period(),
            ema_slow_period: default_ema_slow_period(),
            rsi_period: default_rsi_period(),
            momentum_period: default_momentum_period(),
            momentum_short_period: default_momentum_short_period(),
            volume_period: default_volume_period(),
            trend_threshold: default_trend_threshold(),
            bias_filter_enabled: true,
        }
    }
}

impl IndicatorConfig {
    /// Smallest sample count every indicator can be computed from.
    pub fn required_samples(&self) -> usize {
        [
            self.atr_period + 1,
            self.sma_short_period,
            self.sma_long_period,
            self.ema_fast_period,
            self.ema_slow_period,
            self.rsi_period + 1,
            self.momentum_period + 1,
            self.momentum_short_period + 1,
            self.volume_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }

    pub fn validate(&self) -> Result<(), String> {
        let periods = [
            ("atr_period", self.atr_period),
            ("sma_short_period", self.sma_short_period),
            ("sma_long_period", self.sma_long_period),
            ("ema_fast_period", self.ema_fast_period),
            ("ema_slow_period", self.ema_slow_period),
            ("rsi_period", self.rsi_period),
            ("momentum_period", self.momentum_period),
            ("momentum_short_period", self.momentum_short_period),
            ("volume_period", self.volume_period),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(format!("{name} must be positive"));
            }
        }

        if self.sma_short_period >= self.sma_long_period {
            return Err(format!(
                "sma_short_period ({}) must be less than sma_long_period ({})",
                self.sma_short_period, self.sma_long_period
            ));
        }

        let required = self.required_samples();
        if self.min_samples < required {
            return Err(format!(
                "min_samples ({}) must cover the longest period ({})",
                self.min_samples, required
            ));
        }

        if self.lookback < self.min_samples {
            return Err(format!(
                "lookback ({}) must be at least min_samples ({})",
                self.lookback, self.min_samples
            ));
        }

        if self.trend_threshold.is_sign_negative() || self.trend_threshold >= Decimal::ONE {
            return Err(format!(
                "trend_threshold ({}) must be in [0, 1)",
                self.trend_threshold
            ));
        }

        Ok(())
    }
}

/// Market profile configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Rolling window the histogram is built over.
    #[serde(default = "default_session_length_hours")]
    pub session_length_hours: u32,

    /// Number of equal-width price buckets.
    #[serde(default = "default_price_levels")]
    pub price_levels: usize,

    /// Share of total volume the value area must cover, in percent.
    #[serde(default = "default_tpo_percent")]
    pub tpo_percent: Decimal,

    /// Minimum seconds between rebuilds.
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    /// Samples in window required for a usable profile.
    #[serde(default = "default_profile_min_samples")]
    pub min_samples: usize,
}

fn default_session_length_hours() -> u32 {
    24
}

fn default_price_levels() -> usize {
    20
}

fn default_tpo_percent() -> Decimal {
    Decimal::from(70)
}

fn default_update_interval_secs() -> u64 {
    300
}

fn default_profile_min_samples() -> usize {
    10
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            session_length_hours: default_session_length_hours(),
            price_levels: default_price_levels(),
            tpo_percent: default_tpo_percent(),
            update_interval_secs: default_update_interval_secs(),
            min_samples: default_profile_min_samples(),
        }
    }
}

impl ProfileConfig {
    /// Value-area target as a fraction (70% -> 0.7).
    pub fn target_fraction(&self) -> Decimal {
        self.tpo_percent / Decimal::ONE_HUNDRED
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.session_length_hours == 0 {
            return Err("session_length_hours must be positive".to_string());
        }
        if self.session_length_hours > MAX_SESSION_LENGTH_HOURS {
            return Err(format!(
                "session_length_hours ({}) must not exceed {MAX_SESSION_LENGTH_HOURS}",
                self.session_length_hours
            ));
        }
        if self.update_interval_secs > MAX_UPDATE_INTERVAL_SECS {
            return Err(format!(
                "update_interval_secs ({}) must not exceed {MAX_UPDATE_INTERVAL_SECS}",
                self.update_interval_secs
            ));
        }
        if self.price_levels < 2 {
            return Err(format!(
                "price_levels ({}) must be at least 2",
                self.price_levels
            ));
        }
        if self.tpo_percent <= Decimal::ZERO || self.tpo_percent > Decimal::ONE_HUNDRED {
            return Err(format!(
                "tpo_percent ({}) must be in (0, 100]",
                self.tpo_percent
            ));
        }
        Ok(())
    }
}
