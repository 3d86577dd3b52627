//! Launch detector configuration.

use hybrid_core::SessionWindow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const MAX_COOLDOWN_MINUTES: u64 = 7 * 24 * 60;

/// Configuration for launch (session needle) detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Daily window during which the session range is recorded.
    #[serde(default)]
    pub window: SessionWindow,

    /// Minimum wick/body ratio for a rejection.
    #[serde(default = "default_needle_body_ratio")]
    pub needle_body_ratio: f64,

    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u64,

    /// Session range as a fraction of price must be at least this...
    #[serde(default = "default_min_range_pct")]
    pub min_range_pct: Decimal,

    /// ...and at most this.
    #[serde(default = "default_max_range_pct")]
    pub max_range_pct: Decimal,

    /// How close price must be to the session extreme. 0.005 = 0.5%.
    #[serde(default = "default_proximity_pct")]
    pub proximity_pct: Decimal,

    /// Stop distance beyond the extreme. 0.01 = 1%.
    #[serde(default = "default_stop_buffer_pct")]
    pub stop_buffer_pct: Decimal,

    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    #[serde(default = "default_true")]
    pub volatility_filter_enabled: bool,

    /// Multiplier applied to `atr / price` before comparing it with the
    /// volatility threshold and the optimal band.
    #[serde(default = "default_volatility_scale")]
    pub volatility_scale: f64,

    #[serde(default = "default_volatility_threshold")]
    pub volatility_threshold: f64,

    #[serde(default = "default_optimal_volatility_min")]
    pub optimal_volatility_min: f64,

    #[serde(default = "default_optimal_volatility_max")]
    pub optimal_volatility_max: f64,

    /// Volume ratio above which the confidence gets the volume bonus.
    #[serde(default = "default_volume_surge_ratio")]
    pub volume_surge_ratio: f64,
}

fn default_true() -> bool {
    true
}

fn default_needle_body_ratio() -> f64 {
    2.0
}

fn default_cooldown_minutes() -> u64 {
    30
}

fn default_min_range_pct() -> Decimal {
    Decimal::new(5, 3) // 0.005
}

fn default_max_range_pct() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

fn default_proximity_pct() -> Decimal {
    Decimal::new(5, 3) // 0.005
}

fn default_stop_buffer_pct() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_min_confidence() -> f64 {
    0.6
}

fn default_volatility_scale() -> f64 {
    100.0
}

fn default_volatility_threshold() -> f64 {
    1.5
}

fn default_optimal_volatility_min() -> f64 {
    1.0
}

fn default_optimal_volatility_max() -> f64 {
    3.0
}

fn default_volume_surge_ratio() -> f64 {
    1.2
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: SessionWindow::default(),
            needle_body_ratio: default_needle_body_ratio(),
            cooldown_minutes: default_cooldown_minutes(),
            min_range_pct: default_min_range_pct(),
            max_range_pct: default_max_range_pct(),
            proximity_pct: default_proximity_pct(),
            stop_buffer_pct: default_stop_buffer_pct(),
            min_confidence: default_min_confidence(),
            volatility_filter_enabled: true,
            volatility_scale: default_volatility_scale(),
            volatility_threshold: default_volatility_threshold(),
            optimal_volatility_min: default_optimal_volatility_min(),
            optimal_volatility_max: default_optimal_volatility_max(),
            volume_surge_ratio: default_volume_surge_ratio(),
        }
    }
}

impl LaunchConfig {
    /// Validate configuration values.
    ///
    /// Returns Err if:
    /// - the window bounds do not parse or are equal
    /// - min_range_pct > max_range_pct, or either is negative
    /// - needle_body_ratio or volatility_scale is not positive
    /// - min_confidence is outside [0, 1]
    /// - the optimal volatility band is inverted
    pub fn validate(&self) -> Result<(), String> {
        self.window.validate().map_err(|e| e.to_string())?;

        if self.min_range_pct.is_sign_negative() {
            return Err(format!(
                "min_range_pct ({}) must be non-negative",
                self.min_range_pct
            ));
        }
        if self.min_range_pct > self.max_range_pct {
            return Err(format!(
                "min_range_pct ({}) must not exceed max_range_pct ({})",
                self.min_range_pct, self.max_range_pct
            ));
        }
        if self.proximity_pct.is_sign_negative() || self.stop_buffer_pct.is_sign_negative() {
            return Err("proximity_pct and stop_buffer_pct must be non-negative".to_string());
        }
        if self.needle_body_ratio <= 0.0 {
            return Err(format!(
                "needle_body_ratio ({}) must be positive",
                self.needle_body_ratio
            ));
        }
        if self.volatility_scale <= 0.0 {
            return Err(format!(
                "volatility_scale ({}) must be positive",
                self.volatility_scale
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(format!(
                "min_confidence ({}) must be in [0, 1]",
                self.min_confidence
            ));
        }
        if self.cooldown_minutes > MAX_COOLDOWN_MINUTES {
            return Err(format!(
                "cooldown_minutes ({}) must not exceed {MAX_COOLDOWN_MINUTES}",
                self.cooldown_minutes
            ));
        }
        if self.optimal_volatility_min > self.optimal_volatility_max {
            return Err(format!(
                "optimal_volatility_min ({}) exceeds optimal_volatility_max ({})",
                self.optimal_volatility_min, self.optimal_volatility_max
            ));
        }
        Ok(())
    }

    /// `volatility_ratio` on the scale used by the threshold and band.
    pub fn scaled_volatility(&self, volatility_ratio: f64) -> f64 {
        volatility_ratio * self.volatility_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = LaunchConfig::default();
        assert!(config.enabled);
        assert_eq!(config.window.start, "01:00");
        assert_eq!(config.window.end, "08:00");
        assert_eq!(config.window.utc_offset_minutes, 180);
        assert_eq!(config.cooldown_minutes, 30);
        assert_eq!(config.min_range_pct, dec!(0.005));
        assert_eq!(config.max_range_pct, dec!(0.05));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_range_inverted() {
        let config = LaunchConfig {
            min_range_pct: dec!(0.06),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("must not exceed max_range_pct"));
    }

    #[test]
    fn test_validate_bad_window() {
        let config = LaunchConfig {
            window: SessionWindow::new("25:00", "08:00", 180),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_confidence_bounds() {
        let config = LaunchConfig {
            min_confidence: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_window_section() {
        let config: LaunchConfig = toml::from_str(
            r#"
            cooldown_minutes = 45

            [window]
            start = "22:00"
            end = "02:00"
            utc_offset_minutes = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.cooldown_minutes, 45);
        assert_eq!(config.window.start, "22:00");
        assert_eq!(config.window.utc_offset_minutes, 0);
        assert_eq!(config.needle_body_ratio, 2.0);
    }

    #[test]
    fn test_scaled_volatility() {
        let config = LaunchConfig::default();
        assert!((config.scaled_volatility(0.02) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cooldown_bounded() {
        let config = LaunchConfig {
            cooldown_minutes: u64::MAX / 2,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("cooldown_minutes"));

        let config = LaunchConfig {
            cooldown_minutes: 10_080,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
