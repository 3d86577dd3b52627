//! Grid configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const MAX_LEVEL_AGE_SECS: u64 = 7 * 86_400;

/// How the raw level spacing is derived.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpacingMode {
    /// `atr * atr_multiplier`
    #[default]
    Atr,
    /// `base_price * base_spacing_pct`
    Fixed,
}

/// Grid planner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Enable grid planning.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub mode: SpacingMode,

    /// Levels per side.
    #[serde(default = "default_level_count")]
    pub level_count: u32,

    /// Spacing as a fraction of base price in fixed mode. 0.012 = 1.2%.
    #[serde(default = "default_base_spacing_pct")]
    pub base_spacing_pct: Decimal,

    #[serde(default = "default_atr_multiplier")]
    pub atr_multiplier: Decimal,

    /// Lower spacing bound as a fraction of base price.
    #[serde(default = "default_min_spread_pct")]
    pub min_spread_pct: Decimal,

    /// Upper bound on the total ladder width per side as a fraction of base
    /// price. Spacing is capped at `base * max_spread_pct / level_count`.
    #[serde(default = "default_max_spread_pct")]
    pub max_spread_pct: Decimal,

    /// Fractional deviation of price from base that forces a rebuild.
    #[serde(default = "default_rebalance_threshold")]
    pub rebalance_threshold: Decimal,

    /// Weight of the point of control in the base price when a valid market
    /// profile exists. 0 disables blending.
    #[serde(default = "default_poc_blend_weight")]
    pub poc_blend_weight: Decimal,

    /// Levels older than this are reported stale.
    #[serde(default = "default_level_max_age_secs")]
    pub level_max_age_secs: u64,

    /// Quote notional per level in quote currency.
    #[serde(default = "default_level_notional")]
    pub level_notional: Decimal,

    #[serde(default = "default_lot_size")]
    pub lot_size: Decimal,
}

fn default_true() -> bool {
    true
}

fn default_level_count() -> u32 {
    8
}

fn default_base_spacing_pct() -> Decimal {
    Decimal::new(12, 3) // 0.012
}

fn default_atr_multiplier() -> Decimal {
    Decimal::new(15, 1) // 1.5
}

fn default_min_spread_pct() -> Decimal {
    Decimal::new(2, 3) // 0.002
}

fn default_max_spread_pct() -> Decimal {
    Decimal::new(16, 2) // 0.16
}

fn default_rebalance_threshold() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

fn default_poc_blend_weight() -> Decimal {
    Decimal::new(4, 1) // 0.4
}

fn default_level_max_age_secs() -> u64 {
    3600
}

fn default_level_notional() -> Decimal {
    Decimal::new(25, 0)
}

fn default_lot_size() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: SpacingMode::default(),
            level_count: default_level_count(),
            base_spacing_pct: default_base_spacing_pct(),
            atr_multiplier: default_atr_multiplier(),
            min_spread_pct: default_min_spread_pct(),
            max_spread_pct: default_max_spread_pct(),
            rebalance_threshold: default_rebalance_threshold(),
            poc_blend_weight: default_poc_blend_weight(),
            level_max_age_secs: default_level_max_age_secs(),
            level_notional: default_level_notional(),
            lot_size: default_lot_size(),
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.level_count == 0 {
            return Err("level_count must be positive".to_string());
        }

        if self.min_spread_pct <= Decimal::ZERO {
            return Err(format!(
                "min_spread_pct ({}) must be positive",
                self.min_spread_pct
            ));
        }

        if self.max_spread_pct >= Decimal::ONE {
            return Err(format!(
                "max_spread_pct ({}) must be less than 1",
                self.max_spread_pct
            ));
        }

        // min_spacing must not exceed max_spacing for any base price
        if self.min_spread_pct * Decimal::from(self.level_count) > self.max_spread_pct {
            return Err(format!(
                "min_spread_pct * level_count ({}) exceeds max_spread_pct ({})",
                self.min_spread_pct * Decimal::from(self.level_count),
                self.max_spread_pct
            ));
        }

        if self.base_spacing_pct <= Decimal::ZERO {
            return Err(format!(
                "base_spacing_pct ({}) must be positive",
                self.base_spacing_pct
            ));
        }

        if self.atr_multiplier <= Decimal::ZERO {
            return Err(format!(
                "atr_multiplier ({}) must be positive",
                self.atr_multiplier
            ));
        }

        if self.rebalance_threshold <= Decimal::ZERO {
            return Err(format!(
                "rebalance_threshold ({}) must be positive",
                self.rebalance_threshold
            ));
        }

        if self.poc_blend_weight < Decimal::ZERO || self.poc_blend_weight > Decimal::ONE {
            return Err(format!(
                "poc_blend_weight ({}) must be in [0, 1]",
                self.poc_blend_weight
            ));
        }

        if self.level_max_age_secs > MAX_LEVEL_AGE_SECS {
            return Err(format!(
                "level_max_age_secs ({}) must not exceed {MAX_LEVEL_AGE_SECS}",
                self.level_max_age_secs
            ));
        }

        if self.level_notional.is_sign_negative() || self.lot_size.is_sign_negative() {
            return Err("level_notional and lot_size must be non-negative".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = GridConfig::default();
        assert!(config.enabled);
        assert_eq!(config.mode, SpacingMode::Atr);
        assert_eq!(config.level_count, 8);
        assert_eq!(config.base_spacing_pct, dec!(0.012));
        assert_eq!(config.atr_multiplier, dec!(1.5));
        assert_eq!(config.rebalance_threshold, dec!(0.05));
        assert_eq!(config.poc_blend_weight, dec!(0.4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_min_spacing_above_max_rejected() {
        let config = GridConfig {
            min_spread_pct: dec!(0.03),
            max_spread_pct: dec!(0.16),
            level_count: 8,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("exceeds max_spread_pct"));
    }

    #[test]
    fn test_bounds_rejected() {
        let bad = [
            GridConfig {
                level_count: 0,
                ..Default::default()
            },
            GridConfig {
                min_spread_pct: dec!(0),
                ..Default::default()
            },
            GridConfig {
                max_spread_pct: dec!(1),
                ..Default::default()
            },
            GridConfig {
                poc_blend_weight: dec!(1.5),
                ..Default::default()
            },
            GridConfig {
                rebalance_threshold: dec!(0),
                ..Default::default()
            },
            GridConfig {
                level_max_age_secs: u64::MAX,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?} should be invalid");
        }
    }

    #[test]
    fn test_deserialize_mode() {
        let config: GridConfig = toml::from_str(
            r#"
            mode = "fixed"
            level_count = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, SpacingMode::Fixed);
        assert_eq!(config.level_count, 4);
        assert_eq!(config.min_spread_pct, dec!(0.002));
    }
}
