//! Grid ladder calculation.
//!
//! Computes a symmetric ladder of buy and sell levels around a base price:
//! - Base price: current price, optionally blended toward the profile POC
//! - Spacing: ATR-scaled or a fixed fraction of base, clamped to bounds
//! - Levels: `base ± spacing * i` for `i = 1..=level_count`

use chrono::{DateTime, Duration, Utc};
use hybrid_core::{OrderSide, Price, Size};
use hybrid_indicators::MarketProfile;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{GridConfig, SpacingMode};

/// A single resting level of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLevel {
    pub side: OrderSide,
    /// Distance from base in spacings (1 = closest).
    pub index: u32,
    pub price: Price,
    pub size: Size,
    /// When this level was (re)issued.
    pub placed_at: DateTime<Utc>,
}

/// Spacing before and after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spacing {
    pub raw: Decimal,
    pub value: Decimal,
    pub min: Decimal,
    pub max: Decimal,
}

/// A complete ladder.
///
/// Buy levels are ordered descending from base and sell levels ascending.
/// Both sides always have `level_count` entries; a buy level that would be
/// non-positive is dropped together with its sell counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPlan {
    pub base_price: Price,
    pub spacing: Decimal,
    pub min_spacing: Decimal,
    pub max_spacing: Decimal,
    pub buy_levels: Vec<GridLevel>,
    pub sell_levels: Vec<GridLevel>,
    pub level_count: u32,
    pub atr_used: Decimal,
    pub poc_used: Option<Price>,
    pub created_at: DateTime<Utc>,
}

impl GridPlan {
    /// Fractional deviation of `price` from the base.
    pub fn deviation(&self, price: Price) -> Decimal {
        price.deviation_from(self.base_price).unwrap_or(Decimal::ZERO)
    }

    /// Rebuild condition: `|price - base| / base > threshold`.
    pub fn needs_rebalance(&self, price: Price, threshold: Decimal) -> bool {
        self.deviation(price) > threshold
    }

    /// All levels, buys first.
    pub fn levels(&self) -> impl Iterator<Item = &GridLevel> {
        self.buy_levels.iter().chain(self.sell_levels.iter())
    }

    /// Levels issued more than `max_age` before `now`.
    pub fn stale_levels(&self, now: DateTime<Utc>, max_age: Duration) -> Vec<GridLevel> {
        self.levels()
            .filter(|l| now - l.placed_at > max_age)
            .cloned()
            .collect()
    }

    /// Re-stamp stale levels as freshly issued. Returns how many were refreshed.
    pub fn refresh_stale(&mut self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let mut refreshed = 0;
        for level in self.buy_levels.iter_mut().chain(self.sell_levels.iter_mut()) {
            if now - level.placed_at > max_age {
                level.placed_at = now;
                refreshed += 1;
            }
        }
        refreshed
    }
}

/// Base price for a new ladder.
///
/// With a valid profile the base is `price * (1 - w) + poc * w`. A POC far
/// from price can leave the base outside the rebalance band, in which case
/// the next cycle rebuilds around the same blend.
pub fn compute_base_price(
    price: Price,
    profile: Option<&MarketProfile>,
    config: &GridConfig,
) -> (Price, Option<Price>) {
    let w = config.poc_blend_weight;
    let poc = match profile {
        Some(p) if p.is_valid && p.poc.is_positive() && !w.is_zero() => p.poc,
        _ => return (price, None),
    };

    (price * (Decimal::ONE - w) + poc * w, Some(poc))
}

/// Level spacing for a base price.
///
/// Bounds: `[base * min_spread_pct, base * max_spread_pct / level_count]`.
pub fn compute_spacing(base: Price, atr: Decimal, config: &GridConfig) -> Spacing {
    let raw = match config.mode {
        SpacingMode::Atr => atr * config.atr_multiplier,
        SpacingMode::Fixed => base.inner() * config.base_spacing_pct,
    };
    let count = Decimal::from(config.level_count.max(1));
    let min = base.inner() * config.min_spread_pct;
    let max = (base.inner() * config.max_spread_pct / count).max(min);

    Spacing {
        raw,
        value: raw.max(min).min(max),
        min,
        max,
    }
}

/// Build a full ladder.
pub fn compute_plan(
    price: Price,
    atr: Decimal,
    profile: Option<&MarketProfile>,
    config: &GridConfig,
    now: DateTime<Utc>,
) -> GridPlan {
    let (base, poc_used) = compute_base_price(price, profile, config);
    let spacing = compute_spacing(base, atr, config);

    let level_size = |p: Price| {
        if p.is_positive() {
            Size::new(config.level_notional / p.inner()).round_to_lot(Size::new(config.lot_size))
        } else {
            Size::ZERO
        }
    };

    let mut buy_levels = Vec::with_capacity(config.level_count as usize);
    let mut sell_levels = Vec::with_capacity(config.level_count as usize);

    for i in 1..=config.level_count {
        let offset = spacing.value * Decimal::from(i);
        let buy = Price::new(base.inner() - offset);
        if !buy.is_positive() {
            // Deeper levels are lower still
            break;
        }
        let sell = Price::new(base.inner() + offset);

        buy_levels.push(GridLevel {
            side: OrderSide::Buy,
            index: i,
            price: buy,
            size: level_size(buy),
            placed_at: now,
        });
        sell_levels.push(GridLevel {
            side: OrderSide::Sell,
            index: i,
            price: sell,
            size: level_size(sell),
            placed_at: now,
        });
    }

    GridPlan {
        base_price: base,
        spacing: spacing.value,
        min_spacing: spacing.min,
        max_spacing: spacing.max,
        level_count: buy_levels.len() as u32,
        buy_levels,
        sell_levels,
        atr_used: atr,
        poc_used,
        created_at: now,
    }
}
