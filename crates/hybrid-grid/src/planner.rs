//! Grid lifecycle management.
//!
//! Holds the current ladder and decides, once per cycle, whether it has to
//! be built, rebuilt after the price drifted away from base, or left alone
//! with only stale levels re-issued. A rebuild discards the previous plan
//! entirely; reconciling resting orders is left to the executor.

use chrono::{DateTime, Duration, Utc};
use hybrid_core::Price;
use hybrid_indicators::{IndicatorSnapshot, MarketProfile};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::GridConfig;
use crate::error::{GridError, GridResult};
use crate::plan::{compute_plan, GridLevel, GridPlan};

/// Outcome of a planner cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum GridUpdate {
    /// Grid planning is switched off.
    Disabled,
    /// First ladder built.
    Built(GridPlan),
    /// Price left the rebalance band; the ladder was replaced.
    Rebuilt {
        plan: GridPlan,
        previous_base: Price,
        deviation: Decimal,
    },
    /// Ladder kept. `stale` lists levels that were re-issued this cycle.
    Unchanged { stale: Vec<GridLevel> },
}

impl GridUpdate {
    /// The plan that was produced this cycle, if any.
    pub fn new_plan(&self) -> Option<&GridPlan> {
        match self {
            Self::Built(plan) | Self::Rebuilt { plan, .. } => Some(plan),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Built(_) => "built",
            Self::Rebuilt { .. } => "rebuilt",
            Self::Unchanged { .. } => "unchanged",
        }
    }
}

/// Owns the active [`GridPlan`].
#[derive(Debug)]
pub struct GridPlanner {
    config: GridConfig,
    plan: Option<GridPlan>,
    rebuilds: u64,
}

impl GridPlanner {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            plan: None,
            rebuilds: 0,
        }
    }

    /// Create a planner after validating the configuration.
    pub fn try_new(config: GridConfig) -> GridResult<Self> {
        config.validate().map_err(GridError::ConfigError)?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn plan(&self) -> Option<&GridPlan> {
        self.plan.as_ref()
    }

    /// Number of rebuilds triggered by the rebalance check.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    fn max_age(&self) -> Duration {
        i64::try_from(self.config.level_max_age_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// Build a fresh ladder, replacing any existing one.
    pub fn initialize(
        &mut self,
        price: Price,
        atr: Decimal,
        profile: Option<&MarketProfile>,
        now: DateTime<Utc>,
    ) -> &GridPlan {
        let plan = compute_plan(price, atr, profile, &self.config, now);
        info!(
            base = %plan.base_price,
            spacing = %plan.spacing,
            levels = plan.level_count,
            poc = ?plan.poc_used.map(|p| p.to_string()),
            "Grid initialized"
        );
        self.plan.insert(plan)
    }

    /// `|price - base| / base > rebalance_threshold` for the current plan.
    /// False when there is no plan.
    pub fn needs_rebalance(&self, price: Price) -> bool {
        self.plan
            .as_ref()
            .is_some_and(|p| p.needs_rebalance(price, self.config.rebalance_threshold))
    }

    /// Run one planner cycle against a fresh indicator snapshot.
    pub fn update(
        &mut self,
        snapshot: &IndicatorSnapshot,
        profile: Option<&MarketProfile>,
        now: DateTime<Utc>,
    ) -> GridUpdate {
        if !self.config.enabled {
            return GridUpdate::Disabled;
        }

        let price = snapshot.price;
        let previous = match &self.plan {
            None => {
                let plan = self.initialize(price, snapshot.atr, profile, now).clone();
                return GridUpdate::Built(plan);
            }
            Some(plan) => (plan.base_price, plan.deviation(price)),
        };

        if self.needs_rebalance(price) {
            let (previous_base, deviation) = previous;
            info!(
                previous_base = %previous_base,
                price = %price,
                deviation = %deviation,
                threshold = %self.config.rebalance_threshold,
                "Grid rebalance triggered"
            );
            self.rebuilds += 1;
            let plan = self.initialize(price, snapshot.atr, profile, now).clone();
            return GridUpdate::Rebuilt {
                plan,
                previous_base,
                deviation,
            };
        }

        let stale = self.stale_levels(now);
        if !stale.is_empty() {
            let refreshed = self.refresh_stale(now);
            debug!(refreshed, "Stale grid levels re-issued");
        }
        GridUpdate::Unchanged { stale }
    }

    /// Levels older than `level_max_age_secs`.
    pub fn stale_levels(&self, now: DateTime<Utc>) -> Vec<GridLevel> {
        match &self.plan {
            Some(plan) => plan.stale_levels(now, self.max_age()),
            None => Vec::new(),
        }
    }

    /// Re-stamp stale levels. Returns how many were refreshed.
    pub fn refresh_stale(&mut self, now: DateTime<Utc>) -> usize {
        let max_age = self.max_age();
        match &mut self.plan {
            Some(plan) => plan.refresh_stale(now, max_age),
            None => 0,
        }
    }

    /// Drop the current plan (e.g. after an emergency cancel).
    pub fn reset(&mut self) {
        self.plan = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    fn snapshot(price: Decimal, atr: Decimal) -> IndicatorSnapshot {
        let mut snap = IndicatorSnapshot::neutral(Price::new(price), now());
        snap.atr = atr;
        snap
    }

    #[test]
    fn test_first_update_builds() {
        let mut planner = GridPlanner::new(GridConfig::default());
        assert!(planner.plan().is_none());
        assert!(!planner.needs_rebalance(Price::new(dec!(100))));

        let update = planner.update(&snapshot(dec!(100), dec!(1)), None, now());
        assert!(matches!(update, GridUpdate::Built(_)));
        assert_eq!(update.label(), "built");
        assert_eq!(planner.plan().unwrap().base_price, Price::new(dec!(100)));
    }

    #[test]
    fn test_rebalance_threshold() {
        let mut planner = GridPlanner::new(GridConfig::default());
        planner.update(&snapshot(dec!(100), dec!(1)), None, now());

        // 4% move: kept
        let update = planner.update(&snapshot(dec!(104), dec!(1)), None, now());
        assert!(matches!(update, GridUpdate::Unchanged { .. }));
        assert_eq!(planner.plan().unwrap().base_price, Price::new(dec!(100)));

        // 6% move: rebuilt around the new price
        let update = planner.update(&snapshot(dec!(106), dec!(1)), None, now());
        match update {
            GridUpdate::Rebuilt {
                plan,
                previous_base,
                deviation,
            } => {
                assert_eq!(previous_base, Price::new(dec!(100)));
                assert_eq!(deviation, dec!(0.06));
                assert_eq!(plan.base_price, Price::new(dec!(106)));
            }
            other => panic!("expected Rebuilt, got {other:?}"),
        }
        assert_eq!(planner.rebuild_count(), 1);
    }

    #[test]
    fn test_rebuild_discards_previous_levels() {
        let mut planner = GridPlanner::new(GridConfig::default());
        planner.update(&snapshot(dec!(100), dec!(1)), None, now());
        let old_levels = planner.plan().unwrap().buy_levels.clone();

        planner.update(&snapshot(dec!(90), dec!(1)), None, now());
        let new_plan = planner.plan().unwrap();
        assert!(new_plan
            .buy_levels
            .iter()
            .all(|l| !old_levels.iter().any(|o| o.price == l.price)));
    }

    #[test]
    fn test_stale_levels_reissued() {
        let config = GridConfig {
            level_max_age_secs: 600,
            ..Default::default()
        };
        let mut planner = GridPlanner::new(config);
        planner.update(&snapshot(dec!(100), dec!(1)), None, now());

        let soon = now() + Duration::seconds(300);
        match planner.update(&snapshot(dec!(100), dec!(1)), None, soon) {
            GridUpdate::Unchanged { stale } => assert!(stale.is_empty()),
            other => panic!("expected Unchanged, got {other:?}"),
        }

        let later = now() + Duration::seconds(601);
        match planner.update(&snapshot(dec!(100), dec!(1)), None, later) {
            GridUpdate::Unchanged { stale } => assert_eq!(stale.len(), 16),
            other => panic!("expected Unchanged, got {other:?}"),
        }
        assert!(planner.stale_levels(later).is_empty());
    }

    #[test]
    fn test_oversized_max_age_never_stale() {
        let mut planner = GridPlanner::new(GridConfig {
            level_max_age_secs: u64::MAX,
            ..Default::default()
        });
        planner.update(&snapshot(dec!(100), dec!(1)), None, now());

        let much_later = now() + Duration::days(3650);
        match planner.update(&snapshot(dec!(100), dec!(1)), None, much_later) {
            GridUpdate::Unchanged { stale } => assert!(stale.is_empty()),
            other => panic!("expected Unchanged, got {other:?}"),
        }
    }

    #[test]
    fn test_disabled() {
        let mut planner = GridPlanner::new(GridConfig {
            enabled: false,
            ..Default::default()
        });
        let update = planner.update(&snapshot(dec!(100), dec!(1)), None, now());
        assert_eq!(update, GridUpdate::Disabled);
        assert!(planner.plan().is_none());
    }

    #[test]
    fn test_try_new_rejects_invalid_config() {
        let err = GridPlanner::try_new(GridConfig {
            level_count: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, GridError::ConfigError(_)));
        assert!(GridPlanner::try_new(GridConfig::default()).is_ok());
    }

    #[test]
    fn test_reset() {
        let mut planner = GridPlanner::new(GridConfig::default());
        planner.update(&snapshot(dec!(100), dec!(1)), None, now());
        planner.reset();
        assert!(planner.plan().is_none());

        let update = planner.update(&snapshot(dec!(100), dec!(1)), None, now());
        assert!(update.new_plan().is_some());
    }
}
