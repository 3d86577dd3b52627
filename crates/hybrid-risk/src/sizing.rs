//! Position sizing.

use hybrid_core::{Price, Size};
use rust_decimal::Decimal;

use crate::gates::RiskGateConfig;

/// Risk-based position sizing with a notional cap.
///
/// `size = min(balance * max_single_position_pct / |entry - stop|,
/// max_position_value / entry)`, floored at zero and rounded down to the lot.
#[derive(Debug, Clone, Copy)]
pub struct PositionSizer {
    pub max_single_position_pct: Decimal,
    pub max_position_value: Decimal,
    pub lot_size: Size,
}

impl PositionSizer {
    pub fn from_config(config: &RiskGateConfig) -> Self {
        Self {
            max_single_position_pct: config.max_single_position_pct,
            max_position_value: config.max_position_value,
            lot_size: Size::new(config.lot_size),
        }
    }

    /// Amount of balance put at risk by one position.
    pub fn risk_amount(&self, balance: Decimal) -> Decimal {
        (balance * self.max_single_position_pct).max(Decimal::ZERO)
    }

    /// Size for an entry with the given stop.
    ///
    /// Zero when the entry is non-positive or the stop sits on the entry.
    pub fn size(&self, balance: Decimal, entry: Price, stop_loss: Price) -> Size {
        if !entry.is_positive() {
            return Size::ZERO;
        }
        let stop_distance = entry.abs_diff(stop_loss);
        if stop_distance.is_zero() {
            return Size::ZERO;
        }

        let by_risk = self.risk_amount(balance) / stop_distance;
        let by_value = self.max_position_value / entry.inner();
        let raw = by_risk.min(by_value).max(Decimal::ZERO);

        Size::new(raw).round_to_lot(self.lot_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sizer() -> PositionSizer {
        PositionSizer::from_config(&RiskGateConfig::default())
    }

    #[test]
    fn test_risk_bound_size() {
        // risk 1000 * 0.04 = 40, distance 0.026 → 1538.46; cap 1000 / 2.6 = 384.61
        let size = sizer().size(dec!(1000), Price::new(dec!(2.6)), Price::new(dec!(2.626)));
        assert_eq!(size, Size::new(dec!(384.61)));

        // Wider stop: risk 40 / 0.5 = 80 < cap 384.61
        let size = sizer().size(dec!(1000), Price::new(dec!(2.6)), Price::new(dec!(2.1)));
        assert_eq!(size, Size::new(dec!(80.00)));
    }

    #[test]
    fn test_degenerate_inputs() {
        let s = sizer();
        assert_eq!(
            s.size(dec!(1000), Price::new(dec!(2.5)), Price::new(dec!(2.5))),
            Size::ZERO
        );
        assert_eq!(s.size(dec!(1000), Price::ZERO, Price::new(dec!(1))), Size::ZERO);
        assert_eq!(
            s.size(dec!(-100), Price::new(dec!(2.5)), Price::new(dec!(2.4))),
            Size::ZERO
        );
    }

    #[test]
    fn test_lot_rounding() {
        let s = PositionSizer {
            max_single_position_pct: dec!(0.04),
            max_position_value: dec!(1000),
            lot_size: Size::new(dec!(1)),
        };
        // 40 / 0.3 = 133.33 → 133
        let size = s.size(dec!(1000), Price::new(dec!(2.5)), Price::new(dec!(2.2)));
        assert_eq!(size, Size::new(dec!(133)));
    }
}
