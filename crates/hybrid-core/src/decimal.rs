//! Price and size newtypes.
//!
//! Every quantity the ladder, the sizer or the ledger touches is a
//! `rust_decimal::Decimal`. The wrappers only exist so a level price can't
//! be passed where a base-unit amount is expected. Ratios (RSI, volatility,
//! wick/body) are computed in `f64` and leave through [`Price::to_f64`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

macro_rules! decimal_newtype {
    ($name:ident) => {
        impl $name {
            pub const ZERO: Self = Self(Decimal::ZERO);

            #[inline]
            pub fn new(value: Decimal) -> Self {
                Self(value)
            }

            #[inline]
            pub fn inner(&self) -> Decimal {
                self.0
            }

            /// Strictly greater than zero.
            #[inline]
            pub fn is_positive(&self) -> bool {
                self.0 > Decimal::ZERO
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

/// Quote-currency price of one base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

/// Amount in base units (grid level size, launch position size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub Decimal);

decimal_newtype!(Price);
decimal_newtype!(Size);

impl Price {
    /// Distance between two prices, ignoring direction. Used for wick bodies
    /// and stop distances.
    #[inline]
    pub fn abs_diff(&self, other: Price) -> Decimal {
        (self.0 - other.0).abs()
    }

    /// `|self - base| / base`, the quantity the rebalance check compares
    /// against its threshold. `None` when `base` is zero.
    pub fn deviation_from(&self, base: Price) -> Option<Decimal> {
        if base.0.is_zero() {
            return None;
        }
        Some(self.abs_diff(base) / base.0)
    }

    /// 0.0 when the value does not fit an `f64`.
    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

/// Scaling by a weight or a fraction (POC blend, spread bounds).
impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self {
        Self(self.0 * rhs)
    }
}

impl Size {
    /// Truncate to a whole number of lots. A zero lot leaves the size as is.
    pub fn round_to_lot(&self, lot: Size) -> Self {
        if lot.0.is_zero() {
            return *self;
        }
        Self((self.0 / lot.0).floor() * lot.0)
    }

    /// Quote-currency value at `price`.
    #[inline]
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deviation_is_symmetric() {
        let base = Price::new(dec!(100));

        assert_eq!(Price::new(dec!(106)).deviation_from(base), Some(dec!(0.06)));
        assert_eq!(Price::new(dec!(94)).deviation_from(base), Some(dec!(0.06)));
        assert_eq!(base.deviation_from(Price::ZERO), None);
    }

    #[test]
    fn test_blend_arithmetic() {
        let price = Price::new(dec!(2.50));
        let poc = Price::new(dec!(2.45));
        let w = dec!(0.4);

        let blended = price * (Decimal::ONE - w) + poc * w;
        assert_eq!(blended, Price::new(dec!(2.48)));
        assert_eq!(price - poc, Price::new(dec!(0.05)));
    }

    #[test]
    fn test_is_positive_excludes_zero() {
        assert!(Price::new(dec!(0.0001)).is_positive());
        assert!(!Price::ZERO.is_positive());
        assert!(!Size::new(dec!(-1)).is_positive());
    }

    #[test]
    fn test_lot_truncation() {
        let lot = Size::new(dec!(0.01));

        assert_eq!(Size::new(dec!(16.6789)).round_to_lot(lot), Size::new(dec!(16.67)));
        assert_eq!(Size::new(dec!(0.009)).round_to_lot(lot), Size::ZERO);
        assert_eq!(
            Size::new(dec!(3.3)).round_to_lot(Size::ZERO),
            Size::new(dec!(3.3))
        );
    }

    #[test]
    fn test_notional_and_display() {
        let size = Size::new(dec!(400));
        let price = Price::new(dec!(2.5));

        assert_eq!(size.notional(price), dec!(1000.0));
        assert_eq!(price.to_string(), "2.5");
        assert!((price.to_f64() - 2.5).abs() < 1e-12);
    }
}
