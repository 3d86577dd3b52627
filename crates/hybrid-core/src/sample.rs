//! Price/volume observation.

use crate::decimal::Price;
use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single observation of an instrument.
///
/// Immutable once created. `price` must be positive and `volume`
/// non-negative; see [`Sample::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub price: Price,
    #[serde(default)]
    pub volume: Decimal,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, price: Price, volume: Decimal) -> Self {
        Self {
            timestamp,
            price,
            volume,
        }
    }

    /// Check the observation invariants.
    pub fn validate(&self) -> Result<()> {
        if !self.price.is_positive() {
            return Err(CoreError::InvalidPrice(format!(
                "price must be positive, got {}",
                self.price
            )));
        }
        if self.volume.is_sign_negative() && !self.volume.is_zero() {
            return Err(CoreError::InvalidVolume(format!(
                "volume must be non-negative, got {}",
                self.volume
            )));
        }
        Ok(())
    }
}
