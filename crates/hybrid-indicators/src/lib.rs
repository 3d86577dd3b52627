//! Indicator computation for the hybrid trading core.
//!
//! - [`IndicatorEngine`]: ATR, SMA/EMA, trend, bias, RSI, momentum and
//!   volatility ratio, recomputed from the sample window every cycle.
//! - [`MarketProfileBuilder`]: volume-at-price histogram with point of
//!   control and value area, rebuilt on a fixed refresh interval.

pub mod config;
pub mod engine;
pub mod error;
pub mod profile;
pub mod series;

pub use config::{IndicatorConfig, ProfileConfig};
pub use engine::{IndicatorEngine, IndicatorSnapshot};
pub use error::{IndicatorError, IndicatorResult};
pub use profile::{MarketProfile, MarketProfileBuilder};
