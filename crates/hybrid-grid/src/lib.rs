//! Grid planning for the hybrid trading core.
//!
//! Builds a symmetric ladder of buy and sell levels around a base price:
//!
//! ```text
//! IndicatorSnapshot + MarketProfile → GridPlanner.update()
//!                                      ├─ compute_base_price: price blended toward POC
//!                                      ├─ compute_spacing: ATR or fixed, clamped
//!                                      └─ GridUpdate: built / rebuilt / unchanged
//! ```

pub mod config;
pub mod error;
pub mod plan;
pub mod planner;

pub use config::{GridConfig, SpacingMode};
pub use error::{GridError, GridResult};
pub use plan::{compute_base_price, compute_plan, compute_spacing, GridLevel, GridPlan, Spacing};
pub use planner::{GridPlanner, GridUpdate};
