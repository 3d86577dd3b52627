//! Core domain types for the hybrid grid/launch trading core.
//!
//! This crate provides fundamental types used throughout the system:
//! - `Price`, `Size`: Precision-safe numeric types
//! - `Sample`: A single price/volume observation
//! - `OrderSide`, `Direction`, `Trend`: Trading enums
//! - `SessionWindow`: Daily time-of-day window in a fixed UTC offset

pub mod decimal;
pub mod error;
pub mod sample;
pub mod session_window;
pub mod side;
pub mod trend;

pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use sample::Sample;
pub use session_window::SessionWindow;
pub use side::{Direction, OrderSide, SignalId};
pub use trend::Trend;
