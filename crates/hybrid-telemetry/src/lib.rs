//! Prometheus metrics and structured logging for the hybrid trading core.
//!
//! - Structured logging with tracing (JSON in production)
//! - Prometheus metrics for cycles, signals, risk blocks and grid rebuilds
//! - Periodic summary of the counters

pub mod error;
pub mod logging;
pub mod metrics;
pub mod summary;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
pub use summary::{CycleSummary, SummaryReporter};
