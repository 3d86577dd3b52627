//! Performance log persistence for the hybrid bot.
//!
//! One JSON object per evaluation cycle, appended to a daily
//! `performance_{date}.jsonl` file.

pub mod error;
pub mod record;
pub mod writer;

pub use error::{PersistenceError, PersistenceResult};
pub use record::PerformanceRecord;
pub use writer::PerformanceWriter;
