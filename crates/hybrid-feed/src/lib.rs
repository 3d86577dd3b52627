//! Sample ingestion for the hybrid trading core.
//!
//! Keeps a bounded, time-ordered window of price/volume observations per
//! instrument and parses JSON-lines replay input into samples.

pub mod buffer;
pub mod error;
pub mod parser;

pub use buffer::{InstrumentBuffers, SampleBuffer, DEFAULT_CAPACITY};
pub use error::{FeedError, FeedResult};
pub use parser::{ParsedSample, SampleParser};
