//! Feed error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid sample: {0}")]
    InvalidSample(#[from] hybrid_core::CoreError),

    #[error("Out-of-order sample: {got} is older than buffered {latest}")]
    OutOfOrder {
        latest: DateTime<Utc>,
        got: DateTime<Utc>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;
