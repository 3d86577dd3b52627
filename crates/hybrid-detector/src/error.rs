//! Detector error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid session window: {0}")]
    InvalidWindow(#[from] hybrid_core::CoreError),
}

pub type DetectorResult<T> = Result<T, DetectorError>;
