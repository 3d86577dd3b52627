//! Indicator error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("Insufficient data: have {have} samples, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type IndicatorResult<T> = Result<T, IndicatorError>;
