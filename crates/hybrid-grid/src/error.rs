//! Grid error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type GridResult<T> = Result<T, GridError>;
