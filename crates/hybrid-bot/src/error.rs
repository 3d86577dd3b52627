//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed error: {0}")]
    Feed(#[from] hybrid_feed::FeedError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] hybrid_indicators::IndicatorError),

    #[error("Grid error: {0}")]
    Grid(#[from] hybrid_grid::GridError),

    #[error("Risk error: {0}")]
    Risk(#[from] hybrid_risk::RiskError),

    #[error("Detector error: {0}")]
    Detector(#[from] hybrid_detector::DetectorError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] hybrid_telemetry::TelemetryError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] hybrid_persistence::PersistenceError),

    #[error("Account error: {0}")]
    Account(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
