//! Application configuration.

use crate::error::{AppError, AppResult};
use hybrid_detector::LaunchConfig;
use hybrid_grid::GridConfig;
use hybrid_indicators::{IndicatorConfig, ProfileConfig};
use hybrid_risk::RiskGateConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAX_TICK_INTERVAL_MS: u64 = 3_600_000;
const MAX_SUMMARY_INTERVAL_SECS: u64 = 7 * 86_400;

/// Traded instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Trading pair (e.g., "XRP/USDT").
    #[serde(default = "default_pair")]
    pub pair: String,
    /// Asset the balance is held in.
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,
}

fn default_pair() -> String {
    "XRP/USDT".to_string()
}

fn default_quote_asset() -> String {
    "USDT".to_string()
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            pair: default_pair(),
            quote_asset: default_quote_asset(),
        }
    }
}

/// Evaluation loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tick interval in milliseconds. Default: 10,000 (10 seconds).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Samples retained per instrument. Default: 500.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Interval between periodic summaries (seconds). Default: 3600.
    #[serde(default = "default_summary_interval_secs")]
    pub summary_interval_secs: u64,
    /// Capacity of the execution event channel. Default: 1000.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_tick_interval_ms() -> u64 {
    10_000
}

fn default_buffer_capacity() -> usize {
    hybrid_feed::DEFAULT_CAPACITY
}

fn default_summary_interval_secs() -> u64 {
    3600
}

fn default_event_channel_capacity() -> usize {
    1000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            buffer_capacity: default_buffer_capacity(),
            summary_interval_secs: default_summary_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Paper account used when no exchange account is wired in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperConfig {
    /// Starting balance in the quote asset. Default: 1000.
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
}

fn default_initial_balance() -> Decimal {
    Decimal::from(1000)
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            initial_balance: default_initial_balance(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Write the per-cycle performance log.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory for `performance_{date}.jsonl` files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Buffer size before flush.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> String {
    "./data/performance".to_string()
}

fn default_buffer_size() -> usize {
    60
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_dir: default_data_dir(),
            buffer_size: default_buffer_size(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
    #[serde(default)]
    pub risk: RiskGateConfig,
    #[serde(default)]
    pub paper: PaperConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load from a specific file and validate.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section. Any violation is fatal at startup.
    pub fn validate(&self) -> AppResult<()> {
        let section = |name: &str, result: Result<(), String>| {
            result.map_err(|e| AppError::Config(format!("[{name}] {e}")))
        };

        if self.market.pair.trim().is_empty() {
            return Err(AppError::Config("[market] pair must not be empty".to_string()));
        }
        if self.market.quote_asset.trim().is_empty() {
            return Err(AppError::Config(
                "[market] quote_asset must not be empty".to_string(),
            ));
        }
        section("engine", self.engine.validate())?;
        section("indicators", self.indicators.validate())?;
        section("profile", self.profile.validate())?;
        section("grid", self.grid.validate())?;
        section("launch", self.launch.validate())?;
        section("risk", self.risk.validate())?;

        if self.paper.initial_balance.is_sign_negative() {
            return Err(AppError::Config(
                "[paper] initial_balance must be non-negative".to_string(),
            ));
        }
        if self.persistence.buffer_size == 0 {
            return Err(AppError::Config(
                "[persistence] buffer_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be positive".to_string());
        }
        if self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(format!(
                "tick_interval_ms ({}) must not exceed {MAX_TICK_INTERVAL_MS}",
                self.tick_interval_ms
            ));
        }
        if self.buffer_capacity == 0 {
            return Err("buffer_capacity must be positive".to_string());
        }
        if self.summary_interval_secs == 0 {
            return Err("summary_interval_secs must be positive".to_string());
        }
        if self.summary_interval_secs > MAX_SUMMARY_INTERVAL_SECS {
            return Err(format!(
                "summary_interval_secs ({}) must not exceed {MAX_SUMMARY_INTERVAL_SECS}",
                self.summary_interval_secs
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err("event_channel_capacity must be positive".to_string());
        }
        Ok(())
    }
}
