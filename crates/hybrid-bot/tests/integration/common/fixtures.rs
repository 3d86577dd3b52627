//! Replay files and configuration shared by the scenarios.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, TimeZone, Utc};
use hybrid_bot::AppConfig;
use rust_decimal::Decimal;

pub const PAIR: &str = "XRP/USDT";

pub fn utc(d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, h, min, 0).unwrap()
}

/// Short indicator periods so analysis starts after six samples, a
/// 01:00-03:00 UTC launch window and the performance log under `data_dir`.
pub fn config(data_dir: &Path) -> AppConfig {
    let toml_str = format!(
        r#"
[market]
pair = "{PAIR}"

[indicators]
min_samples = 6
lookback = 50
atr_period = 3
sma_short_period = 3
sma_long_period = 5
ema_fast_period = 3
ema_slow_period = 5
rsi_period = 3
momentum_period = 3
momentum_short_period = 2
volume_period = 3

[persistence]
data_dir = "{}"
buffer_size = 4

[launch]
min_confidence = 0.0
volatility_filter_enabled = false

[launch.window]
start = "01:00"
end = "03:00"
utc_offset_minutes = 0
"#,
        data_dir.display()
    );
    AppConfig::from_toml(&toml_str).unwrap()
}

/// One JSON line per `(time, price)`.
pub fn replay_lines(points: &[(DateTime<Utc>, &str)]) -> String {
    points
        .iter()
        .map(|(t, price)| {
            format!(
                r#"{{"pair": "{PAIR}", "timestamp": "{}", "price": "{price}", "volume": "100"}}"#,
                t.to_rfc3339()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `count` samples at `price`, ten minutes apart from `start`.
pub fn flat(start: DateTime<Utc>, count: i64, price: &'static str) -> Vec<(DateTime<Utc>, &'static str)> {
    (0..count)
        .map(|i| (start + Duration::minutes(10 * i), price))
        .collect()
}

pub fn write_replay(dir: &Path, points: &[(DateTime<Utc>, &str)]) -> PathBuf {
    let path = dir.join("replay.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", replay_lines(points)).unwrap();
    path
}

/// Parsed lines of one day's performance file.
pub fn read_performance(data_dir: &Path, date: &str) -> Vec<serde_json::Value> {
    let path = data_dir.join(format!("performance_{date}.jsonl"));
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

/// Decimal field of a performance record. Decimals are written as strings.
pub fn dec_field(record: &serde_json::Value, field: &str) -> Decimal {
    record[field].as_str().unwrap().parse().unwrap()
}
