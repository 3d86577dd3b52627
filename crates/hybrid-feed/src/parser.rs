//! Replay input parsing.
//!
//! Parses JSON-lines records of the form
//! `{"pair": "XRP/USDT", "timestamp": "2026-03-02T10:00:00Z", "price": "2.5", "volume": "1200"}`
//! into samples. `volume` is optional. Blank lines and lines starting with
//! `#` are ignored.

use crate::error::{FeedError, FeedResult};
use chrono::{DateTime, Utc};
use hybrid_core::{Price, Sample};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

/// Raw replay record. Numeric values may be strings or numbers.
#[derive(Debug, Deserialize)]
struct RawSample {
    pair: String,
    timestamp: DateTime<Utc>,
    price: serde_json::Value,
    #[serde(default)]
    volume: Option<serde_json::Value>,
}

/// A parsed, validated replay record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSample {
    pub pair: String,
    pub sample: Sample,
}

/// Line parser with accept/reject counters.
#[derive(Debug, Default)]
pub struct SampleParser {
    accepted: u64,
    rejected: u64,
}

impl SampleParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Parse one line. `Ok(None)` for blank and comment lines.
    pub fn parse_line(&mut self, line: &str) -> FeedResult<Option<ParsedSample>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        match self.parse_record(line) {
            Ok(parsed) => {
                self.accepted += 1;
                Ok(Some(parsed))
            }
            Err(e) => {
                self.rejected += 1;
                warn!(error = %e, "Rejected replay record");
                Err(e)
            }
        }
    }

    fn parse_record(&self, line: &str) -> FeedResult<ParsedSample> {
        let raw: RawSample = serde_json::from_str(line)?;
        let price = Price::new(self.parse_decimal(&raw.price, "price")?);
        let volume = match &raw.volume {
            Some(v) => self.parse_decimal(v, "volume")?,
            None => Decimal::ZERO,
        };

        let sample = Sample::new(raw.timestamp, price, volume);
        sample.validate()?;

        Ok(ParsedSample {
            pair: raw.pair,
            sample,
        })
    }

    fn parse_decimal(&self, value: &serde_json::Value, field: &str) -> FeedResult<Decimal> {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(FeedError::ParseError(format!(
                    "{field} must be a string or number, got {other}"
                )))
            }
        };
        text.parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| FeedError::ParseError(format!("Invalid {field}: {text}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_string_fields() {
        let mut parser = SampleParser::new();
        let line = r#"{"pair":"XRP/USDT","timestamp":"2026-03-02T10:00:00Z","price":"2.5123","volume":"1200"}"#;

        let parsed = parser.parse_line(line).unwrap().unwrap();
        assert_eq!(parsed.pair, "XRP/USDT");
        assert_eq!(parsed.sample.price, Price::new(dec!(2.5123)));
        assert_eq!(parsed.sample.volume, dec!(1200));
        assert_eq!(parser.accepted(), 1);
    }

    #[test]
    fn test_parse_numeric_fields_and_missing_volume() {
        let mut parser = SampleParser::new();
        let line = r#"{"pair":"XRP/USDT","timestamp":"2026-03-02T10:00:00Z","price":2.5}"#;

        let parsed = parser.parse_line(line).unwrap().unwrap();
        assert_eq!(parsed.sample.price, Price::new(dec!(2.5)));
        assert_eq!(parsed.sample.volume, Decimal::ZERO);
    }

    #[test]
    fn test_blank_and_comment_lines_skipped() {
        let mut parser = SampleParser::new();
        assert!(parser.parse_line("").unwrap().is_none());
        assert!(parser.parse_line("   ").unwrap().is_none());
        assert!(parser.parse_line("# header").unwrap().is_none());
        assert_eq!(parser.accepted(), 0);
        assert_eq!(parser.rejected(), 0);
    }

    #[test]
    fn test_invalid_records_counted() {
        let mut parser = SampleParser::new();

        assert!(parser.parse_line("not json").is_err());
        assert!(parser
            .parse_line(r#"{"pair":"XRP/USDT","timestamp":"2026-03-02T10:00:00Z","price":"abc"}"#)
            .is_err());
        assert!(matches!(
            parser.parse_line(
                r#"{"pair":"XRP/USDT","timestamp":"2026-03-02T10:00:00Z","price":"-1"}"#
            ),
            Err(FeedError::InvalidSample(_))
        ));
        assert_eq!(parser.rejected(), 3);
    }
}
