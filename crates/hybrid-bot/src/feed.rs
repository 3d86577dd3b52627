//! Price sources.
//!
//! The engine sees a feed only through [`PriceFeed::poll`], which yields at
//! most one sample per cycle.

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;

use hybrid_core::Sample;
use hybrid_feed::{ParsedSample, SampleParser};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info};

use crate::error::AppResult;

/// Result of polling a feed for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPoll {
    Tick(Sample),
    /// No new price this cycle.
    NoPrice,
    /// The feed will not produce any more samples.
    Exhausted,
}

#[cfg_attr(test, mockall::automock)]
pub trait PriceFeed {
    fn poll(&mut self, pair: &str) -> FeedPoll;
}

/// Replays a JSON-lines file of samples in file order.
#[derive(Debug, Default)]
pub struct ReplayFeed {
    records: VecDeque<ParsedSample>,
    rejected: u64,
}

impl ReplayFeed {
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let feed = Self::from_reader(std::io::BufReader::new(file))?;
        info!(
            path = %path.as_ref().display(),
            samples = feed.remaining(),
            rejected = feed.rejected(),
            "Replay file loaded"
        );
        Ok(feed)
    }

    /// Parse every line. Malformed records are counted and skipped.
    pub fn from_reader(reader: impl BufRead) -> AppResult<Self> {
        let mut parser = SampleParser::new();
        let mut records = VecDeque::new();
        for line in reader.lines() {
            if let Ok(Some(parsed)) = parser.parse_line(&line?) {
                records.push_back(parsed);
            }
        }
        Ok(Self {
            records,
            rejected: parser.rejected(),
        })
    }

    pub fn from_samples(records: impl IntoIterator<Item = ParsedSample>) -> Self {
        Self {
            records: records.into_iter().collect(),
            rejected: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.records.len()
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

impl PriceFeed for ReplayFeed {
    /// Next record for `pair`; records for other pairs are skipped.
    fn poll(&mut self, pair: &str) -> FeedPoll {
        while let Some(record) = self.records.pop_front() {
            if record.pair == pair {
                return FeedPoll::Tick(record.sample);
            }
            debug!(pair = %record.pair, "Skipping replay record for other pair");
        }
        FeedPoll::Exhausted
    }
}

/// Feed backed by a channel, filled by a reader task.
///
/// Everything received since the last poll is drained and only the newest
/// sample for the pair is returned.
#[derive(Debug)]
pub struct ChannelFeed {
    rx: mpsc::Receiver<ParsedSample>,
}

impl ChannelFeed {
    pub fn new(rx: mpsc::Receiver<ParsedSample>) -> Self {
        Self { rx }
    }
}

impl PriceFeed for ChannelFeed {
    fn poll(&mut self, pair: &str) -> FeedPoll {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(record) if record.pair == pair => latest = Some(record.sample),
                Ok(_) => {}
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) if latest.is_none() => {
                    return FeedPoll::Exhausted;
                }
                Err(TryRecvError::Disconnected) => break,
            }
        }
        latest.map_or(FeedPoll::NoPrice, FeedPoll::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hybrid_core::Price;
    use rust_decimal_macros::dec;

    const REPLAY: &str = r#"
# replay fixture
{"pair": "XRP/USDT", "timestamp": "2026-03-02T10:00:00Z", "price": "2.50", "volume": "100"}
{"pair": "BTC/USDT", "timestamp": "2026-03-02T10:00:05Z", "price": "65000"}
{"pair": "XRP/USDT", "timestamp": "2026-03-02T10:00:10Z", "price": -1}
not json
{"pair": "XRP/USDT", "timestamp": "2026-03-02T10:00:20Z", "price": 2.51}
"#;

    fn parsed(pair: &str, secs: u32, price: rust_decimal::Decimal) -> ParsedSample {
        ParsedSample {
            pair: pair.to_string(),
            sample: Sample::new(
                Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, secs).unwrap(),
                Price::new(price),
                dec!(1),
            ),
        }
    }

    #[test]
    fn test_replay_from_reader() {
        let mut feed = ReplayFeed::from_reader(REPLAY.as_bytes()).unwrap();
        assert_eq!(feed.remaining(), 3);
        assert_eq!(feed.rejected(), 2);

        let FeedPoll::Tick(first) = feed.poll("XRP/USDT") else {
            panic!("expected tick");
        };
        assert_eq!(first.price, Price::new(dec!(2.50)));

        // BTC record skipped
        let FeedPoll::Tick(second) = feed.poll("XRP/USDT") else {
            panic!("expected tick");
        };
        assert_eq!(second.price, Price::new(dec!(2.51)));
        assert_eq!(feed.poll("XRP/USDT"), FeedPoll::Exhausted);
    }

    #[test]
    fn test_replay_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.jsonl");
        std::fs::write(&path, REPLAY).unwrap();
        let feed = ReplayFeed::open(&path).unwrap();
        assert_eq!(feed.remaining(), 3);

        assert!(ReplayFeed::open(dir.path().join("missing.jsonl")).is_err());
    }

    #[test]
    fn test_channel_feed_keeps_newest() {
        let (tx, rx) = mpsc::channel(8);
        let mut feed = ChannelFeed::new(rx);
        assert_eq!(feed.poll("XRP/USDT"), FeedPoll::NoPrice);

        tx.try_send(parsed("XRP/USDT", 0, dec!(2.50))).unwrap();
        tx.try_send(parsed("BTC/USDT", 1, dec!(65000))).unwrap();
        tx.try_send(parsed("XRP/USDT", 2, dec!(2.52))).unwrap();

        match feed.poll("XRP/USDT") {
            FeedPoll::Tick(s) => assert_eq!(s.price, Price::new(dec!(2.52))),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(feed.poll("XRP/USDT"), FeedPoll::NoPrice);

        tx.try_send(parsed("XRP/USDT", 3, dec!(2.53))).unwrap();
        drop(tx);
        assert!(matches!(feed.poll("XRP/USDT"), FeedPoll::Tick(_)));
        assert_eq!(feed.poll("XRP/USDT"), FeedPoll::Exhausted);
    }
}
