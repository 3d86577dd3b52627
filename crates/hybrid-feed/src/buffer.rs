//! Bounded sample buffers.
//!
//! Samples are appended in arrival order and the oldest sample is evicted
//! once the buffer is full. All analysis (indicators, market profile,
//! launch detection) reads from these buffers.

use crate::error::{FeedError, FeedResult};
use chrono::{DateTime, Utc};
use hybrid_core::{Price, Sample};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

/// Default number of samples retained per instrument.
pub const DEFAULT_CAPACITY: usize = 500;

/// Time-ordered window of the most recent samples of one instrument.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
    evicted: u64,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    ///
    /// Rejects samples that violate the observation invariants or that are
    /// older than the newest buffered sample. Equal timestamps are accepted.
    pub fn push(&mut self, sample: Sample) -> FeedResult<()> {
        sample.validate()?;

        if let Some(latest) = self.samples.back() {
            if sample.timestamp < latest.timestamp {
                return Err(FeedError::OutOfOrder {
                    latest: latest.timestamp,
                    got: sample.timestamp,
                });
            }
        }

        if self.samples.len() == self.capacity {
            self.samples.pop_front();
            self.evicted += 1;
        }
        self.samples.push_back(sample);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples dropped by eviction since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn latest_price(&self) -> Option<Price> {
        self.samples.back().map(|s| s.price)
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> + ExactSizeIterator {
        self.samples.iter()
    }

    /// All buffered prices, oldest first.
    pub fn prices(&self) -> Vec<Price> {
        self.samples.iter().map(|s| s.price).collect()
    }

    /// The `n` most recent samples, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<Sample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
    }

    /// Samples with `timestamp >= cutoff`, oldest first.
    pub fn window_since(&self, cutoff: DateTime<Utc>) -> Vec<Sample> {
        self.samples
            .iter()
            .filter(|s| s.timestamp >= cutoff)
            .copied()
            .collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One [`SampleBuffer`] per trading pair, created lazily.
#[derive(Debug, Clone)]
pub struct InstrumentBuffers {
    capacity: usize,
    buffers: HashMap<String, SampleBuffer>,
}

impl InstrumentBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffers: HashMap::new(),
        }
    }

    fn get_or_create(&mut self, pair: &str) -> &mut SampleBuffer {
        let capacity = self.capacity;
        self.buffers.entry(pair.to_string()).or_insert_with(|| {
            debug!(pair, capacity, "Created sample buffer");
            SampleBuffer::new(capacity)
        })
    }

    /// Append a sample to the buffer of `pair`.
    pub fn push(&mut self, pair: &str, sample: Sample) -> FeedResult<()> {
        let buffer = self.get_or_create(pair);
        buffer.push(sample)?;
        trace!(pair, price = %sample.price, len = buffer.len(), "Sample buffered");
        Ok(())
    }

    pub fn get(&self, pair: &str) -> Option<&SampleBuffer> {
        self.buffers.get(pair)
    }

    pub fn pairs(&self) -> impl Iterator<Item = &str> {
        self.buffers.keys().map(String::as_str)
    }
}

impl Default for InstrumentBuffers {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
