//! Periodic summary of the counters.
//!
//! Logs cycle outcomes, emitted signals and risk blocks accumulated since
//! the previous report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use prometheus::core::Collector;
use prometheus::CounterVec;
use serde::Serialize;
use tracing::info;

use crate::metrics::{CYCLES_TOTAL, GATE_BLOCKED_TOTAL, SIGNALS_TOTAL};

/// Counter deltas for one reporting period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleSummary {
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub cycles: BTreeMap<String, u64>,
    pub signals: BTreeMap<String, u64>,
    pub gate_blocks: BTreeMap<String, u64>,
}

impl CycleSummary {
    pub fn total_cycles(&self) -> u64 {
        self.cycles.values().sum()
    }

    pub fn total_signals(&self) -> u64 {
        self.signals.values().sum()
    }
}

/// Emits a [`CycleSummary`] on demand.
pub struct SummaryReporter {
    period_start: DateTime<Utc>,
    last_cycles: BTreeMap<String, u64>,
    last_signals: BTreeMap<String, u64>,
    last_blocks: BTreeMap<String, u64>,
}

impl SummaryReporter {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            period_start: now,
            last_cycles: counter_values(&CYCLES_TOTAL),
            last_signals: counter_values(&SIGNALS_TOTAL),
            last_blocks: counter_values(&GATE_BLOCKED_TOTAL),
        }
    }

    pub fn period_start(&self) -> DateTime<Utc> {
        self.period_start
    }

    /// Close the current period and start a new one at `now`.
    pub fn take(&mut self, now: DateTime<Utc>) -> CycleSummary {
        let cycles = counter_values(&CYCLES_TOTAL);
        let signals = counter_values(&SIGNALS_TOTAL);
        let blocks = counter_values(&GATE_BLOCKED_TOTAL);

        let summary = CycleSummary {
            period_start: Some(self.period_start),
            period_end: Some(now),
            cycles: delta(&cycles, &self.last_cycles),
            signals: delta(&signals, &self.last_signals),
            gate_blocks: delta(&blocks, &self.last_blocks),
        };

        self.period_start = now;
        self.last_cycles = cycles;
        self.last_signals = signals;
        self.last_blocks = blocks;
        summary
    }

    /// Take the period summary and log it.
    pub fn report(&mut self, now: DateTime<Utc>) -> CycleSummary {
        let summary = self.take(now);
        let minutes = (now - self.period_start_of(&summary)).num_minutes();

        info!("========== Cycle Summary ==========");
        info!(
            minutes,
            cycles = summary.total_cycles(),
            signals = summary.total_signals(),
            "Period totals"
        );
        for (outcome, count) in &summary.cycles {
            info!(outcome = %outcome, count, "Cycles");
        }
        for (direction, count) in &summary.signals {
            info!(direction = %direction, count, "Signals");
        }
        for (check, count) in &summary.gate_blocks {
            info!(check = %check, count, "Risk blocks");
        }
        info!("===================================");
        summary
    }

    fn period_start_of(&self, summary: &CycleSummary) -> DateTime<Utc> {
        summary.period_start.unwrap_or(self.period_start)
    }
}

/// Current value of every label set of a single-label counter.
fn counter_values(counter: &CounterVec) -> BTreeMap<String, u64> {
    let mut values = BTreeMap::new();
    for mf in counter.collect() {
        for m in mf.get_metric() {
            let label = m
                .get_label()
                .first()
                .map(|l| l.get_value().to_string())
                .unwrap_or_default();
            values.insert(label, m.get_counter().get_value() as u64);
        }
    }
    values
}

fn delta(
    current: &BTreeMap<String, u64>,
    previous: &BTreeMap<String, u64>,
) -> BTreeMap<String, u64> {
    current
        .iter()
        .filter_map(|(label, &value)| {
            let diff = value.saturating_sub(previous.get(label).copied().unwrap_or(0));
            (diff > 0).then(|| (label.clone(), diff))
        })
        .collect()
}
