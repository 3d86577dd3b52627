//! Prometheus metrics for the hybrid bot.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_int_counter,
    register_int_gauge, CounterVec, Encoder, Gauge, Histogram, IntCounter, IntGauge, TextEncoder,
};

use crate::error::TelemetryResult;

/// Evaluation cycles by outcome.
/// Labels: outcome (analyzed/no_price/insufficient_data/invalid_sample)
pub static CYCLES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hybrid_cycles_total",
        "Total evaluation cycles by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Launch signals emitted.
pub static SIGNALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hybrid_signals_total",
        "Total launch signals emitted",
        &["direction"]
    )
    .unwrap()
});

/// Launch patterns found but not emitted.
pub static SIGNALS_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hybrid_signals_rejected_total",
        "Launch patterns rejected at validation",
        &["direction"]
    )
    .unwrap()
});

/// Cycles blocked by a risk check.
pub static GATE_BLOCKED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hybrid_gate_blocked_total",
        "Total cycles blocked by a risk check",
        &["check"]
    )
    .unwrap()
});

/// Grid builds.
/// Labels: reason (initial/rebalance)
pub static GRID_REBUILD_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hybrid_grid_rebuild_total",
        "Total grid builds by reason",
        &["reason"]
    )
    .unwrap()
});

/// Performance log writes that failed. The cycle itself still completes.
pub static PERSISTENCE_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "hybrid_persistence_errors_total",
        "Failed performance log writes"
    )
    .unwrap()
});

pub static PRICE: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("hybrid_price", "Cycle price snapshot").unwrap());

pub static ATR: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("hybrid_atr", "Average true range").unwrap());

pub static VOLATILITY_RATIO: Lazy<Gauge> =
    Lazy::new(|| register_gauge!("hybrid_volatility_ratio", "ATR divided by price").unwrap());

pub static PORTFOLIO_RISK_PCT: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "hybrid_portfolio_risk_pct",
        "Exposure as a percentage of balance"
    )
    .unwrap()
});

/// 1 when new risk may be taken.
pub static CAN_TRADE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("hybrid_can_trade", "Risk gate state (1=trading allowed)").unwrap()
});

pub static EMERGENCY_STOP: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "hybrid_emergency_stop",
        "Emergency stop latch (1=triggered)"
    )
    .unwrap()
});

pub static GRID_LEVELS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("hybrid_grid_levels", "Levels per side in the active grid").unwrap()
});

/// Cycle processing time in milliseconds.
pub static CYCLE_DURATION_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "hybrid_cycle_duration_ms",
        "Evaluation cycle duration in milliseconds",
        vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    pub fn cycle(outcome: &str) {
        CYCLES_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn cycle_duration(duration_ms: f64) {
        CYCLE_DURATION_MS.observe(duration_ms);
    }

    pub fn signal_emitted(direction: &str) {
        SIGNALS_TOTAL.with_label_values(&[direction]).inc();
    }

    pub fn signal_rejected(direction: &str) {
        SIGNALS_REJECTED_TOTAL.with_label_values(&[direction]).inc();
    }

    pub fn gate_blocked(check: &str) {
        GATE_BLOCKED_TOTAL.with_label_values(&[check]).inc();
    }

    pub fn grid_rebuilt(reason: &str, levels: usize) {
        GRID_REBUILD_TOTAL.with_label_values(&[reason]).inc();
        GRID_LEVELS.set(levels as i64);
    }

    pub fn persistence_error() {
        PERSISTENCE_ERRORS_TOTAL.inc();
    }

    /// Update the per-cycle market gauges.
    pub fn market(price: f64, atr: f64, volatility_ratio: f64) {
        PRICE.set(price);
        ATR.set(atr);
        VOLATILITY_RATIO.set(volatility_ratio);
    }

    pub fn risk(portfolio_risk_pct: f64, can_trade: bool, emergency_stop: bool) {
        PORTFOLIO_RISK_PCT.set(portfolio_risk_pct);
        CAN_TRADE.set(i64::from(can_trade));
        EMERGENCY_STOP.set(i64::from(emergency_stop));
    }

    /// Text exposition of every registered metric.
    pub fn render() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
