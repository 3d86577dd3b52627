//! Main application orchestration.
//!
//! Drives the [`EngineContext`] once per cycle:
//! - Drains execution events into the ledger and the paper account
//! - Collects account facts
//! - Polls the price feed
//! - Appends the performance record
//! - Periodic summary of the counters

use std::time::Duration;

use chrono::{DateTime, Utc};
use hybrid_core::Sample;
use hybrid_persistence::PerformanceWriter;
use hybrid_telemetry::{Metrics, SummaryReporter};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::account::{collect_facts, PaperAccount};
use crate::config::AppConfig;
use crate::engine::{CycleInput, CycleOutcome, EngineContext};
use crate::error::AppResult;
use crate::feed::{FeedPoll, PriceFeed};
use crate::ledger::ExecutionEvent;

/// Main application.
pub struct Application {
    config: AppConfig,
    engine: EngineContext,
    account: PaperAccount,
    writer: Option<PerformanceWriter>,
    summary: SummaryReporter,
    event_tx: mpsc::Sender<ExecutionEvent>,
    event_rx: mpsc::Receiver<ExecutionEvent>,
    signal_count: u64,
}

impl Application {
    /// Create a new application from validated configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let engine = EngineContext::new(&config)?;
        let account = PaperAccount::new(
            config.market.quote_asset.clone(),
            config.paper.initial_balance,
        );
        let writer = if config.persistence.enabled {
            Some(PerformanceWriter::new(
                &config.persistence.data_dir,
                config.persistence.buffer_size,
            )?)
        } else {
            None
        };
        let (event_tx, event_rx) = mpsc::channel(config.engine.event_channel_capacity);

        Ok(Self {
            config,
            engine,
            account,
            writer,
            summary: SummaryReporter::new(Utc::now()),
            event_tx,
            event_rx,
            signal_count: 0,
        })
    }

    /// Sender for execution reports. Events are applied at the start of the
    /// next cycle.
    pub fn event_sender(&self) -> mpsc::Sender<ExecutionEvent> {
        self.event_tx.clone()
    }

    pub fn engine(&self) -> &EngineContext {
        &self.engine
    }

    pub fn account(&self) -> &PaperAccount {
        &self.account
    }

    pub fn signal_count(&self) -> u64 {
        self.signal_count
    }

    /// Run one cycle at `now`.
    ///
    /// A failed performance log write is logged and counted; the cycle
    /// outcome is returned regardless.
    pub fn step(&mut self, now: DateTime<Utc>, sample: Option<Sample>) -> CycleOutcome {
        self.drain_events(now);

        let facts = match collect_facts(
            &self.account,
            &self.config.market.pair,
            &self.config.market.quote_asset,
        ) {
            Ok(facts) => Some(facts),
            Err(e) => {
                warn!(error = %e, "Account facts unavailable, using last known");
                None
            }
        };

        let outcome = self.engine.run_cycle(CycleInput {
            now,
            sample,
            account: facts,
        });

        if let Some(signal) = &outcome.signal {
            self.signal_count += 1;
            info!(
                signal_id = %signal.signal_id.as_str(),
                direction = %signal.direction,
                entry = %signal.entry_price,
                stop_loss = %signal.stop_loss,
                take_profit = %signal.take_profit,
                size = %signal.size,
                confidence = signal.confidence,
                reward_risk = ?signal.reward_risk().map(|r| r.round_dp(2).to_string()),
                count = self.signal_count,
                "Launch signal"
            );
        }
        if let Some(grid) = &outcome.grid {
            debug!(update = grid.label(), "Grid cycle");
        }

        if let (Some(writer), Some(record)) = (self.writer.as_mut(), &outcome.record) {
            if let Err(e) = writer.append(record.clone()) {
                Metrics::persistence_error();
                warn!(
                    error = %e,
                    pending = writer.pending(),
                    "Failed to write performance log"
                );
            }
        }

        outcome
    }

    /// Replay a finite feed. Sample timestamps are the cycle clock.
    pub fn run_replay(&mut self, feed: &mut dyn PriceFeed) -> AppResult<()> {
        info!(pair = %self.config.market.pair, "Starting replay");

        let interval = i64::try_from(self.config.engine.summary_interval_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX);
        let mut clock: Option<DateTime<Utc>> = None;

        loop {
            match feed.poll(&self.config.market.pair) {
                FeedPoll::Tick(sample) => {
                    let now = sample.timestamp;
                    if clock.is_none() {
                        self.summary = SummaryReporter::new(now);
                    }
                    clock = Some(now);
                    self.step(now, Some(sample));

                    if now - self.summary.period_start() >= interval {
                        self.summary.report(now);
                    }
                }
                FeedPoll::NoPrice => {
                    if let Some(now) = clock {
                        self.step(now, None);
                    }
                }
                FeedPoll::Exhausted => break,
            }
        }

        self.shutdown(clock.unwrap_or_else(Utc::now));
        Ok(())
    }

    /// Run against a live feed on a fixed tick until the feed closes or
    /// Ctrl-C is received.
    pub async fn run_live(&mut self, feed: &mut dyn PriceFeed) -> AppResult<()> {
        info!(
            pair = %self.config.market.pair,
            tick_interval_ms = self.config.engine.tick_interval_ms,
            "Entering main event loop"
        );

        let mut tick =
            tokio::time::interval(Duration::from_millis(self.config.engine.tick_interval_ms));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let summary_period = Duration::from_secs(self.config.engine.summary_interval_secs);
        let mut summary_interval =
            tokio::time::interval_at(tokio::time::Instant::now() + summary_period, summary_period);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let now = Utc::now();
                    match feed.poll(&self.config.market.pair) {
                        FeedPoll::Tick(sample) => {
                            self.step(now, Some(sample));
                        }
                        FeedPoll::NoPrice => {
                            self.step(now, None);
                        }
                        FeedPoll::Exhausted => {
                            info!("Price feed closed");
                            break;
                        }
                    }
                }

                _ = summary_interval.tick() => {
                    info!("Outputting periodic statistics summary");
                    self.summary.report(Utc::now());
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.shutdown(Utc::now());
        Ok(())
    }

    fn drain_events(&mut self, now: DateTime<Utc>) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.account.credit(event.pnl());
            self.engine.apply_event(&event, now);
        }
    }

    fn shutdown(&mut self, now: DateTime<Utc>) {
        let totals = self.engine.ledger().totals();
        info!(
            cycles = self.engine.cycles(),
            signals = self.signal_count,
            total_trades = totals.total_trades,
            total_pnl = %totals.total_pnl,
            win_rate = totals.win_rate(),
            max_drawdown_pct = %totals.max_drawdown_pct,
            "Shutting down"
        );

        info!("Final statistics summary:");
        self.summary.report(now);

        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.close() {
                Metrics::persistence_error();
                warn!(error = %e, lost = writer.pending(), "Failed to close performance log");
            }
        }

        match Metrics::render() {
            Ok(text) => debug!(metrics = %text, "Final metrics"),
            Err(e) => warn!(error = %e, "Failed to render metrics"),
        }
    }
}
