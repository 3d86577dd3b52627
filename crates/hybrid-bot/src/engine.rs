//! One evaluation cycle.
//!
//! ```text
//! sample ─▶ buffer ─▶ indicators ─▶ profile ─▶ risk gate ─▶ grid
//!                                                      └──▶ launch detector (only when can_trade)
//! ```
//!
//! The risk gate runs on every cycle, including cycles without a price,
//! against the last account facts that were successfully collected.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use hybrid_core::{Price, Sample};
use hybrid_detector::needle::WICK_LOOKBACK;
use hybrid_detector::{LaunchDecision, LaunchSignal, LaunchSignalDetector, ScanInput};
use hybrid_feed::{InstrumentBuffers, SampleBuffer};
use hybrid_grid::{GridPlan, GridPlanner, GridUpdate};
use hybrid_indicators::{IndicatorEngine, IndicatorSnapshot, MarketProfile, MarketProfileBuilder};
use hybrid_persistence::PerformanceRecord;
use hybrid_risk::{AccountFacts, EmergencyStopLatch, PositionSizer, RiskCheck, RiskGate, RiskState};
use hybrid_telemetry::Metrics;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::ledger::{ExecutionEvent, TradeLedger};

/// Inputs for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleInput {
    pub now: DateTime<Utc>,
    /// The cycle's single price snapshot. `None` skips analysis.
    pub sample: Option<Sample>,
    /// Fresh account facts. `None` reuses the last known facts.
    pub account: Option<AccountFacts>,
}

/// How far a cycle got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    Analyzed,
    NoPrice,
    InvalidSample,
    InsufficientData,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analyzed => "analyzed",
            Self::NoPrice => "no_price",
            Self::InvalidSample => "invalid_sample",
            Self::InsufficientData => "insufficient_data",
        }
    }
}

/// Everything a cycle produced.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub status: CycleStatus,
    pub snapshot: Option<IndicatorSnapshot>,
    pub profile: Option<MarketProfile>,
    pub grid: Option<GridUpdate>,
    /// Detector verdict; `None` when it was not consulted.
    pub launch: Option<LaunchDecision>,
    pub signal: Option<LaunchSignal>,
    pub risk: RiskState,
    /// `None` until the first price has been seen.
    pub record: Option<PerformanceRecord>,
}

/// Owns every component of the decision core.
#[derive(Debug)]
pub struct EngineContext {
    pair: String,
    buffers: InstrumentBuffers,
    indicators: IndicatorEngine,
    profile: MarketProfileBuilder,
    grid: GridPlanner,
    detector: LaunchSignalDetector,
    gate: RiskGate,
    ledger: TradeLedger,
    facts: AccountFacts,
    last_block: Option<RiskCheck>,
    cycles: u64,
}

impl EngineContext {
    /// Build every component from validated configuration.
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let gate = RiskGate::try_new(config.risk.clone())?;
        let sizer = PositionSizer::from_config(&config.risk);

        Ok(Self {
            pair: config.market.pair.clone(),
            buffers: InstrumentBuffers::new(config.engine.buffer_capacity),
            indicators: IndicatorEngine::new(config.indicators.clone()),
            profile: MarketProfileBuilder::new(config.profile.clone()),
            grid: GridPlanner::try_new(config.grid.clone())?,
            detector: LaunchSignalDetector::try_new(config.launch.clone(), sizer)?,
            gate,
            ledger: TradeLedger::new(config.paper.initial_balance),
            facts: AccountFacts::default(),
            last_block: None,
            cycles: 0,
        })
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn buffer(&self) -> Option<&SampleBuffer> {
        self.buffers.get(&self.pair)
    }

    pub fn grid_plan(&self) -> Option<&GridPlan> {
        self.grid.plan()
    }

    pub fn detector(&self) -> &LaunchSignalDetector {
        &self.detector
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    /// Shared handle to the emergency stop latch.
    pub fn latch(&self) -> Arc<EmergencyStopLatch> {
        self.gate.latch()
    }

    /// Last account facts the gate was evaluated against.
    pub fn facts(&self) -> AccountFacts {
        self.facts
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Reconcile an execution report.
    pub fn apply_event(&mut self, event: &ExecutionEvent, now: DateTime<Utc>) {
        self.ledger.apply(event, now);
    }

    /// Run one evaluation cycle.
    pub fn run_cycle(&mut self, input: CycleInput) -> CycleOutcome {
        let started = Instant::now();
        let now = input.now;
        self.cycles += 1;
        self.ledger.roll_day(now);

        let mut status = self.ingest(input.sample);
        let mut snapshot = None;
        let mut profile = None;

        if status == CycleStatus::Analyzed {
            if let Some(buffer) = self.buffers.get(&self.pair) {
                if let Some(price) = buffer.latest_price() {
                    self.detector.track(now, price);
                }
                match self.indicators.compute(buffer) {
                    Ok(s) => snapshot = Some(s),
                    Err(e) => {
                        debug!(error = %e, "Skipping analysis");
                        status = CycleStatus::InsufficientData;
                    }
                }
                profile = self.profile.maybe_refresh(buffer, now).cloned();
            }
        }

        let risk = self.evaluate_risk(input.account);

        let grid = snapshot
            .as_ref()
            .map(|s| self.grid.update(s, self.profile.current(), now));
        if let Some(update) = &grid {
            if let Some(plan) = update.new_plan() {
                let reason = match update {
                    GridUpdate::Built(_) => "initial",
                    _ => "rebalance",
                };
                Metrics::grid_rebuilt(reason, plan.level_count as usize);
            }
        }

        let launch = match &snapshot {
            Some(s) if risk.can_trade => Some(self.scan(now, s, risk.balance)),
            _ => None,
        };
        let signal = launch.as_ref().and_then(|d| d.signal().cloned());

        let record = self.build_record(now, snapshot.as_ref(), &risk, signal.as_ref());

        if let Some(s) = &snapshot {
            Metrics::market(
                s.price.to_f64(),
                s.atr.to_f64().unwrap_or(0.0),
                s.volatility_ratio,
            );
        }
        Metrics::cycle(status.as_str());
        Metrics::cycle_duration(started.elapsed().as_secs_f64() * 1000.0);

        CycleOutcome {
            status,
            snapshot,
            profile,
            grid,
            launch,
            signal,
            risk,
            record,
        }
    }

    fn ingest(&mut self, sample: Option<Sample>) -> CycleStatus {
        let Some(sample) = sample else {
            return CycleStatus::NoPrice;
        };
        match self.buffers.push(&self.pair, sample) {
            Ok(()) => CycleStatus::Analyzed,
            Err(e) => {
                warn!(error = %e, pair = %self.pair, "Sample rejected");
                CycleStatus::InvalidSample
            }
        }
    }

    fn evaluate_risk(&mut self, account: Option<AccountFacts>) -> RiskState {
        if let Some(facts) = account {
            self.facts = facts;
        }
        let state = self.gate.evaluate(&self.facts, &self.ledger.stats());

        if self.gate.latch_if_emergency(&state) {
            error!(
                drawdown_pct = %state.max_drawdown_pct,
                "Emergency drawdown latched; trading halted until reset"
            );
        }

        // Log only on block state changes
        if state.blocked_by != self.last_block {
            match (&state.blocked_by, &state.reason) {
                (Some(check), reason) => warn!(
                    gate = check.as_str(),
                    reason = reason.as_deref().unwrap_or_default(),
                    "Gate block started"
                ),
                (None, _) => info!("Trading allowed"),
            }
            self.last_block = state.blocked_by;
        }
        if let Some(check) = state.blocked_by {
            Metrics::gate_blocked(check.as_str());
        }
        Metrics::risk(
            state.portfolio_risk_pct.to_f64().unwrap_or(0.0),
            state.can_trade,
            self.gate.latch().is_triggered(),
        );

        state
    }

    fn scan(
        &mut self,
        now: DateTime<Utc>,
        snapshot: &IndicatorSnapshot,
        balance: Decimal,
    ) -> LaunchDecision {
        let recent: Vec<Price> = self
            .buffers
            .get(&self.pair)
            .map(|b| b.last_n(WICK_LOOKBACK).iter().map(|s| s.price).collect())
            .unwrap_or_default();

        let decision = self.detector.scan(&ScanInput {
            now,
            recent: &recent,
            snapshot,
            balance,
        });
        match &decision {
            LaunchDecision::Signal(signal) => {
                Metrics::signal_emitted(&signal.direction.to_string());
            }
            LaunchDecision::Rejected { direction, .. } => {
                Metrics::signal_rejected(&direction.to_string());
            }
            _ => {}
        }
        decision
    }

    fn build_record(
        &self,
        now: DateTime<Utc>,
        snapshot: Option<&IndicatorSnapshot>,
        risk: &RiskState,
        signal: Option<&LaunchSignal>,
    ) -> Option<PerformanceRecord> {
        let neutral;
        let snap = match snapshot {
            Some(s) => s,
            None => {
                let price = self.buffer()?.latest_price()?;
                neutral = IndicatorSnapshot::neutral(price, now);
                &neutral
            }
        };
        let totals = self.ledger.totals();

        Some(PerformanceRecord {
            timestamp: now,
            price: snap.price.inner(),
            atr: snap.atr,
            trend: snap.trend.signum(),
            bias: snap.bias.signum(),
            volatility_ratio: snap.volatility_ratio,
            rsi: snap.rsi,
            portfolio_risk_pct: risk.portfolio_risk_pct,
            active_trade_count: risk.active_trade_count,
            can_trade: risk.can_trade,
            restriction_reason: risk.reason.clone(),
            grid_trades: totals.grid_trades,
            grid_profit: totals.grid_profit,
            launch_trades: totals.launch_trades,
            launch_profit: totals.launch_profit,
            total_pnl: totals.total_pnl,
            daily_pnl: totals.daily_pnl,
            poc: self.profile.valid_profile().map(|p| p.poc.inner()),
            grid_base: self.grid.plan().map(|p| p.base_price.inner()),
            signal: signal.map(|s| s.direction.to_string()),
        })
    }
}
