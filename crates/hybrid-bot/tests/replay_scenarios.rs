//! End-to-end replay scenarios.
//!
//! Each scenario writes a replay file, runs it through the application and
//! inspects the engine state and the performance log.

mod integration;
use integration::common::fixtures::{
    config, dec_field, flat, read_performance, utc, write_replay,
};

use chrono::Duration;
use hybrid_bot::feed::ReplayFeed;
use hybrid_bot::{Application, ExecutionEvent};
use hybrid_core::{OrderSide, Price, Size};
use hybrid_telemetry::metrics::PERSISTENCE_ERRORS_TOTAL;
use rust_decimal_macros::dec;

/// Flat replay builds the grid once analysis starts and logs every cycle.
#[test]
fn test_replay_builds_grid_and_logs_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("perf");
    let replay = write_replay(dir.path(), &flat(utc(2, 10, 0), 10, "2.55"));

    let mut app = Application::new(config(&data_dir)).unwrap();
    let mut feed = ReplayFeed::open(&replay).unwrap();
    app.run_replay(&mut feed).unwrap();

    let plan = app.engine().grid_plan().expect("grid built");
    assert_eq!(plan.base_price.inner(), dec!(2.55));
    assert_eq!(plan.buy_levels.len(), 8);
    assert_eq!(plan.sell_levels.len(), 8);

    let records = read_performance(&data_dir, "2026-03-02");
    assert_eq!(records.len(), 10);
    // Analysis starts at the sixth sample
    assert!(records[4]["grid_base"].is_null());
    assert_eq!(dec_field(&records[5], "grid_base"), dec!(2.55));
    assert_eq!(dec_field(&records[9], "price"), dec!(2.55));
    assert_eq!(records[9]["can_trade"], true);
    assert!(records[9]["signal"].is_null());
}

/// A balance under the minimum blocks trading on every cycle, but the grid
/// plan and the log keep running.
#[test]
fn test_low_balance_blocks_trading() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("perf");
    let replay = write_replay(dir.path(), &flat(utc(2, 10, 0), 8, "2.55"));

    let mut cfg = config(&data_dir);
    cfg.paper.initial_balance = dec!(20);
    let mut app = Application::new(cfg).unwrap();
    let mut feed = ReplayFeed::open(&replay).unwrap();
    app.run_replay(&mut feed).unwrap();

    assert!(app.engine().grid_plan().is_some());
    assert_eq!(app.signal_count(), 0);

    let records = read_performance(&data_dir, "2026-03-02");
    assert_eq!(records.len(), 8);
    for record in &records {
        assert_eq!(record["can_trade"], false);
        let reason = record["restriction_reason"].as_str().unwrap();
        assert!(reason.starts_with("Balance below minimum"), "{reason}");
    }
}

/// A reported loss that breaches the drawdown limit latches the emergency
/// stop; later cycles are blocked by the latch itself.
#[test]
fn test_emergency_drawdown_latches() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("perf");
    let replay = write_replay(dir.path(), &flat(utc(2, 10, 0), 3, "2.55"));

    let mut cfg = config(&data_dir);
    // Leave room so the drawdown check is the one that trips
    cfg.risk.daily_loss_limit = dec!(0.9);
    let mut app = Application::new(cfg).unwrap();

    app.event_sender()
        .try_send(ExecutionEvent::GridFill {
            side: OrderSide::Sell,
            price: Price::new(dec!(2.55)),
            size: Size::new(dec!(100)),
            profit: dec!(-300),
        })
        .unwrap();

    let mut feed = ReplayFeed::open(&replay).unwrap();
    app.run_replay(&mut feed).unwrap();

    assert!(app.engine().latch().is_triggered());
    assert_eq!(app.account().balance(), dec!(700));

    let records = read_performance(&data_dir, "2026-03-02");
    let first = records[0]["restriction_reason"].as_str().unwrap();
    assert!(first.starts_with("Emergency drawdown"), "{first}");
    let last = records[2]["restriction_reason"].as_str().unwrap();
    assert!(last.starts_with("Emergency stop active"), "{last}");
    assert_eq!(dec_field(&records[2], "total_pnl"), dec!(-300));
}

/// A needle rejecting the session high after the window closes emits one
/// short signal.
#[test]
fn test_short_signal_after_session() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("perf");

    let mut points = flat(utc(2, 0, 0), 6, "2.55");
    points.extend([
        // Launch window 01:00-03:00
        (utc(2, 1, 0), "2.50"),
        (utc(2, 1, 30), "2.60"),
        (utc(2, 2, 0), "2.55"),
        (utc(2, 2, 30), "2.56"),
        // Window closed
        (utc(2, 3, 0), "2.56"),
        (utc(2, 3, 10), "2.599"),
        (utc(2, 3, 20), "2.596"),
        (utc(2, 3, 30), "2.5955"),
    ]);
    let replay = write_replay(dir.path(), &points);

    let mut app = Application::new(config(&data_dir)).unwrap();
    let mut feed = ReplayFeed::open(&replay).unwrap();
    app.run_replay(&mut feed).unwrap();

    assert_eq!(app.signal_count(), 1);
    assert_eq!(app.engine().detector().trade_count(), 1);
    assert_eq!(
        app.engine().detector().last_signal_time(),
        Some(utc(2, 3, 30))
    );

    let records = read_performance(&data_dir, "2026-03-02");
    let signals: Vec<_> = records
        .iter()
        .filter_map(|r| r["signal"].as_str())
        .collect();
    assert_eq!(signals, vec!["short"]);
    assert_eq!(records.last().unwrap()["signal"], "short");
}

/// Cycles after midnight go to the next day's file and start a fresh
/// daily PnL.
#[test]
fn test_performance_file_rotates_at_midnight() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("perf");
    let start = utc(2, 23, 30);
    let points: Vec<_> = (0..4)
        .map(|i| (start + Duration::minutes(10 * i), "2.55"))
        .collect();
    let replay = write_replay(dir.path(), &points);

    let mut app = Application::new(config(&data_dir)).unwrap();
    app.event_sender()
        .try_send(ExecutionEvent::GridFill {
            side: OrderSide::Sell,
            price: Price::new(dec!(2.56)),
            size: Size::new(dec!(10)),
            profit: dec!(1.5),
        })
        .unwrap();

    let mut feed = ReplayFeed::open(&replay).unwrap();
    app.run_replay(&mut feed).unwrap();

    let day1 = read_performance(&data_dir, "2026-03-02");
    let day2 = read_performance(&data_dir, "2026-03-03");
    assert_eq!(day1.len(), 3);
    assert_eq!(day2.len(), 1);
    assert_eq!(dec_field(&day1[0], "daily_pnl"), dec!(1.5));
    assert_eq!(dec_field(&day2[0], "daily_pnl"), dec!(0));
    assert_eq!(dec_field(&day2[0], "total_pnl"), dec!(1.5));
}

/// Losing the log directory mid-run costs the records, not the cycles.
#[test]
fn test_log_write_failure_does_not_stop_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("perf");
    let replay = write_replay(dir.path(), &flat(utc(2, 10, 0), 10, "2.55"));

    let mut app = Application::new(config(&data_dir)).unwrap();
    std::fs::remove_dir_all(&data_dir).unwrap();

    let errors_before = PERSISTENCE_ERRORS_TOTAL.get();
    let mut feed = ReplayFeed::open(&replay).unwrap();
    app.run_replay(&mut feed).unwrap();

    assert_eq!(app.engine().cycles(), 10);
    assert!(app.engine().grid_plan().is_some());
    assert!(PERSISTENCE_ERRORS_TOTAL.get() > errors_before);
    assert!(!data_dir.exists());
}
