//! Hybrid grid / launch trading bot.
//!
//! Host application around the decision core:
//! - Price feed polling (replay file or live channel)
//! - Account facts and execution event reconciliation
//! - One evaluation cycle per tick through [`EngineContext`]
//! - Per-cycle performance log and periodic summary

pub mod account;
pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod ledger;

pub use account::{collect_facts, AccountProvider, OpenOrder, PaperAccount};
pub use app::Application;
pub use config::AppConfig;
pub use engine::{CycleInput, CycleOutcome, CycleStatus, EngineContext};
pub use error::{AppError, AppResult};
pub use feed::{ChannelFeed, FeedPoll, PriceFeed, ReplayFeed};
pub use ledger::{ExecutionEvent, LedgerTotals, TradeLedger};
