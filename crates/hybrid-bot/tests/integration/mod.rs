//! Integration tests for hybrid-bot.
//!
//! These tests drive the application end to end:
//! - Replay files through the full cycle
//! - Risk blocks and the emergency latch
//! - Launch signals and the performance log

pub mod common;
