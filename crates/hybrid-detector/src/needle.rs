//! Needle (wick rejection) measurements and confidence scoring.
//!
//! Samples carry a single close price, so the wick is approximated from the
//! last three closes: the extreme of those closes is the wick tip and the
//! last two closes form the body.

use hybrid_core::{Direction, Price, Trend};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::LaunchConfig;

const BASE_CONFIDENCE: f64 = 0.5;
const BIAS_AGREE_BONUS: f64 = 0.2;
const BIAS_DISAGREE_PENALTY: f64 = 0.1;
const VOLATILITY_BONUS: f64 = 0.2;
const VOLUME_BONUS: f64 = 0.1;

/// Number of closes the wick anchor looks back over.
pub const WICK_LOOKBACK: usize = 3;

/// Wick/body ratio of the latest move.
///
/// `Short` measures the upper wick (rejection at a high), `Long` the lower
/// wick. Returns 0 with fewer than two prices or a zero body.
pub fn wick_body_ratio(prices: &[Price], direction: Direction) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }
    let window = &prices[prices.len().saturating_sub(WICK_LOOKBACK)..];
    let last = prices[prices.len() - 1];
    let prev = prices[prices.len() - 2];

    let body = last.abs_diff(prev);
    if body.is_zero() {
        return 0.0;
    }

    let wick = match direction {
        Direction::Short => {
            let tip = window.iter().copied().max().unwrap_or(last);
            tip.inner() - last.max(prev).inner()
        }
        Direction::Long => {
            let tip = window.iter().copied().min().unwrap_or(last);
            last.min(prev).inner() - tip.inner()
        }
    };

    (wick.max(Decimal::ZERO) / body).to_f64().unwrap_or(0.0)
}

/// Whether the latest move points in the rejection direction: down for a
/// short at the high, up for a long at the low.
pub fn latest_move_agrees(prices: &[Price], direction: Direction) -> bool {
    match prices {
        [.., prev, last] => match direction {
            Direction::Short => last < prev,
            Direction::Long => last > prev,
        },
        _ => false,
    }
}

/// Confidence score in [0, 1].
///
/// Starts at 0.5. +0.2 when the bias agrees with the direction, -0.1 when it
/// opposes it, +0.2 when scaled volatility sits in the optimal band, +0.1
/// when the volume ratio exceeds the surge ratio.
pub fn confidence(
    direction: Direction,
    bias: Trend,
    volatility_ratio: f64,
    volume_ratio: f64,
    config: &LaunchConfig,
) -> f64 {
    let mut score = BASE_CONFIDENCE;

    match bias.signum() * direction.sign() {
        1 => score += BIAS_AGREE_BONUS,
        -1 => score -= BIAS_DISAGREE_PENALTY,
        _ => {}
    }

    let scaled = config.scaled_volatility(volatility_ratio);
    if (config.optimal_volatility_min..=config.optimal_volatility_max).contains(&scaled) {
        score += VOLATILITY_BONUS;
    }

    if volume_ratio > config.volume_surge_ratio {
        score += VOLUME_BONUS;
    }

    score.clamp(0.0, 1.0)
}
