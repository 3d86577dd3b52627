//! Series math shared by the indicator engine.
//!
//! Price-valued results stay in `Decimal`; oscillators and ratios are `f64`.
//! Every function returns `None` when the input is too short for the period.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Substitute for a zero average loss in RSI.
pub const RSI_LOSS_EPSILON: f64 = 1e-10;

/// Simple moving average of the last `period` values.
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let sum: Decimal = values[values.len() - period..].iter().sum();
    Some(sum / Decimal::from(period))
}

/// Exponential moving average over the whole series.
///
/// `alpha = 2 / (period + 1)`, seeded with the first value.
pub fn ema(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 {
        return None;
    }
    let (first, rest) = values.split_first()?;
    let alpha = Decimal::TWO / Decimal::from(period + 1);
    let keep = Decimal::ONE - alpha;
    Some(rest.iter().fold(*first, |acc, v| alpha * *v + keep * acc))
}

/// Average true range from close-only prices.
///
/// True range of a step is `|p[t] - p[t-1]|`; ATR is the simple mean of the
/// last `period` true ranges.
pub fn average_true_range(prices: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }
    let tail = &prices[prices.len() - (period + 1)..];
    let sum: Decimal = tail.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    Some(sum / Decimal::from(period))
}

/// Wilder RSI over the whole series.
///
/// Averages are seeded with the simple mean of the first `period` changes
/// and then smoothed. A zero average loss is replaced by
/// [`RSI_LOSS_EPSILON`]; a series with no movement at all reads 50.
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let p = period as f64;

    let (seed, rest) = changes.split_at(period);
    let mut avg_gain = seed.iter().map(|c| c.max(0.0)).sum::<f64>() / p;
    let mut avg_loss = seed.iter().map(|c| (-c).max(0.0)).sum::<f64>() / p;

    for c in rest {
        avg_gain = (avg_gain * (p - 1.0) + c.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-c).max(0.0)) / p;
    }

    if avg_gain == 0.0 && avg_loss == 0.0 {
        return Some(50.0);
    }

    let loss = if avg_loss > 0.0 {
        avg_loss
    } else {
        RSI_LOSS_EPSILON
    };
    let rs = avg_gain / loss;
    Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
}

/// Rate of change over `period` steps: `(p[t] - p[t-period]) / p[t-period]`.
pub fn momentum(prices: &[Decimal], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }
    let last = prices[prices.len() - 1];
    let base = prices[prices.len() - 1 - period];
    if base.is_zero() {
        return None;
    }
    ((last - base) / base).to_f64()
}

/// Last value over the mean of the last `period` values. 1.0 when the mean is zero.
pub fn last_over_mean(values: &[Decimal], period: usize) -> Option<f64> {
    let mean = sma(values, period)?;
    let last = *values.last()?;
    if mean.is_zero() {
        return Some(1.0);
    }
    (last / mean).to_f64()
}

/// Bollinger band width `4σ / mean` over the last `period` values
/// (bands at ±2 population standard deviations).
pub fn bollinger_width(values: &[Decimal], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let tail: Vec<f64> = values[values.len() - period..]
        .iter()
        .map(|v| v.to_f64().unwrap_or(0.0))
        .collect();
    let n = tail.len() as f64;
    let mean = tail.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return Some(0.0);
    }
    let variance = tail.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(4.0 * variance.sqrt() / mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sma() {
        let values = [dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)];
        assert_eq!(sma(&values, 5), Some(dec!(3)));
        assert_eq!(sma(&values, 2), Some(dec!(4.5)));
        assert_eq!(sma(&values, 6), None);
        assert_eq!(sma(&values, 0), None);
    }

    #[test]
    fn test_ema_constant_series() {
        let values = vec![dec!(2.5); 30];
        let e = ema(&values, 12).unwrap();
        assert!((e - dec!(2.5)).abs() < dec!(0.0000001));
        assert_eq!(ema(&[], 12), None);
    }

    #[test]
    fn test_ema_step() {
        // alpha = 2 / (3 + 1) = 0.5
        let values = [dec!(10), dec!(20), dec!(20)];
        assert_eq!(ema(&values, 3), Some(dec!(17.5)));
    }

    #[test]
    fn test_atr_close_only() {
        let prices = [dec!(10), dec!(11), dec!(10), dec!(12)];
        // |11-10| + |10-11| + |12-10| = 4, over 3
        let atr = average_true_range(&prices, 3).unwrap();
        assert_eq!(atr.round_dp(6), dec!(1.333333));

        // Only the last 2 steps: 1 + 2 = 3, over 2
        assert_eq!(average_true_range(&prices, 2), Some(dec!(1.5)));
        assert_eq!(average_true_range(&prices, 4), None);
    }

    #[test]
    fn test_rsi_bounds_for_monotonic_series() {
        let up: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let down: Vec<f64> = (0..60).map(|i| 100.0 - i as f64).collect();

        let r_up = rsi(&up, 14).unwrap();
        let r_down = rsi(&down, 14).unwrap();

        assert!(r_up > 99.999 && r_up <= 100.0, "rsi up = {r_up}");
        assert_eq!(r_down, 0.0);
    }

    #[test]
    fn test_rsi_flat_series_is_neutral() {
        let flat = vec![2.5; 30];
        assert_eq!(rsi(&flat, 14), Some(50.0));
    }

    #[test]
    fn test_rsi_balanced_series() {
        // Alternating +1 / -1: equal average gain and loss
        let prices: Vec<f64> = (0..15).map(|i| if i % 2 == 0 { 10.0 } else { 11.0 }).collect();
        let r = rsi(&prices, 14).unwrap();
        assert!((r - 50.0).abs() < 1e-9, "rsi = {r}");
    }

    #[test]
    fn test_rsi_too_short() {
        assert_eq!(rsi(&[1.0, 2.0], 14), None);
    }

    #[test]
    fn test_momentum() {
        let prices = [dec!(100), dec!(101), dec!(102), dec!(110)];
        let m = momentum(&prices, 3).unwrap();
        assert!((m - 0.10).abs() < 1e-12);
        assert_eq!(momentum(&prices, 4), None);
    }

    #[test]
    fn test_last_over_mean() {
        let volumes = [dec!(100), dec!(100), dec!(100), dec!(300)];
        let r = last_over_mean(&volumes, 4).unwrap();
        assert!((r - 2.0).abs() < 1e-12);

        let zeros = [dec!(0), dec!(0)];
        assert_eq!(last_over_mean(&zeros, 2), Some(1.0));
    }

    #[test]
    fn test_bollinger_width() {
        let flat = vec![dec!(2.5); 20];
        assert_eq!(bollinger_width(&flat, 20), Some(0.0));

        // mean 10, population sigma 1
        let values = [dec!(9), dec!(11), dec!(9), dec!(11)];
        let w = bollinger_width(&values, 4).unwrap();
        assert!((w - 0.4).abs() < 1e-12);
    }
}
