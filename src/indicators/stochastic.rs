use super::moving_average::sma_series;

/// Stochastic %K: where the close sits inside the rolling high/low range, 0-100
///
/// A flat range (highest high == lowest low) has no defined position and
/// yields `None` for that bar.
pub fn stochastic_k(highs: &[f64], lows: &[f64], closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let len = closes.len().min(highs.len()).min(lows.len());

    (0..len)
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let start = i + 1 - window;
            let highest = highs[start..=i].iter().copied().fold(f64::MIN, f64::max);
            let lowest = lows[start..=i].iter().copied().fold(f64::MAX, f64::min);

            let k = 100.0 * (closes[i] - lowest) / (highest - lowest);
            k.is_finite().then_some(k)
        })
        .collect()
}

/// Stochastic %D: simple moving average of %K
pub fn stochastic_d(k: &[Option<f64>], smooth: usize) -> Vec<Option<f64>> {
    sma_series(k, smooth)
}
