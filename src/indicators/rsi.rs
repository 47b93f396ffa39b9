use super::moving_average::ema_series;

/// Relative Strength Index over a whole price series
///
/// Gains and losses are Wilder-smoothed (alpha = 1 / period). The first bar
/// contributes a zero change, so the first value appears at index `period - 1`.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
pub fn rsi_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; prices.len()];
    }

    let mut gains = Vec::with_capacity(prices.len());
    let mut losses = Vec::with_capacity(prices.len());

    for i in 0..prices.len() {
        let change = if i == 0 { 0.0 } else { prices[i] - prices[i - 1] };
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }

    let alpha = 1.0 / period as f64;
    let avg_gains = ema_series(&gains, alpha, period);
    let avg_losses = ema_series(&losses, alpha, period);

    avg_gains
        .iter()
        .zip(avg_losses.iter())
        .map(|(gain, loss)| {
            let (gain, loss) = ((*gain)?, (*loss)?);
            if loss == 0.0 {
                return Some(100.0);
            }
            let rs = gain / loss;
            Some(100.0 - (100.0 / (1.0 + rs)))
        })
        .collect()
}
