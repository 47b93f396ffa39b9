use super::moving_average::{ema_series, span_alpha};

/// MACD histogram: MACD line (fast EMA - slow EMA) minus its signal EMA
///
/// Each EMA only reports once it has seen `span` values, so the first
/// histogram value lands at index `slow + signal - 2`.
pub fn macd_histogram(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<Option<f64>> {
    let values: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();

    let fast_ema = ema_series(&values, span_alpha(fast), fast);
    let slow_ema = ema_series(&values, span_alpha(slow), slow);

    let macd_line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal_line = ema_series(&macd_line, span_alpha(signal), signal);

    macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect()
}
