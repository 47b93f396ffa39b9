/// Smoothing factor for an EMA of the given span: 2 / (span + 1)
pub fn span_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Rolling simple moving average
///
/// An output is present only when every value in its window is present.
pub fn sma_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let mut sum = 0.0;
            for v in window {
                sum += (*v)?;
            }
            Some(sum / period as f64)
        })
        .collect()
}

/// Recursive exponential moving average
///
/// Seeded with the first present value and updated as
/// `prev * (1 - alpha) + x * alpha`. Missing inputs produce missing outputs
/// and leave the state untouched; an output is emitted once `min_periods`
/// values have been seen.
pub fn ema_series(values: &[Option<f64>], alpha: f64, min_periods: usize) -> Vec<Option<f64>> {
    let mut state: Option<f64> = None;
    let mut seen = 0usize;

    values
        .iter()
        .map(|value| {
            let x = (*value).filter(|x| x.is_finite())?;
            let next = match state {
                None => x,
                Some(prev) => prev * (1.0 - alpha) + x * alpha,
            };
            state = Some(next);
            seen += 1;

            if seen >= min_periods {
                Some(next)
            } else {
                None
            }
        })
        .collect()
}
