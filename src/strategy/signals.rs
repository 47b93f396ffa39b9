use serde::{Deserialize, Serialize};

use crate::indicators::{IndicatorFrame, IndicatorRow};

/// Configuration for the oversold-recovery entry rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// How many rows back (in addition to the current one) an oversold reading still counts
    pub lags: usize,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    pub rsi_threshold: f64,
    pub macd_threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            lags: 6,
            stoch_oversold: 20.0,
            stoch_overbought: 80.0,
            rsi_threshold: 50.0,
            macd_threshold: 0.0,
        }
    }
}

/// Per-row evaluation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalState {
    pub triggered: bool,
    pub buy: bool,
}

fn is_oversold(row: &IndicatorRow, config: &SignalConfig) -> bool {
    row.stoch_k < config.stoch_oversold && row.stoch_d < config.stoch_oversold
}

fn in_neutral_band(value: f64, config: &SignalConfig) -> bool {
    (config.stoch_oversold..=config.stoch_overbought).contains(&value)
}

/// True if %K and %D were both oversold at row `index` or any of the `lags` rows before it
///
/// Offsets reaching before the first row are skipped.
pub fn trigger_at(frame: &IndicatorFrame, index: usize, config: &SignalConfig) -> bool {
    let rows = frame.rows();
    if index >= rows.len() {
        return false;
    }

    let start = index.saturating_sub(config.lags);
    rows[start..=index].iter().any(|row| is_oversold(row, config))
}

/// Full buy rule at row `index`: recent oversold trigger, stochastic back in the
/// neutral band, RSI above threshold and positive MACD momentum
pub fn buy_at(frame: &IndicatorFrame, index: usize, config: &SignalConfig) -> bool {
    evaluate_at(frame, index, config).buy
}

fn evaluate_at(frame: &IndicatorFrame, index: usize, config: &SignalConfig) -> SignalState {
    let Some(row) = frame.get(index) else {
        return SignalState::default();
    };

    let triggered = trigger_at(frame, index, config);
    let buy = triggered
        && in_neutral_band(row.stoch_k, config)
        && in_neutral_band(row.stoch_d, config)
        && row.rsi > config.rsi_threshold
        && row.macd_hist > config.macd_threshold;

    SignalState { triggered, buy }
}

/// Evaluate every row of the frame
pub fn evaluate(frame: &IndicatorFrame, config: &SignalConfig) -> Vec<SignalState> {
    (0..frame.len())
        .map(|i| evaluate_at(frame, i, config))
        .collect()
}

/// Buy decision at the most recent row; an empty frame never buys
pub fn latest_buy(frame: &IndicatorFrame, config: &SignalConfig) -> bool {
    match frame.len() {
        0 => false,
        n => buy_at(frame, n - 1, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn row(stoch_k: f64, stoch_d: f64, rsi: f64, macd_hist: f64) -> IndicatorRow {
        IndicatorRow {
            timestamp: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            close: 1.0,
            stoch_k,
            stoch_d,
            rsi,
            macd_hist,
        }
    }

    fn neutral() -> IndicatorRow {
        row(50.0, 50.0, 45.0, -0.1)
    }

    fn oversold() -> IndicatorRow {
        row(10.0, 15.0, 30.0, -0.5)
    }

    /// Oversold dip followed by `gap` neutral rows, then `last`
    fn frame_with(gap: usize, last: IndicatorRow) -> IndicatorFrame {
        let mut rows = vec![neutral(), oversold()];
        rows.extend(std::iter::repeat(neutral()).take(gap));
        rows.push(last);
        IndicatorFrame::from_rows(rows)
    }

    fn confirmed() -> IndicatorRow {
        row(35.0, 30.0, 55.0, 0.02)
    }

    #[test]
    fn test_buy_after_recovery() {
        let frame = frame_with(2, confirmed());
        assert!(latest_buy(&frame, &SignalConfig::default()));
    }

    #[test]
    fn test_trigger_expires_after_lags() {
        let config = SignalConfig::default();

        // Oversold row sits exactly `lags` rows back: still inside the window
        let frame = frame_with(5, confirmed());
        assert!(trigger_at(&frame, frame.len() - 1, &config));

        // One more row and it falls out
        let frame = frame_with(6, confirmed());
        assert!(!trigger_at(&frame, frame.len() - 1, &config));
        assert!(!latest_buy(&frame, &config));
    }

    #[test]
    fn test_trigger_requires_both_lines_oversold() {
        let rows = vec![row(10.0, 25.0, 30.0, -0.5), confirmed()];
        let frame = IndicatorFrame::from_rows(rows);
        assert!(!trigger_at(&frame, 1, &SignalConfig::default()));
    }

    #[test]
    fn test_short_frame_uses_available_rows() {
        let frame = IndicatorFrame::from_rows(vec![oversold(), confirmed()]);
        let states = evaluate(&frame, &SignalConfig::default());

        assert_eq!(states.len(), 2);
        assert!(states[0].triggered);
        assert!(!states[0].buy);
        assert!(states[1].buy);
    }

    #[test]
    fn test_empty_frame_never_buys() {
        assert!(!latest_buy(&IndicatorFrame::default(), &SignalConfig::default()));
        assert!(!trigger_at(&IndicatorFrame::default(), 0, &SignalConfig::default()));
    }

    #[test]
    fn test_all_boundaries_at_once_do_not_buy() {
        // %K/%D = 20 are inside the band, but RSI = 50 and MACD = 0 fail the strict checks
        let frame = frame_with(0, row(20.0, 20.0, 50.0, 0.0));
        assert!(!latest_buy(&frame, &SignalConfig::default()));
    }

    #[test]
    fn test_stochastic_band_is_inclusive() {
        let config = SignalConfig::default();
        assert!(latest_buy(&frame_with(0, row(20.0, 30.0, 55.0, 0.1)), &config));
        assert!(latest_buy(&frame_with(0, row(30.0, 20.0, 55.0, 0.1)), &config));
        assert!(latest_buy(&frame_with(0, row(80.0, 30.0, 55.0, 0.1)), &config));
        assert!(latest_buy(&frame_with(0, row(30.0, 80.0, 55.0, 0.1)), &config));

        assert!(!latest_buy(&frame_with(0, row(80.5, 30.0, 55.0, 0.1)), &config));
        assert!(!latest_buy(&frame_with(0, row(30.0, 19.9, 55.0, 0.1)), &config));
    }

    #[test]
    fn test_rsi_threshold_is_strict() {
        let config = SignalConfig::default();
        assert!(!latest_buy(&frame_with(0, row(30.0, 30.0, 50.0, 0.1)), &config));
        assert!(latest_buy(&frame_with(0, row(30.0, 30.0, 50.01, 0.1)), &config));
    }

    #[test]
    fn test_macd_threshold_is_strict() {
        let config = SignalConfig::default();
        assert!(!latest_buy(&frame_with(0, row(30.0, 30.0, 55.0, 0.0)), &config));
        assert!(latest_buy(&frame_with(0, row(30.0, 30.0, 55.0, 1e-9)), &config));
    }

    #[test]
    fn test_widening_lags_only_adds_triggers() {
        let rows = vec![
            oversold(),
            neutral(),
            neutral(),
            neutral(),
            row(15.0, 12.0, 40.0, -0.2),
            neutral(),
            neutral(),
            neutral(),
            neutral(),
            neutral(),
            neutral(),
            neutral(),
        ];
        let frame = IndicatorFrame::from_rows(rows);

        let mut previous = vec![false; frame.len()];
        for lags in 0..=12 {
            let config = SignalConfig {
                lags,
                ..Default::default()
            };
            let current: Vec<bool> = evaluate(&frame, &config).iter().map(|s| s.triggered).collect();
            for (before, now) in previous.iter().zip(&current) {
                assert!(!before || *now, "lags={} dropped a trigger", lags);
            }
            previous = current;
        }
        assert!(previous.iter().all(|t| *t));
    }
}
