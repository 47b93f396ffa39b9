use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{macd_histogram, rsi_series, stochastic_d, stochastic_k};
use crate::models::CandleSeries;

/// Indicator windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub stoch_window: usize,
    pub stoch_smooth: usize,
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            stoch_window: 14,
            stoch_smooth: 3,
            rsi_window: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl IndicatorConfig {
    /// Candles needed before the first complete row exists
    ///
    /// With the default windows this is 34, driven by MACD (26 + 9 - 1).
    pub fn longest_window(&self) -> usize {
        let stoch = self.stoch_window + self.stoch_smooth.saturating_sub(1);
        let macd = self.macd_slow.max(self.macd_fast) + self.macd_signal.saturating_sub(1);
        stoch.max(self.rsi_window).max(macd)
    }
}

/// One fully-defined set of indicator values, tied to its source candle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub rsi: f64,
    pub macd_hist: f64,
}

/// Indicator rows aligned to the tail of a candle series
///
/// Candles whose indicators are not all defined are dropped, never
/// zero-filled, so every row holds usable values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    pub fn from_rows(rows: Vec<IndicatorRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&IndicatorRow> {
        self.rows.get(index)
    }

    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Compute %K, %D, RSI and MACD histogram for every candle, keeping complete rows
///
/// Fewer candles than `config.longest_window()` yields an empty frame.
pub fn compute_frame(series: &CandleSeries, config: &IndicatorConfig) -> IndicatorFrame {
    let closes = series.closes();
    let highs = series.highs();
    let lows = series.lows();

    let k = stochastic_k(&highs, &lows, &closes, config.stoch_window);
    let d = stochastic_d(&k, config.stoch_smooth);
    let rsi = rsi_series(&closes, config.rsi_window);
    let hist = macd_histogram(&closes, config.macd_fast, config.macd_slow, config.macd_signal);

    let rows = series
        .candles()
        .iter()
        .enumerate()
        .filter_map(|(i, candle)| {
            let row = IndicatorRow {
                timestamp: candle.timestamp,
                close: candle.close,
                stoch_k: k[i]?,
                stoch_d: d[i]?,
                rsi: rsi[i]?,
                macd_hist: hist[i]?,
            };
            let finite = [row.stoch_k, row.stoch_d, row.rsi, row.macd_hist]
                .iter()
                .all(|v| v.is_finite());
            finite.then_some(row)
        })
        .collect();

    IndicatorFrame { rows }
}
