use super::{
    signals::{latest_buy, SignalConfig},
    Strategy,
};
use crate::indicators::{compute_frame, IndicatorConfig, IndicatorFrame};
use crate::models::{CandleSeries, Signal};
use crate::{BotError, Result};

/// Oversold-recovery momentum entry
///
/// Buys when the stochastic was oversold within the last `lags` rows, has
/// climbed back into the neutral band, and RSI plus MACD histogram confirm
/// upward momentum.
#[derive(Debug, Clone, Default)]
pub struct StochasticMomentum {
    indicators: IndicatorConfig,
    signals: SignalConfig,
}

impl StochasticMomentum {
    pub fn new(indicators: IndicatorConfig, signals: SignalConfig) -> Self {
        Self {
            indicators,
            signals,
        }
    }

    /// Indicator frame for a series, for inspection and reporting
    pub fn frame(&self, series: &CandleSeries) -> IndicatorFrame {
        compute_frame(series, &self.indicators)
    }

    pub fn signal_config(&self) -> &SignalConfig {
        &self.signals
    }
}

impl Strategy for StochasticMomentum {
    fn generate_signal(&self, series: &CandleSeries) -> Result<Signal> {
        let frame = self.frame(series);

        let Some(latest) = frame.latest() else {
            return Err(BotError::data_unavailable(
                series.symbol(),
                format!(
                    "insufficient data: {} candles, need {}",
                    series.len(),
                    self.min_candles_required()
                ),
            ));
        };

        let buy = latest_buy(&frame, &self.signals);

        tracing::debug!(
            symbol = %series.symbol(),
            "Indicators: %K={:.2}, %D={:.2}, RSI={:.2}, MACD hist={:.6}, buy={}",
            latest.stoch_k,
            latest.stoch_d,
            latest.rsi,
            latest.macd_hist,
            buy
        );

        Ok(if buy { Signal::Buy } else { Signal::Hold })
    }

    fn name(&self) -> &str {
        "StochasticMomentum"
    }

    fn min_candles_required(&self) -> usize {
        self.indicators.longest_window()
    }
}
