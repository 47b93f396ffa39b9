use std::sync::Arc;

use chrono::Duration;

use crate::api::MarketDataProvider;
use crate::models::{CandleSeries, KlineInterval};
use crate::Result;

/// Candle access for one controller: a long window for entry, a short one for monitoring
#[derive(Clone)]
pub struct PriceFeed {
    market: Arc<dyn MarketDataProvider>,
    interval: KlineInterval,
    entry_lookback: Duration,
    monitor_lookback: Duration,
}

impl PriceFeed {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        interval: KlineInterval,
        entry_lookback: Duration,
        monitor_lookback: Duration,
    ) -> Self {
        Self {
            market,
            interval,
            entry_lookback,
            monitor_lookback,
        }
    }

    /// Series the entry decision is computed on
    pub async fn entry_series(&self, symbol: &str) -> Result<CandleSeries> {
        self.market
            .fetch_candles(symbol, self.interval, self.entry_lookback)
            .await
    }

    /// Close of the most recent candle in the short window
    pub async fn latest_close(&self, symbol: &str) -> Result<f64> {
        let series = self
            .market
            .fetch_candles(symbol, self.interval, self.monitor_lookback)
            .await?;
        Ok(series.latest().close)
    }
}
