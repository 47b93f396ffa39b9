pub mod binance;
pub mod paper;

pub use binance::BinanceClient;
pub use paper::PaperExchange;

use async_trait::async_trait;
use chrono::Duration;
use rust_decimal::Decimal;

use crate::models::{CandleSeries, InstrumentRule, KlineInterval, OrderFill, TradeSide};
use crate::Result;

/// Source of OHLCV candles
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Candles for `symbol` covering the last `lookback`
    ///
    /// Fails with `DataUnavailable` on provider errors or when no rows come back.
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: KlineInterval,
        lookback: Duration,
    ) -> Result<CandleSeries>;
}

/// Order placement and lot-size metadata
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    /// Fails with `RuleUnavailable` for unknown symbols or malformed filters
    async fn fetch_instrument_rule(&self, symbol: &str) -> Result<InstrumentRule>;

    /// Submit a market order; fails with `OrderRejected` when the venue declines
    async fn submit_market_order(
        &self,
        symbol: &str,
        side: TradeSide,
        quantity: Decimal,
    ) -> Result<OrderFill>;
}
