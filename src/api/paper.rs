use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use super::{MarketDataProvider, OrderExecutor};
use crate::models::{InstrumentRule, KlineInterval, OrderFill, TradeSide};
use crate::{BotError, Result};

/// Dry-run order executor
///
/// Lot-size rules come from the real venue; market orders fill in full at the
/// venue's latest close and are only recorded locally.
pub struct PaperExchange<V> {
    venue: V,
    fills: Mutex<Vec<OrderFill>>,
}

impl<V> PaperExchange<V>
where
    V: MarketDataProvider + OrderExecutor,
{
    pub fn new(venue: V) -> Self {
        Self {
            venue,
            fills: Mutex::new(Vec::new()),
        }
    }

    /// Orders filled so far, oldest first
    pub fn fills(&self) -> Vec<OrderFill> {
        self.fills
            .lock()
            .map(|fills| fills.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl<V> OrderExecutor for PaperExchange<V>
where
    V: MarketDataProvider + OrderExecutor,
{
    async fn fetch_instrument_rule(&self, symbol: &str) -> Result<InstrumentRule> {
        self.venue.fetch_instrument_rule(symbol).await
    }

    async fn submit_market_order(
        &self,
        symbol: &str,
        side: TradeSide,
        quantity: Decimal,
    ) -> Result<OrderFill> {
        if quantity <= Decimal::ZERO {
            return Err(BotError::OrderRejected(format!(
                "quantity must be positive (got {})",
                quantity
            )));
        }

        let series = self
            .venue
            .fetch_candles(symbol, KlineInterval::OneMinute, Duration::minutes(2))
            .await
            .map_err(|e| BotError::OrderRejected(format!("no price to fill against: {}", e)))?;

        let mut fills = self
            .fills
            .lock()
            .map_err(|e| BotError::OrderRejected(e.to_string()))?;

        let fill = OrderFill {
            order_id: format!("paper-{}", fills.len() + 1),
            client_order_id: uuid::Uuid::new_v4().simple().to_string(),
            symbol: symbol.to_string(),
            side,
            price: series.latest().close,
            quantity,
            timestamp: Utc::now(),
        };

        tracing::info!(symbol = %symbol, "Paper fill: {}", fill);
        fills.push(fill.clone());

        Ok(fill)
    }
}

#[async_trait]
impl<V> MarketDataProvider for PaperExchange<V>
where
    V: MarketDataProvider + OrderExecutor,
{
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: KlineInterval,
        lookback: Duration,
    ) -> Result<crate::models::CandleSeries> {
        self.venue.fetch_candles(symbol, interval, lookback).await
    }
}
