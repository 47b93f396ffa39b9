use std::sync::Arc;

use chrono::Duration;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::executor::Executor;
use super::position::{ExitBands, Position};
use super::price_feed::PriceFeed;
use super::status::{StatusLine, StatusStream};
use crate::api::{MarketDataProvider, OrderExecutor};
use crate::models::{KlineInterval, Signal, TradeSide};
use crate::strategy::Strategy;
use crate::{BotError, Result};

/// Timing, band and sizing parameters for a controller run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub interval: KlineInterval,
    pub entry_lookback_minutes: i64,
    pub monitor_lookback_minutes: i64,
    pub poll_interval_ms: u64,
    /// Floor applied to `poll_interval_ms`, sized to the data provider's rate limits
    pub min_poll_interval_ms: u64,
    pub take_profit_ratio: f64,
    pub stop_loss_ratio: f64,
    /// Scales the requested quantity on exit to leave room for fees
    pub sell_quantity_factor: Decimal,
    pub status_buffer: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            interval: KlineInterval::OneMinute,
            entry_lookback_minutes: 100,
            monitor_lookback_minutes: 2,
            poll_interval_ms: 500,
            min_poll_interval_ms: 200,
            take_profit_ratio: 1.01,
            stop_loss_ratio: 0.99,
            sell_quantity_factor: Decimal::new(998, 3),
            status_buffer: 32,
        }
    }
}

impl ControllerConfig {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms.max(self.min_poll_interval_ms))
    }

    pub fn bands(&self) -> ExitBands {
        ExitBands {
            take_profit_ratio: self.take_profit_ratio,
            stop_loss_ratio: self.stop_loss_ratio,
        }
    }
}

/// Single-symbol entry/exit controller
///
/// Each `run` is independent: it starts flat, checks for an entry once, and
/// if it buys, polls until the position hits a band and is sold. At most one
/// run per symbol should be active against a real account.
#[derive(Clone)]
pub struct PositionController {
    market: Arc<dyn MarketDataProvider>,
    orders: Arc<dyn OrderExecutor>,
    strategy: Arc<dyn Strategy>,
    config: ControllerConfig,
}

impl PositionController {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        orders: Arc<dyn OrderExecutor>,
        strategy: Arc<dyn Strategy>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            market,
            orders,
            strategy,
            config,
        }
    }

    /// Start a run for `symbol` sized at `quantity`
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(&self, symbol: &str, quantity: Decimal) -> StatusStream {
        let (tx, rx) = mpsc::channel(self.config.status_buffer.max(1));

        let run = Run {
            feed: PriceFeed::new(
                self.market.clone(),
                self.config.interval,
                Duration::minutes(self.config.entry_lookback_minutes),
                Duration::minutes(self.config.monitor_lookback_minutes),
            ),
            executor: Executor::new(self.orders.clone()),
            strategy: self.strategy.clone(),
            config: self.config.clone(),
            symbol: symbol.to_string(),
            quantity,
            position: Position::flat(symbol),
            polls: 0,
            tx,
        };

        tracing::info!(
            symbol = %symbol,
            strategy = run.strategy.name(),
            "Starting run for {}",
            quantity
        );

        StatusStream::new(rx, tokio::spawn(run.execute()))
    }
}

/// Per-invocation state, owned by the spawned task
struct Run {
    feed: PriceFeed,
    executor: Executor,
    strategy: Arc<dyn Strategy>,
    config: ControllerConfig,
    symbol: String,
    quantity: Decimal,
    position: Position,
    polls: u64,
    tx: mpsc::Sender<Result<StatusLine>>,
}

impl Run {
    async fn execute(mut self) -> Position {
        match self.drive().await {
            Ok(()) => {
                tracing::info!(symbol = %self.symbol, "Run finished ({:?})", self.position.status);
            }
            Err(BotError::Cancelled) => {
                if self.position.is_open() {
                    tracing::warn!(
                        symbol = %self.symbol,
                        "Observer disconnected with position open ({} @ {})",
                        self.position.quantity,
                        self.position.entry_price
                    );
                } else {
                    tracing::info!(symbol = %self.symbol, "Observer disconnected, stopping");
                }
            }
            Err(e) => {
                if self.position.is_open() {
                    tracing::error!(
                        symbol = %self.symbol,
                        "Run failed with position left open ({} @ {}): {}",
                        self.position.quantity,
                        self.position.entry_price,
                        e
                    );
                } else {
                    tracing::warn!(symbol = %self.symbol, "Run failed: {}", e);
                }
                // Receiver may already be gone; nothing else to report to
                let _ = self.tx.send(Err(e)).await;
            }
        }

        self.position
    }

    async fn emit(&self, line: StatusLine) -> Result<()> {
        self.tx.send(Ok(line)).await.map_err(|_| BotError::Cancelled)
    }

    async fn drive(&mut self) -> Result<()> {
        if self.try_enter().await? {
            self.monitor().await?;
        }
        Ok(())
    }

    /// One-shot entry check; returns whether a position was opened
    async fn try_enter(&mut self) -> Result<bool> {
        let series = match self.feed.entry_series(&self.symbol).await {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!(symbol = %self.symbol, "No entry data: {}", e);
                self.emit(StatusLine::NoEntry(e.to_string())).await?;
                return Ok(false);
            }
        };

        self.emit(StatusLine::PriceUpdate(series.latest().close)).await?;

        match self.strategy.generate_signal(&series) {
            Ok(Signal::Buy) => {}
            Ok(Signal::Hold) => {
                self.emit(StatusLine::NoEntry("no buy signal".to_string()))
                    .await?;
                return Ok(false);
            }
            Err(e) => {
                tracing::warn!(symbol = %self.symbol, "Signal unavailable: {}", e);
                self.emit(StatusLine::NoEntry(e.to_string())).await?;
                return Ok(false);
            }
        }

        let fill = self
            .executor
            .place(&self.symbol, TradeSide::Buy, self.quantity)
            .await?;
        self.position.open(&fill, &self.config.bands())?;
        self.emit(StatusLine::OrderPlaced(TradeSide::Buy, fill)).await?;

        Ok(true)
    }

    /// Poll the short window until a band is hit and the position is sold
    async fn monitor(&mut self) -> Result<()> {
        let poll_interval = self.config.poll_interval();

        while self.position.is_open() {
            if self.tx.is_closed() {
                return Err(BotError::Cancelled);
            }

            tokio::time::sleep(poll_interval).await;
            self.polls += 1;

            let close = match self.feed.latest_close(&self.symbol).await {
                Ok(close) => close,
                Err(e) => {
                    tracing::warn!(symbol = %self.symbol, poll = self.polls, "Skipping poll: {}", e);
                    self.emit(StatusLine::PollSkipped(e.to_string())).await?;
                    continue;
                }
            };

            tracing::debug!(symbol = %self.symbol, poll = self.polls, "Close {}", close);

            self.emit(StatusLine::PriceUpdate(close)).await?;
            self.emit(StatusLine::TargetBand {
                take_profit: self.position.take_profit,
                stop_loss: self.position.stop_loss,
            })
            .await?;

            if let Some(reason) = self.position.should_exit(close) {
                tracing::info!(symbol = %self.symbol, "{:?} hit at {}", reason, close);

                let requested = self.quantity * self.config.sell_quantity_factor;
                let fill = self
                    .executor
                    .place(&self.symbol, TradeSide::Sell, requested)
                    .await?;
                self.position.close(&fill, reason)?;
                self.emit(StatusLine::OrderPlaced(TradeSide::Sell, fill)).await?;
            }
        }

        Ok(())
    }
}
