#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use scalpbot::api::{MarketDataProvider, OrderExecutor};
use scalpbot::execution::{ControllerConfig, PositionController, StatusLine};
use scalpbot::models::{
    Candle, CandleSeries, InstrumentRule, KlineInterval, OrderFill, Signal, TradeSide,
};
use scalpbot::{BotError, Result, Strategy};

pub const SYMBOL: &str = "ADAUSDT";

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn candle(minute: i64, close: f64) -> Candle {
    Candle {
        timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000 + minute * 60, 0).unwrap(),
        open: close,
        high: close * 1.001,
        low: close * 0.999,
        close,
        volume: 1000.0,
    }
}

/// Slow climb, a five-bar dip into oversold, then a seven-bar recovery that
/// the stochastic momentum rule buys on its last candle (close 101.45)
pub fn dip_and_recovery() -> Vec<Candle> {
    let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + 0.05 * i as f64).collect();
    for _ in 0..5 {
        closes.push(closes[closes.len() - 1] - 1.0);
    }
    for _ in 0..7 {
        closes.push(closes[closes.len() - 1] + 0.5);
    }
    closes
        .into_iter()
        .enumerate()
        .map(|(i, close)| candle(i as i64, close))
        .collect()
}

/// Market data that serves a fixed entry series, then one scripted close per poll
///
/// Requests with a lookback over ten minutes are treated as the entry fetch.
/// A `None` poll entry fails that poll; once the script runs out the last
/// close repeats.
pub struct ScriptedMarket {
    entry: Option<Vec<Candle>>,
    polls: Mutex<VecDeque<Option<f64>>>,
    last_close: Mutex<f64>,
    pub entry_fetches: AtomicUsize,
    pub poll_fetches: AtomicUsize,
}

impl ScriptedMarket {
    pub fn new(entry: Option<Vec<Candle>>, polls: Vec<Option<f64>>) -> Self {
        let last = entry
            .as_ref()
            .and_then(|c| c.last().map(|c| c.close))
            .unwrap_or(100.0);
        Self {
            entry,
            polls: Mutex::new(polls.into()),
            last_close: Mutex::new(last),
            entry_fetches: AtomicUsize::new(0),
            poll_fetches: AtomicUsize::new(0),
        }
    }

    /// Entry series ending at `close`
    pub fn with_closes(close: f64, polls: &[f64]) -> Self {
        Self::new(
            Some(vec![candle(0, close - 0.1), candle(1, close)]),
            polls.iter().copied().map(Some).collect(),
        )
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedMarket {
    async fn fetch_candles(
        &self,
        symbol: &str,
        _interval: KlineInterval,
        lookback: Duration,
    ) -> Result<CandleSeries> {
        if lookback > Duration::minutes(10) {
            self.entry_fetches.fetch_add(1, Ordering::SeqCst);
            return match &self.entry {
                Some(candles) => CandleSeries::new(symbol, candles.clone()),
                None => Err(BotError::data_unavailable(symbol, "scripted outage")),
            };
        }

        let n = self.poll_fetches.fetch_add(1, Ordering::SeqCst) as i64;
        let next = self.polls.lock().unwrap().pop_front();
        let close = match next {
            Some(Some(close)) => {
                *self.last_close.lock().unwrap() = close;
                close
            }
            Some(None) => return Err(BotError::data_unavailable(symbol, "scripted poll failure")),
            None => *self.last_close.lock().unwrap(),
        };

        CandleSeries::new(symbol, vec![candle(100 + n, close)])
    }
}

/// Order executor that records orders and fills at fixed prices
pub struct ScriptedExecutor {
    rule: Option<InstrumentRule>,
    buy_price: f64,
    sell_price: f64,
    reject: Option<TradeSide>,
    pub orders: Mutex<Vec<(TradeSide, Decimal)>>,
    pub rule_fetches: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new(buy_price: f64, sell_price: f64) -> Self {
        Self {
            rule: Some(ada_rule()),
            buy_price,
            sell_price,
            reject: None,
            orders: Mutex::new(Vec::new()),
            rule_fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_rule(mut self, rule: Option<InstrumentRule>) -> Self {
        self.rule = rule;
        self
    }

    pub fn rejecting(mut self, side: TradeSide) -> Self {
        self.reject = Some(side);
        self
    }

    pub fn orders(&self) -> Vec<(TradeSide, Decimal)> {
        self.orders.lock().unwrap().clone()
    }
}

pub fn ada_rule() -> InstrumentRule {
    InstrumentRule::new(SYMBOL, dec("0.1"), dec("0.1"), dec("900000")).unwrap()
}

#[async_trait]
impl OrderExecutor for ScriptedExecutor {
    async fn fetch_instrument_rule(&self, symbol: &str) -> Result<InstrumentRule> {
        self.rule_fetches.fetch_add(1, Ordering::SeqCst);
        self.rule
            .clone()
            .ok_or_else(|| BotError::rule_unavailable(symbol, "unknown symbol"))
    }

    async fn submit_market_order(
        &self,
        symbol: &str,
        side: TradeSide,
        quantity: Decimal,
    ) -> Result<OrderFill> {
        if self.reject == Some(side) {
            return Err(BotError::OrderRejected(
                "Account has insufficient balance for requested action.".to_string(),
            ));
        }

        let mut orders = self.orders.lock().unwrap();
        orders.push((side, quantity));

        Ok(OrderFill {
            order_id: orders.len().to_string(),
            client_order_id: format!("scripted-{}", orders.len()),
            symbol: symbol.to_string(),
            side,
            price: match side {
                TradeSide::Buy => self.buy_price,
                TradeSide::Sell => self.sell_price,
            },
            quantity,
            timestamp: Utc::now(),
        })
    }
}

/// Strategy that always answers the same way
pub struct FixedSignal(pub Signal);

impl Strategy for FixedSignal {
    fn generate_signal(&self, _series: &CandleSeries) -> Result<Signal> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "FixedSignal"
    }

    fn min_candles_required(&self) -> usize {
        1
    }
}

pub fn controller(
    market: Arc<ScriptedMarket>,
    orders: Arc<ScriptedExecutor>,
    strategy: Arc<dyn Strategy>,
) -> PositionController {
    let config = ControllerConfig {
        status_buffer: 1,
        ..Default::default()
    };
    PositionController::new(market, orders, strategy, config)
}

pub fn is_price(line: &StatusLine) -> bool {
    matches!(line, StatusLine::PriceUpdate(_))
}

/// Market and executor in one, the shape a paper exchange wraps
pub struct ScriptedVenue {
    market: ScriptedMarket,
    orders: ScriptedExecutor,
}

impl ScriptedVenue {
    pub fn new(market: ScriptedMarket, orders: ScriptedExecutor) -> Self {
        Self { market, orders }
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedVenue {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: KlineInterval,
        lookback: Duration,
    ) -> Result<CandleSeries> {
        self.market.fetch_candles(symbol, interval, lookback).await
    }
}

#[async_trait]
impl OrderExecutor for ScriptedVenue {
    async fn fetch_instrument_rule(&self, symbol: &str) -> Result<InstrumentRule> {
        self.orders.fetch_instrument_rule(symbol).await
    }

    async fn submit_market_order(
        &self,
        symbol: &str,
        side: TradeSide,
        quantity: Decimal,
    ) -> Result<OrderFill> {
        self.orders.submit_market_order(symbol, side, quantity).await
    }
}
