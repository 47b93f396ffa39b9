use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use super::{MarketDataProvider, OrderExecutor};
use crate::models::{Candle, CandleSeries, InstrumentRule, KlineInterval, OrderFill, TradeSide};
use crate::{BotError, Result};

const BINANCE_API_BASE: &str = "https://api.binance.com";
const KLINE_LIMIT: u32 = 1000;

type HmacSha256 = Hmac<Sha256>;

// Type alias for the rate limiter to simplify signatures
type BinanceRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Connection settings for the Binance spot REST API
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BinanceConfig {
    pub base_url: String,
    pub recv_window_ms: u64,
    /// Request budget shared by every call made through one client
    pub requests_per_second: u32,
    pub timeout_secs: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_API_BASE.to_string(),
            recv_window_ms: 5000,
            requests_per_second: 10,
            timeout_secs: 10,
        }
    }
}

/// API key pair for signed endpoints
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub secret_key: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Binance spot client: klines, lot-size filters and market orders
///
/// Cloneable; all clones share one rate limiter.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    config: BinanceConfig,
    credentials: Option<ApiCredentials>,
    rate_limiter: Arc<BinanceRateLimiter>,
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct SymbolInfo {
    symbol: String,
    filters: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    symbol: String,
    order_id: u64,
    client_order_id: String,
    executed_qty: String,
    #[serde(default)]
    transact_time: Option<i64>,
    #[serde(default)]
    fills: Vec<FillRaw>,
}

#[derive(Debug, Deserialize)]
struct FillRaw {
    price: String,
}

// ============== Implementation ==============

impl BinanceClient {
    pub fn new(config: BinanceConfig, credentials: Option<ApiCredentials>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BotError::Config(format!("failed to build HTTP client: {}", e)))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            client,
            config,
            credentials,
            rate_limiter,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Rate-limited send returning the body of a 2xx response, or a readable error
    async fn send(&self, request: RequestBuilder) -> std::result::Result<String, String> {
        self.rate_limiter.until_ready().await;

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;

        if status.is_success() {
            return Ok(body);
        }

        Err(match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(err) => format!("{} (code {}, HTTP {})", err.msg, err.code, status.as_u16()),
            Err(_) => format!("HTTP {}: {}", status.as_u16(), body),
        })
    }

    fn sign(secret: &str, payload: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| BotError::Config(format!("invalid secret key: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

fn parse_kline(row: &[Value]) -> Option<Candle> {
    let open_time = row.first()?.as_i64()?;
    let field = |i: usize| -> Option<f64> {
        let value: f64 = row.get(i)?.as_str()?.parse().ok()?;
        (value.is_finite() && value >= 0.0).then_some(value)
    };

    Some(Candle {
        timestamp: DateTime::<Utc>::from_timestamp_millis(open_time)?,
        open: field(1)?,
        high: field(2)?,
        low: field(3)?,
        close: field(4)?,
        volume: field(5)?,
    })
}

fn parse_lot_size(symbol: &str, filters: &[Value]) -> Result<InstrumentRule> {
    let lot_size = filters
        .iter()
        .find(|f| f.get("filterType").and_then(Value::as_str) == Some("LOT_SIZE"))
        .ok_or_else(|| BotError::rule_unavailable(symbol, "no LOT_SIZE filter"))?;

    let decimal = |key: &str| -> Result<Decimal> {
        lot_size
            .get(key)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Decimal>().ok())
            .ok_or_else(|| BotError::rule_unavailable(symbol, format!("malformed {}", key)))
    };

    InstrumentRule::new(
        symbol,
        decimal("stepSize")?,
        decimal("minQty")?,
        decimal("maxQty")?,
    )
}

#[async_trait]
impl MarketDataProvider for BinanceClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: KlineInterval,
        lookback: Duration,
    ) -> Result<CandleSeries> {
        let start = (Utc::now() - lookback).timestamp_millis();
        let request = self.client.get(self.url("/api/v3/klines")).query(&[
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("startTime", start.to_string()),
            ("limit", KLINE_LIMIT.to_string()),
        ]);

        let body = self
            .send(request)
            .await
            .map_err(|e| BotError::data_unavailable(symbol, e))?;
        let rows: Vec<Vec<Value>> = serde_json::from_str(&body)
            .map_err(|e| BotError::data_unavailable(symbol, format!("bad kline payload: {}", e)))?;

        let candles = rows
            .iter()
            .map(|row| parse_kline(row))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| BotError::data_unavailable(symbol, "malformed kline row"))?;

        tracing::debug!(symbol = %symbol, interval = %interval, "Fetched {} candles", candles.len());

        CandleSeries::new(symbol, candles)
    }
}

#[async_trait]
impl OrderExecutor for BinanceClient {
    async fn fetch_instrument_rule(&self, symbol: &str) -> Result<InstrumentRule> {
        let request = self
            .client
            .get(self.url("/api/v3/exchangeInfo"))
            .query(&[("symbol", symbol)]);

        let body = self
            .send(request)
            .await
            .map_err(|e| BotError::rule_unavailable(symbol, e))?;
        let info: ExchangeInfo = serde_json::from_str(&body)
            .map_err(|e| BotError::rule_unavailable(symbol, format!("bad exchange info: {}", e)))?;

        let info = info
            .symbols
            .into_iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| BotError::rule_unavailable(symbol, "symbol not listed"))?;

        parse_lot_size(symbol, &info.filters)
    }

    async fn submit_market_order(
        &self,
        symbol: &str,
        side: TradeSide,
        quantity: Decimal,
    ) -> Result<OrderFill> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| BotError::OrderRejected("API credentials not configured".to_string()))?;

        let client_order_id = uuid::Uuid::new_v4().simple().to_string();
        let query = format!(
            "symbol={}&side={}&type=MARKET&quantity={}&newClientOrderId={}&recvWindow={}&timestamp={}",
            symbol,
            side,
            quantity.normalize(),
            client_order_id,
            self.config.recv_window_ms,
            Utc::now().timestamp_millis()
        );
        let signature = Self::sign(&credentials.secret_key, &query)?;
        let url = format!("{}?{}&signature={}", self.url("/api/v3/order"), query, signature);

        tracing::info!(symbol = %symbol, "Submitting market {} for {}", side, quantity);

        let request = self
            .client
            .post(url)
            .header("X-MBX-APIKEY", &credentials.api_key);
        let body = self.send(request).await.map_err(BotError::OrderRejected)?;

        let response: OrderResponse = serde_json::from_str(&body)
            .map_err(|e| BotError::OrderRejected(format!("unreadable order response: {}", e)))?;

        let price = response
            .fills
            .first()
            .and_then(|f| f.price.parse::<f64>().ok())
            .ok_or_else(|| BotError::OrderRejected("order reported no fills".to_string()))?;
        let filled = response
            .executed_qty
            .parse::<Decimal>()
            .map_err(|e| BotError::OrderRejected(format!("bad executedQty: {}", e)))?;

        Ok(OrderFill {
            order_id: response.order_id.to_string(),
            client_order_id: response.client_order_id,
            symbol: response.symbol,
            side,
            price,
            quantity: filled,
            timestamp: response
                .transact_time
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .unwrap_or_else(Utc::now),
        })
    }
}
