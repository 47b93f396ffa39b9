use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BotError, Result};

/// OHLCV candlestick for one interval
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candles for one symbol, ascending by timestamp
///
/// Never empty: construction fails with `DataUnavailable` otherwise.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    symbol: String,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> Result<Self> {
        let symbol = symbol.into();

        if candles.is_empty() {
            return Err(BotError::data_unavailable(&symbol, "provider returned no candles"));
        }

        if candles.windows(2).any(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(BotError::data_unavailable(
                &symbol,
                "candles are not strictly ascending by timestamp",
            ));
        }

        Ok(Self { symbol, candles })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Most recent candle
    pub fn latest(&self) -> &Candle {
        // Invariant: non-empty by construction
        &self.candles[self.candles.len() - 1]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }
}

/// Kline resolution supported by the data provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum KlineInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
}

impl KlineInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::ThreeMinutes => "3m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
        }
    }
}

impl fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KlineInterval {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1m" => Ok(Self::OneMinute),
            "3m" => Ok(Self::ThreeMinutes),
            "5m" => Ok(Self::FiveMinutes),
            "15m" => Ok(Self::FifteenMinutes),
            "1h" => Ok(Self::OneHour),
            other => Err(BotError::Config(format!("unsupported kline interval '{}'", other))),
        }
    }
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Hold,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lot-size filter for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRule {
    pub symbol: String,
    pub step_size: Decimal,
    pub min_qty: Decimal,
    pub max_qty: Decimal,
}

impl InstrumentRule {
    /// Build a rule, rejecting data no quantity could be adjusted against
    pub fn new(
        symbol: impl Into<String>,
        step_size: Decimal,
        min_qty: Decimal,
        max_qty: Decimal,
    ) -> Result<Self> {
        let symbol = symbol.into();

        if step_size <= Decimal::ZERO {
            return Err(BotError::rule_unavailable(
                &symbol,
                format!("step size must be positive (got {})", step_size),
            ));
        }
        if min_qty < Decimal::ZERO || max_qty < min_qty {
            return Err(BotError::rule_unavailable(
                &symbol,
                format!("invalid quantity bounds [{}, {}]", min_qty, max_qty),
            ));
        }

        Ok(Self {
            symbol,
            step_size,
            min_qty,
            max_qty,
        })
    }

    /// Decimal places implied by the step size ("0.010" -> 2, "1.0" -> 0)
    pub fn precision(&self) -> u32 {
        self.step_size.normalize().scale()
    }
}

/// Execution report for a filled market order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFill {
    pub order_id: String,
    pub client_order_id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for OrderFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ {} (order {})",
            self.side, self.quantity, self.symbol, self.price, self.order_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn candle_at(minute: i64, close: f64) -> Candle {
        Candle {
            timestamp: DateTime::<Utc>::from_timestamp(minute * 60, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn test_series_rejects_empty() {
        let result = CandleSeries::new("ADAUSDT", vec![]);
        assert!(matches!(result, Err(BotError::DataUnavailable { .. })));
    }

    #[test]
    fn test_series_rejects_unsorted() {
        let candles = vec![candle_at(2, 1.0), candle_at(1, 1.0)];
        let result = CandleSeries::new("ADAUSDT", candles);
        assert!(matches!(result, Err(BotError::DataUnavailable { .. })));
    }

    #[test]
    fn test_series_latest() {
        let mut candles = vec![candle_at(0, 1.0)];
        let mut next = candles[0];
        next.timestamp += Duration::minutes(1);
        next.close = 2.5;
        candles.push(next);

        let series = CandleSeries::new("ADAUSDT", candles).unwrap();
        assert_eq!(series.len(), 2);
        assert!(!series.is_empty());
        assert_eq!(series.latest().close, 2.5);
        assert_eq!(series.closes(), vec![1.0, 2.5]);
    }

    #[test]
    fn test_rule_precision() {
        let rule = InstrumentRule::new(
            "ADAUSDT",
            "0.10000000".parse().unwrap(),
            "0.1".parse().unwrap(),
            "900000".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(rule.precision(), 1);

        let whole = InstrumentRule::new(
            "ADAUSDT",
            "1.00000000".parse().unwrap(),
            Decimal::ONE,
            Decimal::from(1000),
        )
        .unwrap();
        assert_eq!(whole.precision(), 0);
    }

    #[test]
    fn test_rule_rejects_zero_step() {
        let result = InstrumentRule::new("ADAUSDT", Decimal::ZERO, Decimal::ONE, Decimal::TEN);
        assert!(matches!(result, Err(BotError::RuleUnavailable { .. })));
    }

    #[test]
    fn test_interval_round_trip() {
        let interval: KlineInterval = "1m".parse().unwrap();
        assert_eq!(interval, KlineInterval::OneMinute);
        assert_eq!(interval.to_string(), "1m");
        assert!("2m".parse::<KlineInterval>().is_err());
    }
}
