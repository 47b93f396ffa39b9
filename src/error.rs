use rust_decimal::Decimal;

use crate::models::TradeSide;

/// Errors raised by the trading core and its providers
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// The market-data provider failed or returned too little to work with
    #[error("market data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Lot-size metadata for the symbol is missing or malformed
    #[error("trading rule unavailable for {symbol}: {reason}")]
    RuleUnavailable { symbol: String, reason: String },

    /// The execution provider declined the order
    #[error("order rejected: {0}")]
    OrderRejected(String),

    /// The requested quantity rounds down to nothing under the lot-size rule
    #[error("{side} quantity for {symbol} rounds to zero (requested {requested})")]
    ZeroQuantity {
        symbol: String,
        side: TradeSide,
        requested: Decimal,
    },

    /// A position transition was attempted from the wrong state
    #[error("invalid position state: {0}")]
    InvalidState(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The status observer went away before the run finished
    #[error("status observer disconnected")]
    Cancelled,
}

impl BotError {
    pub fn data_unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    pub fn rule_unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        Self::RuleUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for BotError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
