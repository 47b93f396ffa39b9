use std::path::Path;

use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::api::binance::{ApiCredentials, BinanceConfig};
use crate::execution::ControllerConfig;
use crate::indicators::IndicatorConfig;
use crate::strategy::SignalConfig;
use crate::{BotError, Result};

const DEFAULT_CONFIG_FILE: &str = "config/default";
const ENV_PREFIX: &str = "SCALPBOT";

/// Application settings
///
/// Layered: built-in defaults, `config/default.toml` if present, an explicit
/// file if given, then `SCALPBOT__SECTION__KEY` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub symbol: String,
    pub quantity: Decimal,
    pub controller: ControllerConfig,
    pub indicators: IndicatorConfig,
    pub signal: SignalConfig,
    pub binance: BinanceConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            symbol: "ADAUSDT".to_string(),
            quantity: Decimal::from(95),
            controller: ControllerConfig::default(),
            indicators: IndicatorConfig::default(),
            signal: SignalConfig::default(),
            binance: BinanceConfig::default(),
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            Config::builder().add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let controller = &self.controller;

        if self.symbol.trim().is_empty() {
            return Err(BotError::Config("symbol must not be empty".to_string()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(BotError::Config(format!(
                "quantity must be positive (got {})",
                self.quantity
            )));
        }
        if controller.poll_interval_ms < controller.min_poll_interval_ms {
            return Err(BotError::Config(format!(
                "poll_interval_ms {} is below the {} ms floor",
                controller.poll_interval_ms, controller.min_poll_interval_ms
            )));
        }
        if controller.take_profit_ratio <= 1.0 {
            return Err(BotError::Config(format!(
                "take_profit_ratio must be above 1 (got {})",
                controller.take_profit_ratio
            )));
        }
        if controller.stop_loss_ratio <= 0.0 || controller.stop_loss_ratio >= 1.0 {
            return Err(BotError::Config(format!(
                "stop_loss_ratio must be between 0 and 1 (got {})",
                controller.stop_loss_ratio
            )));
        }
        if controller.sell_quantity_factor <= Decimal::ZERO
            || controller.sell_quantity_factor > Decimal::ONE
        {
            return Err(BotError::Config(format!(
                "sell_quantity_factor must be in (0, 1] (got {})",
                controller.sell_quantity_factor
            )));
        }
        if controller.status_buffer == 0 {
            return Err(BotError::Config("status_buffer must be at least 1".to_string()));
        }
        if controller.entry_lookback_minutes <= 0 || controller.monitor_lookback_minutes <= 0 {
            return Err(BotError::Config("lookback windows must be positive".to_string()));
        }

        Ok(())
    }
}

/// Read `API_KEY` / `SECRET_KEY` from the environment, if both are set
pub fn credentials_from_env() -> Option<ApiCredentials> {
    let api_key = std::env::var("API_KEY").ok().filter(|k| !k.is_empty())?;
    let secret_key = std::env::var("SECRET_KEY").ok().filter(|k| !k.is_empty())?;
    Some(ApiCredentials {
        api_key,
        secret_key,
    })
}
