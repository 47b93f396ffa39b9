use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::OrderFill;
use crate::{BotError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Flat,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
}

/// Static exit bands as multiples of the entry price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitBands {
    pub take_profit_ratio: f64,
    pub stop_loss_ratio: f64,
}

impl Default for ExitBands {
    fn default() -> Self {
        Self {
            take_profit_ratio: 1.01,
            stop_loss_ratio: 0.99,
        }
    }
}

/// The single position a controller run manages
///
/// Starts `Flat`, becomes `Open` once on a filled buy, and `Closed` once on a
/// filled sell. No transition ever leads back.
#[derive(Debug, Clone)]
pub struct Position {
    pub id: Uuid,
    pub symbol: String,
    pub quantity: Decimal,
    pub entry_price: f64,
    pub entry_time: Option<DateTime<Utc>>,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub status: PositionStatus,
    pub exit_price: Option<f64>,
    pub exit_quantity: Option<Decimal>,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_reason: Option<ExitReason>,
}

impl Position {
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            entry_price: 0.0,
            entry_time: None,
            take_profit: 0.0,
            stop_loss: 0.0,
            status: PositionStatus::Flat,
            exit_price: None,
            exit_quantity: None,
            exit_time: None,
            exit_reason: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Record a filled buy and fix the exit bands around its price
    pub fn open(&mut self, fill: &OrderFill, bands: &ExitBands) -> Result<()> {
        if self.status != PositionStatus::Flat {
            return Err(BotError::InvalidState(format!(
                "cannot open {} position from {:?}",
                self.symbol, self.status
            )));
        }

        self.quantity = fill.quantity;
        self.entry_price = fill.price;
        self.entry_time = Some(fill.timestamp);
        self.take_profit = fill.price * bands.take_profit_ratio;
        self.stop_loss = fill.price * bands.stop_loss_ratio;
        self.status = PositionStatus::Open;

        tracing::info!(
            symbol = %self.symbol,
            "Opened {} @ {} (target {}, stop {})",
            self.quantity,
            self.entry_price,
            self.take_profit,
            self.stop_loss
        );

        Ok(())
    }

    /// Check if the latest price has reached either band (inclusive)
    pub fn should_exit(&self, price: f64) -> Option<ExitReason> {
        if !self.is_open() {
            return None;
        }

        if price >= self.take_profit {
            Some(ExitReason::TakeProfit)
        } else if price <= self.stop_loss {
            Some(ExitReason::StopLoss)
        } else {
            None
        }
    }

    /// Record a filled sell
    pub fn close(&mut self, fill: &OrderFill, reason: ExitReason) -> Result<()> {
        if self.status != PositionStatus::Open {
            return Err(BotError::InvalidState(format!(
                "cannot close {} position from {:?}",
                self.symbol, self.status
            )));
        }

        self.status = PositionStatus::Closed;
        self.exit_price = Some(fill.price);
        self.exit_quantity = Some(fill.quantity);
        self.exit_time = Some(fill.timestamp);
        self.exit_reason = Some(reason);

        tracing::info!(
            symbol = %self.symbol,
            "Closed {} @ {} ({:?}, P&L {:.6})",
            fill.quantity,
            fill.price,
            reason,
            self.realized_pnl().unwrap_or_default()
        );

        Ok(())
    }

    /// P&L on the quantity actually sold
    pub fn realized_pnl(&self) -> Option<f64> {
        let exit_price = self.exit_price?;
        let quantity = self.exit_quantity?.to_f64()?;
        Some((exit_price - self.entry_price) * quantity)
    }
}
