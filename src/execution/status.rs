use std::fmt;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::position::Position;
use crate::models::{OrderFill, TradeSide};
use crate::{BotError, Result};

/// One observer-facing event from a controller run
#[derive(Debug, Clone, PartialEq)]
pub enum StatusLine {
    PriceUpdate(f64),
    OrderPlaced(TradeSide, OrderFill),
    TargetBand { take_profit: f64, stop_loss: f64 },
    /// The run ended without taking a position
    NoEntry(String),
    /// A monitoring poll got no price; the position is unchanged
    PollSkipped(String),
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PriceUpdate(close) => write!(f, "Current Close: {}", close),
            Self::OrderPlaced(TradeSide::Buy, fill) => write!(f, "Buy Order: {}", fill),
            Self::OrderPlaced(TradeSide::Sell, fill) => write!(f, "Sell Order: {}", fill),
            Self::TargetBand {
                take_profit,
                stop_loss,
            } => write!(f, "Target: {} | Stop Loss: {}", take_profit, stop_loss),
            Self::NoEntry(reason) => write!(f, "No Entry: {}", reason),
            Self::PollSkipped(reason) => write!(f, "Poll Skipped: {}", reason),
        }
    }
}

/// Receiving end of a controller run
///
/// Lines arrive in the order the run produced them. An `Err` item is always
/// the last one. Dropping the stream stops the run at its next emission or
/// poll, whichever comes first.
pub struct StatusStream {
    rx: mpsc::Receiver<Result<StatusLine>>,
    task: JoinHandle<Position>,
}

impl StatusStream {
    pub(crate) fn new(rx: mpsc::Receiver<Result<StatusLine>>, task: JoinHandle<Position>) -> Self {
        Self { rx, task }
    }

    /// Next line, or `None` once the run has finished
    pub async fn next(&mut self) -> Option<Result<StatusLine>> {
        self.rx.recv().await
    }

    /// Read everything up to the end of the run
    pub async fn drain(&mut self) -> Vec<Result<StatusLine>> {
        let mut lines = Vec::new();
        while let Some(line) = self.rx.recv().await {
            lines.push(line);
        }
        lines
    }

    /// Wait for the run to finish (discarding unread lines) and return its final position
    pub async fn join(mut self) -> Result<Position> {
        while self.rx.recv().await.is_some() {}
        self.task
            .await
            .map_err(|e| BotError::InvalidState(format!("controller task failed: {}", e)))
    }
}
