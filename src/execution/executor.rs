use std::sync::Arc;

use rust_decimal::Decimal;

use super::quantity::adjust_quantity;
use crate::api::OrderExecutor;
use crate::models::{OrderFill, TradeSide};
use crate::{BotError, Result};

/// Places market orders sized to the instrument's current lot-size rule
#[derive(Clone)]
pub struct Executor {
    orders: Arc<dyn OrderExecutor>,
}

impl Executor {
    pub fn new(orders: Arc<dyn OrderExecutor>) -> Self {
        Self { orders }
    }

    /// Fetch the rule, adjust `requested`, and submit
    ///
    /// The rule is fetched on every call. A quantity that adjusts to zero is
    /// refused with `ZeroQuantity` instead of being sent.
    pub async fn place(&self, symbol: &str, side: TradeSide, requested: Decimal) -> Result<OrderFill> {
        let rule = self.orders.fetch_instrument_rule(symbol).await?;
        let quantity = adjust_quantity(requested, &rule);

        if quantity <= Decimal::ZERO {
            return Err(BotError::ZeroQuantity {
                symbol: symbol.to_string(),
                side,
                requested,
            });
        }

        tracing::info!(
            symbol = %symbol,
            "Placing market {}: requested {}, adjusted {} (step {})",
            side,
            requested,
            quantity,
            rule.step_size
        );

        self.orders.submit_market_order(symbol, side, quantity).await
    }
}
