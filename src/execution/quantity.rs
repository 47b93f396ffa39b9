use rust_decimal::Decimal;

use crate::models::InstrumentRule;

/// Fit a desired quantity to the instrument's lot-size rule
///
/// Clamps into `[min_qty, max_qty]`, floors to a multiple of `step_size`, then
/// rounds to the step's own decimal places. The result can be zero when
/// `min_qty` sits below one step; callers must not submit such an order.
pub fn adjust_quantity(quantity: Decimal, rule: &InstrumentRule) -> Decimal {
    let clamped = quantity.min(rule.max_qty).max(rule.min_qty);
    let floored = clamped - (clamped % rule.step_size);
    floored.round_dp(rule.precision())
}
