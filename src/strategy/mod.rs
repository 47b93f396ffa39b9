// Trading strategy module
pub mod momentum;
pub mod signals;

pub use momentum::StochasticMomentum;
pub use signals::{evaluate, latest_buy, trigger_at, SignalConfig, SignalState};

use crate::models::{CandleSeries, Signal};
use crate::Result;

/// Base trait for entry strategies
pub trait Strategy: Send + Sync {
    /// Generate a trading signal from the latest candles
    ///
    /// Returns `DataUnavailable` when the series is too short to decide.
    fn generate_signal(&self, series: &CandleSeries) -> Result<Signal>;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum candles required for this strategy
    fn min_candles_required(&self) -> usize;
}
