// Technical indicators module
// Series-oriented stochastic, RSI and MACD, assembled into an aligned frame

pub mod frame;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod stochastic;

pub use frame::{compute_frame, IndicatorConfig, IndicatorFrame, IndicatorRow};
pub use macd::macd_histogram;
pub use moving_average::{ema_series, sma_series, span_alpha};
pub use rsi::rsi_series;
pub use stochastic::{stochastic_d, stochastic_k};
