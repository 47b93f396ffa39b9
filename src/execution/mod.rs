// Order execution and position control module
pub mod controller;
pub mod executor;
pub mod position;
pub mod price_feed;
pub mod quantity;
pub mod status;

pub use controller::{ControllerConfig, PositionController};
pub use executor::Executor;
pub use position::{ExitBands, ExitReason, Position, PositionStatus};
pub use price_feed::PriceFeed;
pub use quantity::adjust_quantity;
pub use status::{StatusLine, StatusStream};
