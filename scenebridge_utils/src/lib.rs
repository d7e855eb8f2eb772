pub mod axis;
mod bridge_args;
mod config;
mod frame_counter;
mod logging;

pub use bridge_args::BridgeArgs;
pub use config::{BridgeConfig, WindowDesc};
pub use frame_counter::{FrameCounter, TickSample};
pub use logging::LogThrottle;

pub use tracing;
