mod render_loop;
mod render_thread;
mod stop_signal;

pub use render_loop::{LoopState, RenderLoop, RenderLoopError, TickReport};
pub use render_thread::RenderThread;
pub use stop_signal::StopSignal;
