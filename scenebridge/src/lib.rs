//! Scene-to-renderer synchronization.
//!
//! A host scene is captured once per host tick by [`SceneCapture`] into a
//! [`Snapshot`](scenebridge_asset::Snapshot), handed to the render thread and
//! turned into backend resources and draw calls there. [`SceneBridge`] wires the
//! two halves together:
//!
//! ```no_run
//! use scenebridge::{SceneBridge, SceneSource};
//! use scenebridge_render::backend::recording::RecordingBackend;
//! use scenebridge_utils::BridgeConfig;
//!
//! fn run(scene: &mut dyn SceneSource) {
//!     let mut bridge = SceneBridge::start(BridgeConfig::from_args(), RecordingBackend::new())
//!         .expect("render thread");
//!     loop {
//!         // host update ...
//!         bridge.publish(scene);
//!     }
//! }
//! ```

mod bridge;
pub mod capture;

pub use bridge::{BridgeError, SceneBridge};
pub use capture::{
    CaptureError, CaptureReport, RenderState, SceneCapture, SceneSource, SkinnedRenderer,
    StaticRenderer,
};

pub use scenebridge_asset as asset;
pub use scenebridge_render as render;
pub use scenebridge_utils as utils;
