//! Render-side half of the scene bridge.
//!
//! The render thread reads the latest [`Snapshot`](scenebridge_asset::Snapshot)
//! from the [`SnapshotHandoff`], turns the resources it references into backend
//! handles through the [`ResourceCaches`] (static meshes via the
//! [`IncrementalBuilder`], skinned meshes via the [`TransientManager`]) and issues
//! draw calls. Every call into the backend goes through one [`SerializedBackend`].

pub mod backend;
pub mod builder;
pub mod cache;
pub mod convert;
pub mod error;
pub mod handoff;
pub mod rendering;
pub mod transient;

pub use backend::{RenderBackend, SerializedBackend};
pub use builder::IncrementalBuilder;
pub use cache::ResourceCaches;
pub use handoff::SnapshotHandoff;
pub use rendering::{LoopState, RenderLoop, RenderThread, StopSignal, TickReport};
pub use transient::TransientManager;
