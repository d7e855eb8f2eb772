//! Contract of the external retained-mode renderer.
//!
//! The backend is not safe for concurrent entry. Implementations are only ever
//! reached through a [`SerializedBackend`], which funnels every call through one lock.
//! Everything crossing this boundary is already in the backend's Z-up convention,
//! see [`crate::convert`].

mod handle;
pub mod recording;
mod serialized;

pub use handle::{MaterialHandle, MeshHandle, TextureHandle};
pub use serialized::SerializedBackend;

use glamx::{Mat4, Vec3};
use scenebridge_asset::{LightType, Vertex};
use scenebridge_utils::WindowDesc;
use snafu::Snafu;
use std::time::Duration;

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(context(suffix(Err)))]
#[snafu(visibility(pub))]
pub enum BackendError {
    #[snafu(display("Backend rejected {what} (code {code})"))]
    Rejected { what: &'static str, code: i32 },

    #[snafu(display("Backend unavailable: {reason}"))]
    Unavailable { reason: String },

    #[snafu(display("Backend handshake failed during {stage}: {reason}"))]
    Handshake { stage: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy)]
pub struct MeshUpload<'a> {
    pub label: &'a str,
    pub vertices: &'a [Vertex],
    pub indices: &'a [u32],
    pub material: Option<MaterialHandle>,
    pub hash: u64,
}

/// Tightly packed RGBA8 pixels of the base level.
#[derive(Debug, Clone, Copy)]
pub struct TextureUpload<'a> {
    pub label: &'a str,
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub mip_count: u32,
    pub hash: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialUpload<'a> {
    pub label: &'a str,
    pub albedo: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub albedo_color: [f32; 4],
    pub emissive: [f32; 3],
    pub double_sided: bool,
    pub hash: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendCamera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendLight {
    pub kind: LightType,
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
    pub inner_angle: f32,
    pub outer_angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshHandle,
    pub transform: Mat4,
    pub double_sided: bool,
    pub pick_tag: Option<u32>,
}

pub trait RenderBackend: Send {
    /// Creates the window and rendering context.
    fn create_window(&mut self, window: &WindowDesc) -> BackendResult<()>;
    /// Startup handshake with the renderer, after the window exists.
    fn start(&mut self) -> BackendResult<()>;
    /// Handles pending host messages without blocking. Returns `false` once the window was closed.
    fn pump_messages(&mut self) -> bool;
    /// Blocks until host input arrives or `timeout` passes. Returns `true` if input arrived.
    ///
    /// Used to idle between limited frames. Backends without an input queue return
    /// `false` right away.
    fn wait_messages(&mut self, timeout: Duration) -> bool {
        let _ = timeout;
        false
    }

    fn create_mesh(&mut self, upload: &MeshUpload<'_>) -> BackendResult<MeshHandle>;
    fn destroy_mesh(&mut self, handle: MeshHandle);
    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> BackendResult<TextureHandle>;
    fn destroy_texture(&mut self, handle: TextureHandle);
    fn create_material(&mut self, upload: &MaterialUpload<'_>) -> BackendResult<MaterialHandle>;
    fn destroy_material(&mut self, handle: MaterialHandle);

    fn set_camera(&mut self, camera: &BackendCamera) -> BackendResult<()>;
    fn set_lights(&mut self, lights: &[BackendLight]) -> BackendResult<()>;
    fn draw(&mut self, call: &DrawCall) -> BackendResult<()>;
    fn present(&mut self) -> BackendResult<()>;

    fn shutdown(&mut self);
}
