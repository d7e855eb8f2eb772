use crate::backend::*;
use parking_lot::Mutex;
use scenebridge_utils::WindowDesc;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// The single entry point into the backend.
///
/// All backend calls (resource creation and destruction, camera, draws, present)
/// take this lock. A second thread creating resources on its own would contend with
/// the render thread for the backend's internal device lock, so no component keeps
/// a backend reference outside of this type.
///
/// The lock is not reentrant: never call back into the `SerializedBackend` from inside
/// [`SerializedBackend::with`].
pub struct SerializedBackend {
    inner: Mutex<Box<dyn RenderBackend>>,
}

impl Debug for SerializedBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializedBackend").finish_non_exhaustive()
    }
}

impl SerializedBackend {
    pub fn new(backend: impl RenderBackend + 'static) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Box::new(backend)),
        })
    }

    /// Runs `f` with exclusive access to the backend.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn RenderBackend) -> R) -> R {
        let mut backend = self.inner.lock();
        f(backend.as_mut())
    }

    pub fn create_window(&self, window: &WindowDesc) -> BackendResult<()> {
        self.with(|b| b.create_window(window))
    }

    pub fn start(&self) -> BackendResult<()> {
        self.with(|b| b.start())
    }

    pub fn pump_messages(&self) -> bool {
        self.with(|b| b.pump_messages())
    }

    pub fn wait_messages(&self, timeout: Duration) -> bool {
        self.with(|b| b.wait_messages(timeout))
    }

    pub fn create_mesh(&self, upload: &MeshUpload<'_>) -> BackendResult<MeshHandle> {
        self.with(|b| b.create_mesh(upload))
    }

    pub fn destroy_mesh(&self, handle: MeshHandle) {
        self.with(|b| b.destroy_mesh(handle))
    }

    pub fn create_texture(&self, upload: &TextureUpload<'_>) -> BackendResult<TextureHandle> {
        self.with(|b| b.create_texture(upload))
    }

    pub fn destroy_texture(&self, handle: TextureHandle) {
        self.with(|b| b.destroy_texture(handle))
    }

    pub fn create_material(&self, upload: &MaterialUpload<'_>) -> BackendResult<MaterialHandle> {
        self.with(|b| b.create_material(upload))
    }

    pub fn destroy_material(&self, handle: MaterialHandle) {
        self.with(|b| b.destroy_material(handle))
    }

    pub fn set_camera(&self, camera: &BackendCamera) -> BackendResult<()> {
        self.with(|b| b.set_camera(camera))
    }

    pub fn set_lights(&self, lights: &[BackendLight]) -> BackendResult<()> {
        self.with(|b| b.set_lights(lights))
    }

    pub fn present(&self) -> BackendResult<()> {
        self.with(|b| b.present())
    }

    pub fn shutdown(&self) {
        self.with(|b| b.shutdown())
    }
}
