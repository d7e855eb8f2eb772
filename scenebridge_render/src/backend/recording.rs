//! A headless backend that records every call it receives.
//!
//! Hands out increasing non-zero ids, tracks which resources are alive and can be
//! told to fail or slow down specific calls. Clones share the same recording, so a
//! test can keep one clone for inspection while the pipeline owns the other.

use crate::backend::*;
use glamx::Vec3;
use parking_lot::Mutex;
use scenebridge_utils::WindowDesc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateWindow,
    Start,
    CreateMesh {
        handle: MeshHandle,
        hash: u64,
        vertices: usize,
        indices: usize,
        first_position: Option<Vec3>,
        material: Option<MaterialHandle>,
    },
    DestroyMesh(MeshHandle),
    CreateTexture {
        handle: TextureHandle,
        hash: u64,
        width: u32,
        height: u32,
    },
    DestroyTexture(TextureHandle),
    CreateMaterial {
        handle: MaterialHandle,
        hash: u64,
        albedo: Option<TextureHandle>,
        normal: Option<TextureHandle>,
    },
    DestroyMaterial(MaterialHandle),
    SetCamera(BackendCamera),
    SetLights(Vec<BackendLight>),
    Draw(DrawCall),
    Present,
    Shutdown,
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<BackendCall>,
    next_id: u64,
    live_meshes: HashSet<MeshHandle>,
    live_textures: HashSet<TextureHandle>,
    live_materials: HashSet<MaterialHandle>,
    invalid_draws: usize,

    window_failures: u32,
    start_failures: u32,
    rejected_mesh_hashes: HashSet<u64>,
    reject_meshes: bool,
    reject_draws: bool,
    reject_present: bool,
    panic_on_present: bool,
    create_delay: Duration,
    window_closed: bool,
    pending_input: u32,
}

impl Recording {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next `times` window creations.
    pub fn fail_window_creation(&self, times: u32) {
        self.inner.lock().window_failures = times;
    }

    /// Fails the next `times` startup handshakes.
    pub fn fail_startup(&self, times: u32) {
        self.inner.lock().start_failures = times;
    }

    pub fn reject_mesh_hash(&self, hash: u64) {
        self.inner.lock().rejected_mesh_hashes.insert(hash);
    }

    pub fn accept_mesh_hash(&self, hash: u64) {
        self.inner.lock().rejected_mesh_hashes.remove(&hash);
    }

    pub fn reject_meshes(&self, reject: bool) {
        self.inner.lock().reject_meshes = reject;
    }

    pub fn reject_draws(&self, reject: bool) {
        self.inner.lock().reject_draws = reject;
    }

    pub fn reject_present(&self, reject: bool) {
        self.inner.lock().reject_present = reject;
    }

    /// Panics inside the next present.
    pub fn panic_on_next_present(&self) {
        self.inner.lock().panic_on_present = true;
    }

    /// Makes every resource creation take at least `delay`.
    pub fn set_create_delay(&self, delay: Duration) {
        self.inner.lock().create_delay = delay;
    }

    /// Queues `events` host input events, each waking one [`RenderBackend::wait_messages`].
    pub fn queue_input(&self, events: u32) {
        self.inner.lock().pending_input += events;
    }

    pub fn close_window(&self) {
        self.inner.lock().window_closed = true;
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<BackendCall> {
        std::mem::take(&mut self.inner.lock().calls)
    }

    pub fn count(&self, filter: impl Fn(&BackendCall) -> bool) -> usize {
        self.inner.lock().calls.iter().filter(|c| filter(c)).count()
    }

    pub fn meshes_created(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::CreateMesh { .. }))
    }

    pub fn meshes_destroyed(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::DestroyMesh(_)))
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Draw(draw) => Some(*draw),
                _ => None,
            })
            .collect()
    }

    pub fn presents(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Present))
    }

    pub fn live_meshes(&self) -> usize {
        self.inner.lock().live_meshes.len()
    }

    pub fn live_textures(&self) -> usize {
        self.inner.lock().live_textures.len()
    }

    pub fn live_materials(&self) -> usize {
        self.inner.lock().live_materials.len()
    }

    pub fn is_live_mesh(&self, handle: MeshHandle) -> bool {
        self.inner.lock().live_meshes.contains(&handle)
    }

    /// Draws that referenced a mesh which was never created or already destroyed.
    pub fn invalid_draws(&self) -> usize {
        self.inner.lock().invalid_draws
    }

    fn delay_creation(&self) {
        let delay = self.inner.lock().create_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

impl RenderBackend for RecordingBackend {
    fn create_window(&mut self, _window: &WindowDesc) -> BackendResult<()> {
        let mut rec = self.inner.lock();
        rec.calls.push(BackendCall::CreateWindow);
        if rec.window_failures > 0 {
            rec.window_failures -= 1;
            return HandshakeErr {
                stage: "window",
                reason: "window creation failed",
            }
            .fail();
        }
        rec.window_closed = false;
        Ok(())
    }

    fn start(&mut self) -> BackendResult<()> {
        let mut rec = self.inner.lock();
        rec.calls.push(BackendCall::Start);
        if rec.start_failures > 0 {
            rec.start_failures -= 1;
            return HandshakeErr {
                stage: "startup",
                reason: "renderer did not answer",
            }
            .fail();
        }
        Ok(())
    }

    fn pump_messages(&mut self) -> bool {
        !self.inner.lock().window_closed
    }

    fn wait_messages(&mut self, _timeout: Duration) -> bool {
        let mut rec = self.inner.lock();
        if rec.pending_input == 0 {
            return false;
        }
        rec.pending_input -= 1;
        true
    }

    fn create_mesh(&mut self, upload: &MeshUpload<'_>) -> BackendResult<MeshHandle> {
        self.delay_creation();

        let mut rec = self.inner.lock();
        if rec.reject_meshes || rec.rejected_mesh_hashes.contains(&upload.hash) {
            return RejectedErr {
                what: "mesh",
                code: -1,
            }
            .fail();
        }

        let id = rec.next_id();
        let handle = MeshHandle::from_raw(id).ok_or(BackendError::Rejected {
            what: "mesh",
            code: 0,
        })?;
        rec.live_meshes.insert(handle);
        rec.calls.push(BackendCall::CreateMesh {
            handle,
            hash: upload.hash,
            vertices: upload.vertices.len(),
            indices: upload.indices.len(),
            first_position: upload.vertices.first().map(|v| v.position),
            material: upload.material,
        });
        Ok(handle)
    }

    fn destroy_mesh(&mut self, handle: MeshHandle) {
        let mut rec = self.inner.lock();
        rec.live_meshes.remove(&handle);
        rec.calls.push(BackendCall::DestroyMesh(handle));
    }

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> BackendResult<TextureHandle> {
        self.delay_creation();

        let mut rec = self.inner.lock();
        let id = rec.next_id();
        let handle = TextureHandle::from_raw(id).ok_or(BackendError::Rejected {
            what: "texture",
            code: 0,
        })?;
        rec.live_textures.insert(handle);
        rec.calls.push(BackendCall::CreateTexture {
            handle,
            hash: upload.hash,
            width: upload.width,
            height: upload.height,
        });
        Ok(handle)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        let mut rec = self.inner.lock();
        rec.live_textures.remove(&handle);
        rec.calls.push(BackendCall::DestroyTexture(handle));
    }

    fn create_material(&mut self, upload: &MaterialUpload<'_>) -> BackendResult<MaterialHandle> {
        self.delay_creation();

        let mut rec = self.inner.lock();
        let id = rec.next_id();
        let handle = MaterialHandle::from_raw(id).ok_or(BackendError::Rejected {
            what: "material",
            code: 0,
        })?;
        rec.live_materials.insert(handle);
        rec.calls.push(BackendCall::CreateMaterial {
            handle,
            hash: upload.hash,
            albedo: upload.albedo,
            normal: upload.normal,
        });
        Ok(handle)
    }

    fn destroy_material(&mut self, handle: MaterialHandle) {
        let mut rec = self.inner.lock();
        rec.live_materials.remove(&handle);
        rec.calls.push(BackendCall::DestroyMaterial(handle));
    }

    fn set_camera(&mut self, camera: &BackendCamera) -> BackendResult<()> {
        self.inner.lock().calls.push(BackendCall::SetCamera(*camera));
        Ok(())
    }

    fn set_lights(&mut self, lights: &[BackendLight]) -> BackendResult<()> {
        self.inner
            .lock()
            .calls
            .push(BackendCall::SetLights(lights.to_vec()));
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> BackendResult<()> {
        let mut rec = self.inner.lock();
        if rec.reject_draws {
            return RejectedErr {
                what: "draw",
                code: -2,
            }
            .fail();
        }
        if !rec.live_meshes.contains(&call.mesh) {
            rec.invalid_draws += 1;
        }
        rec.calls.push(BackendCall::Draw(*call));
        Ok(())
    }

    fn present(&mut self) -> BackendResult<()> {
        let mut rec = self.inner.lock();
        if rec.panic_on_present {
            rec.panic_on_present = false;
            drop(rec);
            panic!("present panicked");
        }
        if rec.reject_present {
            return UnavailableErr {
                reason: "swapchain lost",
            }
            .fail();
        }
        rec.calls.push(BackendCall::Present);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.inner.lock().calls.push(BackendCall::Shutdown);
    }
}
