use crate::capture::{SceneCapture, SceneSource};
use scenebridge_render::{
    RenderBackend, RenderThread, ResourceCaches, SerializedBackend, SnapshotHandoff,
};
use scenebridge_utils::BridgeConfig;
use snafu::{ResultExt, Snafu};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)))]
pub enum BridgeError {
    #[snafu(display("Failed to spawn the render thread: {source}"))]
    Spawn { source: std::io::Error },
}

/// Owns both halves of the pipeline.
///
/// The host calls [`SceneBridge::publish`] from its update loop. Rendering happens on
/// a separate thread that starts with [`SceneBridge::start`] and ends with
/// [`SceneBridge::shutdown`] or when the bridge is dropped.
pub struct SceneBridge {
    capture: SceneCapture,
    handoff: Arc<SnapshotHandoff>,
    caches: Arc<ResourceCaches>,
    render_thread: Option<RenderThread>,
}

impl SceneBridge {
    pub fn start(
        config: BridgeConfig,
        backend: impl RenderBackend + 'static,
    ) -> Result<Self, BridgeError> {
        let backend = SerializedBackend::new(backend);
        let caches = Arc::new(ResourceCaches::new(backend));
        let handoff = Arc::new(SnapshotHandoff::new());
        let capture = SceneCapture::new(&config);

        let render_thread =
            RenderThread::spawn(config, caches.clone(), handoff.clone()).context(SpawnErr)?;
        info!("Scene bridge started");

        Ok(Self {
            capture,
            handoff,
            caches,
            render_thread: Some(render_thread),
        })
    }

    /// Captures `source` and hands the snapshot to the render thread. Returns its generation.
    pub fn publish(&mut self, source: &mut dyn SceneSource) -> u64 {
        let snapshot = self.capture.capture(source);
        let generation = snapshot.generation;
        self.handoff.publish(snapshot);
        generation
    }

    /// Drops every renderer resource with the next published snapshot.
    pub fn invalidate(&mut self) {
        self.capture.invalidate();
    }

    pub fn capture(&self) -> &SceneCapture {
        &self.capture
    }

    pub fn handoff(&self) -> &Arc<SnapshotHandoff> {
        &self.handoff
    }

    pub fn caches(&self) -> &Arc<ResourceCaches> {
        &self.caches
    }

    pub fn is_running(&self) -> bool {
        self.render_thread
            .as_ref()
            .is_some_and(RenderThread::is_running)
    }

    /// Stops the render thread. Returns `false` if it didn't confirm within `stop_wait`.
    pub fn shutdown(&mut self) -> bool {
        let Some(mut render_thread) = self.render_thread.take() else {
            return true;
        };
        let stopped = render_thread.stop();
        info!("Scene bridge shut down");
        stopped
    }
}

impl Drop for SceneBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}
