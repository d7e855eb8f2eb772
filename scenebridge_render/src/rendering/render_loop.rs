//! The consumer side of the bridge.
//!
//! A [`RenderLoop`] owns the builder and the transient manager and is driven by
//! exactly one thread. Each tick it reads the latest snapshot, spends a bounded
//! amount of time on uploads and then draws whatever is resolvable.

use crate::backend::{BackendError, DrawCall, SerializedBackend};
use crate::builder::{BuildJob, BuildReport, IncrementalBuilder};
use crate::cache::ResourceCaches;
use crate::convert::{camera_to_backend, light_to_backend, transform_to_backend};
use crate::handoff::SnapshotHandoff;
use crate::rendering::StopSignal;
use crate::transient::{TransientManager, TransientReport};
use itertools::Itertools;
use scenebridge_asset::{CameraSample, Snapshot};
use scenebridge_utils::{BridgeConfig, FrameCounter, LogThrottle, TickSample, throttled};
use snafu::{ResultExt, Snafu};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use web_time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    WindowReady,
    DeviceReady,
    Running,
    Stopped,
}

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)))]
pub enum RenderLoopError {
    #[snafu(display("Failed to create the render window: {source}"))]
    Window { source: BackendError },

    #[snafu(display("Failed to start the renderer: {source}"))]
    Device { source: BackendError },

    #[snafu(display("The render loop was stopped"))]
    Stopped,
}

/// What one render tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub generation: Option<u64>,
    pub static_draws: usize,
    /// Static instances that were not drawn because their mesh isn't cached yet.
    pub static_pending: usize,
    pub transient_draws: usize,
    pub failed_draws: usize,
    pub build: BuildReport,
    pub transient: TransientReport,
    /// Resources destroyed because the scene changed.
    pub invalidated: usize,
    pub camera_fallback: bool,
    pub present_failed: bool,
    pub window_closed: bool,
    pub duration: Duration,
}

impl TickReport {
    pub fn draws(&self) -> usize {
        self.static_draws + self.transient_draws
    }
}

pub struct RenderLoop {
    config: BridgeConfig,
    backend: Arc<SerializedBackend>,
    caches: Arc<ResourceCaches>,
    handoff: Arc<SnapshotHandoff>,
    builder: IncrementalBuilder,
    transient: TransientManager,

    state: LoopState,
    scene_epoch: Option<u64>,
    draw_list: Vec<DrawCall>,

    frames: FrameCounter,
    last_report: TickReport,
    last_stats: Instant,
    throttle: LogThrottle,
}

impl RenderLoop {
    pub fn new(
        config: BridgeConfig,
        caches: Arc<ResourceCaches>,
        handoff: Arc<SnapshotHandoff>,
    ) -> Self {
        let builder = IncrementalBuilder::new(caches.clone(), &config);
        let transient = TransientManager::new(caches.clone(), &config);
        let throttle = LogThrottle::new(config.log_interval);

        Self {
            backend: caches.backend().clone(),
            config,
            caches,
            handoff,
            builder,
            transient,
            state: LoopState::Uninitialized,
            scene_epoch: None,
            draw_list: Vec::new(),
            frames: FrameCounter::default(),
            last_report: TickReport::default(),
            last_stats: Instant::now(),
            throttle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn builder(&self) -> &IncrementalBuilder {
        &self.builder
    }

    pub fn transient(&self) -> &TransientManager {
        &self.transient
    }

    pub fn frames(&self) -> &FrameCounter {
        &self.frames
    }

    pub fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    /// Advances the session up to [`LoopState::Running`].
    ///
    /// A failed step leaves the state where it was, so calling this again retries
    /// exactly the step that failed.
    pub fn start(&mut self) -> Result<(), RenderLoopError> {
        match self.state {
            LoopState::Running => return Ok(()),
            LoopState::Stopped => return StoppedErr.fail(),
            _ => {}
        }

        if self.state == LoopState::Uninitialized {
            self.backend
                .create_window(&self.config.window)
                .context(WindowErr)?;
            self.state = LoopState::WindowReady;
            debug!("Render window created");
        }

        if self.state == LoopState::WindowReady {
            self.backend.start().context(DeviceErr)?;
            self.state = LoopState::DeviceReady;
            debug!("Renderer started");
        }

        self.state = LoopState::Running;
        info!("Render loop running");
        Ok(())
    }

    /// Renders one frame from the latest snapshot.
    #[instrument(skip_all)]
    #[profiling::function]
    pub fn tick(&mut self) -> TickReport {
        let start = Instant::now();
        let mut report = TickReport::default();

        if self.state != LoopState::Running {
            scenebridge_utils::debug_panic!("Render tick in state {:?}", self.state);
            return report;
        }

        if !self.backend.pump_messages() {
            report.window_closed = true;
            return report;
        }

        let snapshot = self.handoff.read_latest();
        if let Some(snapshot) = &snapshot {
            report.generation = Some(snapshot.generation);
            report.invalidated = self.observe_epoch(snapshot.scene_epoch);
        }

        report.build = self.builder.drain();

        if let Some(snapshot) = &snapshot {
            report.transient = self.transient.update(&snapshot.skinned, snapshot.generation);
        }

        let camera = snapshot.as_ref().map(|s| s.camera).unwrap_or_default();
        report.camera_fallback = !camera.valid;
        self.submit_view(&camera, snapshot.as_deref());

        self.draw_list.clear();
        if let Some(snapshot) = &snapshot {
            self.collect_static_draws(snapshot, &mut report);
        }
        let static_draws = self.draw_list.len();
        self.draw_list.extend(self.transient.draws());
        report.transient_draws = self.draw_list.len() - static_draws;

        report.failed_draws = self.submit_draws();
        report.static_draws = static_draws;

        if let Err(e) = self.backend.present() {
            report.present_failed = true;
            throttled!(self.throttle, "present", warn, "Present failed: {e}");
        }

        report.duration = start.elapsed();
        self.record(&report);
        report
    }

    /// [`RenderLoop::tick`], with a panic inside the tick reported as a skipped tick.
    pub fn tick_guarded(&mut self) -> Option<TickReport> {
        match catch_unwind(AssertUnwindSafe(|| self.tick())) {
            Ok(report) => Some(report),
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                error!("Render tick panicked, skipping it: {reason}");
                None
            }
        }
    }

    /// Destroys everything created from the previous scene.
    fn observe_epoch(&mut self, epoch: u64) -> usize {
        let previous = self.scene_epoch.replace(epoch);
        match previous {
            Some(previous) if previous != epoch => {
                let destroyed = self.invalidate();
                info!("Scene changed ({previous} -> {epoch}), destroyed {destroyed} resources");
                destroyed
            }
            _ => 0,
        }
    }

    /// Drops every queued build and destroys every resource. Returns how many were destroyed.
    pub fn invalidate(&mut self) -> usize {
        let destroyed = self.transient.release_all();
        self.builder.clear();
        destroyed + self.caches.invalidate()
    }

    fn submit_view(&mut self, camera: &CameraSample, snapshot: Option<&Snapshot>) {
        let camera = camera.resolved(self.config.window.aspect());
        if let Err(e) = self.backend.set_camera(&camera_to_backend(&camera)) {
            throttled!(
                self.throttle,
                "camera",
                warn,
                "Setting the camera failed: {e}"
            );
        }

        let lights = snapshot
            .map(|s| s.lights.iter().map(light_to_backend).collect_vec())
            .unwrap_or_default();
        if let Err(e) = self.backend.set_lights(&lights) {
            throttled!(self.throttle, "lights", warn, "Setting lights failed: {e}");
        }
    }

    /// Queues a draw for every cached static instance and a build for every other one.
    fn collect_static_draws(&mut self, snapshot: &Snapshot, report: &mut TickReport) {
        for instance in &snapshot.statics {
            match self.caches.mesh(&instance.key) {
                Some(mesh) => self.draw_list.push(DrawCall {
                    mesh,
                    transform: transform_to_backend(&instance.transform),
                    double_sided: instance.double_sided(),
                    pick_tag: instance.pick_tag,
                }),
                None => {
                    report.static_pending += 1;
                    self.builder.enqueue(BuildJob {
                        key: instance.key,
                        mesh: instance.mesh.clone(),
                        material: instance.material.clone(),
                    });
                }
            }
        }
    }

    fn submit_draws(&mut self) -> usize {
        let draws = &self.draw_list;
        let (failed, last_error) = self.backend.with(|backend| {
            let mut failed = 0;
            let mut last_error = None;
            for draw in draws {
                if let Err(e) = backend.draw(draw) {
                    failed += 1;
                    last_error = Some(e);
                }
            }
            (failed, last_error)
        });

        if let Some(e) = last_error {
            throttled!(
                self.throttle,
                "draw",
                warn,
                "{failed} draw calls failed: {e}"
            );
        }
        failed
    }

    fn record(&mut self, report: &TickReport) {
        self.frames.record(TickSample {
            duration: report.duration,
            draws: report.draws() as u32,
            uploads: (report.build.created + report.transient.built) as u32,
        });
        self.last_report = *report;

        if self.last_stats.elapsed() >= self.config.log_interval {
            self.last_stats = Instant::now();
            debug!(
                fps = self.frames.fps_mean(),
                worst_ms = self.frames.tick_worst().as_secs_f32() * 1000.0,
                ticks = self.frames.total_ticks(),
                draws = self.frames.draws_mean(),
                uploads = self.frames.uploads(),
                queued = self.builder.len(),
                transient = self.transient.live_count(),
                "Render stats"
            );
        }
    }

    /// Runs ticks until `stop` is triggered or the window is closed, then stops.
    ///
    /// Startup failures are retried every `startup_retry_interval`. With a frame limit
    /// configured, the time between ticks is spent waiting for host input, then on
    /// `stop`. Input cuts the wait short.
    pub fn run(&mut self, stop: &StopSignal) {
        while !stop.is_set() && self.state != LoopState::Stopped {
            if self.state != LoopState::Running {
                if let Err(e) = self.start() {
                    throttled!(
                        self.throttle,
                        "startup",
                        warn,
                        "{e}, retrying in {:?}",
                        self.config.startup_retry_interval
                    );
                    if stop.wait(self.config.startup_retry_interval) {
                        break;
                    }
                    continue;
                }
            }

            let tick_start = Instant::now();
            if self.tick_guarded().is_some_and(|r| r.window_closed) {
                info!("Render window closed");
                break;
            }

            if let Some(interval) = self.config.frame_interval() {
                let deadline = tick_start + interval;
                let remaining = deadline.saturating_duration_since(Instant::now());
                if self.backend.wait_messages(remaining) {
                    continue;
                }
                let remaining = deadline.saturating_duration_since(Instant::now());
                if !remaining.is_zero() && stop.wait(remaining) {
                    break;
                }
            }
        }

        self.stop();
    }

    /// Releases every resource and shuts the backend down. Idempotent.
    pub fn stop(&mut self) {
        match self.state {
            LoopState::Stopped => return,
            LoopState::Uninitialized => {}
            _ => {
                let destroyed = self.invalidate();
                self.backend.shutdown();
                debug!("Render loop stopped, destroyed {destroyed} resources");
            }
        }
        self.state = LoopState::Stopped;
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
