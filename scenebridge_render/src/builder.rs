//! Amortized upload of static meshes.
//!
//! Meshes seen for the first time are queued here and turned into backend
//! resources a few at a time, so a scene load spreads its uploads over many
//! frames instead of stalling one.

use crate::cache::ResourceCaches;
use crate::convert::vertices_to_backend;
use crate::error::{BuildError, InvalidErr};
use scenebridge_asset::{MaterialDescriptor, MeshDescriptor, ResourceKey, Vertex};
use scenebridge_utils::{BridgeConfig, LogThrottle, throttled};
use snafu::ResultExt;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use web_time::Instant;

#[derive(Debug, Clone)]
pub struct BuildJob {
    pub key: ResourceKey,
    pub mesh: Arc<MeshDescriptor>,
    pub material: Option<Arc<MaterialDescriptor>>,
}

impl BuildJob {
    pub fn new(mesh: Arc<MeshDescriptor>, material: Option<Arc<MaterialDescriptor>>) -> Self {
        Self {
            key: mesh.key(),
            mesh,
            material,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    AlreadyCached,
    AlreadyQueued,
    /// The mesh failed validation before and will not be built again.
    Rejected,
}

/// What one [`IncrementalBuilder::drain`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Jobs taken off the queue.
    pub processed: usize,
    pub created: usize,
    /// Jobs whose key was already cached when they came up.
    pub dropped: usize,
    /// Jobs that failed validation. Never retried.
    pub rejected: usize,
    /// Jobs the backend refused. Retried once they're enqueued again.
    pub failed: usize,
    pub remaining: usize,
    pub elapsed: Duration,
    pub budget_exhausted: bool,
}

#[derive(Debug)]
pub struct IncrementalBuilder {
    caches: Arc<ResourceCaches>,
    queue: VecDeque<BuildJob>,
    enqueued: HashSet<ResourceKey>,
    rejected: HashSet<ResourceKey>,

    vertices: Vec<Vertex>,
    indices: Vec<u32>,

    budget: Duration,
    small_batch: usize,
    large_batch: usize,
    deep_queue: usize,
    throttle: LogThrottle,
}

impl IncrementalBuilder {
    pub fn new(caches: Arc<ResourceCaches>, config: &BridgeConfig) -> Self {
        Self {
            caches,
            queue: VecDeque::new(),
            enqueued: HashSet::new(),
            rejected: HashSet::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            budget: config.builder_budget,
            small_batch: config.builder_small_batch.max(1),
            large_batch: config.builder_large_batch.max(1),
            deep_queue: config.builder_deep_queue,
            throttle: LogThrottle::new(config.log_interval),
        }
    }

    pub fn enqueue(&mut self, job: BuildJob) -> EnqueueOutcome {
        if self.rejected.contains(&job.key) {
            return EnqueueOutcome::Rejected;
        }
        if self.caches.meshes.contains(&job.key) {
            return EnqueueOutcome::AlreadyCached;
        }
        if !self.enqueued.insert(job.key) {
            return EnqueueOutcome::AlreadyQueued;
        }

        self.queue.push_back(job);
        EnqueueOutcome::Queued
    }

    /// Maximum jobs one drain processes at the current queue depth.
    pub fn batch_limit(&self) -> usize {
        if self.queue.len() > self.deep_queue {
            self.small_batch
        } else {
            self.large_batch
        }
    }

    /// Builds queued meshes until the batch limit, the time budget or the queue runs out.
    ///
    /// The budget is checked before each job, so a drain can overrun it by at most the
    /// duration of one job.
    #[profiling::function]
    pub fn drain(&mut self) -> BuildReport {
        let start = Instant::now();
        let limit = self.batch_limit();
        let mut report = BuildReport::default();

        while report.processed < limit {
            if start.elapsed() >= self.budget {
                report.budget_exhausted = true;
                break;
            }
            let Some(job) = self.queue.pop_front() else {
                break;
            };
            self.enqueued.remove(&job.key);
            report.processed += 1;

            if self.caches.meshes.contains(&job.key) {
                report.dropped += 1;
                continue;
            }

            match self.build(&job) {
                Ok(()) => report.created += 1,
                Err(e) if e.is_permanent() => {
                    self.rejected.insert(job.key);
                    report.rejected += 1;
                    throttled!(self.throttle, "build-invalid", warn, "Dropped mesh: {e}");
                }
                Err(e) => {
                    report.failed += 1;
                    throttled!(
                        self.throttle,
                        "build-backend",
                        warn,
                        "Mesh upload failed: {e}"
                    );
                }
            }
        }

        report.remaining = self.queue.len();
        report.elapsed = start.elapsed();
        if report.processed > 0 {
            debug!(
                processed = report.processed,
                created = report.created,
                remaining = report.remaining,
                "Builder drained"
            );
        }
        report
    }

    fn build(&mut self, job: &BuildJob) -> Result<(), BuildError> {
        job.mesh
            .prepare_into(&mut self.vertices, &mut self.indices)
            .context(InvalidErr {
                name: &job.mesh.name,
            })?;
        vertices_to_backend(&mut self.vertices);

        self.caches.upload_mesh(
            job.key,
            &job.mesh.name,
            &self.vertices,
            &self.indices,
            job.material.as_deref(),
        )?;
        Ok(())
    }

    /// Forgets every queued job and every rejection. Returns how many jobs were discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.queue.len();
        self.queue.clear();
        self.enqueued.clear();
        self.rejected.clear();
        discarded
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_enqueued(&self, key: &ResourceKey) -> bool {
        self.enqueued.contains(key)
    }

    pub fn is_rejected(&self, key: &ResourceKey) -> bool {
        self.rejected.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SerializedBackend;
    use crate::backend::recording::RecordingBackend;
    use glamx::Vec3;

    fn setup() -> (IncrementalBuilder, Arc<ResourceCaches>, RecordingBackend) {
        let recording = RecordingBackend::new();
        let caches = Arc::new(ResourceCaches::new(SerializedBackend::new(recording.clone())));
        let builder = IncrementalBuilder::new(caches.clone(), &BridgeConfig::default());
        (builder, caches, recording)
    }

    fn triangle(name: &str) -> Arc<MeshDescriptor> {
        Arc::new(MeshDescriptor::new(
            name,
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
        ))
    }

    #[test]
    fn duplicate_enqueue_is_refused() {
        let (mut builder, _, _) = setup();
        let job = BuildJob::new(triangle("a"), None);

        assert_eq!(builder.enqueue(job.clone()), EnqueueOutcome::Queued);
        assert_eq!(builder.enqueue(job.clone()), EnqueueOutcome::AlreadyQueued);
        assert_eq!(builder.len(), 1);

        builder.drain();
        assert_eq!(builder.enqueue(job), EnqueueOutcome::AlreadyCached);
    }

    #[test]
    fn converted_geometry_reaches_backend() {
        let (mut builder, caches, recording) = setup();
        let mesh = Arc::new(MeshDescriptor::new(
            "raised",
            vec![Vec3::new(1.0, 2.0, 3.0), Vec3::X, Vec3::Y],
            vec![0, 1, 2],
        ));
        builder.enqueue(BuildJob::new(mesh.clone(), None));

        let report = builder.drain();
        assert_eq!(report.created, 1);
        assert!(caches.mesh(&mesh.key()).is_some());
        assert!(recording.calls().iter().any(|c| matches!(
            c,
            crate::backend::recording::BackendCall::CreateMesh {
                first_position: Some(p),
                ..
            } if *p == Vec3::new(1.0, 3.0, 2.0)
        )));
    }

    #[test]
    fn clear_forgets_rejections() {
        let (mut builder, _, _) = setup();
        let broken = Arc::new(MeshDescriptor::new("broken", vec![Vec3::ZERO], vec![0, 1, 2]));
        let job = BuildJob::new(broken, None);

        builder.enqueue(job.clone());
        assert_eq!(builder.drain().rejected, 1);
        assert_eq!(builder.enqueue(job.clone()), EnqueueOutcome::Rejected);

        builder.clear();
        assert_eq!(builder.enqueue(job), EnqueueOutcome::Queued);
    }
}
