//! Per-frame resources of skinned meshes.
//!
//! A skinned entity's geometry is re-baked by the host every frame. Each new
//! generation gets a fresh backend mesh under a key that includes the
//! generation, while the mesh it replaces is parked in a
//! [`DeferredDestructionQueue`] until no frame in flight can still read it.

mod deferred;
mod pinned;

pub use deferred::DeferredDestructionQueue;
pub use pinned::{PinnedBuffer, PinnedBufferPool};

use crate::backend::{DrawCall, MeshHandle};
use crate::cache::ResourceCaches;
use crate::convert::{transform_to_backend, vertices_to_backend};
use glamx::Mat4;
use scenebridge_asset::{EntityId, ResourceKey, SkinnedSample};
use scenebridge_utils::{BridgeConfig, LogThrottle, throttled};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use web_time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveTransient {
    key: ResourceKey,
    handle: MeshHandle,
    transform: Mat4,
    double_sided: bool,
    pick_tag: Option<u32>,
    last_seen: u64,
}

/// What one [`TransientManager::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransientReport {
    /// Samples attempted this tick, built or failed.
    pub processed: usize,
    pub built: usize,
    /// Samples left on their previous resource because the tick ran out of count or time.
    pub skipped: usize,
    pub failed: usize,
    pub destroyed: usize,
    pub swept: usize,
    pub budget_exhausted: bool,
}

#[derive(Debug)]
pub struct TransientManager {
    caches: Arc<ResourceCaches>,
    pool: PinnedBufferPool,
    active: HashMap<EntityId, ActiveTransient>,
    retired: DeferredDestructionQueue<ResourceKey>,
    generation: Option<u64>,
    last_sweep: u64,

    budget: Duration,
    max_per_tick: usize,
    sweep_interval: u64,
    throttle: LogThrottle,
}

impl TransientManager {
    pub fn new(caches: Arc<ResourceCaches>, config: &BridgeConfig) -> Self {
        Self {
            caches,
            pool: PinnedBufferPool::default(),
            active: HashMap::new(),
            retired: DeferredDestructionQueue::new(config.destroy_after_generations),
            generation: None,
            last_sweep: 0,
            budget: config.transient_budget,
            max_per_tick: config.transient_max_per_tick,
            sweep_interval: config.sweep_interval_generations.max(1),
            throttle: LogThrottle::new(config.log_interval),
        }
    }

    /// Rebuilds the skinned resources of `generation`.
    ///
    /// Does nothing if `generation` was already processed, so re-rendering the same
    /// snapshot keeps drawing the same meshes.
    #[profiling::function]
    pub fn update(&mut self, samples: &[SkinnedSample], generation: u64) -> TransientReport {
        let mut report = TransientReport::default();
        if self.generation.is_some_and(|last| generation <= last) {
            return report;
        }
        self.generation = Some(generation);

        for sample in samples {
            if let Some(active) = self.active.get_mut(&sample.entity) {
                active.last_seen = generation;
                active.transform = sample.transform;
                active.double_sided = sample.double_sided();
                active.pick_tag = sample.pick_tag;
            }
        }

        let start = Instant::now();
        for (i, sample) in samples.iter().enumerate() {
            if report.processed >= self.max_per_tick || start.elapsed() >= self.budget {
                report.budget_exhausted = true;
                report.skipped = samples.len() - i;
                break;
            }
            report.processed += 1;

            let buffer = self.pool.acquire(sample.entity);
            if let Err(e) = buffer.fill(&sample.mesh) {
                report.failed += 1;
                throttled!(
                    self.throttle,
                    "transient-invalid",
                    warn,
                    "Skinned mesh of {} skipped: {e}",
                    sample.entity
                );
                continue;
            }
            vertices_to_backend(&mut buffer.vertices);

            let key = ResourceKey::transient(sample.entity, generation);
            let created = self.caches.upload_mesh(
                key,
                &sample.mesh.name,
                &buffer.vertices,
                &buffer.indices,
                sample.material.as_deref(),
            );
            let handle = match created {
                Ok(handle) => handle,
                Err(e) => {
                    report.failed += 1;
                    throttled!(
                        self.throttle,
                        "transient-backend",
                        warn,
                        "Skinned mesh of {} not rebuilt: {e}",
                        sample.entity
                    );
                    continue;
                }
            };

            let replaced = self.active.insert(
                sample.entity,
                ActiveTransient {
                    key,
                    handle,
                    transform: sample.transform,
                    double_sided: sample.double_sided(),
                    pick_tag: sample.pick_tag,
                    last_seen: generation,
                },
            );
            if let Some(previous) = replaced {
                self.retired.push(previous.key, generation);
            }
            report.built += 1;
        }

        if generation >= self.last_sweep + self.sweep_interval {
            self.last_sweep = generation;
            report.swept = self.sweep(generation);
        }

        let caches = &self.caches;
        report.destroyed = self.retired.drain_aged(generation, |key| {
            caches.destroy_mesh(&key);
        });

        trace!(
            generation,
            built = report.built,
            destroyed = report.destroyed,
            "Transient update"
        );
        report
    }

    /// Retires the resources of entities that were not part of `generation`.
    ///
    /// Their pinned buffers stay in the pool until [`TransientManager::release_all`].
    fn sweep(&mut self, generation: u64) -> usize {
        let stale: Vec<EntityId> = self
            .active
            .iter()
            .filter(|(_, active)| active.last_seen < generation)
            .map(|(entity, _)| *entity)
            .collect();

        for entity in &stale {
            if let Some(active) = self.active.remove(entity) {
                self.retired.push(active.key, generation);
            }
        }

        if !stale.is_empty() {
            debug!("Swept {} stale skinned entities", stale.len());
        }
        stale.len()
    }

    /// Draw calls for every skinned entity of the last processed generation.
    pub fn draws(&self) -> impl Iterator<Item = DrawCall> + '_ {
        let generation = self.generation;
        self.active
            .values()
            .filter(move |active| Some(active.last_seen) == generation)
            .map(|active| DrawCall {
                mesh: active.handle,
                transform: transform_to_backend(&active.transform),
                double_sided: active.double_sided,
                pick_tag: active.pick_tag,
            })
    }

    /// Destroys every resource right away and frees all pinned buffers.
    ///
    /// Used on shutdown and scene invalidation. Returns how many meshes were destroyed.
    pub fn release_all(&mut self) -> usize {
        let caches = &self.caches;
        let mut destroyed = 0;
        self.retired.drain_all(|key| {
            if caches.destroy_mesh(&key) {
                destroyed += 1;
            }
        });
        for (_, active) in self.active.drain() {
            if caches.destroy_mesh(&active.key) {
                destroyed += 1;
            }
        }

        let buffers = self.pool.clear();
        self.generation = None;
        self.last_sweep = 0;

        debug!(destroyed, buffers, "Released transient resources");
        destroyed
    }

    pub fn pending_destroys(&self) -> usize {
        self.retired.len()
    }

    pub fn live_count(&self) -> usize {
        self.active.len()
    }

    pub fn handle(&self, entity: EntityId) -> Option<MeshHandle> {
        self.active.get(&entity).map(|active| active.handle)
    }

    pub fn pool(&self) -> &PinnedBufferPool {
        &self.pool
    }

    pub fn generation(&self) -> Option<u64> {
        self.generation
    }
}
