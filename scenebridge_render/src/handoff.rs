use parking_lot::Mutex;
use scenebridge_asset::Snapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Single-slot, last-write-wins exchange of complete snapshots.
///
/// The producer builds a snapshot entirely on its own and then swaps it in. The lock
/// only covers the pointer swap, so the consumer never waits for a traversal and
/// never sees a half-filled snapshot.
#[derive(Debug, Default)]
pub struct SnapshotHandoff {
    slot: Mutex<Option<Arc<Snapshot>>>,
    published: AtomicU64,
}

impl SnapshotHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current snapshot. An unread previous snapshot is dropped.
    pub fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        let previous = self.slot.lock().replace(snapshot);
        self.published.fetch_add(1, Ordering::Release);
        // the superseded snapshot is freed outside the lock
        drop(previous);
    }

    /// The most recently published snapshot, if any. Repeated reads return the same one
    /// until the producer publishes again.
    pub fn read_latest(&self) -> Option<Arc<Snapshot>> {
        self.slot.lock().clone()
    }

    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glamx::Vec3;
    use scenebridge_asset::{CameraSample, LightSample};
    use std::thread;

    #[test]
    fn last_write_wins() {
        let handoff = SnapshotHandoff::new();
        assert!(handoff.read_latest().is_none());

        handoff.publish(Snapshot::new(1, 0));
        handoff.publish(Snapshot::new(2, 0));

        let latest = handoff.read_latest().unwrap();
        assert_eq!(latest.generation, 2);
        assert_eq!(handoff.read_latest().unwrap().generation, 2);
        assert_eq!(handoff.published_count(), 2);
    }

    #[test]
    fn reader_only_sees_complete_snapshots() {
        const LIGHTS: usize = 32;

        let handoff = Arc::new(SnapshotHandoff::new());
        let producer = {
            let handoff = handoff.clone();
            thread::spawn(move || {
                for generation in 1..=500u64 {
                    let mut snapshot = Snapshot::new(generation, 0)
                        .with_camera(CameraSample::synthetic(generation as f32));
                    for _ in 0..LIGHTS {
                        snapshot = snapshot.with_light(LightSample::point(
                            Vec3::splat(generation as f32),
                            Vec3::ONE,
                            1.0,
                            10.0,
                        ));
                    }
                    handoff.publish(snapshot);
                }
            })
        };

        let mut last = 0;
        while last < 500 {
            let Some(snapshot) = handoff.read_latest() else {
                continue;
            };
            assert_eq!(snapshot.lights.len(), LIGHTS);
            assert!(snapshot.generation >= last);
            let g = snapshot.generation as f32;
            assert!(snapshot.lights.iter().all(|l| l.position.x == g));
            assert_eq!(snapshot.camera.aspect, g);
            last = snapshot.generation;
        }

        producer.join().unwrap();
    }
}
