//! Producer side of the bridge.
//!
//! [`SceneCapture`] walks a [`SceneSource`] and copies out everything the render
//! thread needs, so the snapshot stays valid however the scene changes afterwards.

mod source;

pub use source::{
    BakeErr, CaptureError, DestroyedErr, RenderState, SceneSource, SkinnedRenderer, StaticRenderer,
};

use scenebridge_asset::{SkinnedSample, Snapshot, StaticInstance};
use scenebridge_utils::{BridgeConfig, LogThrottle, throttled};
use tracing::{debug, trace};

/// What one capture saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureReport {
    pub statics: usize,
    pub skinned: usize,
    /// Renderers that are disabled, inactive, invisible or have no mesh.
    pub hidden: usize,
    /// Renderers whose data couldn't be read this tick.
    pub failed: usize,
}

#[derive(Debug)]
pub struct SceneCapture {
    generation: u64,
    epoch: u64,
    host_epoch: Option<u64>,
    last_report: CaptureReport,
    throttle: LogThrottle,
}

impl SceneCapture {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            generation: 0,
            epoch: 0,
            host_epoch: None,
            last_report: CaptureReport::default(),
            throttle: LogThrottle::new(config.log_interval),
        }
    }

    /// Generation of the last captured snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn last_report(&self) -> CaptureReport {
        self.last_report
    }

    /// Makes the next snapshot start a new scene epoch, dropping every renderer resource.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        debug!(epoch = self.epoch, "Scene invalidated");
    }

    /// Captures the current state of `source` into a new snapshot.
    #[profiling::function]
    pub fn capture(&mut self, source: &mut dyn SceneSource) -> Snapshot {
        let host_epoch = source.scene_epoch();
        if self.host_epoch.is_some_and(|e| e != host_epoch) {
            self.invalidate();
        }
        self.host_epoch = Some(host_epoch);

        self.generation += 1;
        let mut report = CaptureReport::default();
        let mut snapshot = Snapshot::new(self.generation, self.epoch)
            .with_camera(source.camera().unwrap_or_default());

        for renderer in source.static_renderers() {
            let mesh = match renderer.mesh {
                Some(mesh) if renderer.state.is_renderable() => mesh,
                _ => {
                    report.hidden += 1;
                    continue;
                }
            };

            let mut instance = StaticInstance::new(mesh, renderer.world);
            instance.material = renderer.material;
            instance.pick_tag = renderer.pick_tag;
            snapshot.statics.push(instance);
        }

        for renderer in source.skinned_renderers() {
            if !renderer.state.is_renderable() {
                report.hidden += 1;
                continue;
            }

            let mesh = match source.bake_skinned(renderer.entity) {
                Ok(mesh) => mesh,
                Err(e) => {
                    report.failed += 1;
                    throttled!(
                        self.throttle,
                        "bake",
                        warn,
                        "Skipping skinned renderer: {e}"
                    );
                    continue;
                }
            };

            let mut sample = SkinnedSample::new(renderer.entity, mesh, &renderer.world);
            sample.material = renderer.material;
            sample.pick_tag = renderer.pick_tag;
            snapshot.skinned.push(sample);
        }

        snapshot.lights = source.lights();

        report.statics = snapshot.statics.len();
        report.skinned = snapshot.skinned.len();
        self.last_report = report;

        if !snapshot.camera.valid {
            throttled!(
                self.throttle,
                "camera",
                debug,
                "No camera in scene, using fallback"
            );
        }
        trace!(
            generation = self.generation,
            statics = report.statics,
            skinned = report.skinned,
            "Captured scene"
        );
        snapshot
    }
}

impl Default for SceneCapture {
    fn default() -> Self {
        Self::new(&BridgeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glamx::{Mat4, Quat, Vec3};
    use scenebridge_asset::{CameraSample, EntityId, MeshDescriptor};
    use std::sync::Arc;

    #[derive(Default)]
    struct Scene {
        epoch: u64,
        statics: Vec<StaticRenderer>,
        skinned: Vec<SkinnedRenderer>,
        bakes: usize,
    }

    impl SceneSource for Scene {
        fn scene_epoch(&self) -> u64 {
            self.epoch
        }

        fn camera(&self) -> Option<CameraSample> {
            None
        }

        fn static_renderers(&self) -> Vec<StaticRenderer> {
            self.statics.clone()
        }

        fn skinned_renderers(&self) -> Vec<SkinnedRenderer> {
            self.skinned.clone()
        }

        fn bake_skinned(&mut self, entity: EntityId) -> Result<MeshDescriptor, CaptureError> {
            self.bakes += 1;
            if entity.0 == 13 {
                return DestroyedErr { entity }.fail();
            }
            Ok(triangle())
        }
    }

    fn triangle() -> MeshDescriptor {
        MeshDescriptor::new("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2])
    }

    #[test]
    fn hidden_renderers_are_left_out() {
        let mesh = Arc::new(triangle());
        let mut hidden = StaticRenderer::new(EntityId(2), mesh.clone(), Mat4::IDENTITY);
        hidden.state.visible = false;
        let mut meshless = StaticRenderer::new(EntityId(3), mesh.clone(), Mat4::IDENTITY);
        meshless.mesh = None;
        let mut disabled = SkinnedRenderer::new(EntityId(4), Mat4::IDENTITY);
        disabled.state.enabled = false;

        let mut scene = Scene {
            statics: vec![
                StaticRenderer::new(EntityId(1), mesh.clone(), Mat4::IDENTITY),
                hidden,
                meshless,
            ],
            skinned: vec![disabled],
            ..Scene::default()
        };

        let mut capture = SceneCapture::default();
        let snapshot = capture.capture(&mut scene);

        assert_eq!(snapshot.statics.len(), 1);
        assert_eq!(snapshot.statics[0].key, mesh.key());
        assert!(snapshot.skinned.is_empty());
        assert_eq!(scene.bakes, 0);
        assert_eq!(capture.last_report().hidden, 3);
        assert!(!snapshot.camera.valid);
    }

    #[test]
    fn failed_bakes_are_skipped() {
        let mut scene = Scene {
            skinned: vec![
                SkinnedRenderer::new(EntityId(13), Mat4::IDENTITY),
                SkinnedRenderer::new(
                    EntityId(14),
                    Mat4::from_scale_rotation_translation(
                        Vec3::splat(3.0),
                        Quat::IDENTITY,
                        Vec3::X,
                    ),
                ),
            ],
            ..Scene::default()
        };

        let mut capture = SceneCapture::default();
        let snapshot = capture.capture(&mut scene);

        assert_eq!(snapshot.skinned.len(), 1);
        assert_eq!(snapshot.skinned[0].entity, EntityId(14));
        let (scale, _, translation) = snapshot.skinned[0].transform.to_scale_rotation_translation();
        assert!((scale - Vec3::ONE).length() < 1e-5);
        assert_eq!(translation, Vec3::X);
        assert_eq!(capture.last_report().failed, 1);
    }

    #[test]
    fn generations_increase_and_scene_changes_bump_the_epoch() {
        let mut scene = Scene::default();
        let mut capture = SceneCapture::default();

        let first = capture.capture(&mut scene);
        let second = capture.capture(&mut scene);
        assert_eq!((first.generation, second.generation), (1, 2));
        assert_eq!(first.scene_epoch, second.scene_epoch);

        scene.epoch = 7;
        let third = capture.capture(&mut scene);
        assert_eq!(third.scene_epoch, second.scene_epoch + 1);

        capture.invalidate();
        assert_eq!(capture.capture(&mut scene).scene_epoch, third.scene_epoch + 1);
    }
}
