//! Drives the bridge with a procedural scene and the recording backend.
//!
//! `cargo run --example headless -- --target-fps 60`
//! Set `RUST_LOG=debug` to see the render stats.

use glamx::{Mat4, Quat, Vec3};
use scenebridge::asset::{CameraSample, EntityId, LightSample, MeshDescriptor};
use scenebridge::render::backend::recording::{BackendCall, RecordingBackend};
use scenebridge::utils::BridgeConfig;
use scenebridge::{CaptureError, SceneBridge, SceneSource, SkinnedRenderer, StaticRenderer};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const HOST_TICKS: u64 = 300;

struct Orbit {
    tick: u64,
    cube: Arc<MeshDescriptor>,
}

impl Orbit {
    fn new() -> Self {
        let positions = (0..8)
            .map(|i| Vec3::new((i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32))
            .collect();
        let indices = vec![
            0, 2, 1, 1, 2, 3, 4, 5, 6, 5, 7, 6, 0, 1, 4, 1, 5, 4, 2, 6, 3, 3, 6, 7, 0, 4, 2, 2, 4,
            6, 1, 3, 5, 3, 7, 5,
        ];
        Self {
            tick: 0,
            cube: Arc::new(MeshDescriptor::new("cube", positions, indices)),
        }
    }
}

impl SceneSource for Orbit {
    fn scene_epoch(&self) -> u64 {
        0
    }

    fn camera(&self) -> Option<CameraSample> {
        let angle = self.tick as f32 * 0.01;
        let position = Vec3::new(angle.sin() * 12.0, 4.0, angle.cos() * 12.0);
        let world = Mat4::look_at_rh(position, Vec3::ZERO, Vec3::Y).inverse();
        Some(CameraSample::from_world(
            &world,
            CameraSample::DEFAULT_FOV_Y,
            16.0 / 9.0,
            0.1,
            100.0,
        ))
    }

    fn static_renderers(&self) -> Vec<StaticRenderer> {
        (0..25)
            .map(|i| {
                let x = (i % 5) as f32 * 2.0 - 4.0;
                let z = (i / 5) as f32 * 2.0 - 4.0;
                let world = Mat4::from_translation(Vec3::new(x, 0.0, z));
                let mut renderer = StaticRenderer::new(EntityId(i), self.cube.clone(), world);
                renderer.pick_tag = Some(i as u32);
                renderer
            })
            .collect()
    }

    fn skinned_renderers(&self) -> Vec<SkinnedRenderer> {
        let sway = Quat::from_rotation_y(self.tick as f32 * 0.05);
        vec![SkinnedRenderer::new(
            EntityId(1000),
            Mat4::from_rotation_translation(sway, Vec3::Y * 2.0),
        )]
    }

    fn bake_skinned(&mut self, _entity: EntityId) -> Result<MeshDescriptor, CaptureError> {
        let bend = (self.tick as f32 * 0.1).sin() * 0.5;
        Ok(MeshDescriptor::new(
            "tentacle",
            vec![Vec3::ZERO, Vec3::X * 0.2, Vec3::new(bend, 2.0, 0.0)],
            vec![0, 1, 2],
        ))
    }

    fn lights(&self) -> Vec<LightSample> {
        vec![
            LightSample::sun(Vec3::new(-0.4, -1.0, -0.3), Vec3::ONE, 2.0),
            LightSample::point(Vec3::Y * 3.0, Vec3::new(1.0, 0.6, 0.3), 5.0, 10.0),
        ]
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let backend = RecordingBackend::new();
    let Ok(mut bridge) = SceneBridge::start(BridgeConfig::from_args(), backend.clone()) else {
        tracing::error!("Could not start the render thread");
        return;
    };

    let mut scene = Orbit::new();
    for _ in 0..HOST_TICKS {
        scene.tick += 1;
        bridge.publish(&mut scene);
        std::thread::sleep(Duration::from_millis(16));
    }
    bridge.shutdown();

    info!(
        frames = backend.presents(),
        draws = backend.draws().len(),
        meshes_created = backend.meshes_created(),
        meshes_destroyed = backend.meshes_destroyed(),
        lights = backend.count(|c| matches!(c, BackendCall::SetLights(_))),
        "Done"
    );
}
