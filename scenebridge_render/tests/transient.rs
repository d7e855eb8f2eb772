use glamx::{Mat4, Quat, Vec3};
use scenebridge_asset::{EntityId, MeshDescriptor, SkinnedSample};
use scenebridge_render::backend::recording::RecordingBackend;
use scenebridge_render::backend::{MeshHandle, SerializedBackend};
use scenebridge_render::{ResourceCaches, TransientManager};
use scenebridge_utils::BridgeConfig;
use std::sync::Arc;
use std::time::Duration;

fn setup(config: &BridgeConfig) -> (TransientManager, RecordingBackend) {
    let recording = RecordingBackend::new();
    let caches = Arc::new(ResourceCaches::new(SerializedBackend::new(recording.clone())));
    (TransientManager::new(caches, config), recording)
}

fn baked(entity: u64, lift: f32) -> SkinnedSample {
    let mesh = MeshDescriptor::new(
        "skinned",
        vec![Vec3::new(0.0, lift, 0.0), Vec3::X, Vec3::Z],
        vec![0, 1, 2],
    );
    SkinnedSample::new(EntityId(entity), mesh, &Mat4::IDENTITY)
}

#[test]
fn superseded_meshes_wait_out_the_aging_threshold() {
    let (mut manager, recording) = setup(&BridgeConfig::default());
    let entity = EntityId(1);
    let mut handles: Vec<MeshHandle> = Vec::new();

    for generation in 1..=3 {
        let report = manager.update(&[baked(1, generation as f32)], generation);
        assert_eq!(report.built, 1);
        assert_eq!(report.destroyed, 0);
        handles.extend(manager.handle(entity));
    }

    // two generations were superseded, none has aged enough
    assert_eq!(manager.pending_destroys(), 2);
    assert_eq!(recording.meshes_created(), 3);
    assert_eq!(recording.meshes_destroyed(), 0);

    let expected_destroyed = [(4, 0), (5, 1), (6, 2), (7, 3)];
    for (generation, destroyed) in expected_destroyed {
        manager.update(&[baked(1, 0.0)], generation);
        handles.extend(manager.handle(entity));
        assert_eq!(recording.meshes_destroyed(), destroyed, "generation {generation}");
    }

    // the oldest meshes go first and the current one is untouched
    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(recording.is_live_mesh(*handle), i >= 3, "mesh {i}");
    }
    assert_eq!(manager.live_count(), 1);
}

#[test]
fn same_generation_is_not_rebuilt() {
    let (mut manager, recording) = setup(&BridgeConfig::default());

    assert_eq!(manager.update(&[baked(1, 0.0)], 1).built, 1);
    assert_eq!(manager.update(&[baked(1, 0.0)], 1).built, 0);
    assert_eq!(manager.update(&[baked(1, 0.0)], 0).built, 0);
    assert_eq!(recording.meshes_created(), 1);
    assert_eq!(manager.draws().count(), 1);
}

#[test]
fn vanished_entities_are_swept() {
    let config = BridgeConfig::builder()
        .sweep_interval_generations(4)
        .destroy_after_generations(1)
        .build();
    let (mut manager, recording) = setup(&config);

    manager.update(&[baked(1, 0.0), baked(2, 0.0)], 1);
    let gone = manager.handle(EntityId(2)).unwrap();

    for generation in 2..=4 {
        let report = manager.update(&[baked(1, 0.0)], generation);
        assert_eq!(manager.draws().count(), 1);
        assert_eq!(report.swept, usize::from(generation == 4));
    }
    assert!(recording.is_live_mesh(gone));
    assert_eq!(manager.handle(EntityId(2)), None);
    // pinned buffers are only freed on release
    assert_eq!(manager.pool().len(), 2);
    let grown = manager.pool().get(EntityId(2)).map(|b| b.grow_events());

    manager.update(&[baked(1, 0.0)], 5);
    assert!(!recording.is_live_mesh(gone));

    manager.update(&[baked(1, 0.0), baked(2, 0.0)], 6);
    assert!(manager.handle(EntityId(2)).is_some());
    assert_eq!(manager.pool().get(EntityId(2)).map(|b| b.grow_events()), grown);
    assert_eq!(manager.pool().len(), 2);
}

#[test]
fn work_per_tick_is_bounded() {
    let config = BridgeConfig::builder()
        .transient_max_per_tick(2)
        .transient_budget(Duration::from_secs(10))
        .build();
    let (mut manager, recording) = setup(&config);
    let samples: Vec<_> = (0..5).map(|i| baked(i, 0.0)).collect();

    let report = manager.update(&samples, 1);
    assert_eq!(report.processed, 2);
    assert_eq!(report.built, 2);
    assert_eq!(report.skipped, 3);
    assert!(report.budget_exhausted);
    assert_eq!(recording.meshes_created(), 2);
    assert_eq!(manager.draws().count(), 2);
}

#[test]
fn failed_samples_count_against_the_tick_limit() {
    let config = BridgeConfig::builder()
        .transient_max_per_tick(2)
        .transient_budget(Duration::from_secs(10))
        .build();
    let (mut manager, recording) = setup(&config);
    let degenerate: Vec<_> = (0..5)
        .map(|i| {
            let mesh = MeshDescriptor::new("broken", vec![Vec3::X, Vec3::Y], Vec::new());
            SkinnedSample::new(EntityId(i), mesh, &Mat4::IDENTITY)
        })
        .collect();

    let report = manager.update(&degenerate, 1);
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, 2);
    assert_eq!(report.built, 0);
    assert_eq!(report.skipped, 3);
    assert!(report.budget_exhausted);
    assert_eq!(recording.meshes_created(), 0);

    let mut mixed = degenerate;
    mixed.insert(0, baked(9, 0.0));
    let report = manager.update(&mixed, 2);
    assert_eq!(report.processed, 2);
    assert_eq!(report.built, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 4);
}

#[test]
fn draws_use_the_backend_convention() {
    let (mut manager, _) = setup(&BridgeConfig::default());
    let world = Mat4::from_scale_rotation_translation(
        Vec3::splat(2.0),
        Quat::IDENTITY,
        Vec3::new(1.0, 2.0, 3.0),
    );
    let mut sample = SkinnedSample::new(EntityId(9), baked(9, 0.0).mesh, &world);
    sample.pick_tag = Some(42);

    manager.update(&[sample], 1);
    let draw = manager.draws().next().unwrap();

    assert_eq!(draw.pick_tag, Some(42));
    assert_eq!(draw.transform.w_axis.truncate(), Vec3::new(1.0, 3.0, 2.0));
    // the scale is already baked into the vertices
    assert!((draw.transform.x_axis.length() - 1.0).abs() < 1e-5);
}

#[test]
fn release_all_frees_everything() {
    let (mut manager, recording) = setup(&BridgeConfig::default());
    for generation in 1..=4 {
        manager.update(&[baked(1, 0.0), baked(2, 0.0)], generation);
    }
    assert!(recording.live_meshes() > 2);

    manager.release_all();

    assert_eq!(recording.live_meshes(), 0);
    assert_eq!(manager.live_count(), 0);
    assert_eq!(manager.pending_destroys(), 0);
    assert!(manager.pool().is_empty());
    assert_eq!(recording.invalid_draws(), 0);
}
