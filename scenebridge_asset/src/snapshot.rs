//! The per-tick scene description handed from the producer to the render thread.
//!
//! A [`Snapshot`] owns everything it references by value or through immutable
//! `Arc`s, so the consumer can read it while the producer keeps mutating the scene.

use crate::{EntityId, MaterialDescriptor, MeshDescriptor, ResourceKey};
use glamx::{Mat4, Vec3};
use std::f32::consts::FRAC_PI_3;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSample {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// `false` if the host had no usable camera this tick.
    pub valid: bool,
}

impl Default for CameraSample {
    fn default() -> Self {
        Self {
            valid: false,
            ..Self::synthetic(16.0 / 9.0)
        }
    }
}

impl CameraSample {
    pub const DEFAULT_FOV_Y: f32 = FRAC_PI_3;
    pub const DEFAULT_NEAR: f32 = 0.1;
    pub const DEFAULT_FAR: f32 = 1000.0;

    /// Samples a camera from its world transform. The camera looks down its local -Z.
    pub fn from_world(world: &Mat4, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: world.w_axis.truncate(),
            forward: world.transform_vector3(Vec3::NEG_Z).normalize_or_zero(),
            up: world.transform_vector3(Vec3::Y).normalize_or_zero(),
            right: world.transform_vector3(Vec3::X).normalize_or_zero(),
            fov_y,
            aspect,
            near,
            far,
            valid: true,
        }
    }

    /// Stand-in used when no camera was captured.
    pub fn synthetic(aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 1.7, 5.0),
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            fov_y: Self::DEFAULT_FOV_Y,
            aspect,
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
            valid: true,
        }
    }

    /// This camera, or the synthetic fallback if it is invalid.
    pub fn resolved(&self, fallback_aspect: f32) -> CameraSample {
        if self.valid {
            *self
        } else {
            Self::synthetic(fallback_aspect)
        }
    }
}

/// A static mesh placed in the world.
#[derive(Debug, Clone)]
pub struct StaticInstance {
    pub key: ResourceKey,
    pub transform: Mat4,
    /// Source data, used to build the resource if `key` isn't cached yet.
    pub mesh: Arc<MeshDescriptor>,
    pub material: Option<Arc<MaterialDescriptor>>,
    pub pick_tag: Option<u32>,
}

impl StaticInstance {
    pub fn new(mesh: Arc<MeshDescriptor>, transform: Mat4) -> Self {
        Self {
            key: mesh.key(),
            transform,
            mesh,
            material: None,
            pick_tag: None,
        }
    }

    pub fn with_material(mut self, material: Arc<MaterialDescriptor>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_pick_tag(mut self, tag: u32) -> Self {
        self.pick_tag = Some(tag);
        self
    }

    pub fn double_sided(&self) -> bool {
        self.material.as_ref().is_some_and(|m| m.double_sided)
    }
}

/// One skinned entity's geometry, baked for the current frame.
#[derive(Debug, Clone)]
pub struct SkinnedSample {
    pub entity: EntityId,
    pub mesh: MeshDescriptor,
    pub material: Option<Arc<MaterialDescriptor>>,
    /// World transform without scale magnitude, the baked vertices already carry it.
    pub transform: Mat4,
    pub pick_tag: Option<u32>,
}

impl SkinnedSample {
    pub fn new(entity: EntityId, mesh: MeshDescriptor, world: &Mat4) -> Self {
        Self {
            entity,
            mesh,
            material: None,
            transform: strip_scale(world),
            pick_tag: None,
        }
    }

    pub fn with_material(mut self, material: Arc<MaterialDescriptor>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn double_sided(&self) -> bool {
        self.material.as_ref().is_some_and(|m| m.double_sided)
    }
}

/// Removes the scale magnitude of a transform while keeping its sign.
pub fn strip_scale(transform: &Mat4) -> Mat4 {
    let (scale, rotation, translation) = transform.to_scale_rotation_translation();
    Mat4::from_scale_rotation_translation(scale.signum(), rotation, translation)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    Point,
    Sun,
    Spot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    pub kind: LightType,
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
    /// Spot cone angles in radians.
    pub inner_angle: f32,
    pub outer_angle: f32,
}

impl LightSample {
    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            kind: LightType::Point,
            position,
            direction: Vec3::NEG_Y,
            color,
            intensity,
            range,
            inner_angle: 0.0,
            outer_angle: 0.0,
        }
    }

    pub fn sun(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightType::Sun,
            position: Vec3::ZERO,
            direction: direction.normalize_or_zero(),
            color,
            intensity,
            range: f32::INFINITY,
            inner_angle: 0.0,
            outer_angle: 0.0,
        }
    }
}

/// Complete scene description of one producer tick.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Monotonically increasing producer tick counter.
    pub generation: u64,
    /// Changes whenever the host loads a different scene.
    pub scene_epoch: u64,
    pub camera: CameraSample,
    pub statics: Vec<StaticInstance>,
    pub skinned: Vec<SkinnedSample>,
    pub lights: Vec<LightSample>,
}

impl Snapshot {
    pub fn new(generation: u64, scene_epoch: u64) -> Self {
        Self {
            generation,
            scene_epoch,
            ..Self::default()
        }
    }

    pub fn with_camera(mut self, camera: CameraSample) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_static(mut self, instance: StaticInstance) -> Self {
        self.statics.push(instance);
        self
    }

    pub fn with_skinned(mut self, sample: SkinnedSample) -> Self {
        self.skinned.push(sample);
        self
    }

    pub fn with_light(mut self, light: LightSample) -> Self {
        self.lights.push(light);
        self
    }
}
