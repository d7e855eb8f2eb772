use glamx::Mat4;
use scenebridge_asset::{CameraSample, EntityId, LightSample, MaterialDescriptor, MeshDescriptor};
use snafu::Snafu;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(context(suffix(Err)))]
#[snafu(visibility(pub))]
pub enum CaptureError {
    #[snafu(display("Entity {entity} was destroyed during capture"))]
    Destroyed { entity: EntityId },

    #[snafu(display("Could not bake the skinned mesh of {entity}: {reason}"))]
    Bake { entity: EntityId, reason: String },
}

/// Host-side visibility flags of a renderer. All of them must be set for it to be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub enabled: bool,
    pub active: bool,
    pub visible: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::VISIBLE
    }
}

impl RenderState {
    pub const VISIBLE: RenderState = RenderState {
        enabled: true,
        active: true,
        visible: true,
    };

    #[inline]
    pub const fn is_renderable(&self) -> bool {
        self.enabled && self.active && self.visible
    }
}

#[derive(Debug, Clone)]
pub struct StaticRenderer {
    pub entity: EntityId,
    /// `None` if the renderer has no mesh assigned.
    pub mesh: Option<Arc<MeshDescriptor>>,
    pub material: Option<Arc<MaterialDescriptor>>,
    pub world: Mat4,
    pub state: RenderState,
    pub pick_tag: Option<u32>,
}

impl StaticRenderer {
    pub fn new(entity: EntityId, mesh: Arc<MeshDescriptor>, world: Mat4) -> Self {
        Self {
            entity,
            mesh: Some(mesh),
            material: None,
            world,
            state: RenderState::VISIBLE,
            pick_tag: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkinnedRenderer {
    pub entity: EntityId,
    pub material: Option<Arc<MaterialDescriptor>>,
    pub world: Mat4,
    pub state: RenderState,
    pub pick_tag: Option<u32>,
}

impl SkinnedRenderer {
    pub fn new(entity: EntityId, world: Mat4) -> Self {
        Self {
            entity,
            material: None,
            world,
            state: RenderState::VISIBLE,
            pick_tag: None,
        }
    }
}

/// The host scene graph as seen by the capture.
///
/// Everything is called from the host's own thread, once per captured tick.
pub trait SceneSource {
    /// Changes whenever the host loads a different scene.
    fn scene_epoch(&self) -> u64;

    /// World transform and projection of the active camera, if there is one.
    fn camera(&self) -> Option<CameraSample>;

    fn static_renderers(&self) -> Vec<StaticRenderer>;

    fn skinned_renderers(&self) -> Vec<SkinnedRenderer>;

    /// Bakes the current pose of a skinned renderer into flat, world-scaled geometry.
    fn bake_skinned(&mut self, entity: EntityId) -> Result<MeshDescriptor, CaptureError>;

    fn lights(&self) -> Vec<LightSample> {
        Vec::new()
    }
}
