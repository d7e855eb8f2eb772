use crate::backend::{MaterialHandle, TextureHandle};
use scenebridge_asset::ContentHash;

/// A backend material together with the textures it was built from.
///
/// Created on the render thread the first time an instance using it is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialRecord {
    pub handle: MaterialHandle,
    pub albedo: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub albedo_hash: Option<ContentHash>,
    pub normal_hash: Option<ContentHash>,
    pub albedo_color: [f32; 4],
    pub double_sided: bool,
}
