use crate::hash::Fnv1a;
use crate::{ContentHash, TextureData};
use std::sync::Arc;
use tracing::warn;

/// Material inputs captured from the host.
///
/// The backend material is not created here. The render side creates it the first
/// time an instance using this material is drawn.
#[derive(Debug, Clone)]
pub struct MaterialDescriptor {
    pub name: String,
    pub albedo: Option<Arc<TextureData>>,
    pub normal: Option<Arc<TextureData>>,
    pub albedo_color: [f32; 4],
    pub emissive: [f32; 3],
    pub double_sided: bool,
}

impl Default for MaterialDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            albedo: None,
            normal: None,
            albedo_color: [1.0; 4],
            emissive: [0.0; 3],
            double_sided: false,
        }
    }
}

impl MaterialDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_albedo(mut self, texture: Arc<TextureData>) -> Self {
        self.albedo = Some(texture);
        self
    }

    pub fn with_normal(mut self, texture: Arc<TextureData>) -> Self {
        self.normal = Some(texture);
        self
    }

    pub fn with_color(mut self, albedo_color: [f32; 4]) -> Self {
        self.albedo_color = albedo_color;
        self
    }

    pub fn with_emissive(mut self, emissive: [f32; 3]) -> Self {
        self.emissive = emissive;
        self
    }

    pub fn double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }

    /// Content hash of the albedo texture, `None` if absent or unconvertible.
    pub fn albedo_hash(&self) -> Option<ContentHash> {
        texture_hash(self.albedo.as_deref())
    }

    pub fn normal_hash(&self) -> Option<ContentHash> {
        texture_hash(self.normal.as_deref())
    }

    /// Identity of this material: texture contents plus constant inputs.
    pub fn key(&self) -> ContentHash {
        let mut hasher = Fnv1a::new();
        hasher.write_u64(self.albedo_hash().map_or(0, ContentHash::get));
        hasher.write_u64(self.normal_hash().map_or(0, ContentHash::get));
        for c in self.albedo_color {
            hasher.write_f32(c);
        }
        for c in self.emissive {
            hasher.write_f32(c);
        }
        hasher.write_bytes(&[self.double_sided as u8]);

        ContentHash::from_raw(hasher.finish())
    }
}

fn texture_hash(texture: Option<&TextureData>) -> Option<ContentHash> {
    let texture = texture?;
    match texture.content_hash() {
        Ok(hash) => Some(hash),
        Err(e) => {
            warn!("Ignoring texture {:?}: {e}", texture.name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PixelFormat;

    fn texture(value: u8) -> Arc<TextureData> {
        Arc::new(TextureData::new(
            "tex",
            1,
            1,
            PixelFormat::Rgba8,
            vec![value, value, value, 255],
        ))
    }

    #[test]
    fn key_is_stable_for_equal_inputs() {
        let a = MaterialDescriptor::new("a").with_albedo(texture(1));
        let b = MaterialDescriptor::new("b").with_albedo(texture(1));
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn key_tracks_textures_and_constants() {
        let base = MaterialDescriptor::new("m").with_albedo(texture(1));

        assert_ne!(base.key(), base.clone().with_albedo(texture(2)).key());
        assert_ne!(base.key(), base.clone().with_normal(texture(1)).key());
        assert_ne!(base.key(), base.clone().with_color([0.5; 4]).key());
        assert_ne!(base.key(), base.clone().with_emissive([1.0; 3]).key());
        assert_ne!(base.key(), base.clone().double_sided(true).key());
    }

    #[test]
    fn broken_textures_count_as_absent() {
        let broken = Arc::new(TextureData::new("broken", 4, 4, PixelFormat::Rgba8, vec![]));
        let with_broken = MaterialDescriptor::new("m").with_albedo(broken);

        assert_eq!(with_broken.albedo_hash(), None);
        assert_eq!(with_broken.key(), MaterialDescriptor::new("m").key());
    }
}
