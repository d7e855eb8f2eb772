//! Content-keyed stores of backend handles.
//!
//! One [`ResourceCache`] per resource kind, bundled in [`ResourceCaches`] together
//! with the backend that creates and destroys what they hold. The caches are shared
//! between the render thread and anything else that needs a handle; the backend
//! lock is only taken while a creation or destruction actually happens.

mod material;
mod resource_cache;

pub use material::MaterialRecord;
pub use resource_cache::{CacheEntry, ResourceCache};

use crate::backend::*;
use crate::error::{BackendErr, Result, TextureErr};
use scenebridge_asset::{ContentHash, MaterialDescriptor, ResourceKey, TextureData, Vertex};
use snafu::ResultExt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Debug)]
pub struct ResourceCaches {
    pub meshes: ResourceCache<ResourceKey, MeshHandle>,
    pub textures: ResourceCache<ContentHash, TextureHandle>,
    pub materials: ResourceCache<ContentHash, MaterialRecord>,
    backend: Arc<SerializedBackend>,
}

impl ResourceCaches {
    pub fn new(backend: Arc<SerializedBackend>) -> Self {
        Self {
            meshes: ResourceCache::new("meshes"),
            textures: ResourceCache::new("textures"),
            materials: ResourceCache::new("materials"),
            backend,
        }
    }

    pub fn backend(&self) -> &Arc<SerializedBackend> {
        &self.backend
    }

    #[inline]
    pub fn mesh(&self, key: &ResourceKey) -> Option<MeshHandle> {
        self.meshes.get(key)
    }

    pub fn texture(&self, texture: &TextureData) -> Result<TextureHandle> {
        let hash = texture.content_hash().context(TextureErr {
            name: &texture.name,
        })?;

        self.textures.get_or_create(hash, || {
            let pixels = texture.to_rgba8().context(TextureErr {
                name: &texture.name,
            })?;
            let handle = self
                .backend
                .create_texture(&TextureUpload {
                    label: &texture.name,
                    pixels: &pixels,
                    width: texture.width,
                    height: texture.height,
                    mip_count: texture.mip_count,
                    hash: hash.get(),
                })
                .context(BackendErr {
                    what: "texture",
                    name: &texture.name,
                })?;

            trace!("Created texture {:?} as {handle}", texture.name);
            Ok(handle)
        })
    }

    /// Returns the material record, creating its textures and the material on first use.
    ///
    /// A texture whose pixels can't be converted is left out of the material. Backend
    /// failures are returned and leave the material uncached.
    pub fn material(&self, material: &MaterialDescriptor) -> Result<MaterialRecord> {
        let key = material.key();
        self.materials.get_or_create(key, || {
            let albedo = self.optional_texture(material.albedo.as_deref())?;
            let normal = self.optional_texture(material.normal.as_deref())?;

            let handle = self
                .backend
                .create_material(&MaterialUpload {
                    label: &material.name,
                    albedo,
                    normal,
                    albedo_color: material.albedo_color,
                    emissive: material.emissive,
                    double_sided: material.double_sided,
                    hash: key.get(),
                })
                .context(BackendErr {
                    what: "material",
                    name: &material.name,
                })?;

            debug!("Created material {:?} as {handle}", material.name);
            Ok(MaterialRecord {
                handle,
                albedo,
                normal,
                albedo_hash: albedo.and(material.albedo_hash()),
                normal_hash: normal.and(material.normal_hash()),
                albedo_color: material.albedo_color,
                double_sided: material.double_sided,
            })
        })
    }

    fn optional_texture(&self, texture: Option<&TextureData>) -> Result<Option<TextureHandle>> {
        let Some(texture) = texture else {
            return Ok(None);
        };

        match self.texture(texture) {
            Ok(handle) => Ok(Some(handle)),
            Err(e) if e.is_permanent() => {
                warn!("Material texture left out: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns the mesh cached under `key`, uploading the given geometry if it isn't cached.
    ///
    /// The geometry must already be validated and converted to the backend convention.
    /// The material is resolved only if the mesh actually has to be created.
    pub fn upload_mesh(
        &self,
        key: ResourceKey,
        label: &str,
        vertices: &[Vertex],
        indices: &[u32],
        material: Option<&MaterialDescriptor>,
    ) -> Result<MeshHandle> {
        let entry = self.meshes.get_or_create_entry(key, || {
            let record = material.map(|m| self.material(m)).transpose()?;
            let handle = self
                .backend
                .create_mesh(&MeshUpload {
                    label,
                    vertices,
                    indices,
                    material: record.map(|r| r.handle),
                    hash: key.backend_hash(),
                })
                .context(BackendErr { what: "mesh", name: label })?;

            trace!("Created mesh {label:?} ({key}) as {handle}");
            Ok(CacheEntry::with_material(
                handle,
                material.map(MaterialDescriptor::key),
            ))
        })?;

        Ok(entry.handle)
    }

    /// Removes `key` and destroys its backend mesh. Returns `false` if it wasn't cached.
    pub fn destroy_mesh(&self, key: &ResourceKey) -> bool {
        match self.meshes.remove(key) {
            Some(entry) => {
                self.backend.destroy_mesh(entry.handle);
                true
            }
            None => false,
        }
    }

    /// Destroys every cached resource. Returns how many were destroyed.
    ///
    /// Meshes go first, then the materials they reference, then textures.
    pub fn invalidate(&self) -> usize {
        let meshes = self.meshes.drain();
        let materials = self.materials.drain();
        let textures = self.textures.drain();
        let destroyed = meshes.len() + materials.len() + textures.len();

        self.backend.with(|backend| {
            for (_, entry) in &meshes {
                backend.destroy_mesh(entry.handle);
            }
            for (_, entry) in &materials {
                backend.destroy_material(entry.handle.handle);
            }
            for (_, entry) in &textures {
                backend.destroy_texture(entry.handle);
            }
        });

        debug!(
            meshes = meshes.len(),
            materials = materials.len(),
            textures = textures.len(),
            "Invalidated resource caches"
        );
        destroyed
    }
}
