//! Plain data crossing the producer/consumer boundary.
//!
//! Nothing in here talks to the renderer. The snapshot types are filled by the
//! capture side and read by the render side, the descriptors carry the raw
//! resource data the render side turns into backend resources, and the
//! [`hash`] module derives the content keys both sides agree on.

pub mod hash;
mod key;
pub mod material;
pub mod mesh;
pub mod snapshot;
pub mod texture;

pub use key::{ContentHash, EntityId, ResourceKey};
pub use material::MaterialDescriptor;
pub use mesh::{MeshDescriptor, MeshError, PreparedMesh, SubMesh, Topology, Vertex};
pub use snapshot::{CameraSample, LightSample, LightType, SkinnedSample, Snapshot, StaticInstance};
pub use texture::{PixelFormat, TextureData, TextureError, TextureOrigin};
