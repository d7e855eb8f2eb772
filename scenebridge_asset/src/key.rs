use std::fmt::{Display, Formatter};
use std::num::NonZeroU64;

/// Stable identity of a host entity across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A 64-bit content fingerprint. Zero means "no resource" and is never a valid hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(NonZeroU64);

impl ContentHash {
    /// Wraps a raw hash value, substituting 1 for 0.
    pub const fn from_raw(raw: u64) -> Self {
        match NonZeroU64::new(raw) {
            Some(v) => Self(v),
            None => Self(NonZeroU64::MIN),
        }
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.get())
    }
}

/// Cache key of a renderer resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// Persistent resource, identical source data always maps to the same key.
    Content(ContentHash),
    /// Per-frame resource of a skinned entity. Never reused across generations.
    Transient { entity: EntityId, generation: u64 },
}

impl ResourceKey {
    pub const fn content(hash: ContentHash) -> Self {
        Self::Content(hash)
    }

    pub const fn transient(entity: EntityId, generation: u64) -> Self {
        Self::Transient { entity, generation }
    }

    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// The 64-bit hash forwarded to the backend alongside the resource.
    pub fn backend_hash(&self) -> u64 {
        match *self {
            Self::Content(hash) => hash.get(),
            Self::Transient { entity, generation } => {
                let mut hasher = crate::hash::Fnv1a::new();
                hasher.write_u64(entity.0);
                hasher.write_u64(generation);
                ContentHash::from_raw(hasher.finish()).get()
            }
        }
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Content(hash) => write!(f, "content:{hash}"),
            Self::Transient { entity, generation } => {
                write!(f, "transient:{entity}@{generation}")
            }
        }
    }
}
