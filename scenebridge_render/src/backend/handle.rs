use std::fmt::{Display, Formatter};
use std::num::NonZeroU64;

macro_rules! backend_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Wraps a backend-issued id. Zero is the backend's "no resource" and yields `None`.
            pub const fn from_raw(raw: u64) -> Option<Self> {
                match NonZeroU64::new(raw) {
                    Some(id) => Some(Self(id)),
                    None => None,
                }
            }

            pub const fn raw(self) -> u64 {
                self.0.get()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

backend_handle!(
    /// Opaque id of a backend mesh. Owned by the backend, never dereferenced here.
    MeshHandle,
    "mesh"
);
backend_handle!(
    /// Opaque id of a backend texture.
    TextureHandle,
    "texture"
);
backend_handle!(
    /// Opaque id of a backend material.
    MaterialHandle,
    "material"
);
