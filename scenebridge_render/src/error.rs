use crate::backend::BackendError;
use scenebridge_asset::{MeshError, TextureError};
use snafu::Snafu;

pub type Result<T, E = BuildError> = std::result::Result<T, E>;

/// Why a resource could not be turned into a backend handle.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(context(suffix(Err)))]
#[snafu(visibility(pub))]
pub enum BuildError {
    #[snafu(display("Mesh {name:?} is degenerate: {source}"))]
    Invalid { name: String, source: MeshError },

    #[snafu(display("Texture {name:?} could not be converted: {source}"))]
    Texture { name: String, source: TextureError },

    #[snafu(display("Backend failed to create {what} {name:?}: {source}"))]
    Backend {
        what: &'static str,
        name: String,
        source: BackendError,
    },
}

impl BuildError {
    /// Permanent failures depend only on the source data and are never retried.
    /// Backend failures may succeed when the same content is submitted again.
    pub fn is_permanent(&self) -> bool {
        !matches!(self, BuildError::Backend { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_backend_failures_are_retryable() {
        let invalid = BuildError::Invalid {
            name: "cube".into(),
            source: MeshError::EmptyVertices,
        };
        let backend = BuildError::Backend {
            what: "mesh",
            name: "cube".into(),
            source: BackendError::Rejected {
                what: "mesh",
                code: 3,
            },
        };

        assert!(invalid.is_permanent());
        assert!(!backend.is_permanent());
        assert!(backend.to_string().contains("cube"));
    }
}
