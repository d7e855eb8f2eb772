mod vertex;

pub use vertex::{DEFAULT_NORMAL, Vertex};

use crate::hash::mesh_content_hash;
use crate::{ContentHash, ResourceKey};
use glamx::{Vec2, Vec3};
use snafu::{Snafu, ensure};
use std::ops::Range;

type Result<T, E = MeshError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(context(suffix(Err)))]
pub enum MeshError {
    #[snafu(display("The mesh has no vertices"))]
    EmptyVertices,
    #[snafu(display("The mesh has no triangle geometry"))]
    NoTriangles,
    #[snafu(display("Triangle index count {count} is not a multiple of 3"))]
    IndexCountNotTriangles { count: usize },
    #[snafu(display("Index {index} is out of range for {vertex_count} vertices"))]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[snafu(display("Sub-mesh range {start}..{end} exceeds {index_count} indices"))]
    SubMeshOutOfRange {
        start: u32,
        end: u32,
        index_count: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
    LineStrip,
    Points,
}

/// A range of the index buffer drawn with one topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMesh {
    pub topology: Topology,
    pub indices: Range<u32>,
}

/// Raw mesh data as read from the host.
///
/// Normals and UVs are optional: an attribute array whose length does not match
/// the position count is treated as missing. Without sub-meshes the whole index
/// buffer is a triangle list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshDescriptor {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMesh>,
}

/// Validated geometry, ready for upload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreparedMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshDescriptor {
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            positions,
            indices,
            ..Self::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = uvs;
        self
    }

    pub fn with_submesh(mut self, topology: Topology, indices: Range<u32>) -> Self {
        self.submeshes.push(SubMesh { topology, indices });
        self
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn content_hash(&self) -> ContentHash {
        mesh_content_hash(
            &self.name,
            self.vertex_count(),
            self.index_count(),
            &self.positions,
        )
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::Content(self.content_hash())
    }

    /// Validates the mesh and produces upload-ready geometry.
    pub fn prepare(&self) -> Result<PreparedMesh> {
        let mut prepared = PreparedMesh::default();
        self.prepare_into(&mut prepared.vertices, &mut prepared.indices)?;
        Ok(prepared)
    }

    /// Like [`MeshDescriptor::prepare`], but writes into reusable buffers.
    ///
    /// Both buffers are cleared first and never shrunk. On error their contents are unspecified.
    pub fn prepare_into(&self, vertices: &mut Vec<Vertex>, indices: &mut Vec<u32>) -> Result<()> {
        vertices.clear();
        indices.clear();

        let vertex_count = self.vertex_count();
        ensure!(vertex_count > 0, EmptyVerticesErr);

        self.collect_triangle_indices(indices)?;
        ensure!(!indices.is_empty(), NoTrianglesErr);
        ensure!(
            indices.len() % 3 == 0,
            IndexCountNotTrianglesErr {
                count: indices.len()
            }
        );
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return IndexOutOfRangeErr {
                index,
                vertex_count,
            }
            .fail();
        }

        let normals = (self.normals.len() == vertex_count).then_some(self.normals.as_slice());
        let uvs = (self.uvs.len() == vertex_count).then_some(self.uvs.as_slice());

        vertices.reserve(vertex_count);
        vertices.extend(self.positions.iter().enumerate().map(|(i, &position)| {
            Vertex::new(
                position,
                normals.map_or(DEFAULT_NORMAL, |n| n[i]),
                uvs.map_or(Vec2::ZERO, |uv| uv[i]),
            )
        }));

        Ok(())
    }

    fn collect_triangle_indices(&self, out: &mut Vec<u32>) -> Result<()> {
        if self.submeshes.is_empty() {
            out.extend_from_slice(&self.indices);
            return Ok(());
        }

        let index_count = self.indices.len();
        for submesh in &self.submeshes {
            let Range { start, end } = submesh.indices;
            ensure!(
                start <= end && end as usize <= index_count,
                SubMeshOutOfRangeErr {
                    start,
                    end,
                    index_count
                }
            );
            if submesh.topology == Topology::Triangles {
                out.extend_from_slice(&self.indices[start as usize..end as usize]);
            }
        }

        Ok(())
    }
}
