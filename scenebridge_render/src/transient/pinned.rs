use scenebridge_asset::{EntityId, MeshDescriptor, MeshError, Vertex};
use std::collections::HashMap;

/// Reusable staging memory for one skinned entity.
///
/// Refilled every frame. The buffers grow when a frame needs more room and never shrink.
#[derive(Debug, Default)]
pub struct PinnedBuffer {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    grow_events: u32,
}

impl PinnedBuffer {
    /// Validates `mesh` and writes its upload-ready geometry into this buffer.
    pub fn fill(&mut self, mesh: &MeshDescriptor) -> Result<(), MeshError> {
        let before = self.capacity();
        let result = mesh.prepare_into(&mut self.vertices, &mut self.indices);
        if self.capacity() != before {
            self.grow_events += 1;
        }
        result
    }

    /// Vertex and index capacity.
    pub fn capacity(&self) -> (usize, usize) {
        (self.vertices.capacity(), self.indices.capacity())
    }

    /// How often a fill had to reallocate.
    pub fn grow_events(&self) -> u32 {
        self.grow_events
    }
}

#[derive(Debug, Default)]
pub struct PinnedBufferPool {
    buffers: HashMap<EntityId, PinnedBuffer>,
}

impl PinnedBufferPool {
    pub fn acquire(&mut self, entity: EntityId) -> &mut PinnedBuffer {
        self.buffers.entry(entity).or_default()
    }

    pub fn get(&self, entity: EntityId) -> Option<&PinnedBuffer> {
        self.buffers.get(&entity)
    }

    /// Frees every buffer. Returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.buffers.len();
        self.buffers.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
