use glamx::{Vec2, Vec3};
use static_assertions::assert_eq_size;

/// Normal used when the source mesh has none.
pub const DEFAULT_NORMAL: Vec3 = Vec3::Y;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

assert_eq_size!(Vertex, [f32; 8]);

impl Vertex {
    pub const fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    pub const fn basic(position: Vec3) -> Self {
        Self::new(position, DEFAULT_NORMAL, Vec2::ZERO)
    }
}
