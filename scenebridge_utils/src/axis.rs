//! Conversion between the host's Y-up and the backend's Z-up conventions.
//!
//! The conversion swaps the Y and Z axes. It is its own inverse, so the same
//! functions convert in both directions.

use glamx::{Mat4, Vec3, Vec4};

#[inline]
pub fn swap_yz(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

/// Expresses a transform in the swapped basis (`P * m * P`).
///
/// Rows and columns 1 and 2 trade places, so a point converted with [`swap_yz`]
/// and then transformed lands where the converted result of the original transform would.
pub fn swap_yz_matrix(m: &Mat4) -> Mat4 {
    let swap_rows = |c: Vec4| Vec4::new(c.x, c.z, c.y, c.w);
    Mat4::from_cols(
        swap_rows(m.x_axis),
        swap_rows(m.z_axis),
        swap_rows(m.y_axis),
        swap_rows(m.w_axis),
    )
}
