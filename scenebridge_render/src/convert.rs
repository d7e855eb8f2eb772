//! Boundary conversion into the backend's Z-up convention.
//!
//! Pure functions, applied right before data crosses into the backend. Cache keys
//! are always computed on the unconverted host data.

use crate::backend::{BackendCamera, BackendLight};
use glamx::Mat4;
use scenebridge_asset::{CameraSample, LightSample, Vertex};
use scenebridge_utils::axis::{swap_yz, swap_yz_matrix};

pub fn camera_to_backend(camera: &CameraSample) -> BackendCamera {
    BackendCamera {
        position: swap_yz(camera.position),
        forward: swap_yz(camera.forward),
        up: swap_yz(camera.up),
        right: swap_yz(camera.right),
        fov_y: camera.fov_y,
        aspect: camera.aspect,
        near: camera.near,
        far: camera.far,
    }
}

#[inline]
pub fn transform_to_backend(transform: &Mat4) -> Mat4 {
    swap_yz_matrix(transform)
}

/// Converts positions and normals in place.
pub fn vertices_to_backend(vertices: &mut [Vertex]) {
    for vertex in vertices {
        vertex.position = swap_yz(vertex.position);
        vertex.normal = swap_yz(vertex.normal);
    }
}

pub fn light_to_backend(light: &LightSample) -> BackendLight {
    BackendLight {
        kind: light.kind,
        position: swap_yz(light.position),
        direction: swap_yz(light.direction),
        color: light.color,
        intensity: light.intensity,
        range: light.range,
        inner_angle: light.inner_angle,
        outer_angle: light.outer_angle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glamx::{Quat, Vec2, Vec3};

    #[test]
    fn camera_basis_is_swapped() {
        let camera = CameraSample::synthetic(1.5);
        let converted = camera_to_backend(&camera);

        assert_eq!(converted.position, Vec3::new(0.0, 5.0, 1.7));
        assert_eq!(converted.forward, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(converted.up, Vec3::Z);
        assert_eq!(converted.right, Vec3::X);
        assert_eq!(converted.aspect, 1.5);
    }

    #[test]
    fn converted_vertices_match_converted_transform() {
        let world = Mat4::from_rotation_translation(
            Quat::from_rotation_x(0.7),
            Vec3::new(4.0, -1.0, 2.0),
        );
        let mut vertices = [Vertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, Vec2::ZERO)];
        let host_world = world.transform_point3(vertices[0].position);

        vertices_to_backend(&mut vertices);
        let backend_world = transform_to_backend(&world).transform_point3(vertices[0].position);

        assert!((backend_world - swap_yz(host_world)).length() < 1e-5);
        assert_eq!(vertices[0].normal, Vec3::Z);
    }

    #[test]
    fn vertex_conversion_round_trips() {
        let original = [Vertex::new(Vec3::new(0.5, -2.0, 9.0), Vec3::X, Vec2::ONE)];
        let mut vertices = original;
        vertices_to_backend(&mut vertices);
        vertices_to_backend(&mut vertices);
        assert_eq!(vertices, original);
    }

    #[test]
    fn light_direction_is_swapped() {
        let light = LightSample::sun(Vec3::NEG_Y, Vec3::ONE, 2.0);
        let converted = light_to_backend(&light);
        assert_eq!(converted.direction, Vec3::NEG_Z);
        assert_eq!(converted.intensity, 2.0);
    }
}
