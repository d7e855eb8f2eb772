use glamx::Vec3;
use scenebridge_asset::{
    MaterialDescriptor, MeshDescriptor, PixelFormat, ResourceKey, TextureData, TextureOrigin,
};
use std::sync::Arc;

const WIDTH: u32 = 3;
const HEIGHT: u32 = 2;

fn rgba_pixels() -> Vec<u8> {
    (0..WIDTH * HEIGHT)
        .flat_map(|i| [i as u8 * 10, 100, 200 - i as u8, 255])
        .collect()
}

#[test]
fn readback_with_padded_rows_matches_direct_read() {
    let direct = TextureData::new("direct", WIDTH, HEIGHT, PixelFormat::Rgba8, rgba_pixels());

    let pitch = 16;
    let mut padded = Vec::new();
    for row in rgba_pixels().chunks_exact(WIDTH as usize * 4) {
        padded.extend_from_slice(row);
        padded.resize(padded.len() + (pitch - row.len()), 0xAB);
    }
    let readback = TextureData::new("readback", WIDTH, HEIGHT, PixelFormat::Rgba8, padded)
        .with_readback_pitch(pitch as u32);

    assert_eq!(readback.origin, TextureOrigin::GpuReadback);
    assert_eq!(direct.content_hash(), readback.content_hash());
}

#[test]
fn channel_order_is_normalized_before_hashing() {
    let rgba = TextureData::new("rgba", WIDTH, HEIGHT, PixelFormat::Rgba8, rgba_pixels());
    let bgra_pixels = rgba_pixels()
        .chunks_exact(4)
        .flat_map(|p| [p[2], p[1], p[0], p[3]])
        .collect();
    let bgra = TextureData::new("bgra", WIDTH, HEIGHT, PixelFormat::Bgra8, bgra_pixels);

    assert_eq!(rgba.to_rgba8(), bgra.to_rgba8());
    assert_eq!(rgba.content_hash(), bgra.content_hash());
}

#[test]
fn different_content_does_not_collide() {
    let a = TextureData::new("a", WIDTH, HEIGHT, PixelFormat::Rgba8, rgba_pixels());
    let mut changed = rgba_pixels();
    changed[5] ^= 1;
    let b = TextureData::new("a", WIDTH, HEIGHT, PixelFormat::Rgba8, changed);

    assert_ne!(a.content_hash(), b.content_hash());
}

#[test]
fn reloaded_mesh_keeps_its_key() {
    let load = || {
        MeshDescriptor::new(
            "rock",
            (0..40).map(|i| Vec3::splat(i as f32 * 0.5)).collect(),
            (0..39).flat_map(|i| [0, i, i + 1]).collect(),
        )
    };

    let first = load();
    let second = load();
    assert_eq!(first.key(), second.key());
    assert!(matches!(first.key(), ResourceKey::Content(_)));

    let renamed = MeshDescriptor {
        name: "boulder".into(),
        ..load()
    };
    assert_ne!(first.key(), renamed.key());
}

#[test]
fn material_key_follows_texture_content() {
    let texture = |name: &str| {
        Arc::new(TextureData::new(
            name,
            WIDTH,
            HEIGHT,
            PixelFormat::Rgba8,
            rgba_pixels(),
        ))
    };

    let a = MaterialDescriptor::new("a").with_albedo(texture("x"));
    let b = MaterialDescriptor::new("b").with_albedo(texture("y"));
    let tinted = MaterialDescriptor::new("a")
        .with_albedo(texture("x"))
        .with_color([1.0, 0.5, 0.5, 1.0]);

    assert_eq!(a.key(), b.key());
    assert_ne!(a.key(), tinted.key());
    assert_ne!(a.key(), a.clone().double_sided(true).key());
}
