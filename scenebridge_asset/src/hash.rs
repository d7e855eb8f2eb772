//! Deterministic content fingerprints.
//!
//! Static meshes are keyed by an FNV-1a fold over their name, their counts and a
//! bounded prefix of vertex positions. Textures are keyed by a full xxHash64 of
//! their converted pixel bytes. Neither hash ever yields zero.

use crate::ContentHash;
use glamx::Vec3;
use std::hash::Hasher;
use xxhash_rust::xxh64::xxh64;

pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Number of leading vertex positions folded into a mesh hash.
pub const MAX_SAMPLED_POSITIONS: usize = 16;

const TEXTURE_SEED: u64 = 0;

#[derive(Debug, Clone, Copy)]
pub struct Fnv1a(u64);

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

impl Fnv1a {
    pub const fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= *byte as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_bits().to_le_bytes());
    }

    #[inline]
    pub const fn finish(&self) -> u64 {
        self.0
    }
}

impl Hasher for Fnv1a {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        self.write_bytes(bytes);
    }
}

/// Fingerprint of a static mesh.
///
/// Only the first [`MAX_SAMPLED_POSITIONS`] positions are read, the rest of the
/// geometry is represented by the counts.
pub fn mesh_content_hash(
    name: &str,
    vertex_count: usize,
    index_count: usize,
    positions: &[Vec3],
) -> ContentHash {
    let mut hasher = Fnv1a::new();
    hasher.write_u64(name.len() as u64);
    hasher.write_bytes(name.as_bytes());
    hasher.write_u64(vertex_count as u64);
    hasher.write_u64(index_count as u64);

    for position in positions.iter().take(MAX_SAMPLED_POSITIONS) {
        hasher.write_f32(position.x);
        hasher.write_f32(position.y);
        hasher.write_f32(position.z);
    }

    ContentHash::from_raw(hasher.finish())
}

/// Fingerprint of converted (tightly packed RGBA8) texture bytes.
pub fn texture_content_hash(rgba: &[u8]) -> ContentHash {
    ContentHash::from_raw(xxh64(rgba, TEXTURE_SEED))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(n: usize) -> Vec<Vec3> {
        (0..n)
            .map(|i| Vec3::new(i as f32, i as f32 * 0.5, -(i as f32)))
            .collect()
    }

    #[test]
    fn fnv_matches_reference_vectors() {
        let mut empty = Fnv1a::new();
        empty.write_bytes(b"");
        assert_eq!(empty.finish(), 0xcbf2_9ce4_8422_2325);

        let mut a = Fnv1a::new();
        a.write_bytes(b"a");
        assert_eq!(a.finish(), 0xaf63_dc4c_8601_ec8c);

        let mut foobar = Fnv1a::new();
        foobar.write_bytes(b"foobar");
        assert_eq!(foobar.finish(), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn identical_mesh_data_hashes_equal() {
        let p = positions(32);
        assert_eq!(
            mesh_content_hash("crate", 32, 96, &p),
            mesh_content_hash("crate", 32, 96, &p.clone()),
        );
    }

    #[test]
    fn single_field_changes_change_the_hash() {
        let p = positions(32);
        let base = mesh_content_hash("crate", 32, 96, &p);

        assert_ne!(base, mesh_content_hash("crates", 32, 96, &p));
        assert_ne!(base, mesh_content_hash("crate", 33, 96, &p));
        assert_ne!(base, mesh_content_hash("crate", 32, 99, &p));

        let mut moved = p.clone();
        moved[15].y += 0.001;
        assert_ne!(base, mesh_content_hash("crate", 32, 96, &moved));
    }

    #[test]
    fn positions_past_the_sample_window_are_ignored() {
        let p = positions(32);
        let mut tail_moved = p.clone();
        tail_moved[MAX_SAMPLED_POSITIONS].x += 10.0;

        assert_eq!(
            mesh_content_hash("crate", 32, 96, &p),
            mesh_content_hash("crate", 32, 96, &tail_moved),
        );
    }

    #[test]
    fn texture_hash_matches_xxh64() {
        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(texture_content_hash(&bytes).get(), xxh64(&bytes, 0));
        // xxh64 of the empty input with seed 0
        assert_eq!(texture_content_hash(&[]).get(), 0xef46_db37_51d8_e999);
    }
}
