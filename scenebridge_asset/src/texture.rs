use crate::ContentHash;
use crate::hash::texture_content_hash;
use snafu::{Snafu, ensure};
use std::sync::OnceLock;

type Result<T, E = TextureError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(context(suffix(Err)))]
pub enum TextureError {
    #[snafu(display("Cannot convert empty texture: {width}x{height}"))]
    InvalidDimensions { width: u32, height: u32 },

    #[snafu(display("Row pitch {pitch} is smaller than a row of {row_bytes} bytes"))]
    InvalidRowPitch { pitch: u32, row_bytes: usize },

    #[snafu(display("Pixel buffer holds {actual} bytes, expected at least {expected}"))]
    PixelDataTooShort { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    Bgra8,
    Rgb8,
    R8,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
            PixelFormat::Rgb8 => 3,
            PixelFormat::R8 => 1,
        }
    }
}

/// How the pixel bytes were obtained from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureOrigin {
    /// Read directly from CPU-side texture memory.
    #[default]
    Direct,
    /// Copied back from the GPU, rows possibly padded to an aligned pitch.
    GpuReadback,
}

/// Raw texture bytes as captured from the host.
///
/// The content hash is computed over the converted RGBA8 output, so the same
/// image read through different paths or in different layouts maps to the same key.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Bytes per source row, if rows are padded.
    pub row_pitch: Option<u32>,
    pub mip_count: u32,
    pub origin: TextureOrigin,
    pub pixels: Vec<u8>,
    hash: OnceLock<ContentHash>,
}

impl TextureData {
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            format,
            row_pitch: None,
            mip_count: 1,
            origin: TextureOrigin::Direct,
            pixels,
            hash: OnceLock::new(),
        }
    }

    pub fn with_readback_pitch(mut self, row_pitch: u32) -> Self {
        self.row_pitch = Some(row_pitch);
        self.origin = TextureOrigin::GpuReadback;
        self
    }

    pub fn with_mip_count(mut self, mip_count: u32) -> Self {
        self.mip_count = mip_count.max(1);
        self
    }

    /// Tightly packed RGBA8 pixels.
    pub fn to_rgba8(&self) -> Result<Vec<u8>> {
        let (width, height) = (self.width as usize, self.height as usize);
        ensure!(
            width > 0 && height > 0,
            InvalidDimensionsErr {
                width: self.width,
                height: self.height
            }
        );

        let bpp = self.format.bytes_per_pixel();
        let row_bytes = width * bpp;
        let pitch = match self.row_pitch {
            Some(pitch) => {
                ensure!(
                    pitch as usize >= row_bytes,
                    InvalidRowPitchErr { pitch, row_bytes }
                );
                pitch as usize
            }
            None => row_bytes,
        };

        // the last row doesn't need its padding
        let expected = pitch * (height - 1) + row_bytes;
        ensure!(
            self.pixels.len() >= expected,
            PixelDataTooShortErr {
                expected,
                actual: self.pixels.len()
            }
        );

        let mut out = Vec::with_capacity(width * height * 4);
        for row in 0..height {
            let start = row * pitch;
            let src = &self.pixels[start..start + row_bytes];
            match self.format {
                PixelFormat::Rgba8 => out.extend_from_slice(src),
                PixelFormat::Bgra8 => {
                    for px in src.chunks_exact(4) {
                        out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                    }
                }
                PixelFormat::Rgb8 => {
                    for px in src.chunks_exact(3) {
                        out.extend_from_slice(&[px[0], px[1], px[2], u8::MAX]);
                    }
                }
                PixelFormat::R8 => {
                    for &v in src {
                        out.extend_from_slice(&[v, v, v, u8::MAX]);
                    }
                }
            }
        }

        Ok(out)
    }

    /// Content hash of the converted pixels, computed once.
    pub fn content_hash(&self) -> Result<ContentHash> {
        if let Some(hash) = self.hash.get() {
            return Ok(*hash);
        }

        let hash = texture_content_hash(&self.to_rgba8()?);
        Ok(*self.hash.get_or_init(|| hash))
    }
}
