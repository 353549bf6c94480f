//! Pixel buffers shared by the `Input` / `Output` adapters, plus the file codec.
//!
//! All buffers are tightly packed RGBA8, row-major, first row at the top of the image.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

pub const BYTES_PER_PIXEL: usize = 4;

pub const DEFAULT_JPEG_QUALITY: u8 = 100;

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode {path}: {msg}")]
    Encode { path: PathBuf, msg: String },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    #[default]
    Rgba8888,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8888 => BYTES_PER_PIXEL,
        }
    }
}

/// Encoded file formats understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Accepts both MIME-style (`image/png`) and bare (`png`) tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "image/jpg" | "image/jpeg" | "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "image/png" | "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// A decoded image in CPU memory.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelMap {
    width: u32,
    height: u32,
    format: PixelFormat,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for PixelMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Pixel payloads are large; print the shape only.
        f.debug_struct("PixelMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl PixelMap {
    /// Opaque black image of the given size.
    pub fn new_blank(width: u32, height: u32) -> Self {
        let mut bytes = vec![0u8; rgba_len(width, height)];
        for px in bytes.chunks_exact_mut(BYTES_PER_PIXEL) {
            px[3] = 0xff;
        }
        Self {
            width,
            height,
            format: PixelFormat::Rgba8888,
            bytes,
        }
    }

    pub fn from_rgba(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, CodecError> {
        let expected = rgba_len(width, height);
        if bytes.len() != expected {
            return Err(CodecError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format: PixelFormat::Rgba8888,
            bytes,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = &self.bytes[i..i + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Byte length of a tightly packed RGBA8 image.
pub fn rgba_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

pub fn decode_file(path: &Path) -> Result<PixelMap, CodecError> {
    let reader = image::ImageReader::open(path).map_err(|source| CodecError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = reader.with_guessed_format().map_err(|source| CodecError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let img = reader.decode().map_err(|source| CodecError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    tracing::debug!(path = %path.display(), w, h, "decoded image");
    PixelMap::from_rgba(w, h, rgba.into_raw())
}

/// Encode `pixels` to `path`. `quality` only applies to JPEG (1..=100).
pub fn encode_file(
    pixels: &PixelMap,
    path: &Path,
    format: ImageFormat,
    quality: u8,
) -> Result<(), CodecError> {
    let encode_err = |msg: String| CodecError::Encode {
        path: path.to_path_buf(),
        msg,
    };

    let img = RgbaImage::from_raw(pixels.width, pixels.height, pixels.bytes.clone())
        .ok_or_else(|| encode_err("pixel buffer does not match its dimensions".into()))?;

    match format {
        ImageFormat::Png => img
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| encode_err(e.to_string())),
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(img).to_rgb8();
            let file = File::create(path).map_err(|e| encode_err(e.to_string()))?;
            let mut enc = JpegEncoder::new_with_quality(BufWriter::new(file), quality.clamp(1, 100));
            enc.encode_image(&rgb).map_err(|e| encode_err(e.to_string()))
        }
    }
}
