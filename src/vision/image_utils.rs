// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading and format detection for classification input

use image::{ImageFormat, RgbImage};
use std::path::Path;
use thiserror::Error;

/// Maximum image file size (50MB)
pub const MAX_IMAGE_SIZE: usize = 50 * 1024 * 1024;

/// Errors raised while turning an image file into RGB pixels
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to read image file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,
}

/// Image information extracted during loading
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size of the encoded file in bytes
    pub size_bytes: usize,
}

/// Leading bytes of each accepted container; WebP is matched separately
/// because its tag sits behind the RIFF size field
const SIGNATURES: &[(&[u8], ImageFormat)] = &[
    (b"\xFF\xD8\xFF", ImageFormat::Jpeg),
    (b"\x89PNG", ImageFormat::Png),
    (b"GIF87a", ImageFormat::Gif),
    (b"GIF89a", ImageFormat::Gif),
    (b"II*\0", ImageFormat::Tiff),
    (b"MM\0*", ImageFormat::Tiff),
    (b"BM", ImageFormat::Bmp),
];

fn check_encoded_size(len: u64) -> Result<(), ImageError> {
    if len == 0 {
        return Err(ImageError::EmptyData);
    }
    if len > MAX_IMAGE_SIZE as u64 {
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        return Err(ImageError::TooLarge(len, MAX_IMAGE_SIZE));
    }
    Ok(())
}

/// Read and decode an image file into 8-bit RGB
///
/// The file size is checked before anything is read. Alpha and grayscale
/// inputs come back as three-channel RGB.
pub fn decode_image_file<P: AsRef<Path>>(path: P) -> Result<(RgbImage, ImageInfo), ImageError> {
    let path = path.as_ref();
    let io_error = |source: std::io::Error| ImageError::Io {
        path: path.display().to_string(),
        source,
    };

    let len = std::fs::metadata(path).map_err(io_error)?.len();
    check_encoded_size(len)?;

    let bytes = std::fs::read(path).map_err(io_error)?;
    decode_image_bytes(&bytes)
}

/// Decode an encoded image held in memory
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(RgbImage, ImageInfo), ImageError> {
    check_encoded_size(bytes.len() as u64)?;
    let format = detect_format(bytes)?;

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;
    let info = ImageInfo {
        width: decoded.width(),
        height: decoded.height(),
        format,
        size_bytes: bytes.len(),
    };
    Ok((decoded.into_rgb8(), info))
}

/// Identify the container from its leading bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Ok(ImageFormat::WebP);
    }
    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|&(_, format)| format)
        .ok_or(ImageError::UnsupportedFormat)
}

/// File name component of a path, or the path itself when it has none
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
