//! Image ingestion: uploaded JPEG/PNG bytes in, base64 JPEG payload out
//!
//! Every upload is flattened to 8-bit RGB (alpha is dropped, palettes are
//! expanded) and re-encoded as JPEG, so the backend only ever sees one format.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use thiserror::Error;

/// Quality used when re-encoding (matches the common JPEG library default)
const JPEG_QUALITY: u8 = 75;

const MEDIA_TYPE: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("No image data received")]
    Empty,
    #[error("Image too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: usize, max: usize },
    #[error("Image data is not valid base64: {0}")]
    InvalidBase64(String),
    #[error("Unsupported image format (expected JPEG or PNG): {0}")]
    Unsupported(String),
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("Could not re-encode image as JPEG: {0}")]
    Encode(String),
}

/// Normalized image, stored as base64 of a JPEG byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    base64: String,
    width: u32,
    height: u32,
}

impl ImagePayload {
    #[cfg(test)]
    pub fn from_base64(data: impl Into<String>) -> Self {
        Self {
            base64: data.into(),
            width: 0,
            height: 0,
        }
    }

    pub fn as_base64(&self) -> &str {
        &self.base64
    }

    pub fn media_type(&self) -> &'static str {
        MEDIA_TYPE
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// `data:image/jpeg;base64,...` for embedding in a request or an `<img>`
    pub fn data_url(&self) -> String {
        format!("data:{MEDIA_TYPE};base64,{}", self.base64)
    }
}

/// Decode the base64 body the page sends. A leading `data:...;base64,`
/// prefix (what `FileReader.readAsDataURL` produces) is accepted.
pub fn decode_upload_base64(data: &str, max_bytes: usize) -> Result<Vec<u8>, ImageError> {
    let trimmed = data.trim();
    let encoded = match trimmed.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    };
    if encoded.is_empty() {
        return Err(ImageError::Empty);
    }

    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;

    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }
    Ok(bytes)
}

/// Normalize raw upload bytes into a transmittable payload
pub fn normalize_upload(bytes: &[u8]) -> Result<ImagePayload, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }

    let format = image::guess_format(bytes).map_err(|e| ImageError::Unsupported(e.to_string()))?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(ImageError::Unsupported(format!("{format:?}")));
    }

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::Decode(e.to_string()))?;

    let original_color = decoded.color();
    let rgb: RgbImage = decoded.to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| ImageError::Encode(e.to_string()))?;

    tracing::debug!(
        source_format = ?format,
        source_color = ?original_color,
        width = rgb.width(),
        height = rgb.height(),
        jpeg_bytes = jpeg.len(),
        "Normalized upload"
    );

    Ok(ImagePayload {
        base64: BASE64.encode(&jpeg),
        width: rgb.width(),
        height: rgb.height(),
    })
}
