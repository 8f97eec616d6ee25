//! PNG serialization of finished canvases.
//!
//! Encodes into an in-memory byte vector; where those bytes go (disk,
//! HTTP response, clipboard) is the caller's concern.

use image::ImageEncoder;
use paceframe_pipeline::RgbaImage;

/// Errors that can occur while serializing a canvas.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(String),
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        Self::PngEncode(err.to_string())
    }
}

/// Encode an RGBA canvas as lossless PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if the encoder rejects the
/// buffer, which cannot happen for a well-formed [`RgbaImage`].
pub fn to_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(png_bytes)
}
