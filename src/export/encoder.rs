//! PNG and JPEG export.
//!
//! The canvas is handed to the `image` crate's encoders. Krita's 8-bit colour
//! layers are BGRA, so channels 0 and 2 are swapped on the way out.
//!
//! # Design Decisions
//!
//! - **PNG keeps alpha**: the canvas is written as RGBA8.
//! - **JPEG drops alpha**: JPEG has no alpha channel, so pixels are written as
//!   RGB8 without compositing against a background.
//! - **Quality clamping**: out-of-range quality values are clamped rather than
//!   rejected, matching the CLI's lenient parsing.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::EncodeError;
use crate::raster::CanvasBuffer;

use super::bmp::encode_bmp;
use super::OutputFormat;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

const BGRA_BYTES_PER_PIXEL: usize = 4;

// =============================================================================
// Image Exporter
// =============================================================================

/// Encodes canvases to the supported output formats.
///
/// # Example
///
/// ```
/// use kra_raster::export::{ImageExporter, OutputFormat};
/// use kra_raster::raster::{BoundingBox, CanvasBuffer};
///
/// let mut canvas = CanvasBuffer::zeroed(&BoundingBox::new(0, 0, 2, 2), 4, 1024).unwrap();
/// canvas.pixels.fill(0xFF);
///
/// let png = ImageExporter::new().encode(&canvas, OutputFormat::Png).unwrap();
/// assert_eq!(&png[1..4], b"PNG");
/// ```
#[derive(Debug, Clone)]
pub struct ImageExporter {
    quality: u8,
}

impl Default for ImageExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageExporter {
    /// Create an exporter with the default JPEG quality.
    pub fn new() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Create an exporter with the given JPEG quality (clamped to 1-100).
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: clamp_quality(quality),
        }
    }

    /// JPEG quality used by [`encode`](Self::encode).
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode `canvas` in `format`.
    ///
    /// # Errors
    /// - `UnsupportedPixelSize` unless the canvas is 4 bytes per pixel (BGRA)
    /// - `Codec` if the image encoder fails (e.g. zero-sized PNG/JPEG)
    pub fn encode(&self, canvas: &CanvasBuffer, format: OutputFormat) -> Result<Vec<u8>, EncodeError> {
        match format {
            OutputFormat::Bmp => encode_bmp(canvas),
            OutputFormat::Png => self.encode_png(canvas),
            OutputFormat::Jpeg => self.encode_jpeg(canvas),
        }
    }

    fn encode_png(&self, canvas: &CanvasBuffer) -> Result<Vec<u8>, EncodeError> {
        let (width, height) = check_bgra(canvas, "PNG")?;
        let rgba = bgra_to_rgba(&canvas.pixels);

        let mut output = Vec::new();
        PngEncoder::new(Cursor::new(&mut output))
            .write_image(&rgba, width, height, ExtendedColorType::Rgba8)
            .map_err(|e| EncodeError::Codec(e.to_string()))?;

        Ok(output)
    }

    fn encode_jpeg(&self, canvas: &CanvasBuffer) -> Result<Vec<u8>, EncodeError> {
        let (width, height) = check_bgra(canvas, "JPEG")?;
        let rgb = bgra_to_rgb(&canvas.pixels);

        let mut output = Vec::new();
        JpegEncoder::new_with_quality(&mut output, self.quality)
            .encode(&rgb, width, height, ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError::Codec(e.to_string()))?;

        Ok(output)
    }
}

fn check_bgra(canvas: &CanvasBuffer, format: &'static str) -> Result<(u32, u32), EncodeError> {
    if canvas.bytes_per_pixel != BGRA_BYTES_PER_PIXEL {
        return Err(EncodeError::UnsupportedPixelSize {
            format,
            bytes_per_pixel: canvas.bytes_per_pixel,
            expected: BGRA_BYTES_PER_PIXEL,
        });
    }

    let too_large = || EncodeError::DimensionsTooLarge {
        format,
        width: canvas.width,
        height: canvas.height,
    };
    let width = u32::try_from(canvas.width).map_err(|_| too_large())?;
    let height = u32::try_from(canvas.height).map_err(|_| too_large())?;

    Ok((width, height))
}

fn bgra_to_rgba(pixels: &[u8]) -> Vec<u8> {
    pixels
        .chunks_exact(4)
        .flat_map(|p| [p[2], p[1], p[0], p[3]])
        .collect()
}

fn bgra_to_rgb(pixels: &[u8]) -> Vec<u8> {
    pixels
        .chunks_exact(4)
        .flat_map(|p| [p[2], p[1], p[0]])
        .collect()
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Validate JPEG quality parameter.
///
/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

/// Clamp quality to valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}
