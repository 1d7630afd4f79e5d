//! Canvas export.
//!
//! Serializes a reconstructed [`CanvasBuffer`](crate::raster::CanvasBuffer)
//! to an image file.
//!
//! # Components
//!
//! - [`encode_bmp`]: the canonical 32-bit bitmap writer
//! - [`ImageExporter`]: PNG and JPEG output through the `image` crate
//! - [`OutputFormat`]: format selector shared by the library and the CLI

mod bmp;
mod encoder;

use std::fmt;

pub use self::bmp::{encode_bmp, FILE_HEADER_SIZE, INFO_HEADER_SIZE, PIXEL_DATA_OFFSET};
pub use self::encoder::{
    clamp_quality, is_valid_quality, ImageExporter, DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY,
    MIN_JPEG_QUALITY,
};

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// 32-bit BGRA bitmap
    #[default]
    Bmp,
    /// RGBA PNG
    Png,
    /// RGB JPEG, alpha discarded
    #[value(alias = "jpg")]
    Jpeg,
}

impl OutputFormat {
    /// Conventional file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Bmp => "bmp",
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    /// Guess the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "bmp" => Some(OutputFormat::Bmp),
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Bmp => "BMP",
            OutputFormat::Png => "PNG",
            OutputFormat::Jpeg => "JPEG",
        };
        f.write_str(name)
    }
}
