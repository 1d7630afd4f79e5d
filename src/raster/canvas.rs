use serde::Serialize;

use crate::error::FormatError;
use crate::format::RasterStreamHeader;

// =============================================================================
// Bounding Box
// =============================================================================

/// Rectangle covered by a layer's canvas, in project pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    /// Left edge (smallest tile X)
    pub min_x: i32,

    /// Top edge (smallest tile Y)
    pub min_y: i32,

    /// Width in pixels
    pub width: usize,

    /// Height in pixels
    pub height: usize,
}

impl BoundingBox {
    /// An explicit rectangle, e.g. the project canvas.
    pub fn new(min_x: i32, min_y: i32, width: usize, height: usize) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    /// Smallest tile-aligned rectangle covering every tile origin in `coords`.
    ///
    /// `width = (max_x - min_x) + tile_width`, likewise for height. No tiles
    /// gives an empty box at the origin.
    pub fn from_tiles<I>(header: &RasterStreamHeader, coords: I) -> Self
    where
        I: IntoIterator<Item = (i32, i32)>,
    {
        let mut extent: Option<(i32, i32, i32, i32)> = None;

        for (x, y) in coords {
            extent = Some(match extent {
                None => (x, y, x, y),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                }
            });
        }

        match extent {
            None => Self::new(0, 0, 0, 0),
            Some((min_x, min_y, max_x, max_y)) => Self {
                min_x,
                min_y,
                width: (max_x as i64 - min_x as i64) as usize + header.tile_width as usize,
                height: (max_y as i64 - min_y as i64) as usize + header.tile_height as usize,
            },
        }
    }

    /// Whether the box covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// =============================================================================
// Canvas Buffer
// =============================================================================

/// Interleaved pixel buffer for a whole layer.
///
/// Rows run top to bottom; within a row, all channels of a pixel are
/// contiguous. This is the hand-off format for every image exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasBuffer {
    /// Width in pixels
    pub width: usize,

    /// Height in pixels
    pub height: usize,

    /// Bytes per pixel
    pub bytes_per_pixel: usize,

    /// Project X coordinate of the left column
    pub origin_x: i32,

    /// Project Y coordinate of the top row
    pub origin_y: i32,

    /// `width * height * bytes_per_pixel` bytes
    pub pixels: Vec<u8>,
}

impl CanvasBuffer {
    /// Allocate a zeroed canvas covering `bounds`.
    ///
    /// # Errors
    /// `CanvasTooLarge` if the buffer would exceed `max_bytes` or overflow.
    pub fn zeroed(
        bounds: &BoundingBox,
        bytes_per_pixel: usize,
        max_bytes: usize,
    ) -> Result<Self, FormatError> {
        let len = bounds
            .width
            .checked_mul(bounds.height)
            .and_then(|n| n.checked_mul(bytes_per_pixel))
            .filter(|&n| n <= max_bytes)
            .ok_or(FormatError::CanvasTooLarge {
                width: bounds.width as u64,
                height: bounds.height as u64,
                bytes_per_pixel: bytes_per_pixel as u64,
                limit: max_bytes,
            })?;

        Ok(Self {
            width: bounds.width,
            height: bounds.height,
            bytes_per_pixel,
            origin_x: bounds.min_x,
            origin_y: bounds.min_y,
            pixels: vec![0; len],
        })
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width * self.bytes_per_pixel
    }

    /// One row of interleaved pixels.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.stride();
        Some(&self.pixels[y * stride..(y + 1) * stride])
    }

    /// Channels of the pixel at (`x`, `y`).
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width {
            return None;
        }
        let bpp = self.bytes_per_pixel;
        self.row(y).map(|row| &row[x * bpp..(x + 1) * bpp])
    }

    /// Whether the canvas has no pixels.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}
