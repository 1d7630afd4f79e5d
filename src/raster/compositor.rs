//! Tile compositor.
//!
//! Tiles are stored planar (every channel is a contiguous block inside the
//! tile) while the canvas is interleaved. For a tile placed at
//! (`offset_x`, `offset_y`) relative to the canvas origin:
//!
//! ```text
//! src = x + y * tile_w + c * tile_w * tile_h
//! dst = c + (x + offset_x + (y + offset_y) * canvas_w) * bpp
//! ```

use tracing::warn;

use crate::error::{CompositionWarning, FormatError};
use crate::format::RasterStreamHeader;

use super::canvas::{BoundingBox, CanvasBuffer};
use super::tile::DecodedTile;

/// What to do when a tile does not fit the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementPolicy {
    /// Skip what does not fit, record a warning and keep going
    #[default]
    BestEffort,
    /// Stop at the first misplaced tile
    FailFast,
}

/// Accumulates decoded tiles into a [`CanvasBuffer`].
///
/// Tiles are written in the order they are placed, so a later tile with the
/// same coordinates overwrites an earlier one.
pub struct Compositor {
    tile_width: usize,
    tile_height: usize,
    canvas: CanvasBuffer,
    policy: PlacementPolicy,
    warnings: Vec<CompositionWarning>,
}

impl Compositor {
    /// Create a compositor with a zeroed canvas covering `bounds`.
    ///
    /// # Errors
    /// `CanvasTooLarge` if the canvas would exceed `max_bytes`.
    pub fn new(
        header: &RasterStreamHeader,
        bounds: &BoundingBox,
        policy: PlacementPolicy,
        max_bytes: usize,
    ) -> Result<Self, FormatError> {
        Ok(Self {
            tile_width: header.tile_width as usize,
            tile_height: header.tile_height as usize,
            canvas: CanvasBuffer::zeroed(bounds, header.bytes_per_pixel as usize, max_bytes)?,
            policy,
            warnings: Vec::new(),
        })
    }

    /// Copy one tile into the canvas, converting planar to interleaved.
    ///
    /// # Errors
    /// Under [`PlacementPolicy::FailFast`], the warning that would otherwise
    /// have been recorded.
    pub fn place(&mut self, tile: &DecodedTile) -> Result<(), CompositionWarning> {
        let offset_x = tile.grid_x as i64 - self.canvas.origin_x as i64;
        let offset_y = tile.grid_y as i64 - self.canvas.origin_y as i64;

        if offset_x < 0 || offset_y < 0 {
            return self.record(CompositionWarning::NegativeOffset {
                tile_index: tile.index,
                grid_x: tile.grid_x,
                grid_y: tile.grid_y,
                offset_x,
                offset_y,
            });
        }

        let skipped = self.copy_planar(tile, offset_x, offset_y);
        if skipped > 0 {
            return self.record(CompositionWarning::OutOfBounds {
                tile_index: tile.index,
                grid_x: tile.grid_x,
                grid_y: tile.grid_y,
                skipped,
            });
        }

        Ok(())
    }

    /// Record a warning that is not subject to the placement policy.
    pub fn note(&mut self, warning: CompositionWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> &[CompositionWarning] {
        &self.warnings
    }

    /// Hand back the canvas and every recorded warning.
    pub fn finish(self) -> (CanvasBuffer, Vec<CompositionWarning>) {
        (self.canvas, self.warnings)
    }

    fn record(&mut self, warning: CompositionWarning) -> Result<(), CompositionWarning> {
        match self.policy {
            PlacementPolicy::BestEffort => {
                self.note(warning);
                Ok(())
            }
            PlacementPolicy::FailFast => Err(warning),
        }
    }

    /// Returns the number of bytes that could not be written.
    fn copy_planar(&mut self, tile: &DecodedTile, offset_x: i64, offset_y: i64) -> usize {
        let tile_w = self.tile_width;
        let tile_h = self.tile_height;
        let bpp = self.canvas.bytes_per_pixel;
        let canvas_w = self.canvas.width as i64;
        let canvas_len = self.canvas.pixels.len() as i64;
        let plane = tile_w * tile_h;

        let mut skipped = 0;

        for y in 0..tile_h {
            for x in 0..tile_w {
                let column = x as i64 + offset_x;

                for c in 0..bpp {
                    let src = x + y * tile_w + c * plane;
                    let dst = c as i64 + (column + (y as i64 + offset_y) * canvas_w) * bpp as i64;

                    // Columns past the right edge would wrap into the next row
                    if column >= canvas_w || dst < 0 || dst >= canvas_len {
                        skipped += 1;
                        continue;
                    }
                    let Some(&value) = tile.pixels.get(src) else {
                        skipped += 1;
                        continue;
                    };

                    self.canvas.pixels[dst as usize] = value;
                }
            }
        }

        skipped
    }
}

/// Composite `tiles` onto a canvas inferred from their coordinates.
///
/// Convenience wrapper for the best-effort policy without a size limit.
pub fn composite(
    header: &RasterStreamHeader,
    tiles: &[DecodedTile],
) -> Result<(CanvasBuffer, Vec<CompositionWarning>), FormatError> {
    let bounds = BoundingBox::from_tiles(header, tiles.iter().map(|t| (t.grid_x, t.grid_y)));
    let mut compositor = Compositor::new(header, &bounds, PlacementPolicy::BestEffort, usize::MAX)?;

    for tile in tiles {
        // Best effort never rejects a tile
        let _ = compositor.place(tile);
    }

    Ok(compositor.finish())
}
