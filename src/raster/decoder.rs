//! Layer decoder: header → records → tiles → canvas.
//!
//! # Pipeline
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────────┐   ┌────────────┐
//! │   Header   │──▶│ Tile records │──▶│ LZF / raw    │──▶│ Compositor │──▶ CanvasBuffer
//! │   parser   │   │ (zero-copy)  │   │ (per tile)   │   │ (in order) │
//! └────────────┘   └──────────────┘   └──────────────┘   └────────────┘
//! ```
//!
//! All records are read before any tile is expanded so that the canvas bounds
//! are known up front. Expansion may run on a rayon pool; compositing always
//! happens in record order, which keeps duplicate coordinates last-write-wins
//! and makes the parallel output identical to the sequential one.

use std::collections::BTreeMap;

use bytes::Bytes;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CompositionWarning, DecompressionError, FormatError, LayerError};
use crate::format::{CompressionMethod, RasterStreamHeader, TileRecord, TileRecords};
use crate::io::ByteStream;

use super::canvas::{BoundingBox, CanvasBuffer};
use super::compositor::{Compositor, PlacementPolicy};
use super::tile::DecodedTile;

/// Default upper bound for a canvas allocation: 1 GiB.
pub const DEFAULT_MAX_CANVAS_BYTES: usize = 1 << 30;

// =============================================================================
// Options
// =============================================================================

/// What to do with a tile that fails to decompress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptTilePolicy {
    /// Fail the whole decode
    #[default]
    Abort,
    /// Leave the tile's area blank and record a warning
    Blank,
}

/// Knobs for [`decode_layer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Handling of misplaced tiles
    pub placement: PlacementPolicy,

    /// Handling of tiles that fail to decompress
    pub corrupt_tiles: CorruptTilePolicy,

    /// Expand tiles on the rayon thread pool
    pub parallel: bool,

    /// Largest canvas allocation allowed, in bytes
    pub max_canvas_bytes: usize,

    /// Fixed canvas rectangle; inferred from the tiles when `None`
    pub bounds: Option<BoundingBox>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            placement: PlacementPolicy::default(),
            corrupt_tiles: CorruptTilePolicy::default(),
            parallel: false,
            max_canvas_bytes: DEFAULT_MAX_CANVAS_BYTES,
            bounds: None,
        }
    }
}

impl DecodeOptions {
    pub fn with_placement(mut self, placement: PlacementPolicy) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_corrupt_tiles(mut self, policy: CorruptTilePolicy) -> Self {
        self.corrupt_tiles = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_max_canvas_bytes(mut self, max_canvas_bytes: usize) -> Self {
        self.max_canvas_bytes = max_canvas_bytes;
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

// =============================================================================
// Decoded Layer
// =============================================================================

/// Result of decoding one raster stream.
#[derive(Debug, Clone)]
pub struct DecodedLayer {
    /// The stream header
    pub header: RasterStreamHeader,

    /// Interleaved pixels covering the layer's bounding box
    pub canvas: CanvasBuffer,

    /// Non-fatal problems met while compositing
    pub warnings: Vec<CompositionWarning>,
}

impl DecodedLayer {
    /// Approximate heap size, used for cache accounting.
    pub fn byte_size(&self) -> usize {
        self.canvas.pixels.len()
    }
}

/// Decode a whole raster stream into a canvas.
///
/// # Errors
/// - `Format` for a malformed header or record, or an oversized canvas
/// - `Decompression` for a corrupt tile under [`CorruptTilePolicy::Abort`]
/// - `Placement` for a misplaced tile under [`PlacementPolicy::FailFast`]
pub fn decode_layer(
    data: impl Into<Bytes>,
    options: &DecodeOptions,
) -> Result<DecodedLayer, LayerError> {
    let mut stream = ByteStream::new(data);
    let header = RasterStreamHeader::parse(&mut stream)?;

    debug!(
        tile_width = header.tile_width,
        tile_height = header.tile_height,
        bytes_per_pixel = header.bytes_per_pixel,
        tile_count = header.tile_count,
        "Parsed raster stream header"
    );

    let records: Vec<TileRecord> =
        TileRecords::new(&mut stream, &header).collect::<Result<_, _>>()?;

    for record in &records {
        if let CompressionMethod::Other(label) = &record.method {
            debug!(
                tile_index = record.index,
                label = label.as_str(),
                compressed = record.compressed,
                "Unrecognized compression label, using the flag byte"
            );
        }
    }

    let bounds = options.bounds.unwrap_or_else(|| {
        BoundingBox::from_tiles(&header, records.iter().map(|r| (r.grid_x, r.grid_y)))
    });

    let mut compositor =
        Compositor::new(&header, &bounds, options.placement, options.max_canvas_bytes)?;

    if options.parallel {
        let decoded: Vec<Result<DecodedTile, DecompressionError>> = records
            .par_iter()
            .map(|record| DecodedTile::decode(record, &header))
            .collect();

        for (record, result) in records.iter().zip(decoded) {
            composite_one(&mut compositor, record, &header, result, options)?;
        }
    } else {
        for record in &records {
            let result = DecodedTile::decode(record, &header);
            composite_one(&mut compositor, record, &header, result, options)?;
        }
    }

    let (canvas, warnings) = compositor.finish();

    info!(
        width = canvas.width,
        height = canvas.height,
        tiles = records.len(),
        warnings = warnings.len(),
        "Decoded raster layer"
    );

    Ok(DecodedLayer {
        header,
        canvas,
        warnings,
    })
}

fn composite_one(
    compositor: &mut Compositor,
    record: &TileRecord,
    header: &RasterStreamHeader,
    result: Result<DecodedTile, DecompressionError>,
    options: &DecodeOptions,
) -> Result<(), LayerError> {
    let tile = match result {
        Ok(tile) => tile,
        Err(err) => match options.corrupt_tiles {
            CorruptTilePolicy::Abort => return Err(err.into()),
            CorruptTilePolicy::Blank => {
                // The warning already names the tile
                let reason = match err {
                    DecompressionError::InTile { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                compositor.note(CompositionWarning::BlankedTile {
                    tile_index: record.index,
                    grid_x: record.grid_x,
                    grid_y: record.grid_y,
                    reason,
                });
                DecodedTile::blank(record, header)
            }
        },
    };

    compositor.place(&tile).map_err(LayerError::Placement)
}

// =============================================================================
// Stream Summary
// =============================================================================

/// Structural overview of a raster stream, gathered without expanding tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub header: RasterStreamHeader,
    pub bounds: BoundingBox,
    pub compressed_tiles: usize,
    pub raw_tiles: usize,
    pub payload_bytes: u64,
    /// Record count per compression label
    pub methods: BTreeMap<String, usize>,
}

/// Read the header and every record, without decompressing anything.
///
/// # Errors
/// Any `FormatError` the header parser or record reader raises.
pub fn summarize(data: impl Into<Bytes>) -> Result<StreamSummary, FormatError> {
    let mut stream = ByteStream::new(data);
    let header = RasterStreamHeader::parse(&mut stream)?;

    let mut coords = Vec::with_capacity(header.tile_count.min(1 << 16));
    let mut compressed_tiles = 0;
    let mut payload_bytes = 0u64;
    let mut methods = BTreeMap::new();

    for record in TileRecords::new(&mut stream, &header) {
        let record = record?;
        coords.push((record.grid_x, record.grid_y));
        if record.compressed {
            compressed_tiles += 1;
        }
        payload_bytes += record.payload.len() as u64;
        *methods.entry(record.method.to_string()).or_insert(0) += 1;
    }

    Ok(StreamSummary {
        header,
        bounds: BoundingBox::from_tiles(&header, coords.iter().copied()),
        compressed_tiles,
        raw_tiles: coords.len() - compressed_tiles,
        payload_bytes,
        methods,
    })
}
