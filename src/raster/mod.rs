//! Raster reconstruction.
//!
//! Turns a parsed tile stream into a single interleaved pixel buffer.
//!
//! # Components
//!
//! - [`DecodedTile`]: a tile expanded to its planar layout
//! - [`BoundingBox`]: the canvas rectangle inferred from tile coordinates
//! - [`CanvasBuffer`]: interleaved pixels for the whole layer
//! - [`Compositor`]: writes tiles into the canvas under a [`PlacementPolicy`]
//! - [`decode_layer`]: the full pipeline, configured by [`DecodeOptions`]
//!
//! # Example
//!
//! ```
//! use kra_raster::raster::{decode_layer, DecodeOptions};
//!
//! let stream = b"TILEWIDTH 1\nTILEHEIGHT 1\nPIXELSIZE 1\nDATA 1\n0,0,LZF,2\n\x00\x2a".to_vec();
//! let layer = decode_layer(stream, &DecodeOptions::default()).unwrap();
//!
//! assert_eq!(layer.canvas.pixels, vec![0x2a]);
//! ```

mod canvas;
mod compositor;
mod decoder;
mod tile;

pub use canvas::{BoundingBox, CanvasBuffer};
pub use compositor::{composite, Compositor, PlacementPolicy};
pub use decoder::{
    decode_layer, summarize, CorruptTilePolicy, DecodeOptions, DecodedLayer, StreamSummary,
    DEFAULT_MAX_CANVAS_BYTES,
};
pub use tile::DecodedTile;
