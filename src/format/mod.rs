//! Parsers for the tiled raster stream stored per layer.
//!
//! A stream is a text header ([`RasterStreamHeader`]) followed by
//! `tile_count` records ([`TileRecord`]), each carrying a raw or
//! LZF-compressed ([`lzf::decompress`]) planar tile.

pub mod header;
pub mod lzf;
pub mod record;

pub use header::{RasterStreamHeader, MAX_HEADER_LINES};
pub use record::{CompressionMethod, TileRecord, TileRecords};
