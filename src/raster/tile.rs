use crate::error::DecompressionError;
use crate::format::{lzf, RasterStreamHeader, TileRecord};

/// A tile expanded to its planar pixel layout.
///
/// `pixels` holds one contiguous block per channel, each block
/// `tile_width * tile_height` bytes long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTile {
    /// Record index in the stream
    pub index: usize,

    /// Pixel X coordinate of the tile's top-left corner
    pub grid_x: i32,

    /// Pixel Y coordinate of the tile's top-left corner
    pub grid_y: i32,

    /// Planar pixel data
    pub pixels: Vec<u8>,
}

impl DecodedTile {
    /// Expand a record into a decoded tile.
    ///
    /// Compressed payloads go through the LZF decompressor; raw payloads are
    /// copied. Either way the result must be exactly one tile long.
    ///
    /// # Errors
    /// Returns the decompression failure wrapped with the tile index and record
    /// offset, or `LengthMismatch` if the tile has the wrong size.
    pub fn decode(
        record: &TileRecord,
        header: &RasterStreamHeader,
    ) -> Result<Self, DecompressionError> {
        let in_tile = |source: DecompressionError| DecompressionError::InTile {
            tile_index: record.index,
            offset: record.offset,
            source: Box::new(source),
        };

        let pixels = if record.compressed {
            lzf::decompress(&record.payload).map_err(in_tile)?
        } else {
            record.payload.to_vec()
        };

        let expected = header.tile_byte_len();
        if pixels.len() != expected {
            return Err(in_tile(DecompressionError::LengthMismatch {
                expected,
                actual: pixels.len(),
            }));
        }

        Ok(Self {
            index: record.index,
            grid_x: record.grid_x,
            grid_y: record.grid_y,
            pixels,
        })
    }

    /// A zero-filled tile at the record's position.
    pub fn blank(record: &TileRecord, header: &RasterStreamHeader) -> Self {
        Self {
            index: record.index,
            grid_x: record.grid_x,
            grid_y: record.grid_y,
            pixels: vec![0; header.tile_byte_len()],
        }
    }
}
