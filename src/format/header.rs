//! Tile-stream header parsing.
//!
//! A layer's raster entry starts with a handful of ASCII lines:
//!
//! ```text
//! VERSION 2
//! TILEWIDTH 64
//! TILEHEIGHT 64
//! PIXELSIZE 4
//! DATA 12
//! ```
//!
//! `DATA` is the last header line; the tile records follow immediately.

use serde::Serialize;

use crate::error::FormatError;
use crate::io::ByteStream;

/// Maximum number of lines scanned while looking for `DATA`.
pub const MAX_HEADER_LINES: usize = 16;

const FIELD_TILE_WIDTH: &str = "TILEWIDTH";
const FIELD_TILE_HEIGHT: &str = "TILEHEIGHT";
const FIELD_PIXEL_SIZE: &str = "PIXELSIZE";
const FIELD_DATA: &str = "DATA";

/// Parsed tile-stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RasterStreamHeader {
    /// Width of every tile in pixels
    pub tile_width: u32,

    /// Height of every tile in pixels
    pub tile_height: u32,

    /// Bytes per pixel (all channels together)
    pub bytes_per_pixel: u32,

    /// Number of tile records following the header
    pub tile_count: usize,
}

impl RasterStreamHeader {
    /// Parse the header from `stream`, leaving the cursor on the first tile record.
    ///
    /// # Errors
    /// - `MissingData` if no `DATA` line appears within [`MAX_HEADER_LINES`]
    /// - `MissingField` if `DATA` is reached before a dimension field
    /// - `InvalidNumber` / `NonPositive` for bad field values
    /// - `UnterminatedLine` if the stream ends inside the header
    pub fn parse(stream: &mut ByteStream) -> Result<Self, FormatError> {
        let mut tile_width = None;
        let mut tile_height = None;
        let mut bytes_per_pixel = None;

        for _ in 0..MAX_HEADER_LINES {
            let offset = stream.position();
            let line = stream.read_line()?;
            let (key, value) = line.split_once(' ').unwrap_or((line.as_str(), ""));

            match key {
                FIELD_TILE_WIDTH => {
                    tile_width = Some(parse_dimension(FIELD_TILE_WIDTH, value, offset)?)
                }
                FIELD_TILE_HEIGHT => {
                    tile_height = Some(parse_dimension(FIELD_TILE_HEIGHT, value, offset)?)
                }
                FIELD_PIXEL_SIZE => {
                    bytes_per_pixel = Some(parse_dimension(FIELD_PIXEL_SIZE, value, offset)?)
                }
                FIELD_DATA => {
                    let tile_count = value.trim().parse::<usize>().map_err(|_| {
                        FormatError::InvalidNumber {
                            field: FIELD_DATA,
                            value: value.to_string(),
                            offset,
                        }
                    })?;

                    return Ok(Self {
                        tile_width: tile_width.ok_or(FormatError::MissingField(FIELD_TILE_WIDTH))?,
                        tile_height: tile_height
                            .ok_or(FormatError::MissingField(FIELD_TILE_HEIGHT))?,
                        bytes_per_pixel: bytes_per_pixel
                            .ok_or(FormatError::MissingField(FIELD_PIXEL_SIZE))?,
                        tile_count,
                    });
                }
                _ => {}
            }
        }

        Err(FormatError::MissingData {
            max_lines: MAX_HEADER_LINES,
        })
    }

    /// Size in bytes of one fully decoded tile.
    #[inline]
    pub fn tile_byte_len(&self) -> usize {
        self.tile_width as usize * self.tile_height as usize * self.bytes_per_pixel as usize
    }
}

fn parse_dimension(field: &'static str, value: &str, offset: u64) -> Result<u32, FormatError> {
    let parsed = value
        .trim()
        .parse::<i64>()
        .map_err(|_| FormatError::InvalidNumber {
            field,
            value: value.to_string(),
            offset,
        })?;

    if parsed <= 0 {
        return Err(FormatError::NonPositive {
            field,
            value: parsed,
        });
    }

    u32::try_from(parsed).map_err(|_| FormatError::InvalidNumber {
        field,
        value: value.to_string(),
        offset,
    })
}
