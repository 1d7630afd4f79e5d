//! Tile record reading.
//!
//! Each record is a text line followed by a binary payload:
//!
//! ```text
//! <gridX>,<gridY>,<method>,<size>\n
//! <flag byte><size - 1 payload bytes>
//! ```
//!
//! The least-significant bit of the flag byte says whether the payload is
//! compressed. The method label is kept for diagnostics only; the flag byte
//! is what decides how the payload is expanded.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::error::FormatError;
use crate::io::ByteStream;

use super::header::RasterStreamHeader;

// =============================================================================
// Compression Method
// =============================================================================

/// Compression label written in a tile record line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CompressionMethod {
    /// `LZF`, the only method the format writer emits
    Lzf,
    /// Any other label, kept verbatim
    Other(String),
}

impl CompressionMethod {
    /// Interpret a record label.
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("LZF") {
            CompressionMethod::Lzf
        } else {
            CompressionMethod::Other(label.to_string())
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionMethod::Lzf => f.write_str("LZF"),
            CompressionMethod::Other(label) => f.write_str(label),
        }
    }
}

// =============================================================================
// Tile Record
// =============================================================================

/// One tile as stored in the stream, before decompression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRecord {
    /// Position of this record in the stream (0-based)
    pub index: usize,

    /// Byte offset of the record's header line
    pub offset: u64,

    /// Pixel X coordinate of the tile's top-left corner
    pub grid_x: i32,

    /// Pixel Y coordinate of the tile's top-left corner
    pub grid_y: i32,

    /// Label from the record line (informational)
    pub method: CompressionMethod,

    /// Whether the payload must be expanded by the LZF decompressor
    pub compressed: bool,

    /// Payload without the flag byte
    pub payload: Bytes,
}

impl TileRecord {
    /// Read one record from `stream`.
    ///
    /// The cursor advances by exactly the line length, the terminator, the flag
    /// byte and `size - 1` payload bytes.
    ///
    /// # Errors
    /// - `MalformedRecord` if the line does not have four valid fields
    /// - `InvalidPayloadSize` if the declared size is below 1
    /// - `Truncated` if the stream ends before the payload is complete
    pub fn read(stream: &mut ByteStream, index: usize) -> Result<Self, FormatError> {
        let offset = stream.position();

        let line = stream.read_line().map_err(|e| match e {
            FormatError::UnterminatedLine { .. } => FormatError::MalformedRecord {
                tile_index: index,
                offset,
                message: "missing record line terminator".to_string(),
            },
            other => other,
        })?;

        let malformed = |message: String| FormatError::MalformedRecord {
            tile_index: index,
            offset,
            message,
        };

        let fields: Vec<&str> = line.split(',').collect();
        let [x, y, method, size] = fields.as_slice() else {
            return Err(malformed(format!(
                "expected 4 comma-separated fields, got {}: {:?}",
                fields.len(),
                line
            )));
        };

        let grid_x = x
            .trim()
            .parse::<i32>()
            .map_err(|_| malformed(format!("invalid X coordinate {:?}", x)))?;
        let grid_y = y
            .trim()
            .parse::<i32>()
            .map_err(|_| malformed(format!("invalid Y coordinate {:?}", y)))?;
        let size = size
            .trim()
            .parse::<i64>()
            .map_err(|_| malformed(format!("invalid payload size {:?}", size)))?;

        if size < 1 {
            return Err(FormatError::InvalidPayloadSize {
                tile_index: index,
                offset,
                size,
            });
        }

        let truncated = |stream: &ByteStream| FormatError::Truncated {
            tile_index: index,
            offset: stream.position(),
            requested: size as u64,
            available: stream.remaining() as u64,
        };

        if (size as u64) > stream.remaining() as u64 {
            return Err(truncated(stream));
        }

        let flag = stream.read_u8().ok_or_else(|| truncated(stream))?;
        let payload_len = (size - 1) as usize;
        let payload = stream
            .read_bytes(payload_len)
            .ok_or_else(|| truncated(stream))?;

        Ok(Self {
            index,
            offset,
            grid_x,
            grid_y,
            method: CompressionMethod::from_label(method.trim()),
            compressed: flag & 1 == 1,
            payload,
        })
    }
}

// =============================================================================
// Record Iterator
// =============================================================================

/// Iterator reading exactly `tile_count` records from a stream.
///
/// After the first error the iterator is exhausted.
pub struct TileRecords<'a> {
    stream: &'a mut ByteStream,
    count: usize,
    next: usize,
    failed: bool,
}

impl<'a> TileRecords<'a> {
    /// Iterate over the records announced by `header`.
    pub fn new(stream: &'a mut ByteStream, header: &RasterStreamHeader) -> Self {
        Self {
            stream,
            count: header.tile_count,
            next: 0,
            failed: false,
        }
    }
}

impl Iterator for TileRecords<'_> {
    type Item = Result<TileRecord, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next >= self.count {
            return None;
        }

        let result = TileRecord::read(self.stream, self.next);
        self.next += 1;
        self.failed = result.is_err();
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        (0, Some(self.count - self.next))
    }
}
