use thiserror::Error;

/// Errors raised while opening the project archive or resolving entries in it
#[derive(Debug, Clone, Error)]
pub enum ContainerError {
    /// The archive itself could not be read (not a zip, truncated central directory...)
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    /// The requested entry does not exist in the archive
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// The entry exists but reading its contents failed
    #[error("Failed to read entry {path}: {message}")]
    Read { path: String, message: String },

    /// The project name could not be resolved from the archive layout
    #[error("Cannot resolve project: {0}")]
    AmbiguousProject(String),
}

/// Errors raised while parsing the tile-stream header or a tile record.
///
/// Every variant that can occur after the header carries the byte offset where
/// the problem was detected, and tile-level variants carry the tile index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// No `DATA` line within the header line bound
    #[error("Missing DATA field within the first {max_lines} header lines")]
    MissingData { max_lines: usize },

    /// `DATA` was reached but a required field was never seen
    #[error("Missing required header field: {0}")]
    MissingField(&'static str),

    /// A numeric header field could not be parsed
    #[error("Invalid value for {field} at offset {offset}: {value:?}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        offset: u64,
    },

    /// A dimension field is zero or negative
    #[error("Header field {field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: i64 },

    /// The stream ended before a line terminator was found
    #[error("Unterminated line at offset {offset}")]
    UnterminatedLine { offset: u64 },

    /// A line contains bytes that are not ASCII text
    #[error("Non-ASCII line at offset {offset}")]
    NonAscii { offset: u64 },

    /// A tile record header line could not be parsed
    #[error("Malformed record for tile {tile_index} at offset {offset}: {message}")]
    MalformedRecord {
        tile_index: usize,
        offset: u64,
        message: String,
    },

    /// A tile record declares a payload size below one byte
    #[error("Tile {tile_index} at offset {offset} declares invalid payload size {size}")]
    InvalidPayloadSize {
        tile_index: usize,
        offset: u64,
        size: i64,
    },

    /// The stream ended before the declared payload was available
    #[error(
        "Truncated tile {tile_index}: need {requested} bytes at offset {offset}, only {available} left"
    )]
    Truncated {
        tile_index: usize,
        offset: u64,
        requested: u64,
        available: u64,
    },

    /// The inferred canvas does not fit in memory limits
    #[error("Canvas {width}x{height}x{bytes_per_pixel} exceeds the limit of {limit} bytes")]
    CanvasTooLarge {
        width: u64,
        height: u64,
        bytes_per_pixel: u64,
        limit: usize,
    },
}

/// Errors raised while expanding a compressed tile payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecompressionError {
    /// A back-reference points before the start or past the end of the output
    #[error(
        "Back-reference out of range at input offset {input_offset}: position {position}, output length {output_len}"
    )]
    BadReference {
        input_offset: usize,
        position: i64,
        output_len: usize,
    },

    /// The input ended in the middle of an instruction
    #[error("Input exhausted at offset {input_offset}: needed {needed} more bytes")]
    InputExhausted { input_offset: usize, needed: usize },

    /// The expanded tile does not have the size implied by the header
    #[error("Decoded to {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Wraps any of the above with the tile it occurred in
    #[error("Tile {tile_index} (record at offset {offset}): {source}")]
    InTile {
        tile_index: usize,
        offset: u64,
        #[source]
        source: Box<DecompressionError>,
    },
}

/// Errors raised while serializing a canvas to an image container
#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    /// The canvas pixel size is not supported by the target format
    #[error("Unsupported pixel size {bytes_per_pixel} for {format} (expected {expected})")]
    UnsupportedPixelSize {
        format: &'static str,
        bytes_per_pixel: usize,
        expected: usize,
    },

    /// Width or height does not fit the header field
    #[error("Dimensions {width}x{height} do not fit the {format} header")]
    DimensionsTooLarge {
        format: &'static str,
        width: usize,
        height: usize,
    },

    /// The underlying image codec rejected the data
    #[error("Image codec error: {0}")]
    Codec(String),
}

/// A compositor finding that the decode tolerated, or refused under fail-fast
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionWarning {
    /// The tile lies above or left of the canvas origin
    #[error("Tile {tile_index} at ({grid_x}, {grid_y}) has negative offset ({offset_x}, {offset_y})")]
    NegativeOffset {
        tile_index: usize,
        grid_x: i32,
        grid_y: i32,
        offset_x: i64,
        offset_y: i64,
    },

    /// Part of the tile falls outside the canvas buffer
    #[error("Tile {tile_index} at ({grid_x}, {grid_y}): {skipped} bytes fell outside the canvas")]
    OutOfBounds {
        tile_index: usize,
        grid_x: i32,
        grid_y: i32,
        skipped: usize,
    },

    /// The tile failed to decompress and was replaced by a blank tile
    #[error("Tile {tile_index} at ({grid_x}, {grid_y}) replaced by a blank tile: {reason}")]
    BlankedTile {
        tile_index: usize,
        grid_x: i32,
        grid_y: i32,
        reason: String,
    },
}

/// Top-level error for decoding or exporting a layer
#[derive(Debug, Clone, Error)]
pub enum LayerError {
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Decompression error: {0}")]
    Decompression(#[from] DecompressionError),

    /// A composition warning escalated by the fail-fast placement policy
    #[error("Placement rejected: {0}")]
    Placement(CompositionWarning),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),
}
