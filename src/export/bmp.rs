//! Canonical bitmap writer.
//!
//! # Layout
//!
//! ```text
//! Offset  Size  Field
//! 0       2     "BM"
//! 2       4     File size (patched after the pixels are written)
//! 6       4     Reserved (0)
//! 10      4     Pixel data offset (patched, always 54)
//! 14      4     Info header size (40)
//! 18      4     Width
//! 22      4     Height (positive: rows stored bottom-up)
//! 26      2     Planes (1)
//! 28      2     Bits per pixel (32)
//! 30      4     Compression (0)
//! 34      4     Image size (0)
//! 38      8     Horizontal / vertical resolution (0)
//! 46      8     Palette size / important colors (0)
//! 54      ...   Pixel rows, bottom row first
//! ```
//!
//! All multi-byte fields are little-endian. Rows of 32-bit pixels are always
//! a multiple of four bytes, so no row padding is written.

use crate::error::EncodeError;
use crate::raster::CanvasBuffer;

/// Size of the file header.
pub const FILE_HEADER_SIZE: usize = 14;

/// Size of the BITMAPINFOHEADER.
pub const INFO_HEADER_SIZE: usize = 40;

/// Offset of the pixel data in every file this module writes.
pub const PIXEL_DATA_OFFSET: usize = FILE_HEADER_SIZE + INFO_HEADER_SIZE;

const FILE_SIZE_FIELD: usize = 2;
const DATA_OFFSET_FIELD: usize = 10;
const BYTES_PER_PIXEL: usize = 4;
const BITS_PER_PIXEL: u16 = 32;

/// Serialize a 4-byte-per-pixel canvas as a 32-bit bitmap.
///
/// The canvas is written as-is: Krita stores 8-bit colour as BGRA, which is
/// already the bitmap's channel order.
///
/// # Errors
/// - `UnsupportedPixelSize` if the canvas is not 4 bytes per pixel
/// - `DimensionsTooLarge` if width, height or file size overflow the header
pub fn encode_bmp(canvas: &CanvasBuffer) -> Result<Vec<u8>, EncodeError> {
    if canvas.bytes_per_pixel != BYTES_PER_PIXEL {
        return Err(EncodeError::UnsupportedPixelSize {
            format: "BMP",
            bytes_per_pixel: canvas.bytes_per_pixel,
            expected: BYTES_PER_PIXEL,
        });
    }

    let too_large = || EncodeError::DimensionsTooLarge {
        format: "BMP",
        width: canvas.width,
        height: canvas.height,
    };
    let width = i32::try_from(canvas.width).map_err(|_| too_large())?;
    let height = i32::try_from(canvas.height).map_err(|_| too_large())?;
    let total = PIXEL_DATA_OFFSET + canvas.pixels.len();
    u32::try_from(total).map_err(|_| too_large())?;

    let mut out = Vec::with_capacity(total);

    // File header
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&0u32.to_le_bytes()); // file size
    out.extend_from_slice(&0u32.to_le_bytes()); // reserved
    out.extend_from_slice(&0u32.to_le_bytes()); // data offset

    // Info header
    out.extend_from_slice(&(INFO_HEADER_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&BITS_PER_PIXEL.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // compression
    out.extend_from_slice(&0u32.to_le_bytes()); // image size
    out.extend_from_slice(&0i32.to_le_bytes()); // x pixels per meter
    out.extend_from_slice(&0i32.to_le_bytes()); // y pixels per meter
    out.extend_from_slice(&0u32.to_le_bytes()); // colors used
    out.extend_from_slice(&0u32.to_le_bytes()); // important colors

    let data_offset = out.len();

    let stride = canvas.stride();
    if stride > 0 {
        for row in canvas.pixels.chunks_exact(stride).rev() {
            out.extend_from_slice(row);
        }
    }

    let file_size = out.len() as u32;
    patch_u32(&mut out, FILE_SIZE_FIELD, file_size);
    patch_u32(&mut out, DATA_OFFSET_FIELD, data_offset as u32);

    Ok(out)
}

#[inline]
fn patch_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
