//! Byte-level reading helpers.
//!
//! [`ByteStream`] is the cursor the header parser and tile record reader share.
//! The little-endian helpers exist for tests that check written bitmap headers.

mod stream;

pub use stream::{ByteStream, LINE_FEED};

/// Read a little-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[cfg(test)]
#[inline]
pub(crate) fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Read a little-endian u32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[cfg(test)]
#[inline]
pub(crate) fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Read a little-endian i32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[cfg(test)]
#[inline]
pub(crate) fn read_i32_le(bytes: &[u8]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
