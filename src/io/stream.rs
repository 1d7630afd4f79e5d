use bytes::Bytes;

use crate::error::FormatError;

/// Line terminator used by the tile-stream text records.
pub const LINE_FEED: u8 = 0x0A;

/// Forward-only cursor over an in-memory tile stream.
///
/// The stream is held as [`Bytes`], so payload reads hand out slices of the
/// underlying buffer without copying. The cursor never looks ahead: every read
/// consumes exactly the bytes it returns (plus the terminator for lines).
#[derive(Debug, Clone)]
pub struct ByteStream {
    data: Bytes,
    pos: usize,
}

impl ByteStream {
    /// Create a cursor positioned at the start of `data`.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// Current byte offset from the start of the stream.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether the whole stream has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read one line terminated by `0x0A`, returning it without the terminator.
    ///
    /// A trailing `\r` is stripped. The line must be ASCII.
    ///
    /// # Errors
    /// - `UnterminatedLine` if the stream ends before a terminator
    /// - `NonAscii` if the line contains non-ASCII bytes
    pub fn read_line(&mut self) -> Result<String, FormatError> {
        let start = self.pos;
        let rest = &self.data[start..];

        let len = rest
            .iter()
            .position(|&b| b == LINE_FEED)
            .ok_or(FormatError::UnterminatedLine {
                offset: start as u64,
            })?;

        let mut line = &rest[..len];
        if let [head @ .., b'\r'] = line {
            line = head;
        }

        if !line.is_ascii() {
            return Err(FormatError::NonAscii {
                offset: start as u64,
            });
        }

        self.pos = start + len + 1;

        // ASCII was checked above, so this cannot fail
        Ok(line.iter().map(|&b| b as char).collect())
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    /// Read exactly `len` bytes as a zero-copy slice of the stream.
    ///
    /// Returns `None` without moving the cursor if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Option<Bytes> {
        if len > self.remaining() {
            return None;
        }
        let out = self.data.slice(self.pos..self.pos + len);
        self.pos += len;
        Some(out)
    }
}
