//! LZF-style back-reference decompressor.
//!
//! The compressed stream is a sequence of instructions, each introduced by a
//! control byte:
//!
//! ```text
//! ctrl < 32   literal run: copy the next ctrl + 1 input bytes
//! ctrl >= 32  back-reference:
//!               len    = ctrl >> 5           (7 means: add the next input byte)
//!               offset = (ctrl & 0x1F) << 8  | next input byte
//!               copy len + 2 bytes starting offset + 1 bytes back in the output
//! ```
//!
//! Back-references may overlap the bytes they produce, which is how runs of a
//! repeated pattern are encoded. Copies are therefore done one byte at a time.

use crate::error::DecompressionError;

/// Control bytes below this value start a literal run.
const LITERAL_LIMIT: u8 = 32;

/// Length field value that signals an extra length byte.
const EXTENDED_LENGTH: usize = 7;

/// Minimum number of bytes copied by a back-reference.
const MIN_MATCH: usize = 2;

/// Expand an LZF-compressed buffer.
///
/// Instructions are decoded while the input cursor is before the last input
/// byte. The output grows as needed; its final length is whatever the
/// instructions produce.
///
/// # Errors
/// - `InputExhausted` if an instruction needs more bytes than the input has
/// - `BadReference` if a back-reference points before the start of the output
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, DecompressionError> {
    let mut output = Vec::new();
    let limit = input.len().saturating_sub(1);
    let mut ip = 0;

    while ip < limit {
        let ctrl_offset = ip;
        let ctrl = input[ip];
        ip += 1;

        if ctrl < LITERAL_LIMIT {
            let run = ctrl as usize + 1;
            let literal = input
                .get(ip..ip + run)
                .ok_or_else(|| DecompressionError::InputExhausted {
                    input_offset: ip,
                    needed: ip + run - input.len(),
                })?;
            output.extend_from_slice(literal);
            ip += run;
            continue;
        }

        let mut len = (ctrl >> 5) as usize;
        let offset_high = ((ctrl & 0x1F) as usize) << 8;

        if len == EXTENDED_LENGTH {
            len += next_byte(input, &mut ip)? as usize;
        }
        let offset_low = next_byte(input, &mut ip)? as usize;

        let distance = offset_high + offset_low + 1;
        let output_len = output.len();
        if distance > output_len {
            return Err(DecompressionError::BadReference {
                input_offset: ctrl_offset,
                position: output_len as i64 - distance as i64,
                output_len,
            });
        }

        // Byte-wise so that overlapping references see what they just wrote
        let start = output_len - distance;
        for i in 0..len + MIN_MATCH {
            let byte = output[start + i];
            output.push(byte);
        }
    }

    Ok(output)
}

#[inline]
fn next_byte(input: &[u8], ip: &mut usize) -> Result<u8, DecompressionError> {
    let byte = *input
        .get(*ip)
        .ok_or_else(|| DecompressionError::InputExhausted {
            input_offset: *ip,
            needed: 1,
        })?;
    *ip += 1;
    Ok(byte)
}
