//! Unsigned LEB128 length/index encoding.
//!
//! Seven payload bits per byte, least-significant group first; the high bit
//! is set on every continuation byte and clear on the terminator. Only
//! non-negative integers are representable, which the `u64` signatures
//! enforce at the boundary.

use bytes::{BufMut, BytesMut};

use crate::error::CodecError;

/// Maximum encoded width of a 64-bit varint (ceil(64 / 7) = 10 bytes).
pub const MAX_VARINT_BYTES: usize = 10;

/// Appends `value` to the buffer as an unsigned LEB128 varint.
pub fn write_varint(buf: &mut BytesMut, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

/// Reads an unsigned LEB128 varint from `input` starting at `*pos`,
/// advancing `*pos` past the consumed bytes.
///
/// Running off the end of the input, or a value that does not fit in 64
/// bits, is a format error.
pub fn read_varint(input: &[u8], pos: &mut usize) -> Result<u64, CodecError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;

    loop {
        let byte = *input
            .get(*pos)
            .ok_or_else(|| CodecError::corrupt("varint ran off the end of the input"))?;
        *pos += 1;

        let group = u64::from(byte & 0x7F);
        if shift == 63 && group > 1 {
            return Err(CodecError::corrupt("varint exceeds 64 bits"));
        }
        if shift > 63 {
            return Err(CodecError::corrupt("varint exceeds 64 bits"));
        }
        result |= group << shift;

        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Number of bytes `write_varint` will produce for `value`.
#[inline]
pub const fn varint_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7)
}
