//! Base-128 varints and the ZigZag transform.
//!
//! A varint stores 7 bits per byte, least significant group first; the high
//! bit of each byte is set when another byte follows. A `u64` needs at most
//! ten bytes.

use bytes::BufMut;

use crate::{Error, Result};

/// Longest valid varint encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Writes `value` as a varint.
#[inline]
pub fn encode_varint<B: BufMut>(mut value: u64, buf: &mut B) {
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Number of bytes [`encode_varint`] writes for `value`.
#[inline]
pub const fn encoded_len_varint(value: u64) -> usize {
    // (bits needed * 9 + 73) / 64 == ceil(bits / 7), with 0 taking one byte
    ((((value | 1).leading_zeros() ^ 63) * 9 + 73) / 64) as usize
}

/// Decodes a varint from the front of `data`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
/// `BufferUnderrun` when `data` ends before a byte without the continuation
/// bit; `InvalidEncoding` when the encoding is longer than ten bytes or
/// overflows 64 bits.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(Error::InvalidEncoding("varint overflows 64 bits"));
        }
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::underrun(data.len() + 1, data.len()))
}

/// ZigZag-encodes a 32-bit signed integer.
#[inline]
pub const fn zigzag_encode_32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode_32`].
#[inline]
pub const fn zigzag_decode_32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// ZigZag-encodes a 64-bit signed integer.
#[inline]
pub const fn zigzag_encode_64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode_64`].
#[inline]
pub const fn zigzag_decode_64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
