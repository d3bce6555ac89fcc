//! Tags and wire types.
//!
//! Every field on the wire starts with a varint tag holding
//! `(field_number << 3) | wire_type`:
//! - 0: VARINT (int32, int64, uint32, uint64, sint32, sint64, bool, enum)
//! - 1: I64 (fixed64, sfixed64, double)
//! - 2: LEN (string, bytes, embedded messages, packed repeated fields, maps)
//! - 5: I32 (fixed32, sfixed32, float)
//!
//! Wire types 3 and 4 (groups) are deprecated and rejected.

use bytes::BufMut;

use crate::varint::{encode_varint, encoded_len_varint};
use crate::{Error, Result, UnsupportedError};

/// Smallest valid field number.
pub const MIN_FIELD_NUMBER: u32 = 1;
/// Largest valid field number (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;

/// Protobuf wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            _ => Err(Error::InvalidEncoding("reserved wire type")),
        }
    }
}

/// Writes the tag for `field_number` with `wire_type`.
#[inline]
pub fn encode_tag<B: BufMut>(field_number: u32, wire_type: WireType, buf: &mut B) {
    let tag = (u64::from(field_number) << 3) | wire_type as u64;
    encode_varint(tag, buf);
}

/// Encoded length of a tag. Grows with the field number: numbers up to 15
/// fit one byte, up to 2047 two bytes, and so on.
#[inline]
pub const fn tag_len(field_number: u32) -> usize {
    encoded_len_varint((field_number as u64) << 3)
}

/// Splits a decoded tag value into field number and wire type.
///
/// # Errors
/// `InvalidEncoding` for field number 0 or a reserved wire type,
/// `Unsupported` for a field number above `max_field_number`.
pub fn split_tag(tag: u64, max_field_number: u32) -> Result<(u32, WireType)> {
    let wire_type = WireType::try_from((tag & 0x07) as u8)?;
    let field_number = tag >> 3;
    if field_number < u64::from(MIN_FIELD_NUMBER) {
        return Err(Error::InvalidEncoding("field number 0"));
    }
    if field_number > u64::from(max_field_number.min(MAX_FIELD_NUMBER)) {
        return Err(UnsupportedError::FieldNumberOutOfRange {
            field_number,
            max: max_field_number.min(MAX_FIELD_NUMBER),
        }
        .into());
    }
    Ok((field_number as u32, wire_type))
}
