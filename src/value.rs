use bytes::{BufMut, Bytes};

use crate::kind::FieldKind;
use crate::reader::Reader;
use crate::scalar::{Sint, Varint};
use crate::varint::{
    encode_varint, encoded_len_varint, zigzag_decode_32, zigzag_decode_64, zigzag_encode_32,
    zigzag_encode_64,
};
use crate::{FieldDecodeError, Result};

/// A single protobuf value: one scalar, one string or one embedded message.
///
/// This is the field classifier: every implementing type fixes its
/// [`FieldKind`], and types that implement neither this trait nor
/// [`Field`](crate::Field) cannot appear in a message.
///
/// Most users should use `#[derive(Message)]` or `#[derive(Enumeration)]`
/// instead of implementing it by hand.
pub trait Value: Default {
    /// The kind, and through it the wire type, of this value.
    const KIND: FieldKind;

    /// Returns true if this value equals its protobuf default (zero, empty).
    /// Default values of plain fields are left off the wire.
    fn is_default(&self) -> bool;

    /// Encoded length of the payload, without the tag. For length-delimited
    /// kinds this includes the length prefix.
    fn value_len(&self) -> usize;

    /// Writes the payload, without the tag.
    fn encode_value<B: BufMut>(&self, buf: &mut B);

    /// Reads a payload whose tag has already been consumed and checked.
    /// Scalars and strings are replaced; messages are merged.
    fn merge_value(&mut self, reader: &mut Reader<'_>) -> Result<()>;
}

/// A field-less enum carried as a varint.
///
/// Implemented by `#[derive(Enumeration)]`. Values are sign-extended 32-bit
/// integers stored in a `u64`.
pub trait ProtoEnum: Sized {
    const NAME: &'static str;

    fn to_u64(&self) -> u64;

    /// Returns `None` for a value no variant carries.
    fn from_u64(value: u64) -> Option<Self>;
}

// --- bool and narrow integers (varint) ---
impl Value for bool {
    const KIND: FieldKind = FieldKind::Varint;

    fn is_default(&self) -> bool {
        !*self
    }

    fn value_len(&self) -> usize {
        1
    }

    fn encode_value<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(u8::from(*self));
    }

    fn merge_value(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        *self = reader.read_varint()? != 0;
        Ok(())
    }
}

/// Narrow and wrapped integers: widen to the 64-bit varint payload and
/// truncate back on decode, as protobuf does for mismatched widths.
macro_rules! impl_varint {
    ($ty:ty, |$v:ident| $to_wire:expr, |$raw:ident| $from_wire:expr) => {
        impl Value for $ty {
            const KIND: FieldKind = FieldKind::Varint;

            fn is_default(&self) -> bool {
                *self == <$ty>::default()
            }

            fn value_len(&self) -> usize {
                let $v = *self;
                encoded_len_varint($to_wire)
            }

            fn encode_value<B: BufMut>(&self, buf: &mut B) {
                let $v = *self;
                encode_varint($to_wire, buf);
            }

            fn merge_value(&mut self, reader: &mut Reader<'_>) -> Result<()> {
                let $raw = reader.read_varint()?;
                *self = $from_wire;
                Ok(())
            }
        }
    };
}

impl_varint!(u8, |v| u64::from(v), |raw| raw as u8);
impl_varint!(u16, |v| u64::from(v), |raw| raw as u16);
impl_varint!(i8, |v| i64::from(v) as u64, |raw| raw as i8);
impl_varint!(i16, |v| i64::from(v) as u64, |raw| raw as i16);
impl_varint!(Varint<u32>, |v| u64::from(v.0), |raw| Varint(raw as u32));
impl_varint!(Varint<u64>, |v| v.0, |raw| Varint(raw));
impl_varint!(Varint<i32>, |v| i64::from(v.0) as u64, |raw| Varint(raw as i32));
impl_varint!(Varint<i64>, |v| v.0 as u64, |raw| Varint(raw as i64));

// --- ZigZag (sint32, sint64) ---
macro_rules! impl_sint {
    ($ty:ty, |$v:ident| $to_wire:expr, |$raw:ident| $from_wire:expr) => {
        impl Value for $ty {
            const KIND: FieldKind = FieldKind::Sint;

            fn is_default(&self) -> bool {
                self.0 == 0
            }

            fn value_len(&self) -> usize {
                let $v = self.0;
                encoded_len_varint($to_wire)
            }

            fn encode_value<B: BufMut>(&self, buf: &mut B) {
                let $v = self.0;
                encode_varint($to_wire, buf);
            }

            fn merge_value(&mut self, reader: &mut Reader<'_>) -> Result<()> {
                let $raw = reader.read_varint()?;
                *self = Sint($from_wire);
                Ok(())
            }
        }
    };
}

impl_sint!(Sint<i32>, |v| u64::from(zigzag_encode_32(v)), |raw| zigzag_decode_32(raw as u32));
impl_sint!(Sint<i64>, |v| zigzag_encode_64(v), |raw| zigzag_decode_64(raw));

// --- Fixed width (fixed32, sfixed32, float, fixed64, sfixed64, double) ---
/// Fixed-width values are compared bitwise for default omission, so `-0.0`
/// is still written.
macro_rules! impl_fixed {
    ($ty:ty, $kind:ident, $width:expr, $bits:ident, $put:ident, $read:ident, $from:expr) => {
        impl Value for $ty {
            const KIND: FieldKind = FieldKind::$kind;

            fn is_default(&self) -> bool {
                self.$bits() == 0
            }

            fn value_len(&self) -> usize {
                $width
            }

            fn encode_value<B: BufMut>(&self, buf: &mut B) {
                buf.$put(*self);
            }

            fn merge_value(&mut self, reader: &mut Reader<'_>) -> Result<()> {
                *self = $from(reader.$read()?);
                Ok(())
            }
        }
    };
}

trait Bits32 {
    fn bits32(&self) -> u32;
}

trait Bits64 {
    fn bits64(&self) -> u64;
}

impl Bits32 for u32 {
    fn bits32(&self) -> u32 {
        *self
    }
}

impl Bits32 for i32 {
    fn bits32(&self) -> u32 {
        *self as u32
    }
}

impl Bits32 for f32 {
    fn bits32(&self) -> u32 {
        self.to_bits()
    }
}

impl Bits64 for u64 {
    fn bits64(&self) -> u64 {
        *self
    }
}

impl Bits64 for i64 {
    fn bits64(&self) -> u64 {
        *self as u64
    }
}

impl Bits64 for f64 {
    fn bits64(&self) -> u64 {
        self.to_bits()
    }
}

impl_fixed!(u32, Fixed32, 4, bits32, put_u32_le, read_fixed32, |raw: u32| raw);
impl_fixed!(i32, Fixed32, 4, bits32, put_i32_le, read_fixed32, |raw: u32| raw as i32);
impl_fixed!(f32, Fixed32, 4, bits32, put_f32_le, read_fixed32, f32::from_bits);
impl_fixed!(u64, Fixed64, 8, bits64, put_u64_le, read_fixed64, |raw: u64| raw);
impl_fixed!(i64, Fixed64, 8, bits64, put_i64_le, read_fixed64, |raw: u64| raw as i64);
impl_fixed!(f64, Fixed64, 8, bits64, put_f64_le, read_fixed64, f64::from_bits);

// --- Length-delimited (string, bytes) ---
/// Length prefix plus payload for a byte slice of `len` bytes.
#[inline]
pub fn delimited_len(len: usize) -> usize {
    encoded_len_varint(len as u64) + len
}

/// Writes a length prefix followed by `data`.
#[inline]
pub fn encode_delimited<B: BufMut>(data: &[u8], buf: &mut B) {
    encode_varint(data.len() as u64, buf);
    buf.put_slice(data);
}

/// Reads a length-delimited payload and checks it is UTF-8.
pub fn read_str<'a>(reader: &mut Reader<'a>) -> Result<&'a str> {
    let data = reader.read_bytes()?;
    Ok(std::str::from_utf8(data)?)
}

impl Value for String {
    const KIND: FieldKind = FieldKind::LengthDelimited;

    fn is_default(&self) -> bool {
        self.is_empty()
    }

    fn value_len(&self) -> usize {
        delimited_len(self.len())
    }

    fn encode_value<B: BufMut>(&self, buf: &mut B) {
        encode_delimited(self.as_bytes(), buf);
    }

    fn merge_value(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        let s = read_str(reader)?;
        self.clear();
        self.push_str(s);
        Ok(())
    }
}

impl Value for Bytes {
    const KIND: FieldKind = FieldKind::LengthDelimited;

    fn is_default(&self) -> bool {
        self.is_empty()
    }

    fn value_len(&self) -> usize {
        delimited_len(self.len())
    }

    fn encode_value<B: BufMut>(&self, buf: &mut B) {
        encode_delimited(self, buf);
    }

    fn merge_value(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        *self = Bytes::copy_from_slice(reader.read_bytes()?);
        Ok(())
    }
}

// --- Box ---
// Lets a message refer to itself, e.g. `child: Option<Box<Node>>`.
impl<T: Value> Value for Box<T> {
    const KIND: FieldKind = T::KIND;

    fn is_default(&self) -> bool {
        (**self).is_default()
    }

    fn value_len(&self) -> usize {
        (**self).value_len()
    }

    fn encode_value<B: BufMut>(&self, buf: &mut B) {
        (**self).encode_value(buf);
    }

    fn merge_value(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        (**self).merge_value(reader)
    }
}

// --- Enumerations ---
// Used by `#[derive(Enumeration)]`.

#[inline]
pub fn enum_len<E: ProtoEnum>(value: &E) -> usize {
    encoded_len_varint(value.to_u64())
}

#[inline]
pub fn encode_enum<E: ProtoEnum, B: BufMut>(value: &E, buf: &mut B) {
    encode_varint(value.to_u64(), buf);
}

/// Reads an enum value.
///
/// # Errors
/// `FieldDecodeError::UnknownEnumValue` if no variant carries the value.
pub fn merge_enum<E: ProtoEnum>(value: &mut E, reader: &mut Reader<'_>) -> Result<()> {
    let raw = reader.read_varint()?;
    *value = E::from_u64(raw).ok_or(FieldDecodeError::UnknownEnumValue {
        value: raw,
        enum_name: E::NAME,
    })?;
    Ok(())
}
