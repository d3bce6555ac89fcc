//! # struct-pb
//!
//! Protocol Buffers wire-format encoding for plain Rust structs.
//!
//! - No `.proto` files and no build step: `#[derive(Message)]` turns a struct
//!   into a message, with field numbers taken from declaration order
//! - Output is byte-identical to other protobuf implementations for the same
//!   message (varint, ZigZag, fixed-width, strings, packed repeated, nested
//!   messages, maps)
//! - Decoding borrows the input, checks every length and wire type, and never
//!   panics on malformed bytes
//!
//! ## Type Mapping
//!
//! | Rust                              | Protobuf                         |
//! |-----------------------------------|----------------------------------|
//! | `bool`                            | `bool`                           |
//! | `Varint<i32>`, `Varint<i64>`      | `int32`, `int64`                 |
//! | `Varint<u32>`, `Varint<u64>`      | `uint32`, `uint64`               |
//! | `Sint<i32>`, `Sint<i64>`          | `sint32`, `sint64`               |
//! | `u32`, `i32`, `f32`               | `fixed32`, `sfixed32`, `float`   |
//! | `u64`, `i64`, `f64`               | `fixed64`, `sfixed64`, `double`  |
//! | `String`, `bytes::Bytes`          | `string`, `bytes`                |
//! | `#[derive(Enumeration)]` enum     | `enum`                           |
//! | `#[derive(Message)]` struct       | embedded message                 |
//! | `Option<T>`                       | `optional T` (explicit presence) |
//! | `Vec<T>`                          | `repeated T` (packed if scalar)  |
//! | `HashMap<K, V>`, `BTreeMap<K, V>` | `map<K, V>`                      |
//! | `Option<E>` + `#[derive(Oneof)]`  | `oneof`                          |
//!
//! `u8`, `u16`, `i8` and `i16` are carried as varints.
//!
//! ## Attribute Macros
//!
//! - `#[pb(first_field_number = N)]` on a struct: implicit numbering starts
//!   at `N` instead of 1.
//! - `#[pb(number = N)]` on a field: explicit field number. Once one field is
//!   numbered, every field must be.
//! - `#[pb(oneof(N, M, ...))]` on an `Option<E>` field: the numbers owned by
//!   the oneof enum `E`.
//! - `#[pb(number = N)]` on a oneof variant: that variant's field number.
//!
//! ## Feature Flags
//!
//! - `indexmap` — `indexmap::IndexMap` as a map field.
//! - `ahash` — `ahash::AHashMap` as a map field.
//! - `smol_str` — `smol_str::SmolStr` as a string value.
//!
//! ## Example
//! ```rust
//! use struct_pb::{deserialize, serialize, Message, Varint};
//!
//! #[derive(Message, Default, Debug, PartialEq)]
//! struct Test1 {
//!     a: Varint<i32>,
//! }
//!
//! let value = Test1 { a: Varint(150) };
//! let bytes = serialize(&value);
//! assert_eq!(&bytes[..], &[0x08, 0x96, 0x01]);
//! assert_eq!(deserialize::<Test1>(&bytes).unwrap(), value);
//! ```

extern crate self as struct_pb;

mod error;
mod features;
pub mod field;
pub mod kind;
pub mod message;
pub mod options;
pub mod reader;
pub mod scalar;
pub mod value;
pub mod varint;
pub mod wire;

use bytes::{BufMut, Bytes, BytesMut};

pub use bytes;
pub use error::{Error, ErrorKind, FieldDecodeError, Result, UnsupportedError};
pub use field::{Field, Oneof};
pub use kind::FieldKind;
pub use message::Message;
pub use options::{DecodeOptions, UnknownFields};
pub use reader::Reader;
pub use scalar::{SInt32, SInt64, Sint, VarInt32, VarInt64, VarUint32, VarUint64, Varint};
pub use struct_pb_derive::{Enumeration, Message, Oneof};
pub use value::{ProtoEnum, Value};
pub use wire::{WireType, MAX_FIELD_NUMBER, MIN_FIELD_NUMBER};

/// Number of bytes [`serialize`] produces for `value`.
pub fn calculate_size<T: Message>(value: &T) -> usize {
    value.encoded_len()
}

/// Encodes a message into a new buffer sized exactly for it.
///
/// # Example
/// ```rust
/// use struct_pb::{calculate_size, serialize, Message};
///
/// #[derive(Message, Default)]
/// struct Test2 {
///     #[pb(number = 2)]
///     b: String,
/// }
///
/// let value = Test2 { b: "testing".to_string() };
/// let bytes = serialize(&value);
/// assert_eq!(&bytes[..], b"\x12\x07testing");
/// assert_eq!(bytes.len(), calculate_size(&value));
/// ```
pub fn serialize<T: Message>(value: &T) -> Bytes {
    let mut writer = BytesMut::with_capacity(value.encoded_len());
    value.encode_raw(&mut writer);
    writer.freeze()
}

/// Appends the encoded message to `writer`, growing it as needed.
pub fn serialize_to<T: Message>(writer: &mut BytesMut, value: &T) {
    writer.reserve(value.encoded_len());
    value.encode_raw(writer);
}

/// Encodes a message into a buffer that may not grow, such as `&mut [u8]`.
///
/// # Errors
/// `Error::InsufficientCapacity` if `writer` cannot take the whole message.
/// Nothing is written in that case.
pub fn serialize_into<T: Message, B: BufMut>(writer: &mut B, value: &T) -> Result<()> {
    let required = value.encoded_len();
    let available = writer.remaining_mut();
    if available < required {
        return Err(Error::InsufficientCapacity {
            required,
            available,
        });
    }
    value.encode_raw(writer);
    Ok(())
}

/// Decodes a message with the default [`DecodeOptions`].
pub fn deserialize<T: Message>(data: &[u8]) -> Result<T> {
    deserialize_with(data, &DecodeOptions::default())
}

/// Decodes a message with the given options.
///
/// # Example
/// ```rust
/// use struct_pb::{deserialize_with, DecodeOptions, ErrorKind, Message, UnknownFields, Varint};
///
/// #[derive(Message, Default, Debug)]
/// struct Test1 {
///     a: Varint<i32>,
/// }
///
/// // Field 2 is not declared by `Test1`.
/// let data = [0x08, 0x96, 0x01, 0x10, 0x01];
/// let strict = DecodeOptions::new().unknown_fields(UnknownFields::Reject);
/// let err = deserialize_with::<Test1>(&data, &strict).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::InvalidArgument);
/// ```
pub fn deserialize_with<T: Message>(data: &[u8], options: &DecodeOptions) -> Result<T> {
    let mut value = T::default();
    deserialize_into_with(&mut value, data, options)?;
    Ok(value)
}

/// Merges the encoded message in `data` into `value` and returns the number
/// of bytes consumed, which on success is all of `data`.
///
/// Fields absent from `data` keep their current value. On error, fields
/// decoded before the failure stay set.
pub fn deserialize_into<T: Message>(value: &mut T, data: &[u8]) -> Result<usize> {
    deserialize_into_with(value, data, &DecodeOptions::default())
}

/// [`deserialize_into`] with the given options.
pub fn deserialize_into_with<T: Message>(
    value: &mut T,
    data: &[u8],
    options: &DecodeOptions,
) -> Result<usize> {
    let mut reader = Reader::new(data, options);
    match message::merge_body(value, &mut reader) {
        Ok(()) => Ok(reader.consumed()),
        Err(err) => {
            tracing::debug!(
                message_type = T::NAME,
                offset = reader.consumed(),
                error = %err,
                "failed to decode message"
            );
            Err(err)
        }
    }
}

#[doc(hidden)]
pub mod __private {
    /// Set equality of two field-number lists, usable in const context.
    pub const fn same_field_numbers(a: &[u32], b: &[u32]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        let mut i = 0;
        while i < a.len() {
            let mut found = false;
            let mut j = 0;
            while j < b.len() {
                if a[i] == b[j] {
                    found = true;
                }
                j += 1;
            }
            if !found {
                return false;
            }
            i += 1;
        }
        true
    }
}
