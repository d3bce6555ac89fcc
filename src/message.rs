use bytes::BufMut;

use crate::options::UnknownFields;
use crate::reader::Reader;
use crate::value::delimited_len;
use crate::varint::encode_varint;
use crate::wire::WireType;
use crate::{FieldDecodeError, Result};

/// A struct encoded as a protobuf message.
///
/// Implement this trait with `#[derive(Message)]`; the derive also provides
/// [`Value`](crate::Value), so messages nest in other messages, `Option`,
/// `Vec` and map values.
///
/// `Default` must produce the message with every field at its zero value,
/// which is what `#[derive(Default)]` gives. A plain message field that
/// encodes to no bytes is left off the wire and decodes back as
/// `Default::default()`, so a hand-written `Default` with other values does
/// not round-trip.
///
/// # Example
/// ```rust
/// use struct_pb::{Message, Varint};
///
/// #[derive(Message, Default, Debug, PartialEq)]
/// struct Point {
///     #[pb(number = 1)]
///     x: Varint<i32>,
///     #[pb(number = 4)]
///     y: Varint<i32>,
/// }
///
/// // Tags are resolved when the derive expands.
/// assert_eq!(Point::FIELD_NUMBERS, &[1, 4]);
/// assert_eq!(Point::field_index(4), Some(1));
/// assert_eq!(Point::field_index(2), None);
/// ```
pub trait Message: Default {
    /// Type name, used in error messages.
    const NAME: &'static str;

    /// Field numbers in declaration order. A oneof member contributes each
    /// of its numbers in turn.
    const FIELD_NUMBERS: &'static [u32];

    /// Index of the struct member carrying `field_number`.
    fn field_index(field_number: u32) -> Option<usize>;

    /// Size of the encoded message body, without an outer tag or length.
    fn encoded_len(&self) -> usize;

    /// Writes every field in ascending field-number order. The buffer must
    /// have room for [`encoded_len`](Message::encoded_len) bytes.
    fn encode_raw<B: BufMut>(&self, buf: &mut B);

    /// Merges one record whose tag has already been read. Returns `false`
    /// without touching the reader if the message has no such field.
    fn merge_field(
        &mut self,
        field_number: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<bool>;
}

/// Decodes records until the reader is exhausted.
///
/// Unknown fields are skipped or rejected according to the reader's options.
/// On error the fields decoded so far stay set.
pub fn merge_body<M: Message>(message: &mut M, reader: &mut Reader<'_>) -> Result<()> {
    while !reader.is_empty() {
        let (field_number, wire_type) = reader.read_tag()?;
        if message.merge_field(field_number, wire_type, reader)? {
            continue;
        }
        match reader.options().unknown_fields {
            UnknownFields::Skip => {
                tracing::trace!(
                    message_type = M::NAME,
                    field_number,
                    ?wire_type,
                    "skipping unknown field"
                );
                reader.skip_field(wire_type)?;
            }
            UnknownFields::Reject => {
                return Err(FieldDecodeError::UnknownField {
                    field_number,
                    wire_type,
                    message: M::NAME,
                }
                .into());
            }
        }
    }
    Ok(())
}

// Embedded messages, called from the `Value` impl `#[derive(Message)]` emits.

/// Length prefix plus body.
#[inline]
pub fn message_value_len<M: Message>(message: &M) -> usize {
    delimited_len(message.encoded_len())
}

#[inline]
pub fn encode_message_value<M: Message, B: BufMut>(message: &M, buf: &mut B) {
    encode_varint(message.encoded_len() as u64, buf);
    message.encode_raw(buf);
}

/// Decodes a length-delimited body into `message`, one nesting level deeper.
///
/// The body is read through a sub-reader bounded to the declared length, so
/// it always ends exactly there: a record running past the end fails with
/// `Error::BufferUnderrun` instead of reading into the enclosing message.
pub fn merge_message_value<M: Message>(message: &mut M, reader: &mut Reader<'_>) -> Result<()> {
    let mut body = reader.nested()?;
    merge_body(message, &mut body)
}
