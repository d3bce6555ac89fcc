//! Tag-level encoding of message fields.
//!
//! [`Field`] is what `#[derive(Message)]` calls for every struct member. It
//! adds the tag, the default-omission rule and the container shapes on top of
//! [`Value`]:
//!
//! | Rust type                  | Wire shape                                   |
//! |----------------------------|----------------------------------------------|
//! | `T: Value`                 | omitted when default                         |
//! | `Option<T>`                | always written when `Some`                   |
//! | `Vec<T>` (scalar `T`)      | one packed LEN record                        |
//! | `Vec<T>` (LEN `T`)         | one record per element                       |
//! | `HashMap<K, V>`/`BTreeMap` | one `{1: key, 2: value}` entry per pair      |

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use bytes::BufMut;

use crate::reader::Reader;
use crate::value::{delimited_len, Value};
use crate::varint::encode_varint;
use crate::wire::{encode_tag, tag_len, WireType};
use crate::{FieldDecodeError, Result};

/// A struct member that can be written under a field number.
pub trait Field {
    /// Bytes written by [`encode_field`](Field::encode_field), tags included.
    /// Zero means the field is left off the wire.
    fn field_len(&self, field_number: u32) -> usize;

    fn encode_field<B: BufMut>(&self, field_number: u32, buf: &mut B);

    /// Merges one record whose tag has already been read.
    fn merge_field(
        &mut self,
        field_number: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<()>;
}

/// An enum whose variants share one struct member but each own a field number.
///
/// Implemented by `#[derive(Oneof)]`. The message holds it as `Option<Self>`;
/// a set variant is always written, even when its value is the default.
pub trait Oneof: Sized {
    /// Field numbers of all variants, in declaration order.
    const FIELD_NUMBERS: &'static [u32];

    /// Field number of the variant currently held.
    fn field_number(&self) -> u32;

    fn oneof_len(&self) -> usize;

    fn encode_oneof<B: BufMut>(&self, buf: &mut B);

    /// Merges into the held variant when `field_number` selects it, otherwise
    /// replaces the member with a freshly decoded variant.
    fn merge_oneof(
        field: &mut Option<Self>,
        field_number: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<()>;
}

/// Fails with `WireTypeMismatch` unless the record's wire type is `expected`.
#[inline]
pub fn check_wire_type(field_number: u32, expected: WireType, actual: WireType) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(FieldDecodeError::WireTypeMismatch {
            field_number,
            expected,
            actual,
        }
        .into())
    }
}

/// Tag plus payload, with no default omission.
#[inline]
pub fn present_len<T: Value>(field_number: u32, value: &T) -> usize {
    tag_len(field_number) + value.value_len()
}

#[inline]
pub fn encode_present<T: Value, B: BufMut>(field_number: u32, value: &T, buf: &mut B) {
    encode_tag(field_number, T::KIND.wire_type(), buf);
    value.encode_value(buf);
}

pub fn merge_present<T: Value>(
    value: &mut T,
    field_number: u32,
    wire_type: WireType,
    reader: &mut Reader<'_>,
) -> Result<()> {
    check_wire_type(field_number, T::KIND.wire_type(), wire_type)?;
    value.merge_value(reader)
}

impl<T: Value> Field for T {
    #[inline]
    fn field_len(&self, field_number: u32) -> usize {
        if self.is_default() {
            0
        } else {
            present_len(field_number, self)
        }
    }

    #[inline]
    fn encode_field<B: BufMut>(&self, field_number: u32, buf: &mut B) {
        if !self.is_default() {
            encode_present(field_number, self, buf);
        }
    }

    fn merge_field(
        &mut self,
        field_number: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<()> {
        merge_present(self, field_number, wire_type, reader)
    }
}

impl<T: Value> Field for Option<T> {
    fn field_len(&self, field_number: u32) -> usize {
        match self {
            Some(value) => present_len(field_number, value),
            None => 0,
        }
    }

    fn encode_field<B: BufMut>(&self, field_number: u32, buf: &mut B) {
        if let Some(value) = self {
            encode_present(field_number, value, buf);
        }
    }

    fn merge_field(
        &mut self,
        field_number: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<()> {
        merge_present(
            self.get_or_insert_with(T::default),
            field_number,
            wire_type,
            reader,
        )
    }
}

// --- Repeated ---

fn packed_body_len<T: Value>(values: &[T]) -> usize {
    match T::KIND.fixed_width() {
        Some(width) => width * values.len(),
        None => values.iter().map(Value::value_len).sum(),
    }
}

impl<T: Value> Field for Vec<T> {
    fn field_len(&self, field_number: u32) -> usize {
        if self.is_empty() {
            return 0;
        }
        if T::KIND.is_packable() {
            tag_len(field_number) + delimited_len(packed_body_len(self))
        } else {
            self.iter()
                .map(|value| present_len(field_number, value))
                .sum()
        }
    }

    fn encode_field<B: BufMut>(&self, field_number: u32, buf: &mut B) {
        if self.is_empty() {
            return;
        }
        if T::KIND.is_packable() {
            // The body length is known up front, so the prefix is written
            // before the elements at its final width.
            encode_tag(field_number, WireType::LengthDelimited, buf);
            encode_varint(packed_body_len(self) as u64, buf);
            for value in self {
                value.encode_value(buf);
            }
        } else {
            for value in self {
                encode_present(field_number, value, buf);
            }
        }
    }

    fn merge_field(
        &mut self,
        field_number: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<()> {
        if T::KIND.is_packable() && wire_type == WireType::LengthDelimited {
            let mut packed = reader.delimited()?;
            if let Some(width) = T::KIND.fixed_width() {
                let len = packed.remaining();
                if len % width != 0 {
                    return Err(FieldDecodeError::PackedLength { len, width }.into());
                }
                self.reserve(len / width);
            }
            while !packed.is_empty() {
                let mut value = T::default();
                value.merge_value(&mut packed)?;
                self.push(value);
            }
            return Ok(());
        }
        let mut value = T::default();
        merge_present(&mut value, field_number, wire_type, reader)?;
        self.push(value);
        Ok(())
    }
}

// --- Maps ---
// Every map type encodes as a repeated embedded message with the key at
// field 1 and the value at field 2.

#[inline]
fn entry_len<K: Value, V: Value>(key: &K, value: &V) -> usize {
    key.field_len(1) + value.field_len(2)
}

/// Size of all entries of a map field.
pub fn map_len<'a, K, V, I>(field_number: u32, entries: I) -> usize
where
    K: Value + 'a,
    V: Value + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    entries
        .into_iter()
        .map(|(key, value)| tag_len(field_number) + delimited_len(entry_len(key, value)))
        .sum()
}

pub fn encode_map<'a, K, V, I, B>(field_number: u32, entries: I, buf: &mut B)
where
    K: Value + 'a,
    V: Value + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
    B: BufMut,
{
    for (key, value) in entries {
        encode_tag(field_number, WireType::LengthDelimited, buf);
        encode_varint(entry_len(key, value) as u64, buf);
        key.encode_field(1, buf);
        value.encode_field(2, buf);
    }
}

/// Decodes one map entry. A missing key or value is left at its default;
/// other field numbers inside the entry are skipped.
pub fn merge_map_entry<K: Value, V: Value>(
    field_number: u32,
    wire_type: WireType,
    reader: &mut Reader<'_>,
) -> Result<(K, V)> {
    check_wire_type(field_number, WireType::LengthDelimited, wire_type)?;
    let mut entry = reader.nested()?;
    let mut key = K::default();
    let mut value = V::default();
    while !entry.is_empty() {
        let (number, wire_type) = entry.read_tag()?;
        match number {
            1 => key.merge_field(1, wire_type, &mut entry)?,
            2 => value.merge_field(2, wire_type, &mut entry)?,
            _ => entry.skip_field(wire_type)?,
        }
    }
    Ok((key, value))
}

impl<K, V, S> Field for HashMap<K, V, S>
where
    K: Value + Eq + Hash,
    V: Value,
    S: BuildHasher + Default,
{
    fn field_len(&self, field_number: u32) -> usize {
        map_len(field_number, self)
    }

    fn encode_field<B: BufMut>(&self, field_number: u32, buf: &mut B) {
        encode_map(field_number, self, buf);
    }

    fn merge_field(
        &mut self,
        field_number: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<()> {
        let (key, value) = merge_map_entry(field_number, wire_type, reader)?;
        self.insert(key, value);
        Ok(())
    }
}

impl<K, V> Field for BTreeMap<K, V>
where
    K: Value + Ord,
    V: Value,
{
    fn field_len(&self, field_number: u32) -> usize {
        map_len(field_number, self)
    }

    fn encode_field<B: BufMut>(&self, field_number: u32, buf: &mut B) {
        encode_map(field_number, self, buf);
    }

    fn merge_field(
        &mut self,
        field_number: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<()> {
        let (key, value) = merge_map_entry(field_number, wire_type, reader)?;
        self.insert(key, value);
        Ok(())
    }
}
