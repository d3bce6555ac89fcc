#[cfg(feature = "ahash")]
use ahash::AHashMap;
#[allow(unused_imports)]
use bytes::BufMut;
#[cfg(feature = "indexmap")]
use indexmap::IndexMap;
#[cfg(feature = "smol_str")]
use smol_str::SmolStr;

#[allow(unused_imports)]
use crate::field::{encode_map, map_len, merge_map_entry, Field};
#[allow(unused_imports)]
use crate::reader::Reader;
#[allow(unused_imports)]
use crate::value::{delimited_len, encode_delimited, read_str, Value};
#[allow(unused_imports)]
use crate::{FieldKind, Result, WireType};

// --- IndexMap ---
// Entries are written in insertion order.
#[cfg(feature = "indexmap")]
impl<K, V, S> Field for IndexMap<K, V, S>
where
    K: Value + Eq + std::hash::Hash,
    V: Value,
    S: std::hash::BuildHasher + Default,
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

// --- AHashMap ---
#[cfg(feature = "ahash")]
impl<K, V> Field for AHashMap<K, V>
where
    K: Value + Eq + std::hash::Hash,
    V: Value,
{
    fn field_len(&self, field_number: u32) -> usize {
        map_len(field_number, self.iter())
    }

    fn encode_field<B: BufMut>(&self, field_number: u32, buf: &mut B) {
        encode_map(field_number, self.iter(), buf);
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

// --- SmolStr ---
#[cfg(feature = "smol_str")]
impl Value for SmolStr {
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
        *self = SmolStr::new(read_str(reader)?);
        Ok(())
    }
}
