use crate::wire::WireType;

/// Semantic kind of a field's value, fixed per Rust type.
///
/// Every type usable as a field carries its kind as an associated constant
/// (see [`Value::KIND`](crate::Value::KIND)), so the wire type is known at
/// compile time and never re-derived while encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Plain varint: bool, enums, `Varint<T>`, 8/16-bit integers.
    Varint,
    /// ZigZag-transformed varint: `Sint<T>`.
    Sint,
    /// Eight little-endian bytes: `u64`, `i64`, `f64`.
    Fixed64,
    /// Four little-endian bytes: `u32`, `i32`, `f32`.
    Fixed32,
    /// Length-prefixed payload: strings, bytes, nested messages.
    LengthDelimited,
}

impl FieldKind {
    /// The wire type written in the tag of a single value of this kind.
    pub const fn wire_type(self) -> WireType {
        match self {
            FieldKind::Varint | FieldKind::Sint => WireType::Varint,
            FieldKind::Fixed64 => WireType::Fixed64,
            FieldKind::Fixed32 => WireType::Fixed32,
            FieldKind::LengthDelimited => WireType::LengthDelimited,
        }
    }

    /// Whether repeated values of this kind are written as one packed payload.
    pub const fn is_packable(self) -> bool {
        !matches!(self, FieldKind::LengthDelimited)
    }

    /// Width in bytes of a fixed-size kind.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            FieldKind::Fixed64 => Some(8),
            FieldKind::Fixed32 => Some(4),
            _ => None,
        }
    }
}
