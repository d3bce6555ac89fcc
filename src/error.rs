use crate::wire::WireType;

/// Errors that can occur during encoding or decoding operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The input ended in the middle of a varint, a fixed-width value or a
    /// length-delimited payload.
    #[error("Buffer underrun: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun { needed: usize, remaining: usize },
    /// The bytes cannot be a valid encoding (overlong varint, reserved wire type, field number 0).
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(&'static str),
    /// A string field did not hold valid UTF-8.
    #[error("Invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// Field-specific decode error
    #[error(transparent)]
    Field(#[from] FieldDecodeError),
    /// The input uses something this codec does not handle.
    #[error(transparent)]
    Unsupported(#[from] UnsupportedError),
    /// The output buffer cannot hold the encoded message.
    #[error("Insufficient capacity: need {required} bytes, {available} available")]
    InsufficientCapacity { required: usize, available: usize },
}

/// The result type used throughout this crate for encode/decode operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors tied to a particular field of the message being decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldDecodeError {
    #[error("Wire type mismatch for field {field_number}: expected {expected:?}, got {actual:?}")]
    WireTypeMismatch {
        field_number: u32,
        expected: WireType,
        actual: WireType,
    },
    #[error("Unknown field {field_number} ({wire_type:?}) for message {message}")]
    UnknownField {
        field_number: u32,
        wire_type: WireType,
        message: &'static str,
    },
    #[error("Unknown value {value} for enum {enum_name}")]
    UnknownEnumValue { value: u64, enum_name: &'static str },
    #[error("Packed payload of {len} bytes is not a multiple of the element width {width}")]
    PackedLength { len: usize, width: usize },
}

/// Input that is well formed but outside what this codec accepts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedError {
    #[error("Group wire type {wire_type:?} on field {field_number} is not supported")]
    GroupWireType {
        field_number: u32,
        wire_type: WireType,
    },
    #[error("Field number {field_number} exceeds the maximum of {max}")]
    FieldNumberOutOfRange { field_number: u64, max: u32 },
    #[error("Message nesting exceeds the recursion limit of {limit}")]
    RecursionLimitExceeded { limit: u32 },
}

/// Coarse classification of [`Error`], for callers that only branch on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BufferUnderrun,
    InvalidArgument,
    InvalidEncoding,
    UnsupportedFeature,
    InsufficientCapacity,
}

impl Error {
    pub(crate) fn underrun(needed: usize, remaining: usize) -> Self {
        Error::BufferUnderrun { needed, remaining }
    }

    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BufferUnderrun { .. } => ErrorKind::BufferUnderrun,
            Error::InvalidEncoding(_) | Error::InvalidUtf8(_) => ErrorKind::InvalidEncoding,
            Error::Field(_) => ErrorKind::InvalidArgument,
            Error::Unsupported(_) => ErrorKind::UnsupportedFeature,
            Error::InsufficientCapacity { .. } => ErrorKind::InsufficientCapacity,
        }
    }
}
