//! Decoder configuration.
//!
//! [`DecodeOptions`] controls how strictly untrusted input is treated. The
//! defaults follow protobuf conventions: unknown fields are skipped, nesting
//! is limited to 100 levels and the full field-number range is accepted.
//!
//! ```rust
//! use struct_pb::{DecodeOptions, UnknownFields};
//!
//! let strict = DecodeOptions::new()
//!     .unknown_fields(UnknownFields::Reject)
//!     .max_field_number(15);
//! assert_eq!(strict.max_field_number, 15);
//! ```

use crate::wire::MAX_FIELD_NUMBER;

/// Default nesting limit for embedded messages.
pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

/// What the decoder does with a field number the target message does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnknownFields {
    /// Skip the field using its wire type. Newer writers stay readable.
    #[default]
    Skip,
    /// Fail with `FieldDecodeError::UnknownField`.
    Reject,
}

/// Options for decoding. See the module docs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    pub unknown_fields: UnknownFields,
    /// Maximum depth of nested messages (including map entries).
    pub recursion_limit: u32,
    /// Tags with a larger field number fail with `UnsupportedError::FieldNumberOutOfRange`.
    pub max_field_number: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFields::Skip,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            max_field_number: MAX_FIELD_NUMBER,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unknown_fields(mut self, policy: UnknownFields) -> Self {
        self.unknown_fields = policy;
        self
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Values above [`MAX_FIELD_NUMBER`] are clamped when tags are checked.
    pub fn max_field_number(mut self, max: u32) -> Self {
        self.max_field_number = max;
        self
    }
}
