use bytes::Buf;

use crate::options::DecodeOptions;
use crate::varint::decode_varint;
use crate::wire::{split_tag, WireType};
use crate::{Error, Result, UnsupportedError};

/// A bounded cursor over borrowed input.
///
/// Nested messages are decoded through a sub-reader covering exactly the
/// declared payload, so a field can never read past its parent. The backing
/// bytes are never copied; only string and bytes fields copy out their own
/// payload.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    consumed: usize,
    depth: u32,
    options: &'a DecodeOptions,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8], options: &'a DecodeOptions) -> Self {
        Self {
            buf,
            consumed: 0,
            depth: 0,
            options,
        }
    }

    /// Bytes left in this view.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes consumed from this view so far.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Nesting depth; the top-level message is at depth 0.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn options(&self) -> &'a DecodeOptions {
        self.options
    }

    /// Reads a tag and splits it into field number and wire type.
    ///
    /// # Errors
    /// Group wire types are reported as `Unsupported`; see
    /// [`split_tag`] for the other checks.
    pub fn read_tag(&mut self) -> Result<(u32, WireType)> {
        let tag = self.read_varint()?;
        let (field_number, wire_type) = split_tag(tag, self.options.max_field_number)?;
        match wire_type {
            WireType::StartGroup | WireType::EndGroup => {
                Err(UnsupportedError::GroupWireType {
                    field_number,
                    wire_type,
                }
                .into())
            }
            _ => Ok((field_number, wire_type)),
        }
    }

    #[inline]
    pub fn read_varint(&mut self) -> Result<u64> {
        let (value, len) = decode_varint(self.buf)?;
        self.advance(len);
        Ok(value)
    }

    #[inline]
    pub fn read_fixed32(&mut self) -> Result<u32> {
        let mut bytes = self.take(4)?;
        Ok(bytes.get_u32_le())
    }

    #[inline]
    pub fn read_fixed64(&mut self) -> Result<u64> {
        let mut bytes = self.take(8)?;
        Ok(bytes.get_u64_le())
    }

    /// Reads a length prefix and checks that the payload fits in this view.
    pub fn read_length(&mut self) -> Result<usize> {
        let len = self.read_varint()?;
        match usize::try_from(len) {
            Ok(len) if len <= self.remaining() => Ok(len),
            _ => Err(Error::underrun(
                usize::try_from(len).unwrap_or(usize::MAX),
                self.remaining(),
            )),
        }
    }

    /// Reads a length-delimited payload and returns it without copying.
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_length()?;
        self.take(len)
    }

    /// Reads a length-delimited payload and returns a reader over exactly
    /// those bytes, one level deeper.
    ///
    /// # Errors
    /// `Unsupported` when the configured recursion limit would be exceeded.
    pub fn nested(&mut self) -> Result<Reader<'a>> {
        if self.depth >= self.options.recursion_limit {
            return Err(UnsupportedError::RecursionLimitExceeded {
                limit: self.options.recursion_limit,
            }
            .into());
        }
        let payload = self.read_bytes()?;
        Ok(Reader {
            buf: payload,
            consumed: 0,
            depth: self.depth + 1,
            options: self.options,
        })
    }

    /// Reads a length-delimited payload and returns a reader over it at the
    /// same depth. Used for packed repeated scalars.
    pub fn delimited(&mut self) -> Result<Reader<'a>> {
        let payload = self.read_bytes()?;
        Ok(Reader {
            buf: payload,
            consumed: 0,
            depth: self.depth,
            options: self.options,
        })
    }

    /// Skips the payload of a field whose tag has already been read.
    pub fn skip_field(&mut self, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::Varint => self.read_varint().map(|_| ()),
            WireType::Fixed64 => self.take(8).map(|_| ()),
            WireType::Fixed32 => self.take(4).map(|_| ()),
            WireType::LengthDelimited => self.read_bytes().map(|_| ()),
            WireType::StartGroup | WireType::EndGroup => {
                Err(Error::InvalidEncoding("group wire type cannot be skipped"))
            }
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(Error::underrun(n, self.buf.len()));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        self.consumed += n;
        Ok(head)
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        self.buf = &self.buf[n..];
        self.consumed += n;
    }
}
