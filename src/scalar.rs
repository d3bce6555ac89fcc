//! Wrapper types selecting the varint encodings.
//!
//! Plain `u32`/`i32`/`f32` fields are written as fixed32 and plain
//! `u64`/`i64`/`f64` fields as fixed64. Wrap an integer in [`Varint`] to get
//! protobuf's `int32`/`int64`/`uint32`/`uint64`, or in [`Sint`] to get the
//! ZigZag-encoded `sint32`/`sint64`.

use std::fmt;
use std::ops::{Deref, DerefMut};

/// A varint-encoded integer (`int32`, `int64`, `uint32`, `uint64`).
///
/// Negative values are sign-extended to 64 bits and always take ten bytes,
/// as in every other protobuf implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Varint<T>(pub T);

/// A ZigZag varint-encoded signed integer (`sint32`, `sint64`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Sint<T>(pub T);

pub type VarInt32 = Varint<i32>;
pub type VarInt64 = Varint<i64>;
pub type VarUint32 = Varint<u32>;
pub type VarUint64 = Varint<u64>;
pub type SInt32 = Sint<i32>;
pub type SInt64 = Sint<i64>;

macro_rules! impl_wrapper {
    ($wrapper:ident) => {
        impl<T> $wrapper<T> {
            pub const fn new(value: T) -> Self {
                Self(value)
            }

            pub fn into_inner(self) -> T {
                self.0
            }
        }

        impl<T> From<T> for $wrapper<T> {
            fn from(value: T) -> Self {
                Self(value)
            }
        }

        impl<T> Deref for $wrapper<T> {
            type Target = T;

            fn deref(&self) -> &T {
                &self.0
            }
        }

        impl<T> DerefMut for $wrapper<T> {
            fn deref_mut(&mut self) -> &mut T {
                &mut self.0
            }
        }

        impl<T: fmt::Display> fmt::Display for $wrapper<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

impl_wrapper!(Varint);
impl_wrapper!(Sint);

macro_rules! impl_unwrap {
    ($wrapper:ident: $($ty:ty),*) => {
        $(
            impl From<$wrapper<$ty>> for $ty {
                fn from(value: $wrapper<$ty>) -> Self {
                    value.0
                }
            }
        )*
    };
}

impl_unwrap!(Varint: i32, i64, u32, u64);
impl_unwrap!(Sint: i32, i64);
