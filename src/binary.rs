//! Low-level encoding of numbers, strings and tag-type markers.
//!
//! [`NbtSource`] and [`NbtSink`] are bound to a [`Flavor`](crate::Flavor) and take
//! care of byte order and VarInt-zigzag encoding. Everything above them (the tree
//! codec and both cursors) goes through these two types.

mod sink;
mod source;
pub(crate) mod varint;

pub use sink::*;
pub use source::*;

/// Maximum byte length of a string payload.
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Maximum container nesting accepted by the readers.
pub const MAX_DEPTH: usize = 512;
