//! Whole-tree encoding and decoding.
//!
//! Reading materialises a complete [`NbtTree`](crate::NbtTree) from an
//! [`NbtSource`](crate::NbtSource), optionally consulting a [`Selector`] for each tag
//! so that unwanted parts of a large file are skipped instead of built. Writing emits
//! a tree through an [`NbtSink`](crate::NbtSink).

mod read;
mod write;

pub use read::*;
pub use write::*;

use crate::TagType;

/// What a [`Selector`] gets to see about a tag before its payload is read.
#[derive(Clone, Copy, Debug)]
pub struct TagInfo<'a> {
    /// The tag's name inside its compound; `None` for list elements.
    pub name: Option<&'a str>,
    pub tag_type: TagType,
    /// Position inside the enclosing list, for list elements.
    pub list_index: Option<usize>,
    /// Nesting depth; children of the root are at depth 1.
    pub depth: usize,
}

/// Decides, during a whole-tree read, whether a tag is materialised (`true`) or only
/// skipped (`false`). A skipped container is skipped with all of its contents.
pub type Selector<'s> = &'s mut dyn FnMut(&TagInfo<'_>) -> bool;
