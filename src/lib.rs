//! Reading and writing NBT, the tag-tree format of block-game save files.
//!
//! The format comes in several historical flavors (big or little endian, fixed-width
//! or VarInt integers, named or unnamed roots, with or without int and long arrays).
//! A [`Flavor`] describes one of them, and everything here works in any of them.
//!
//! There are two ways through the data:
//!
//! * [`NbtFile`] loads or saves a whole [`NbtTree`] at once, taking care of gzip and
//!   zlib compression. A [`Selector`] can keep parts of a large file out of memory.
//! * [`NbtReader`] and [`NbtWriter`] stream one tag at a time, never holding more
//!   than the path to the current tag.
//!
//! # Example
//!
//! ```
//! use nbt_flavors::{Compression, Flavor, NbtFile, NbtReader, TagType};
//!
//! let mut file = NbtFile::new(Flavor::JAVA);
//! file.set_root_name(Some("hello world")).unwrap();
//! let root = file.root();
//! let tree = file.tree_mut();
//! let name = tree.create("Bananrama");
//! tree.compound_set(root, "name", name).unwrap();
//!
//! let bytes = file.save_to_buffer(Compression::None).unwrap();
//!
//! let mut reader = NbtReader::new(&bytes[..], Flavor::JAVA);
//! assert!(reader.read_to_following("name").unwrap());
//! assert_eq!(reader.tag_type(), TagType::String);
//! assert_eq!(reader.read_value_as::<String>().unwrap(), "Bananrama");
//! ```

mod binary;
mod codec;
mod error;
mod file;
mod flavor;
mod reader;
mod tag;
mod tree;
mod util;
mod writer;

pub use binary::*;
pub use codec::*;
pub use error::*;
pub use file::*;
pub use flavor::*;
pub use reader::*;
pub use tag::*;
pub use tree::*;
pub(crate) use util::*;
pub use writer::*;
