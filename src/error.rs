//! Error types for NBT trees, codecs and cursors.
//!
//! This module contains the [`Error`] type which represents all possible errors
//! that can occur when building, reading or writing NBT data, and [`ErrorKind`]
//! which sorts them into the four families callers usually care about.
//!
//! # Example
//!
//! ```
//! use nbt_flavors::{Error, ErrorKind, NbtFile, Result};
//!
//! fn try_parse(data: &[u8]) -> Result<()> {
//!     let mut file = NbtFile::default();
//!     match file.load_from_buffer(data, Default::default(), None) {
//!         Ok(_) => Ok(()),
//!         Err(Error::EndOfFile) => {
//!             println!("Data was truncated");
//!             Err(Error::EndOfFile)
//!         }
//!         Err(e) if e.kind() == ErrorKind::Format => {
//!             println!("Malformed: {e}");
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! # assert!(try_parse(&[0x0A, 0, 0]).is_err());
//! ```

use std::fmt::{self, Display};
use std::io;

use crate::TagType;

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Broad family of an [`Error`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ErrorKind {
    /// Malformed or flavor-disallowed input or output.
    Format,
    /// The caller broke a precondition of the API.
    Usage,
    /// The byte source or sink failed, ran dry, or cannot do what was asked.
    Resource,
    /// A tree mutation would break single ownership, acyclicity or list homogeneity.
    Structure,
}

/// This type represents all possible errors that can occur when working with NBT data.
#[derive(Debug)]
pub enum Error {
    Message(String),

    /// An I/O error occurred.
    ///
    /// This typically happens when writing to a [`std::io::Write`] implementation
    /// or reading from a [`std::io::Read`] implementation that encounters an error.
    IO(io::Error),

    /// The input ended unexpectedly.
    EndOfFile,

    /// Auto-detection of compression needs to look ahead, which a plain
    /// non-seekable reader cannot undo.
    NotSeekable,

    /// A byte outside 0-12 was found where a tag type is expected.
    InvalidTagType(u8),

    /// A length or element count decoded as negative.
    NegativeLength(i32),

    /// A VarInt used more groups than its target width allows.
    VarIntTooLong,

    /// A string payload is not valid UTF-8.
    InvalidUtf8,

    /// A string is longer than the 16-bit length prefix can describe.
    StringTooLong(usize),

    /// An End marker appeared where a real tag was required.
    UnexpectedEnd,

    /// Containers are nested deeper than [`MAX_DEPTH`](crate::MAX_DEPTH).
    NestingTooDeep,

    /// The root tag is neither a compound nor a list the flavor permits.
    InvalidRoot(TagType),

    /// The root tag has no name but the flavor requires one.
    UnnamedRoot,

    /// The flavor does not allow this tag kind.
    DisallowedTag(TagType),

    /// The first byte of a stream matches no known compression.
    InvalidCompression(u8),

    /// The two-byte zlib header is malformed or asks for a preset dictionary.
    InvalidZlibHeader,

    /// The writer needed a named tag (inside a compound).
    WriterExpectedName,

    /// The writer got a named tag inside a list.
    WriterUnexpectedName,

    /// The writer got a tag of the wrong type for the enclosing list.
    WriterTagMismatch { expected: TagType, actual: TagType },

    /// A list was closed before or after its declared size was reached.
    ListSizeMismatch { declared: usize, written: usize },

    /// One element too many was written to a list.
    ListOverflow(usize),

    /// The writer has closed its root compound and accepts nothing else.
    WriterClosed,

    /// An earlier write failed; the writer must be discarded.
    WriterFailed,

    /// The writer was finished with containers still open.
    UnclosedContainers(usize),

    /// A cursor value was already consumed and caching is off.
    ValueAlreadyRead,

    /// The cursor is positioned on a tag without a readable value.
    NoValue(TagType),

    /// The operation needs a list or compound.
    NotAContainer(TagType),

    /// The operation needs a value or array tag.
    NotAValue(TagType),

    /// A tag's type is fixed at creation; a value of another type was supplied.
    TypeMismatch { expected: TagType, actual: TagType },

    /// No child at the requested index or name.
    NoSuchChild,

    /// The handle refers to a tag that has been freed.
    StaleHandle,

    /// The reader failed earlier and can no longer be used.
    ReaderFailed,

    /// The reader is not in a state where the operation makes sense.
    ReaderState(&'static str),

    /// Saving needs an explicit compression; auto-detection only applies to reading.
    CompressionRequired,

    /// The file has no remembered path to save to.
    NoPath,

    /// Buffer sizes must be positive.
    ZeroBufferSize,

    /// The tag already belongs to a container.
    AlreadyParented,

    /// Attaching would make a tag its own ancestor.
    CyclicAttachment,

    /// A list only holds elements of a single type.
    ListTypeMismatch { expected: TagType, actual: TagType },

    /// A compound already has a child with this name.
    DuplicateName(String),

    /// A compound child must have a name.
    MissingName,

    /// List elements may not have names.
    NamedListElement,

    /// The element type of a list can only be changed while it is empty.
    ListNotEmpty,
}

impl Error {
    /// Which family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IO(_) | Error::EndOfFile | Error::NotSeekable => ErrorKind::Resource,
            Error::WriterClosed
            | Error::WriterFailed
            | Error::ValueAlreadyRead
            | Error::NoValue(_)
            | Error::NotAContainer(_)
            | Error::NotAValue(_)
            | Error::TypeMismatch { .. }
            | Error::NoSuchChild
            | Error::StaleHandle
            | Error::ReaderFailed
            | Error::ReaderState(_)
            | Error::CompressionRequired
            | Error::NoPath
            | Error::ZeroBufferSize => ErrorKind::Usage,
            Error::AlreadyParented
            | Error::CyclicAttachment
            | Error::ListTypeMismatch { .. }
            | Error::DuplicateName(_)
            | Error::MissingName
            | Error::NamedListElement
            | Error::ListNotEmpty => ErrorKind::Structure,
            _ => ErrorKind::Format,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            Error::EndOfFile
        } else {
            Error::IO(error)
        }
    }
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(message) => formatter.write_str(message),
            Error::IO(error) => formatter.write_str(&error.to_string()),
            Error::EndOfFile => formatter.write_str("unexpected end of input"),
            Error::NotSeekable => {
                formatter.write_str("compression auto-detection requires a seekable source")
            }
            Error::InvalidTagType(tag) => write!(formatter, "invalid NBT tag type: {tag:#04x}"),
            Error::NegativeLength(len) => write!(formatter, "negative length: {len}"),
            Error::VarIntTooLong => formatter.write_str("VarInt is too long"),
            Error::InvalidUtf8 => formatter.write_str("string is not valid UTF-8"),
            Error::StringTooLong(len) => write!(formatter, "string too long: {len} bytes"),
            Error::UnexpectedEnd => formatter.write_str("unexpected TAG_End"),
            Error::NestingTooDeep => formatter.write_str("tags are nested too deeply"),
            Error::InvalidRoot(tag) => write!(formatter, "invalid root tag: {tag}"),
            Error::UnnamedRoot => formatter.write_str("root tag must be named in this flavor"),
            Error::DisallowedTag(tag) => write!(formatter, "{tag} is not allowed in this flavor"),
            Error::InvalidCompression(byte) => {
                write!(formatter, "could not detect compression from byte {byte:#04x}")
            }
            Error::InvalidZlibHeader => formatter.write_str("invalid zlib header"),
            Error::WriterExpectedName => {
                formatter.write_str("expected a named tag inside a compound")
            }
            Error::WriterUnexpectedName => {
                formatter.write_str("expected an unnamed tag inside a list")
            }
            Error::WriterTagMismatch { expected, actual } => write!(
                formatter,
                "tag in list mismatch: expected {expected}, got {actual}"
            ),
            Error::ListSizeMismatch { declared, written } => write!(
                formatter,
                "list size mismatch: declared {declared}, written {written}"
            ),
            Error::ListOverflow(declared) => write!(
                formatter,
                "list overflow: more than the declared {declared} elements"
            ),
            Error::WriterClosed => formatter.write_str("writer is already closed"),
            Error::WriterFailed => formatter.write_str("writer failed earlier and must be discarded"),
            Error::UnclosedContainers(open) => {
                write!(formatter, "writer finished with {open} open containers")
            }
            Error::ValueAlreadyRead => {
                formatter.write_str("value already read and caching is disabled")
            }
            Error::NoValue(tag) => write!(formatter, "{tag} has no readable value"),
            Error::NotAContainer(tag) => write!(formatter, "{tag} is not a list or compound"),
            Error::NotAValue(tag) => write!(formatter, "{tag} is not a value tag"),
            Error::TypeMismatch { expected, actual } => {
                write!(formatter, "type mismatch: expected {expected}, got {actual}")
            }
            Error::NoSuchChild => formatter.write_str("no such child"),
            Error::StaleHandle => formatter.write_str("tag handle refers to a freed tag"),
            Error::ReaderFailed => formatter.write_str("reader is in the error state"),
            Error::ReaderState(expectation) => write!(formatter, "reader must be {expectation}"),
            Error::CompressionRequired => {
                formatter.write_str("saving requires an explicit compression")
            }
            Error::NoPath => formatter.write_str("no file path to save to"),
            Error::ZeroBufferSize => formatter.write_str("buffer size must be positive"),
            Error::AlreadyParented => formatter.write_str("tag already has a parent"),
            Error::CyclicAttachment => {
                formatter.write_str("a tag cannot be attached to itself or its descendant")
            }
            Error::ListTypeMismatch { expected, actual } => write!(
                formatter,
                "list element type mismatch: expected {expected}, got {actual}"
            ),
            Error::DuplicateName(name) => write!(formatter, "duplicate name: {name:?}"),
            Error::MissingName => formatter.write_str("compound children must be named"),
            Error::NamedListElement => formatter.write_str("list elements may not be named"),
            Error::ListNotEmpty => {
                formatter.write_str("list type can only be changed on an empty list")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IO(error) => Some(error),
            _ => None,
        }
    }
}
