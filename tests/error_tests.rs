//! Tests for the Error type

use nbt_flavors::{Error, ErrorKind, Flavor, NbtFile, NbtReader, NbtTree, TagType};
use std::io;

#[test]
fn test_error_display_end_of_file() {
    let error = Error::EndOfFile;
    assert_eq!(format!("{}", error), "unexpected end of input");
}

#[test]
fn test_error_display_invalid_tag_type() {
    let error = Error::InvalidTagType(0xFF);
    assert_eq!(format!("{}", error), "invalid NBT tag type: 0xff");
}

#[test]
fn test_error_display_names_tags() {
    assert_eq!(
        Error::InvalidRoot(TagType::Int).to_string(),
        "invalid root tag: TAG_Int"
    );
    assert_eq!(
        Error::DisallowedTag(TagType::LongArray).to_string(),
        "TAG_Long_Array is not allowed in this flavor"
    );
    assert_eq!(
        Error::ListTypeMismatch {
            expected: TagType::Int,
            actual: TagType::Short
        }
        .to_string(),
        "list element type mismatch: expected TAG_Int, got TAG_Short"
    );
    assert_eq!(
        Error::ListSizeMismatch {
            declared: 3,
            written: 1
        }
        .to_string(),
        "list size mismatch: declared 3, written 1"
    );
    assert_eq!(
        Error::DuplicateName("x".into()).to_string(),
        "duplicate name: \"x\""
    );
    assert_eq!(
        Error::InvalidCompression(0x42).to_string(),
        "could not detect compression from byte 0x42"
    );
}

#[test]
fn test_error_display_io() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let error = Error::IO(io_error);
    assert!(format!("{}", error).contains("file not found"));
    assert!(std::error::Error::source(&error).is_some());
    assert!(std::error::Error::source(&Error::EndOfFile).is_none());
}

#[test]
fn test_error_from_io() {
    let eof: Error = io::Error::from(io::ErrorKind::UnexpectedEof).into();
    assert!(matches!(eof, Error::EndOfFile));
    let other: Error = io::Error::from(io::ErrorKind::PermissionDenied).into();
    assert!(matches!(other, Error::IO(_)));
    assert_eq!(other.kind(), ErrorKind::Resource);
}

#[test]
fn test_error_kinds() {
    for (error, kind) in [
        (Error::NegativeLength(-1), ErrorKind::Format),
        (Error::VarIntTooLong, ErrorKind::Format),
        (Error::UnexpectedEnd, ErrorKind::Format),
        (Error::WriterExpectedName, ErrorKind::Format),
        (Error::UnclosedContainers(1), ErrorKind::Format),
        (Error::ValueAlreadyRead, ErrorKind::Usage),
        (Error::WriterClosed, ErrorKind::Usage),
        (Error::NotAContainer(TagType::Int), ErrorKind::Usage),
        (Error::CompressionRequired, ErrorKind::Usage),
        (Error::EndOfFile, ErrorKind::Resource),
        (Error::NotSeekable, ErrorKind::Resource),
        (Error::AlreadyParented, ErrorKind::Structure),
        (Error::CyclicAttachment, ErrorKind::Structure),
        (Error::NamedListElement, ErrorKind::Structure),
    ] {
        assert_eq!(error.kind(), kind, "{error}");
    }
}

#[test]
fn test_errors_from_operations() {
    let mut tree = NbtTree::new();
    let int = tree.create(1i32);
    assert_eq!(
        tree.list_push(int, int).unwrap_err().kind(),
        ErrorKind::Usage
    );

    let mut file = NbtFile::new(Flavor::JAVA);
    let error = file
        .load_from_buffer(&[0x0A, 0x00, 0x01, b'x', 0x0D], Default::default(), None)
        .unwrap_err();
    assert!(matches!(error, Error::InvalidTagType(0x0D)));
    assert_eq!(error.kind(), ErrorKind::Format);

    let mut reader = NbtReader::new(&[0x0A, 0x00][..], Flavor::JAVA);
    assert!(reader.advance().is_err());
    assert_eq!(reader.advance().unwrap_err().kind(), ErrorKind::Usage);
}

#[test]
fn test_error_debug() {
    let error = Error::EndOfFile;
    let debug_str = format!("{:?}", error);
    assert!(debug_str.contains("EndOfFile"));
}

#[test]
fn test_error_is_std_error() {
    fn assert_error<E: std::error::Error>() {}
    assert_error::<Error>();
}
