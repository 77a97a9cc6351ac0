//! A forward-only cursor that emits tags as it goes.
//!
//! [`NbtWriter`] checks every tag against the container it is written into: compound
//! children need names, list elements must not have them, must match the declared
//! element type, and must add up to the declared count. The first violation is
//! reported and the writer refuses everything after it.
//!
//! # Example
//!
//! ```
//! use nbt_flavors::{Flavor, NbtWriter, TagType};
//!
//! let mut writer = NbtWriter::new(Vec::new(), Some("root"), Flavor::JAVA).unwrap();
//! writer.write_int(Some("a"), 5).unwrap();
//! writer.begin_list(Some("b"), TagType::Int, 3).unwrap();
//! for value in 1..=3 {
//!     writer.write_int(None, value).unwrap();
//! }
//! writer.end_list().unwrap();
//! writer.end_compound().unwrap();
//! let bytes = writer.finish().unwrap();
//! assert_eq!(bytes.len(), 37);
//! ```

use std::io::Write;

use log::debug;

use crate::{
    Error, Flavor, NbtSink, NbtTree, Result, TagHandle, TagType, Value, binary::check_depth,
    cold_path, codec::write_payload,
};

#[derive(Clone, Copy, Debug)]
struct Frame {
    tag_type: TagType,
    list_type: TagType,
    declared: usize,
    written: usize,
}

/// Forward-only writer for one root compound.
pub struct NbtWriter<W: Write> {
    sink: NbtSink<W>,
    frames: Vec<Frame>,
    done: bool,
    failed: bool,
}

impl<W: Write> NbtWriter<W> {
    /// Starts a document by opening its root compound.
    ///
    /// `root_name` is required by flavors with named roots and ignored by the others.
    pub fn new(writer: W, root_name: Option<&str>, flavor: Flavor) -> Result<Self> {
        debug!("new writer, root {root_name:?}, flavor {flavor:?}");
        let root_name = match root_name {
            _ if flavor.has_unnamed_root_tag() => None,
            Some(name) => Some(name),
            None => {
                cold_path();
                return Err(Error::UnnamedRoot);
            }
        };
        let mut sink = NbtSink::new(writer, flavor);
        sink.write_tag_type(TagType::Compound)?;
        if let Some(name) = root_name {
            sink.write_string(name)?;
        }
        Ok(Self {
            sink,
            frames: vec![Frame {
                tag_type: TagType::Compound,
                list_type: TagType::Unknown,
                declared: 0,
                written: 0,
            }],
            done: false,
            failed: false,
        })
    }

    pub fn flavor(&self) -> Flavor {
        self.sink.flavor()
    }

    /// Whether the root compound has been closed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of open containers, the root included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn bytes_written(&self) -> u64 {
        self.sink.bytes_written()
    }

    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.failed {
            cold_path();
            return Err(Error::WriterFailed);
        }
        let result = f(self);
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    /// Validates a tag against the innermost container and writes its header.
    fn begin_tag(&mut self, tag: TagType, name: Option<&str>) -> Result<()> {
        if self.done {
            cold_path();
            return Err(Error::WriterClosed);
        }
        if matches!(tag, TagType::End | TagType::Unknown) {
            cold_path();
            return Err(Error::UnexpectedEnd);
        }
        if !self.sink.flavor().allows(tag) {
            cold_path();
            return Err(Error::DisallowedTag(tag));
        }
        let Some(frame) = self.frames.last_mut() else {
            cold_path();
            return Err(Error::WriterClosed);
        };
        if frame.tag_type == TagType::List {
            if name.is_some() {
                cold_path();
                return Err(Error::WriterUnexpectedName);
            }
            if tag != frame.list_type {
                cold_path();
                return Err(Error::WriterTagMismatch {
                    expected: frame.list_type,
                    actual: tag,
                });
            }
            if frame.written >= frame.declared {
                cold_path();
                return Err(Error::ListOverflow(frame.declared));
            }
            frame.written += 1;
            return Ok(());
        }
        let Some(name) = name else {
            cold_path();
            return Err(Error::WriterExpectedName);
        };
        self.sink.write_tag_type(tag)?;
        self.sink.write_string(name)
    }

    pub fn begin_compound(&mut self, name: Option<&str>) -> Result<()> {
        self.guarded(|writer| {
            check_depth(writer.frames.len())?;
            writer.begin_tag(TagType::Compound, name)?;
            writer.frames.push(Frame {
                tag_type: TagType::Compound,
                list_type: TagType::Unknown,
                declared: 0,
                written: 0,
            });
            Ok(())
        })
    }

    /// Closes the innermost compound. Closing the root finishes the document.
    pub fn end_compound(&mut self) -> Result<()> {
        self.guarded(|writer| {
            if writer.done {
                cold_path();
                return Err(Error::WriterClosed);
            }
            match writer.frames.last() {
                Some(frame) if frame.tag_type == TagType::Compound => {}
                Some(_) => {
                    cold_path();
                    return Err(Error::WriterTagMismatch {
                        expected: TagType::List,
                        actual: TagType::Compound,
                    });
                }
                None => {
                    cold_path();
                    return Err(Error::WriterClosed);
                }
            }
            writer.sink.write_tag_type(TagType::End)?;
            writer.frames.pop();
            if writer.frames.is_empty() {
                writer.done = true;
                writer.sink.flush()?;
            }
            Ok(())
        })
    }

    /// Opens a list of `size` elements of type `element`. An empty list may use
    /// `End` or `Unknown` as its element type.
    pub fn begin_list(&mut self, name: Option<&str>, element: TagType, size: usize) -> Result<()> {
        self.guarded(|writer| {
            let element = match element {
                TagType::End | TagType::Unknown if size == 0 => TagType::Unknown,
                TagType::End | TagType::Unknown => {
                    cold_path();
                    return Err(Error::UnexpectedEnd);
                }
                other => other,
            };
            check_depth(writer.frames.len())?;
            if element != TagType::Unknown && !writer.sink.flavor().allows(element) {
                cold_path();
                return Err(Error::DisallowedTag(element));
            }
            writer.begin_tag(TagType::List, name)?;
            writer.sink.write_tag_type(element)?;
            writer.sink.write_length(size)?;
            writer.frames.push(Frame {
                tag_type: TagType::List,
                list_type: element,
                declared: size,
                written: 0,
            });
            Ok(())
        })
    }

    /// Closes the innermost list, which must have received exactly its declared count.
    pub fn end_list(&mut self) -> Result<()> {
        self.guarded(|writer| {
            if writer.done {
                cold_path();
                return Err(Error::WriterClosed);
            }
            match writer.frames.last() {
                Some(frame) if frame.tag_type == TagType::List => {
                    if frame.written != frame.declared {
                        cold_path();
                        return Err(Error::ListSizeMismatch {
                            declared: frame.declared,
                            written: frame.written,
                        });
                    }
                }
                _ => {
                    cold_path();
                    return Err(Error::WriterTagMismatch {
                        expected: TagType::Compound,
                        actual: TagType::List,
                    });
                }
            }
            writer.frames.pop();
            Ok(())
        })
    }

    /// Writes a value or array tag.
    pub fn write_value(&mut self, name: Option<&str>, value: &Value) -> Result<()> {
        self.guarded(|writer| {
            writer.begin_tag(value.tag_type(), name)?;
            writer.sink.write_value(value)
        })
    }

    pub fn write_byte(&mut self, name: Option<&str>, value: i8) -> Result<()> {
        self.guarded(|writer| {
            writer.begin_tag(TagType::Byte, name)?;
            writer.sink.write_i8(value)
        })
    }

    pub fn write_short(&mut self, name: Option<&str>, value: i16) -> Result<()> {
        self.guarded(|writer| {
            writer.begin_tag(TagType::Short, name)?;
            writer.sink.write_i16(value)
        })
    }

    pub fn write_int(&mut self, name: Option<&str>, value: i32) -> Result<()> {
        self.guarded(|writer| {
            writer.begin_tag(TagType::Int, name)?;
            writer.sink.write_i32(value)
        })
    }

    pub fn write_long(&mut self, name: Option<&str>, value: i64) -> Result<()> {
        self.guarded(|writer| {
            writer.begin_tag(TagType::Long, name)?;
            writer.sink.write_i64(value)
        })
    }

    pub fn write_float(&mut self, name: Option<&str>, value: f32) -> Result<()> {
        self.guarded(|writer| {
            writer.begin_tag(TagType::Float, name)?;
            writer.sink.write_f32(value)
        })
    }

    pub fn write_double(&mut self, name: Option<&str>, value: f64) -> Result<()> {
        self.guarded(|writer| {
            writer.begin_tag(TagType::Double, name)?;
            writer.sink.write_f64(value)
        })
    }

    pub fn write_string(&mut self, name: Option<&str>, value: &str) -> Result<()> {
        self.guarded(|writer| {
            writer.begin_tag(TagType::String, name)?;
            writer.sink.write_string(value)
        })
    }

    pub fn write_byte_array(&mut self, name: Option<&str>, value: &[i8]) -> Result<()> {
        self.guarded(|writer| {
            writer.begin_tag(TagType::ByteArray, name)?;
            writer.sink.write_byte_array(value)
        })
    }

    pub fn write_int_array(&mut self, name: Option<&str>, value: &[i32]) -> Result<()> {
        self.guarded(|writer| {
            writer.begin_tag(TagType::IntArray, name)?;
            writer.sink.write_int_array(value)
        })
    }

    pub fn write_long_array(&mut self, name: Option<&str>, value: &[i64]) -> Result<()> {
        self.guarded(|writer| {
            writer.begin_tag(TagType::LongArray, name)?;
            writer.sink.write_long_array(value)
        })
    }

    /// Writes a materialised tag and everything below it.
    ///
    /// Inside a compound the tag's own name is used; inside a list it is written
    /// unnamed.
    pub fn write_tag(&mut self, tree: &NbtTree, handle: TagHandle) -> Result<()> {
        self.guarded(|writer| {
            let tag = tree.tag_type(handle)?;
            let in_list = writer
                .frames
                .last()
                .is_some_and(|frame| frame.tag_type == TagType::List);
            let name = if in_list { None } else { tree.name(handle)? };
            writer.begin_tag(tag, name)?;
            write_payload(&mut writer.sink, tree, handle, writer.frames.len())
        })
    }

    /// Flushes the sink without finishing the document.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    /// Checks that the root compound was closed and returns the flushed sink.
    pub fn finish(mut self) -> Result<W> {
        if self.failed {
            cold_path();
            return Err(Error::WriterFailed);
        }
        if !self.done {
            cold_path();
            return Err(Error::UnclosedContainers(self.frames.len()));
        }
        self.sink.flush()?;
        Ok(self.sink.into_inner())
    }
}
