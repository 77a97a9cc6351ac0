//! A forward-only cursor over serialized tags.
//!
//! [`NbtReader`] moves through a stream one tag at a time without building a tree.
//! It keeps an explicit stack of the containers it is inside, so it never recurses and
//! never needs to seek back. Values are only decoded when asked for; a tag whose value
//! was not read is skipped on the next advance.
//!
//! # Example
//!
//! ```
//! use nbt_flavors::{Flavor, NbtReader, TagType};
//!
//! let data = [
//!     0x0A, 0x00, 0x04, b'r', b'o', b'o', b't', // TAG_Compound("root")
//!     0x03, 0x00, 0x01, b'a', 0x00, 0x00, 0x00, 0x05, // TAG_Int("a"): 5
//!     0x00,
//! ];
//! let mut reader = NbtReader::new(&data[..], Flavor::JAVA);
//! assert!(reader.read_to_following("a").unwrap());
//! assert_eq!(reader.tag_type(), TagType::Int);
//! assert_eq!(reader.read_value_as::<i32>().unwrap(), 5);
//! assert!(!reader.advance().unwrap());
//! assert!(reader.is_at_end());
//! ```

use std::fmt::{self, Display};
use std::io::Read;

use log::{debug, trace, warn};

use crate::{
    Error, ErrorKind, Flavor, NbtSource, Result, TagType, Value, binary::check_depth, cold_path,
};

mod ops;

/// Where an [`NbtReader`] stands in the stream.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ReaderState {
    /// Nothing has been read yet.
    AtStreamBeginning,
    /// On a compound whose children have not been entered.
    AtCompoundBeginning,
    /// On a child of a compound.
    InCompound,
    /// On the End marker that closes a compound.
    AtCompoundEnd,
    /// On a list whose elements have not been entered.
    AtListBeginning,
    /// On an element of a list.
    InList,
    /// The root has been read completely.
    AtStreamEnd,
    /// A decode error occurred; the reader is unusable.
    Error,
}

/// One open container.
#[derive(Clone, Debug)]
struct Frame {
    name: Option<String>,
    tag_type: TagType,
    /// Declared element count, for lists.
    length: usize,
    /// Index of the next element to read, for lists.
    next_index: usize,
    list_type: TagType,
}

/// Forward-only, resumable cursor over one root tag.
pub struct NbtReader<R> {
    source: NbtSource<R>,
    state: ReaderState,
    frames: Vec<Frame>,

    tag_type: TagType,
    tag_name: Option<String>,
    tag_length: usize,
    list_type: TagType,
    list_index: Option<usize>,
    /// The current tag's payload (or array elements) are still in the stream.
    value_pending: bool,
    cached: Option<Value>,

    tags_read: u64,
    skip_end_tags: bool,
    cache_tag_values: bool,
}

impl<R: Read> NbtReader<R> {
    /// Creates a reader positioned before the root tag.
    ///
    /// The reader does no buffering of its own; wrap slow sources in a
    /// [`BufReader`](std::io::BufReader).
    pub fn new(reader: R, flavor: Flavor) -> Self {
        debug!("new reader, flavor {flavor:?}");
        Self {
            source: NbtSource::new(reader, flavor),
            state: ReaderState::AtStreamBeginning,
            frames: Vec::new(),
            tag_type: TagType::Unknown,
            tag_name: None,
            tag_length: 0,
            list_type: TagType::Unknown,
            list_index: None,
            value_pending: false,
            cached: None,
            tags_read: 0,
            skip_end_tags: true,
            cache_tag_values: false,
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.source.flavor()
    }

    #[inline]
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Type of the current tag. `Unknown` before the first advance, `End` on an
    /// observed End marker.
    #[inline]
    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }

    /// Name of the current tag; `None` for list elements and unnamed roots.
    pub fn tag_name(&self) -> Option<&str> {
        self.tag_name.as_deref()
    }

    /// Name of the container holding the current tag.
    pub fn parent_name(&self) -> Option<&str> {
        self.parent().and_then(|frame| frame.name.as_deref())
    }

    /// Type of the container holding the current tag, `None` at the root.
    pub fn parent_type(&self) -> Option<TagType> {
        self.parent().map(|frame| frame.tag_type)
    }

    /// Element type of the current list, or of the list holding the current element.
    pub fn list_type(&self) -> Option<TagType> {
        if self.tag_type == TagType::List {
            Some(self.list_type)
        } else if self.is_list_element() {
            self.parent().map(|frame| frame.list_type)
        } else {
            None
        }
    }

    /// Element count of the current list or array tag; 0 for other tags.
    pub fn tag_length(&self) -> usize {
        self.tag_length
    }

    /// Position of the current tag in its list.
    pub fn list_index(&self) -> Option<usize> {
        self.list_index
    }

    /// Nesting depth of the current tag; the root is at 0.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Number of tag headers consumed so far, End markers excluded.
    pub fn tags_read(&self) -> u64 {
        self.tags_read
    }

    /// Bytes consumed from the source so far.
    pub fn bytes_read(&self) -> u64 {
        self.source.bytes_read()
    }

    pub fn is_list_element(&self) -> bool {
        self.list_index.is_some()
    }

    pub fn is_compound(&self) -> bool {
        self.tag_type == TagType::Compound
    }

    pub fn is_list(&self) -> bool {
        self.tag_type == TagType::List
    }

    /// Whether [`read_value`](Self::read_value) would return something right now.
    pub fn has_value(&self) -> bool {
        (self.tag_type.is_value() || self.tag_type.is_array())
            && (self.value_pending || self.cached.is_some())
    }

    /// Whether the current tag has an element count.
    pub fn has_length(&self) -> bool {
        self.tag_type.is_array() || self.tag_type == TagType::List
    }

    pub fn is_at_end(&self) -> bool {
        self.state == ReaderState::AtStreamEnd
    }

    pub fn is_in_error(&self) -> bool {
        self.state == ReaderState::Error
    }

    /// Whether compound End markers are folded into the next advance. On by default.
    pub fn skip_end_tags(&self) -> bool {
        self.skip_end_tags
    }

    pub fn set_skip_end_tags(&mut self, skip: bool) {
        self.skip_end_tags = skip;
    }

    /// Whether a read value stays available until the cursor moves on. Off by default.
    pub fn cache_tag_values(&self) -> bool {
        self.cache_tag_values
    }

    pub fn set_cache_tag_values(&mut self, cache: bool) {
        self.cache_tag_values = cache;
        if !cache {
            self.cached = None;
        }
    }

    pub fn get_ref(&self) -> &R {
        self.source.get_ref()
    }

    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    #[inline]
    fn parent(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Runs `f`, moving to the permanent error state if it fails with anything other
    /// than a usage error.
    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.state == ReaderState::Error {
            cold_path();
            return Err(Error::ReaderFailed);
        }
        let result = f(self);
        match &result {
            Err(error) if error.kind() != ErrorKind::Usage => {
                cold_path();
                warn!("reader failed after {} bytes: {error}", self.source.bytes_read());
                self.state = ReaderState::Error;
            }
            _ => {}
        }
        result
    }

    /// Moves to the next tag in document order.
    ///
    /// Returns `false` once the root has been read completely. The first call reads
    /// the root tag itself.
    pub fn advance(&mut self) -> Result<bool> {
        self.guarded(Self::step)
    }

    fn step(&mut self) -> Result<bool> {
        loop {
            match self.state {
                ReaderState::AtStreamBeginning => {
                    self.read_root_header()?;
                    return Ok(true);
                }
                ReaderState::AtCompoundBeginning => {
                    self.push_frame();
                    self.state = ReaderState::InCompound;
                    if self.next_in_compound()? {
                        return Ok(true);
                    }
                }
                ReaderState::AtListBeginning => {
                    self.push_frame();
                    self.state = ReaderState::InList;
                    if self.next_in_list()? {
                        return Ok(true);
                    }
                }
                ReaderState::InCompound => {
                    if self.next_in_compound()? {
                        return Ok(true);
                    }
                }
                ReaderState::InList => {
                    if self.next_in_list()? {
                        return Ok(true);
                    }
                }
                ReaderState::AtCompoundEnd => {
                    self.frames.pop();
                    self.resume_parent();
                }
                ReaderState::AtStreamEnd => return Ok(false),
                ReaderState::Error => return Err(Error::ReaderFailed),
            }
        }
    }

    fn read_root_header(&mut self) -> Result<()> {
        let (tag, name) = self.source.read_root_header()?;
        trace!("root {tag} {name:?}");
        self.begin_tag(tag, name, None)
    }

    /// Reads the next child header of the innermost compound. Returns `false` when it
    /// was an End marker that got folded away.
    fn next_in_compound(&mut self) -> Result<bool> {
        self.discard_pending()?;
        let tag = self.source.read_tag_type()?;
        if tag == TagType::End {
            self.state = ReaderState::AtCompoundEnd;
            self.tag_type = TagType::End;
            self.tag_name = None;
            self.tag_length = 0;
            self.list_index = None;
            self.cached = None;
            return Ok(!self.skip_end_tags);
        }
        let name = self.source.read_string()?;
        self.begin_tag(tag, Some(name), None)?;
        Ok(true)
    }

    /// Reads the next element header of the innermost list. Returns `false` when the
    /// list was exhausted and its frame popped.
    fn next_in_list(&mut self) -> Result<bool> {
        self.discard_pending()?;
        let Some(frame) = self.frames.last_mut() else {
            cold_path();
            return Err(Error::ReaderState("inside a list"));
        };
        if frame.next_index >= frame.length {
            self.frames.pop();
            self.resume_parent();
            return Ok(false);
        }
        let index = frame.next_index;
        frame.next_index += 1;
        let element = frame.list_type;
        self.begin_tag(element, None, Some(index))?;
        Ok(true)
    }

    /// Makes a freshly read header the current tag. Lists and arrays have their
    /// headers read right away.
    fn begin_tag(&mut self, tag: TagType, name: Option<String>, index: Option<usize>) -> Result<()> {
        self.tag_type = tag;
        self.tag_name = name;
        self.list_index = index;
        self.tag_length = 0;
        self.value_pending = false;
        self.cached = None;
        self.tags_read += 1;
        match tag {
            TagType::Compound => {
                check_depth(self.frames.len())?;
                self.state = ReaderState::AtCompoundBeginning;
            }
            TagType::List => {
                check_depth(self.frames.len())?;
                let element = self.source.read_tag_type()?;
                let len = self.source.read_length()?;
                if element == TagType::End && len > 0 {
                    cold_path();
                    return Err(Error::UnexpectedEnd);
                }
                if element != TagType::End {
                    self.source.check_allowed(element)?;
                }
                self.list_type = if element == TagType::End {
                    TagType::Unknown
                } else {
                    element
                };
                self.tag_length = len;
                self.state = ReaderState::AtListBeginning;
            }
            TagType::ByteArray | TagType::IntArray | TagType::LongArray => {
                self.source.check_allowed(tag)?;
                self.tag_length = self.source.read_length()?;
                self.value_pending = true;
            }
            TagType::End | TagType::Unknown => {
                cold_path();
                return Err(Error::UnexpectedEnd);
            }
            _ => self.value_pending = true,
        }
        trace!("{:?} at {tag} {:?} depth {}", self.state, self.tag_name, self.frames.len());
        Ok(())
    }

    fn push_frame(&mut self) {
        self.frames.push(Frame {
            name: self.tag_name.take(),
            tag_type: self.tag_type,
            length: self.tag_length,
            next_index: 0,
            list_type: self.list_type,
        });
    }

    /// Continues in whatever container is now innermost.
    fn resume_parent(&mut self) {
        self.state = match self.frames.last() {
            None => ReaderState::AtStreamEnd,
            Some(frame) if frame.tag_type == TagType::List => ReaderState::InList,
            Some(_) => ReaderState::InCompound,
        };
    }

    /// Skips the unread payload of the current value or array tag.
    fn discard_pending(&mut self) -> Result<()> {
        self.cached = None;
        if !self.value_pending {
            return Ok(());
        }
        self.value_pending = false;
        match self.tag_type {
            TagType::ByteArray | TagType::IntArray | TagType::LongArray => {
                self.source.skip_primitives(self.tag_type, self.tag_length)
            }
            tag => self.source.skip_payload(tag),
        }
    }

    /// Decodes the pending payload of the current value or array tag.
    fn take_pending(&mut self) -> Result<Value> {
        self.value_pending = false;
        let len = self.tag_length;
        Ok(match self.tag_type {
            TagType::ByteArray => Value::ByteArray(self.source.read_byte_elements(len)?),
            TagType::IntArray => Value::IntArray(self.source.read_int_elements(len)?),
            TagType::LongArray => Value::LongArray(self.source.read_long_elements(len)?),
            tag => self.source.read_value(tag)?,
        })
    }
}

impl<R> Display for NbtReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.state)?;
        if matches!(
            self.state,
            ReaderState::AtStreamBeginning | ReaderState::AtStreamEnd | ReaderState::Error
        ) {
            return Ok(());
        }
        write!(f, " at {}", self.tag_type)?;
        if let Some(name) = &self.tag_name {
            write!(f, "({name:?})")?;
        }
        if let Some(index) = self.list_index {
            write!(f, "[{index}]")?;
        }
        write!(f, ", depth {}", self.frames.len())?;
        if let Some(parent) = self.frames.last() {
            write!(f, ", in {}", parent.tag_type)?;
            if let Some(name) = &parent.name {
                write!(f, "({name:?})")?;
            }
        }
        Ok(())
    }
}
