use std::io::Read;

use crate::{
    Error, FromValue, NbtReader, NbtTree, ReaderState, Result, TagHandle, TagInfo, TagType, Value,
    codec::{read_list_payload, read_payload},
    cold_path,
    tree::Payload,
};

impl<R: Read> NbtReader<R> {
    /// Reads the value of the current value or array tag.
    ///
    /// A value can be read once. With [`cache_tag_values`](Self::set_cache_tag_values)
    /// on, later calls return a copy until the cursor moves on; otherwise they fail
    /// with [`Error::ValueAlreadyRead`].
    pub fn read_value(&mut self) -> Result<Value> {
        self.guarded(Self::current_value)
    }

    /// Reads the current value as `T`, failing without consuming it when the tag type
    /// does not match.
    pub fn read_value_as<T: FromValue>(&mut self) -> Result<T> {
        if self.tag_type() != T::TAG_TYPE {
            cold_path();
            return Err(Error::TypeMismatch {
                expected: T::TAG_TYPE,
                actual: self.tag_type(),
            });
        }
        let value = self.read_value()?;
        T::from_value(value).ok_or(Error::TypeMismatch {
            expected: T::TAG_TYPE,
            actual: self.tag_type(),
        })
    }

    /// Reads every element of the current list, which must not have been entered yet.
    ///
    /// The cursor ends up after the list, as if all elements had been advanced over.
    pub fn read_list_as_vec<T: FromValue>(&mut self) -> Result<Vec<T>> {
        if self.state != ReaderState::AtListBeginning {
            cold_path();
            return Err(Error::ReaderState("at the start of a list"));
        }
        if self.tag_length > 0 && self.list_type != T::TAG_TYPE {
            cold_path();
            return Err(Error::TypeMismatch {
                expected: T::TAG_TYPE,
                actual: self.list_type,
            });
        }
        self.guarded(|reader| {
            let len = reader.tag_length;
            let mut items = Vec::with_capacity(len.min(4096));
            for _ in 0..len {
                let value = reader.source.read_value(T::TAG_TYPE)?;
                items.extend(T::from_value(value));
            }
            reader.tags_read += len as u64;
            reader.resume_parent();
            Ok(items)
        })
    }

    /// Advances until a tag named `name` is current, at any depth.
    pub fn read_to_following(&mut self, name: &str) -> Result<bool> {
        while self.advance()? {
            if self.tag_name() == Some(name) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Advances to the next tag named `name` inside the current container.
    ///
    /// Returns `false`, leaving the cursor past the container, if there is none.
    pub fn read_to_descendant(&mut self, name: &str) -> Result<bool> {
        match self.state() {
            ReaderState::AtStreamBeginning => return self.read_to_following(name),
            ReaderState::AtStreamEnd => return Ok(false),
            _ => {}
        }
        let start = self.depth();
        while self.advance()? {
            if self.depth() <= start {
                return Ok(false);
            }
            if self.tag_name() == Some(name) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Advances to the next sibling of the current tag, optionally the next one named
    /// `name`.
    ///
    /// Returns `false` once the enclosing container ends.
    pub fn read_to_next_sibling(&mut self, name: Option<&str>) -> Result<bool> {
        if matches!(
            self.state(),
            ReaderState::AtStreamBeginning | ReaderState::AtStreamEnd
        ) {
            return Ok(false);
        }
        let start = self.depth();
        while self.advance()? {
            let depth = self.depth();
            if depth < start {
                return Ok(false);
            }
            if depth == start
                && self.tag_type() != TagType::End
                && name.is_none_or(|name| self.tag_name() == Some(name))
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Skips the current tag, its contents, and the rest of its siblings.
    ///
    /// Returns the number of tags skipped, the current one included. Afterwards the
    /// cursor is on the tag following the enclosing container, or at the end.
    pub fn skip(&mut self) -> Result<u64> {
        match self.state() {
            ReaderState::AtStreamEnd => return Ok(0),
            ReaderState::AtStreamBeginning => {
                if !self.advance()? {
                    return Ok(0);
                }
            }
            _ => {}
        }
        let start = self.depth();
        let mut skipped = u64::from(self.tag_type() != TagType::End);
        while self.advance()? {
            if self.depth() < start {
                break;
            }
            if self.tag_type() != TagType::End {
                skipped += 1;
            }
        }
        Ok(skipped)
    }

    /// Builds the current tag, with everything below it, in `tree`.
    ///
    /// The returned tag is detached and carries the current tag's name. Afterwards the
    /// cursor is past the tag, so the next advance moves to its next sibling. At the
    /// very beginning this reads the whole root.
    pub fn read_as_tag(&mut self, tree: &mut NbtTree) -> Result<TagHandle> {
        self.guarded(|reader| reader.materialize(tree))
    }

    fn materialize(&mut self, tree: &mut NbtTree) -> Result<TagHandle> {
        if self.state == ReaderState::AtStreamBeginning {
            self.step()?;
        }
        let before = tree.tag_count();
        let depth = self.depth();
        let mut select_all = |_: &TagInfo<'_>| true;
        let handle = match self.state {
            ReaderState::AtCompoundBeginning => {
                let name = self.tag_name.clone();
                let handle = read_payload(
                    &mut self.source,
                    tree,
                    TagType::Compound,
                    name,
                    &mut select_all,
                    depth,
                )?;
                self.resume_parent();
                handle
            }
            ReaderState::AtListBeginning => {
                let element = match self.list_type {
                    TagType::Unknown => TagType::End,
                    other => other,
                };
                let name = self.tag_name.clone();
                let handle = read_list_payload(
                    &mut self.source,
                    tree,
                    name,
                    element,
                    self.tag_length,
                    &mut select_all,
                    depth,
                )?;
                self.resume_parent();
                handle
            }
            ReaderState::InCompound | ReaderState::InList => {
                let value = self.current_value()?;
                tree.alloc_raw(self.tag_name.clone(), Payload::Value(value))
            }
            _ => {
                cold_path();
                return Err(Error::ReaderState("on a tag"));
            }
        };
        let descendants = tree.tag_count().saturating_sub(before + 1);
        self.tags_read += descendants as u64;
        Ok(handle)
    }

    pub(super) fn current_value(&mut self) -> Result<Value> {
        let tag = self.tag_type;
        if !(tag.is_value() || tag.is_array()) {
            cold_path();
            return Err(Error::NoValue(tag));
        }
        if self.value_pending {
            let value = self.take_pending()?;
            if self.cache_tag_values {
                self.cached = Some(value.clone());
            }
            return Ok(value);
        }
        match &self.cached {
            Some(value) => Ok(value.clone()),
            None => {
                cold_path();
                Err(Error::ValueAlreadyRead)
            }
        }
    }
}
