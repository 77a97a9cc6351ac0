use std::{collections::HashSet, io::Read};

use log::trace;

use crate::{
    Error, NbtSource, NbtTree, Result, Selector, TagHandle, TagInfo, TagType, Value,
    binary::check_depth,
    cold_path,
    tree::{ListData, Payload},
};

impl<R: Read> NbtSource<R> {
    /// Reads the payload of a value or array tag.
    pub fn read_value(&mut self, tag: TagType) -> Result<Value> {
        Ok(match tag {
            TagType::Byte => Value::Byte(self.read_i8()?),
            TagType::Short => Value::Short(self.read_i16()?),
            TagType::Int => Value::Int(self.read_i32()?),
            TagType::Long => Value::Long(self.read_i64()?),
            TagType::Float => Value::Float(self.read_f32()?),
            TagType::Double => Value::Double(self.read_f64()?),
            TagType::ByteArray => Value::ByteArray(self.read_byte_array()?),
            TagType::String => Value::String(self.read_string()?),
            TagType::IntArray => Value::IntArray(self.read_int_array()?),
            TagType::LongArray => Value::LongArray(self.read_long_array()?),
            TagType::End | TagType::Unknown => return Err(Error::UnexpectedEnd),
            TagType::List | TagType::Compound => return Err(Error::NotAValue(tag)),
        })
    }

    /// Reads a root header: the type byte, checked against the flavor, and the name
    /// unless the flavor has unnamed roots.
    pub fn read_root_header(&mut self) -> Result<(TagType, Option<String>)> {
        let tag = self.read_tag_type()?;
        if !self.flavor().allows_root(tag) {
            cold_path();
            return Err(Error::InvalidRoot(tag));
        }
        let name = if self.flavor().has_unnamed_root_tag() {
            None
        } else {
            Some(self.read_string()?)
        };
        Ok((tag, name))
    }
}

/// Reads a complete root tag into `tree`, returning its (detached) handle.
///
/// The root's name, if the flavor has one, becomes the name of the returned tag.
/// The root itself is always materialised; the selector is consulted for every tag
/// below it.
pub fn read_root<R: Read>(
    source: &mut NbtSource<R>,
    tree: &mut NbtTree,
    selector: Option<Selector<'_>>,
) -> Result<TagHandle> {
    let (tag, name) = source.read_root_header()?;
    let mut select_all = |_: &TagInfo<'_>| true;
    let selector: Selector<'_> = match selector {
        Some(selector) => selector,
        None => &mut select_all,
    };
    read_payload(source, tree, tag, name, selector, 0)
}

/// Reads the payload of a tag whose type byte and name were already consumed.
pub fn read_tag<R: Read>(
    source: &mut NbtSource<R>,
    tree: &mut NbtTree,
    tag: TagType,
    name: Option<String>,
) -> Result<TagHandle> {
    read_payload(source, tree, tag, name, &mut |_: &TagInfo<'_>| true, 0)
}

pub(crate) fn read_payload<R: Read>(
    source: &mut NbtSource<R>,
    tree: &mut NbtTree,
    tag: TagType,
    name: Option<String>,
    selector: &mut dyn FnMut(&TagInfo<'_>) -> bool,
    depth: usize,
) -> Result<TagHandle> {
    match tag {
        TagType::List => {
            check_depth(depth)?;
            let element = source.read_tag_type()?;
            let len = source.read_length()?;
            read_list_payload(source, tree, name, element, len, selector, depth)
        }
        TagType::Compound => {
            check_depth(depth)?;
            let handle = tree.alloc_raw(name, Payload::Compound(Vec::new()));
            let filled = read_compound_children(source, tree, handle, selector, depth);
            release_on_error(tree, handle, filled)
        }
        _ => {
            let value = source.read_value(tag)?;
            Ok(tree.alloc_raw(name, Payload::Value(value)))
        }
    }
}

/// Reads `len` list elements after the list header was consumed.
pub(crate) fn read_list_payload<R: Read>(
    source: &mut NbtSource<R>,
    tree: &mut NbtTree,
    name: Option<String>,
    element: TagType,
    len: usize,
    selector: &mut dyn FnMut(&TagInfo<'_>) -> bool,
    depth: usize,
) -> Result<TagHandle> {
    if element == TagType::End && len > 0 {
        cold_path();
        return Err(Error::UnexpectedEnd);
    }
    if element != TagType::End {
        source.check_allowed(element)?;
    }
    let handle = tree.alloc_raw(
        name,
        Payload::List(ListData {
            element: if element == TagType::End {
                TagType::Unknown
            } else {
                element
            },
            items: Vec::with_capacity(len.min(4096)),
        }),
    );
    let filled = read_list_elements(source, tree, handle, element, len, selector, depth);
    release_on_error(tree, handle, filled)
}

fn read_compound_children<R: Read>(
    source: &mut NbtSource<R>,
    tree: &mut NbtTree,
    handle: TagHandle,
    selector: &mut dyn FnMut(&TagInfo<'_>) -> bool,
    depth: usize,
) -> Result<()> {
    let mut seen = HashSet::new();
    loop {
        let child_tag = source.read_tag_type()?;
        if child_tag == TagType::End {
            return Ok(());
        }
        let child_name = source.read_string()?;
        let info = TagInfo {
            name: Some(&child_name),
            tag_type: child_tag,
            list_index: None,
            depth: depth + 1,
        };
        if !selector(&info) {
            trace!("skipping {child_tag} {child_name:?} at depth {}", depth + 1);
            source.skip_payload_at(child_tag, depth + 1)?;
            continue;
        }
        if !seen.insert(child_name.clone()) {
            cold_path();
            return Err(Error::DuplicateName(child_name));
        }
        let child = read_payload(source, tree, child_tag, Some(child_name), selector, depth + 1)?;
        tree.push_raw(handle, child)?;
    }
}

fn read_list_elements<R: Read>(
    source: &mut NbtSource<R>,
    tree: &mut NbtTree,
    handle: TagHandle,
    element: TagType,
    len: usize,
    selector: &mut dyn FnMut(&TagInfo<'_>) -> bool,
    depth: usize,
) -> Result<()> {
    for index in 0..len {
        let info = TagInfo {
            name: None,
            tag_type: element,
            list_index: Some(index),
            depth: depth + 1,
        };
        if !selector(&info) {
            trace!("skipping {element} [{index}] at depth {}", depth + 1);
            source.skip_payload_at(element, depth + 1)?;
            continue;
        }
        let child = read_payload(source, tree, element, None, selector, depth + 1)?;
        tree.push_raw(handle, child)?;
    }
    Ok(())
}

/// Frees a container, with whatever was read into it, when its contents failed to
/// decode.
fn release_on_error(tree: &mut NbtTree, handle: TagHandle, filled: Result<()>) -> Result<TagHandle> {
    match filled {
        Ok(()) => Ok(handle),
        Err(error) => {
            cold_path();
            tree.free(handle)?;
            Err(error)
        }
    }
}
