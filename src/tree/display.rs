use std::fmt::{self, Write as _};

use crate::{MAX_DEPTH, NbtTree, Result, TagHandle, Visit, tree::Payload};

/// Pretty printer returned by [`NbtTree::display`].
///
/// ```text
/// TAG_Compound("root"): 2 entries {
///   TAG_Int("a"): 5
///   TAG_List("b"): 3 entries {
///     TAG_Int: 1
///     TAG_Int: 2
///     TAG_Int: 3
///   }
/// }
/// ```
///
/// Contents below [`MAX_DEPTH`] are elided as `{ ... }`.
pub struct TagDisplay<'a> {
    tree: &'a NbtTree,
    handle: TagHandle,
    indent: &'a str,
}

impl<'a> TagDisplay<'a> {
    /// Uses `indent` for each nesting level instead of two spaces.
    pub fn indent(mut self, indent: &'a str) -> Self {
        self.indent = indent;
        self
    }

    fn write_tag(&self, f: &mut fmt::Formatter<'_>, handle: TagHandle, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            f.write_str(self.indent)?;
        }
        let tree = self.tree;
        let tag_type = tree.tag_type(handle).map_err(|_| fmt::Error)?;
        f.write_str(tag_type.name())?;
        if let Ok(Some(name)) = tree.name(handle) {
            write!(f, "({name:?})")?;
        }
        f.write_str(": ")?;
        match tree.view(handle).map_err(|_| fmt::Error)? {
            Visit::Byte(v) => write!(f, "{v}"),
            Visit::Short(v) => write!(f, "{v}"),
            Visit::Int(v) => write!(f, "{v}"),
            Visit::Long(v) => write!(f, "{v}"),
            Visit::Float(v) => write!(f, "{v}"),
            Visit::Double(v) => write!(f, "{v}"),
            Visit::String(v) => write!(f, "{v:?}"),
            Visit::ByteArray(v) => write!(f, "[{} bytes]", v.len()),
            Visit::IntArray(v) => write!(f, "[{} ints]", v.len()),
            Visit::LongArray(v) => write!(f, "[{} longs]", v.len()),
            Visit::List(list) => {
                self.write_children(f, list.iter(), list.len(), depth)
            }
            Visit::Compound(compound) => {
                self.write_children(f, compound.iter().map(|(_, c)| c), compound.len(), depth)
            }
        }
    }

    fn write_children(
        &self,
        f: &mut fmt::Formatter<'_>,
        children: impl Iterator<Item = TagHandle>,
        len: usize,
        depth: usize,
    ) -> fmt::Result {
        let noun = if len == 1 { "entry" } else { "entries" };
        if depth + 1 >= MAX_DEPTH {
            return write!(f, "{len} {noun} {{ ... }}");
        }
        write!(f, "{len} {noun} {{")?;
        for child in children {
            f.write_char('\n')?;
            self.write_tag(f, child, depth + 1)?;
        }
        f.write_char('\n')?;
        for _ in 0..depth {
            f.write_str(self.indent)?;
        }
        f.write_char('}')
    }
}

impl fmt::Display for TagDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tag(f, self.handle, 0)
    }
}

impl NbtTree {
    /// A [`Display`](fmt::Display) adapter for the subtree at `handle`.
    pub fn display(&self, handle: TagHandle) -> TagDisplay<'_> {
        TagDisplay {
            tree: self,
            handle,
            indent: "  ",
        }
    }

    /// Where a tag sits below its topmost ancestor: `.name` steps for compound
    /// children, `[i]` steps for list elements, starting from the root's own name.
    pub fn path(&self, handle: TagHandle) -> Result<String> {
        let mut steps = Vec::new();
        let mut current = handle;
        loop {
            let node = self.node(current)?;
            let Some(parent) = node.parent else {
                steps.push(node.name.clone().unwrap_or_default());
                break;
            };
            match &self.node(parent)?.payload {
                Payload::List(list) => {
                    let index = list.items.iter().position(|&c| c == current).unwrap_or(0);
                    steps.push(format!("[{index}]"));
                }
                _ => steps.push(format!(".{}", node.name.as_deref().unwrap_or_default())),
            }
            current = parent;
        }
        Ok(steps.into_iter().rev().collect())
    }
}
