use crate::{NbtTree, Result, TagHandle, TagType, Value, tree::Payload};

/// A borrowed look at one tag, for pattern matching.
///
/// # Example
///
/// ```
/// use nbt_flavors::{NbtTree, Visit};
///
/// let mut tree = NbtTree::new();
/// let tag = tree.create("hello");
/// let text = tree.visit(tag, |v| match v {
///     Visit::String(s) => s.to_owned(),
///     _ => String::new(),
/// });
/// assert_eq!(text.unwrap(), "hello");
/// ```
#[derive(Clone, Copy)]
pub enum Visit<'a> {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(&'a [i8]),
    String(&'a str),
    List(ListView<'a>),
    Compound(CompoundView<'a>),
    IntArray(&'a [i32]),
    LongArray(&'a [i64]),
}

/// Read-only view of a list.
#[derive(Clone, Copy)]
pub struct ListView<'a> {
    tree: &'a NbtTree,
    element: TagType,
    items: &'a [TagHandle],
}

impl<'a> ListView<'a> {
    #[inline]
    pub fn element_type(&self) -> TagType {
        self.element
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<TagHandle> {
        self.items.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = TagHandle> + 'a {
        self.items.iter().copied()
    }

    /// Visits every element in order.
    pub fn visit_each(&self, mut f: impl FnMut(Visit<'a>)) -> Result<()> {
        for &item in self.items {
            f(self.tree.view(item)?);
        }
        Ok(())
    }
}

/// Read-only view of a compound.
#[derive(Clone, Copy)]
pub struct CompoundView<'a> {
    tree: &'a NbtTree,
    items: &'a [TagHandle],
}

impl<'a> CompoundView<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<TagHandle> {
        self.iter()
            .find_map(|(key, child)| (key == name).then_some(child))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// `(name, child)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, TagHandle)> + 'a {
        let tree = self.tree;
        self.items.iter().filter_map(move |&child| {
            let name = tree.node(child).ok()?.name.as_deref()?;
            Some((name, child))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.iter().map(|(name, _)| name)
    }
}

impl NbtTree {
    /// A [`Visit`] of the tag behind `handle`.
    pub fn view(&self, handle: TagHandle) -> Result<Visit<'_>> {
        Ok(match &self.node(handle)?.payload {
            Payload::Value(value) => match value {
                Value::Byte(v) => Visit::Byte(*v),
                Value::Short(v) => Visit::Short(*v),
                Value::Int(v) => Visit::Int(*v),
                Value::Long(v) => Visit::Long(*v),
                Value::Float(v) => Visit::Float(*v),
                Value::Double(v) => Visit::Double(*v),
                Value::ByteArray(v) => Visit::ByteArray(v),
                Value::String(v) => Visit::String(v),
                Value::IntArray(v) => Visit::IntArray(v),
                Value::LongArray(v) => Visit::LongArray(v),
            },
            Payload::List(list) => Visit::List(ListView {
                tree: self,
                element: list.element,
                items: &list.items,
            }),
            Payload::Compound(items) => Visit::Compound(CompoundView { tree: self, items }),
        })
    }

    /// Visits the tag with a closure, allowing for efficient pattern matching.
    pub fn visit<'a, R>(
        &'a self,
        handle: TagHandle,
        match_fn: impl FnOnce(Visit<'a>) -> R,
    ) -> Result<R> {
        Ok(match_fn(self.view(handle)?))
    }
}
