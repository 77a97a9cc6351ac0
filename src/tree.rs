//! The in-memory tag model.
//!
//! All tags live in an [`NbtTree`] arena and are addressed by [`TagHandle`]s. A
//! handle stays valid until the tag is [freed](NbtTree::free); after that every
//! operation on it fails with [`Error::StaleHandle`].
//!
//! Ownership rules are checked on every mutation, before anything changes:
//!
//! * a tag has at most one parent;
//! * a tag is never its own ancestor;
//! * a list holds elements of one type, and those elements have no names;
//! * compound children are named and the names are unique.
//!
//! # Example
//!
//! ```
//! use nbt_flavors::{NbtTree, TagType};
//!
//! let mut tree = NbtTree::new();
//! let root = tree.compound();
//! let level = tree.create(5i32);
//! tree.compound_set(root, "level", level).unwrap();
//!
//! let scores = tree.list(TagType::Unknown);
//! for score in [10i32, 20, 30] {
//!     let score = tree.create(score);
//!     tree.list_push(scores, score).unwrap();
//! }
//! tree.compound_set(root, "scores", scores).unwrap();
//!
//! assert_eq!(tree.list_type(scores).unwrap(), TagType::Int);
//! assert_eq!(tree.value_as::<i32>(tree.child(root, "level").unwrap()).unwrap(), 5);
//! assert_eq!(tree.path(tree.child(scores, 1usize).unwrap()).unwrap(), ".scores[1]");
//! ```

use crate::{Error, Result, TagType, cold_path};

mod copy;
mod display;
mod key;
mod value;
mod view;

pub use display::*;
pub use key::*;
pub use value::*;
pub use view::*;

/// A stable reference to a tag inside an [`NbtTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TagHandle {
    index: u32,
    generation: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct ListData {
    pub(crate) element: TagType,
    pub(crate) items: Vec<TagHandle>,
}

#[derive(Clone, Debug)]
pub(crate) enum Payload {
    Value(Value),
    List(ListData),
    Compound(Vec<TagHandle>),
}

impl Payload {
    pub(crate) fn tag_type(&self) -> TagType {
        match self {
            Payload::Value(value) => value.tag_type(),
            Payload::List(_) => TagType::List,
            Payload::Compound(_) => TagType::Compound,
        }
    }

    pub(crate) fn children(&self) -> &[TagHandle] {
        match self {
            Payload::List(list) => &list.items,
            Payload::Compound(items) => items,
            Payload::Value(_) => &[],
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<TagHandle>,
    pub(crate) payload: Payload,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena owning a forest of tags.
///
/// Tags are created detached. They become owned by a container when inserted into a
/// list or compound, and detached again on removal, replacement or `clear`. A
/// detached tag keeps living in the arena until it is freed or the tree is dropped.
#[derive(Clone, Debug, Default)]
pub struct NbtTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl NbtTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live tags, attached or not.
    #[inline]
    pub fn tag_count(&self) -> usize {
        self.live
    }

    fn alloc(&mut self, name: Option<String>, payload: Payload) -> TagHandle {
        let node = Node {
            name,
            parent: None,
            payload,
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return TagHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        TagHandle {
            index,
            generation: 0,
        }
    }

    pub(crate) fn node(&self, handle: TagHandle) -> Result<&Node> {
        match self.slots.get(handle.index as usize) {
            Some(Slot {
                generation,
                node: Some(node),
            }) if *generation == handle.generation => Ok(node),
            _ => {
                cold_path();
                Err(Error::StaleHandle)
            }
        }
    }

    fn node_mut(&mut self, handle: TagHandle) -> Result<&mut Node> {
        match self.slots.get_mut(handle.index as usize) {
            Some(Slot {
                generation,
                node: Some(node),
            }) if *generation == handle.generation => Ok(node),
            _ => {
                cold_path();
                Err(Error::StaleHandle)
            }
        }
    }

    /// Whether `handle` still refers to a live tag.
    pub fn is_live(&self, handle: TagHandle) -> bool {
        self.node(handle).is_ok()
    }

    // ---- construction ----

    /// Creates a detached, unnamed value or array tag.
    pub fn create(&mut self, value: impl Into<Value>) -> TagHandle {
        self.alloc(None, Payload::Value(value.into()))
    }

    /// Creates a detached, named value or array tag, ready for [`compound_add`](Self::compound_add).
    pub fn create_named(&mut self, name: &str, value: impl Into<Value>) -> TagHandle {
        self.alloc(Some(name.to_owned()), Payload::Value(value.into()))
    }

    /// Creates a detached, empty list. `element` may be `Unknown` to let the first
    /// insertion decide.
    pub fn list(&mut self, element: TagType) -> TagHandle {
        self.alloc(
            None,
            Payload::List(ListData {
                element: normalize_list_type(element),
                items: Vec::new(),
            }),
        )
    }

    /// Creates a detached, empty compound.
    pub fn compound(&mut self) -> TagHandle {
        self.alloc(None, Payload::Compound(Vec::new()))
    }

    // ---- inspection ----

    pub fn tag_type(&self, handle: TagHandle) -> Result<TagType> {
        Ok(self.node(handle)?.payload.tag_type())
    }

    pub fn name(&self, handle: TagHandle) -> Result<Option<&str>> {
        Ok(self.node(handle)?.name.as_deref())
    }

    pub fn parent(&self, handle: TagHandle) -> Result<Option<TagHandle>> {
        Ok(self.node(handle)?.parent)
    }

    /// The value of a value or array tag.
    pub fn value(&self, handle: TagHandle) -> Result<&Value> {
        match &self.node(handle)?.payload {
            Payload::Value(value) => Ok(value),
            other => Err(Error::NotAValue(other.tag_type())),
        }
    }

    /// Mutable access to a value in place; its type cannot change.
    pub fn value_mut(&mut self, handle: TagHandle) -> Result<ValueMut<'_>> {
        match &mut self.node_mut(handle)?.payload {
            Payload::Value(value) => Ok(value.into()),
            other => Err(Error::NotAValue(other.tag_type())),
        }
    }

    /// Replaces a value, returning the old one. The new value must have the same type.
    pub fn set_value(&mut self, handle: TagHandle, value: impl Into<Value>) -> Result<Value> {
        let value = value.into();
        match &mut self.node_mut(handle)?.payload {
            Payload::Value(old) if old.tag_type() == value.tag_type() => {
                Ok(std::mem::replace(old, value))
            }
            Payload::Value(old) => Err(Error::TypeMismatch {
                expected: old.tag_type(),
                actual: value.tag_type(),
            }),
            other => Err(Error::NotAValue(other.tag_type())),
        }
    }

    /// Typed copy of a value, failing if the tag holds another type.
    pub fn value_as<T: FromValue>(&self, handle: TagHandle) -> Result<T> {
        let value = self.value(handle)?;
        T::from_ref(value).cloned().ok_or(Error::TypeMismatch {
            expected: T::TAG_TYPE,
            actual: value.tag_type(),
        })
    }

    /// Element type of a list; `Unknown` only for a list that never had one.
    pub fn list_type(&self, handle: TagHandle) -> Result<TagType> {
        match &self.node(handle)?.payload {
            Payload::List(list) => Ok(list.element),
            other => Err(Error::NotAContainer(other.tag_type())),
        }
    }

    /// Child count of a container, or element count of an array.
    pub fn len(&self, handle: TagHandle) -> Result<usize> {
        match &self.node(handle)?.payload {
            Payload::List(list) => Ok(list.items.len()),
            Payload::Compound(items) => Ok(items.len()),
            Payload::Value(value) if value.tag_type().is_array() => {
                Ok(value.element_count().unwrap_or_default())
            }
            Payload::Value(value) => Err(Error::NotAContainer(value.tag_type())),
        }
    }

    pub fn is_empty(&self, handle: TagHandle) -> Result<bool> {
        Ok(self.len(handle)? == 0)
    }

    /// Children of a container in order: list order, or compound insertion order.
    pub fn children(&self, handle: TagHandle) -> Result<impl Iterator<Item = TagHandle> + '_> {
        match &self.node(handle)?.payload {
            Payload::Value(value) => Err(Error::NotAContainer(value.tag_type())),
            payload => Ok(payload.children().iter().copied()),
        }
    }

    /// Names of a compound's children in insertion order.
    pub fn names(&self, handle: TagHandle) -> Result<impl Iterator<Item = &str> + '_> {
        Ok(self
            .compound_items(handle)?
            .iter()
            .filter_map(|&child| self.node(child).ok()?.name.as_deref()))
    }

    fn compound_items(&self, handle: TagHandle) -> Result<&[TagHandle]> {
        match &self.node(handle)?.payload {
            Payload::Compound(items) => Ok(items),
            other => Err(Error::NotAContainer(other.tag_type())),
        }
    }

    fn find_named(&self, items: &[TagHandle], name: &str) -> Option<(usize, TagHandle)> {
        items
            .iter()
            .enumerate()
            .find(|&(_, &child)| {
                self.node(child)
                    .is_ok_and(|node| node.name.as_deref() == Some(name))
            })
            .map(|(position, &child)| (position, child))
    }

    /// Looks up a child by list position or compound name.
    ///
    /// Returns `Ok(None)` when the container has no such child, including a list
    /// addressed by name or a compound addressed by position.
    pub fn try_child<'k>(
        &self,
        handle: TagHandle,
        key: impl Into<ChildKey<'k>>,
    ) -> Result<Option<TagHandle>> {
        match (&self.node(handle)?.payload, key.into()) {
            (Payload::List(list), ChildKey::Position(i)) => Ok(list.items.get(i).copied()),
            (Payload::Compound(items), ChildKey::Name(name)) => {
                Ok(self.find_named(items, name).map(|(_, child)| child))
            }
            (Payload::Value(value), _) => Err(Error::NotAContainer(value.tag_type())),
            _ => Ok(None),
        }
    }

    /// Like [`try_child`](Self::try_child), but an absent child is an error.
    pub fn child<'k>(&self, handle: TagHandle, key: impl Into<ChildKey<'k>>) -> Result<TagHandle> {
        self.try_child(handle, key)?.ok_or(Error::NoSuchChild)
    }

    pub fn contains<'k>(&self, handle: TagHandle, key: impl Into<ChildKey<'k>>) -> Result<bool> {
        Ok(self.try_child(handle, key)?.is_some())
    }

    /// Position of `child` within a list or compound.
    pub fn index_of(&self, handle: TagHandle, child: TagHandle) -> Result<Option<usize>> {
        match &self.node(handle)?.payload {
            Payload::Value(value) => Err(Error::NotAContainer(value.tag_type())),
            payload => Ok(payload.children().iter().position(|&c| c == child)),
        }
    }

    // ---- structural checks ----

    /// Rejects attaching `child` under `parent` if it would give `child` a second
    /// parent or make it its own ancestor.
    fn check_attach(&self, parent: TagHandle, child: TagHandle) -> Result<()> {
        if self.node(child)?.parent.is_some() {
            cold_path();
            return Err(Error::AlreadyParented);
        }
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                cold_path();
                return Err(Error::CyclicAttachment);
            }
            cursor = self.node(current)?.parent;
        }
        Ok(())
    }

    /// Checks that `child` may join the list `parent`, returning the list's element
    /// type after the insertion.
    fn check_list_attach(&self, parent: TagHandle, child: TagHandle) -> Result<TagType> {
        let element = self.list_type(parent)?;
        self.check_attach(parent, child)?;
        let child_node = self.node(child)?;
        if child_node.name.is_some() {
            cold_path();
            return Err(Error::NamedListElement);
        }
        let actual = child_node.payload.tag_type();
        if element != TagType::Unknown && element != actual {
            cold_path();
            return Err(Error::ListTypeMismatch {
                expected: element,
                actual,
            });
        }
        Ok(actual)
    }

    fn list_data_mut(&mut self, handle: TagHandle) -> Result<&mut ListData> {
        match &mut self.node_mut(handle)?.payload {
            Payload::List(list) => Ok(list),
            other => Err(Error::NotAContainer(other.tag_type())),
        }
    }

    fn compound_items_mut(&mut self, handle: TagHandle) -> Result<&mut Vec<TagHandle>> {
        match &mut self.node_mut(handle)?.payload {
            Payload::Compound(items) => Ok(items),
            other => Err(Error::NotAContainer(other.tag_type())),
        }
    }

    fn set_parent(&mut self, child: TagHandle, parent: Option<TagHandle>) -> Result<()> {
        self.node_mut(child)?.parent = parent;
        Ok(())
    }

    // ---- list mutation ----

    /// Appends `child` to the list `parent`.
    pub fn list_push(&mut self, parent: TagHandle, child: TagHandle) -> Result<()> {
        let len = self.len(parent)?;
        self.list_insert(parent, len, child)
    }

    /// Inserts `child` at `index`, shifting later elements.
    pub fn list_insert(&mut self, parent: TagHandle, index: usize, child: TagHandle) -> Result<()> {
        let element = self.check_list_attach(parent, child)?;
        let list = self.list_data_mut(parent)?;
        if index > list.items.len() {
            cold_path();
            return Err(Error::NoSuchChild);
        }
        list.element = element;
        list.items.insert(index, child);
        self.set_parent(child, Some(parent))
    }

    /// Replaces the element at `index`, returning the detached old element.
    pub fn list_set(&mut self, parent: TagHandle, index: usize, child: TagHandle) -> Result<TagHandle> {
        self.check_list_attach(parent, child)?;
        let list = self.list_data_mut(parent)?;
        let Some(slot) = list.items.get_mut(index) else {
            cold_path();
            return Err(Error::NoSuchChild);
        };
        let old = std::mem::replace(slot, child);
        self.set_parent(old, None)?;
        self.set_parent(child, Some(parent))?;
        Ok(old)
    }

    /// Removes and detaches the element at `index`. The list keeps its element type.
    pub fn list_remove(&mut self, parent: TagHandle, index: usize) -> Result<TagHandle> {
        let list = self.list_data_mut(parent)?;
        if index >= list.items.len() {
            cold_path();
            return Err(Error::NoSuchChild);
        }
        let old = list.items.remove(index);
        self.set_parent(old, None)?;
        Ok(old)
    }

    /// Sets the element type of a list.
    ///
    /// Allowed while the list is empty, or when the type does not change. `End` is
    /// treated like `Unknown`.
    pub fn set_list_type(&mut self, handle: TagHandle, element: TagType) -> Result<()> {
        let element = normalize_list_type(element);
        let list = self.list_data_mut(handle)?;
        if list.element == element {
            return Ok(());
        }
        if !list.items.is_empty() {
            cold_path();
            return Err(Error::ListNotEmpty);
        }
        list.element = element;
        Ok(())
    }

    // ---- compound mutation ----

    /// Adds an already-named `child` to the compound `parent`.
    pub fn compound_add(&mut self, parent: TagHandle, child: TagHandle) -> Result<()> {
        let items = self.compound_items(parent)?;
        self.check_attach(parent, child)?;
        let Some(name) = self.node(child)?.name.as_deref() else {
            cold_path();
            return Err(Error::MissingName);
        };
        if self.find_named(items, name).is_some() {
            cold_path();
            return Err(Error::DuplicateName(name.to_owned()));
        }
        self.compound_items_mut(parent)?.push(child);
        self.set_parent(child, Some(parent))
    }

    /// Stores `child` under `name`, giving it that name.
    ///
    /// A previous occupant of `name` is detached first and returned. On error
    /// neither tag changes.
    pub fn compound_set(
        &mut self,
        parent: TagHandle,
        name: &str,
        child: TagHandle,
    ) -> Result<Option<TagHandle>> {
        let items = self.compound_items(parent)?;
        self.check_attach(parent, child)?;
        let previous = self.find_named(items, name);

        self.node_mut(child)?.name = Some(name.to_owned());
        if let Some((position, old)) = previous {
            self.compound_items_mut(parent)?[position] = child;
            self.set_parent(old, None)?;
        } else {
            self.compound_items_mut(parent)?.push(child);
        }
        self.set_parent(child, Some(parent))?;
        Ok(previous.map(|(_, old)| old))
    }

    /// Removes and detaches the child called `name`. The child keeps its name.
    pub fn compound_remove(&mut self, parent: TagHandle, name: &str) -> Result<Option<TagHandle>> {
        let items = self.compound_items(parent)?;
        let Some((position, old)) = self.find_named(items, name) else {
            return Ok(None);
        };
        self.compound_items_mut(parent)?.remove(position);
        self.set_parent(old, None)?;
        Ok(Some(old))
    }

    /// Renames the child `old_name` of a compound to `new_name`.
    pub fn compound_rename(&mut self, parent: TagHandle, old_name: &str, new_name: &str) -> Result<()> {
        let child = self.child(parent, old_name)?;
        self.rename(child, Some(new_name))
    }

    /// Sets or clears a tag's name, keeping its parent's rules intact: compound
    /// children stay named and unique, list elements stay unnamed.
    pub fn rename(&mut self, handle: TagHandle, name: Option<&str>) -> Result<()> {
        let node = self.node(handle)?;
        if node.name.as_deref() == name {
            return Ok(());
        }
        if let Some(parent) = node.parent {
            match (&self.node(parent)?.payload, name) {
                (Payload::List(_), Some(_)) => {
                    cold_path();
                    return Err(Error::NamedListElement);
                }
                (Payload::Compound(_), None) => {
                    cold_path();
                    return Err(Error::MissingName);
                }
                (Payload::Compound(items), Some(name)) => {
                    if self.find_named(items, name).is_some() {
                        cold_path();
                        return Err(Error::DuplicateName(name.to_owned()));
                    }
                }
                _ => {}
            }
        }
        self.node_mut(handle)?.name = name.map(str::to_owned);
        Ok(())
    }

    // ---- generic mutation ----

    /// Removes a tag from its parent, if it has one.
    pub fn detach(&mut self, handle: TagHandle) -> Result<()> {
        let Some(parent) = self.node(handle)?.parent else {
            return Ok(());
        };
        match &mut self.node_mut(parent)?.payload {
            Payload::List(ListData { items, .. }) | Payload::Compound(items) => {
                items.retain(|&child| child != handle)
            }
            Payload::Value(_) => {}
        }
        self.set_parent(handle, None)
    }

    /// Detaches every child of a container. A list keeps its element type.
    pub fn clear(&mut self, handle: TagHandle) -> Result<()> {
        let children = match &mut self.node_mut(handle)?.payload {
            Payload::List(ListData { items, .. }) | Payload::Compound(items) => {
                std::mem::take(items)
            }
            Payload::Value(value) => return Err(Error::NotAContainer(value.tag_type())),
        };
        for child in children {
            self.set_parent(child, None)?;
        }
        Ok(())
    }

    /// Releases a detached tag and all of its descendants. Their handles become stale.
    pub fn free(&mut self, handle: TagHandle) -> Result<()> {
        if self.node(handle)?.parent.is_some() {
            cold_path();
            return Err(Error::AlreadyParented);
        }
        let mut pending = vec![handle];
        while let Some(current) = pending.pop() {
            let slot = &mut self.slots[current.index as usize];
            if let Some(node) = slot.node.take() {
                pending.extend_from_slice(node.payload.children());
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                self.live -= 1;
            }
        }
        Ok(())
    }

    /// Builds a node from already-decoded parts, attaching nothing. Used by the codecs,
    /// which maintain the list and compound rules themselves.
    pub(crate) fn alloc_raw(&mut self, name: Option<String>, payload: Payload) -> TagHandle {
        self.alloc(name, payload)
    }

    /// Appends a freshly decoded child without re-validating it.
    pub(crate) fn push_raw(&mut self, parent: TagHandle, child: TagHandle) -> Result<()> {
        match &mut self.node_mut(parent)?.payload {
            Payload::List(ListData { items, .. }) | Payload::Compound(items) => items.push(child),
            Payload::Value(value) => return Err(Error::NotAContainer(value.tag_type())),
        }
        self.set_parent(child, Some(parent))
    }
}

#[inline]
fn normalize_list_type(element: TagType) -> TagType {
    match element {
        TagType::End => TagType::Unknown,
        other => other,
    }
}
