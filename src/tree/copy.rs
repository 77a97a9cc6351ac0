use std::collections::HashMap;

use crate::{
    NbtTree, Result, TagHandle,
    tree::{ListData, Payload},
};

/// The payload of `payload` with its children stripped.
fn hollow(payload: &Payload) -> Payload {
    match payload {
        Payload::Value(value) => Payload::Value(value.clone()),
        Payload::List(list) => Payload::List(ListData {
            element: list.element,
            items: Vec::with_capacity(list.items.len()),
        }),
        Payload::Compound(items) => Payload::Compound(Vec::with_capacity(items.len())),
    }
}

impl NbtTree {
    /// A detached, childless copy of one node of `source`.
    fn alloc_hollow(&mut self, source: &NbtTree, handle: TagHandle) -> Result<TagHandle> {
        let node = source.node(handle)?;
        Ok(self.alloc_raw(node.name.clone(), hollow(&node.payload)))
    }

    fn alloc_own_hollow(&mut self, handle: TagHandle) -> Result<TagHandle> {
        let node = self.node(handle)?;
        let (name, payload) = (node.name.clone(), hollow(&node.payload));
        Ok(self.alloc_raw(name, payload))
    }

    /// Copies a subtree within this tree. The copy is detached and keeps the name of
    /// the original.
    pub fn deep_copy(&mut self, handle: TagHandle) -> Result<TagHandle> {
        let copy = self.alloc_own_hollow(handle)?;
        let mut pending = vec![(handle, copy)];
        while let Some((original, copy)) = pending.pop() {
            let children = self.node(original)?.payload.children().to_vec();
            for child in children {
                let child_copy = self.alloc_own_hollow(child)?;
                self.push_raw(copy, child_copy)?;
                pending.push((child, child_copy));
            }
        }
        Ok(copy)
    }

    /// Copies a subtree from this tree into `target`, returning the detached copy.
    pub fn copy_into(&self, handle: TagHandle, target: &mut NbtTree) -> Result<TagHandle> {
        let copy = target.alloc_hollow(self, handle)?;
        let mut pending = vec![(handle, copy)];
        while let Some((original, copy)) = pending.pop() {
            for &child in self.node(original)?.payload.children() {
                let child_copy = target.alloc_hollow(self, child)?;
                target.push_raw(copy, child_copy)?;
                pending.push((child, child_copy));
            }
        }
        Ok(copy)
    }

    /// Structural equality of two subtrees, possibly in different trees.
    ///
    /// Lists compare element type and order; compounds compare their key sets and the
    /// children under each key. The names of `a` and `b` themselves are ignored.
    pub fn deep_eq(&self, a: TagHandle, other: &NbtTree, b: TagHandle) -> bool {
        let mut pending = vec![(a, b)];
        while let Some((a, b)) = pending.pop() {
            let (Ok(left), Ok(right)) = (self.node(a), other.node(b)) else {
                return false;
            };
            match (&left.payload, &right.payload) {
                (Payload::Value(x), Payload::Value(y)) => {
                    if !x.same(y) {
                        return false;
                    }
                }
                (Payload::List(x), Payload::List(y)) => {
                    if x.element != y.element || x.items.len() != y.items.len() {
                        return false;
                    }
                    pending.extend(x.items.iter().copied().zip(y.items.iter().copied()));
                }
                (Payload::Compound(x), Payload::Compound(y)) => {
                    if x.len() != y.len() {
                        return false;
                    }
                    let by_name: HashMap<&str, TagHandle> = y
                        .iter()
                        .filter_map(|&r| Some((other.node(r).ok()?.name.as_deref()?, r)))
                        .collect();
                    for &l in x {
                        let Some(name) = self.node(l).ok().and_then(|n| n.name.as_deref()) else {
                            return false;
                        };
                        let Some(&r) = by_name.get(name) else {
                            return false;
                        };
                        pending.push((l, r));
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::{NbtTree, TagType};

    fn sample(tree: &mut NbtTree) -> crate::TagHandle {
        let root = tree.compound();
        let list = tree.list(TagType::Unknown);
        for v in [1i64, 2, 3] {
            let item = tree.create(v);
            tree.list_push(list, item).unwrap();
        }
        tree.compound_set(root, "longs", list).unwrap();
        let name = tree.create("steve");
        tree.compound_set(root, "name", name).unwrap();
        root
    }

    #[test]
    fn deep_copy_is_detached_and_equal() {
        let mut tree = NbtTree::new();
        let root = sample(&mut tree);
        let copy = tree.deep_copy(root).unwrap();
        assert_ne!(copy, root);
        assert_eq!(tree.parent(copy).unwrap(), None);
        assert!(tree.deep_eq(root, &tree, copy));

        let copied_list = tree.child(copy, "longs").unwrap();
        assert_eq!(tree.parent(copied_list).unwrap(), Some(copy));
    }

    #[test]
    fn copy_into_other_tree() {
        let mut tree = NbtTree::new();
        let root = sample(&mut tree);
        let mut other = NbtTree::new();
        let copy = tree.copy_into(root, &mut other).unwrap();
        assert_eq!(other.tag_count(), tree.tag_count());
        assert!(tree.deep_eq(root, &other, copy));
    }

    #[test]
    fn compound_order_does_not_matter() {
        let mut tree = NbtTree::new();
        let a = tree.compound();
        let b = tree.compound();
        for (parent, order) in [(a, ["x", "y"]), (b, ["y", "x"])] {
            for key in order {
                let v = tree.create(7i16);
                tree.compound_set(parent, key, v).unwrap();
            }
        }
        assert!(tree.deep_eq(a, &tree, b));

        let extra = tree.create(0i8);
        tree.compound_set(b, "z", extra).unwrap();
        assert!(!tree.deep_eq(a, &tree, b));
    }

    #[test]
    fn list_order_matters() {
        let mut tree = NbtTree::new();
        let a = tree.list(TagType::Int);
        let b = tree.list(TagType::Int);
        for (list, values) in [(a, [1i32, 2]), (b, [2, 1])] {
            for v in values {
                let item = tree.create(v);
                tree.list_push(list, item).unwrap();
            }
        }
        assert!(!tree.deep_eq(a, &tree, b));
    }
}
