/// Addresses a child of a container: a position in a list, or a name in a compound.
///
/// Lookups such as [`NbtTree::child`](crate::NbtTree::child) take anything that
/// converts into a key, so `tree.child(list, 2usize)` and `tree.child(compound, "id")`
/// both work.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ChildKey<'a> {
    Position(usize),
    Name(&'a str),
}

impl From<usize> for ChildKey<'_> {
    #[inline]
    fn from(position: usize) -> Self {
        ChildKey::Position(position)
    }
}

impl<'a> From<&'a str> for ChildKey<'a> {
    #[inline]
    fn from(name: &'a str) -> Self {
        ChildKey::Name(name)
    }
}

impl<'a> From<&'a String> for ChildKey<'a> {
    #[inline]
    fn from(name: &'a String) -> Self {
        ChildKey::Name(name)
    }
}
