use std::io::Write;

use crate::{
    Error, NbtSink, NbtTree, Result, TagHandle, TagType, Value, binary::check_depth, cold_path,
    tree::Payload,
};

impl<W: Write> NbtSink<W> {
    /// Writes the payload of a value or array tag.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Byte(v) => self.write_i8(*v),
            Value::Short(v) => self.write_i16(*v),
            Value::Int(v) => self.write_i32(*v),
            Value::Long(v) => self.write_i64(*v),
            Value::Float(v) => self.write_f32(*v),
            Value::Double(v) => self.write_f64(*v),
            Value::ByteArray(v) => self.write_byte_array(v),
            Value::String(v) => self.write_string(v),
            Value::IntArray(v) => self.write_int_array(v),
            Value::LongArray(v) => self.write_long_array(v),
        }
    }
}

/// Writes `root` as a file root: type byte, the root's name (unless the flavor has
/// unnamed roots), and payload.
pub fn write_root<W: Write>(sink: &mut NbtSink<W>, tree: &NbtTree, root: TagHandle) -> Result<()> {
    let node = tree.node(root)?;
    let tag = node.payload.tag_type();
    if !sink.flavor().allows_root(tag) {
        cold_path();
        return Err(Error::InvalidRoot(tag));
    }
    sink.write_tag_type(tag)?;
    if !sink.flavor().has_unnamed_root_tag() {
        let Some(name) = node.name.as_deref() else {
            cold_path();
            return Err(Error::UnnamedRoot);
        };
        sink.write_string(name)?;
    }
    write_payload(sink, tree, root, 0)
}

/// Writes a tag in its named form: type byte, name, payload. An unnamed tag gets an
/// empty name.
///
/// `depth` is the nesting depth the tag lands at, the root being 0. A container whose
/// depth reaches [`MAX_DEPTH`](crate::MAX_DEPTH) fails with [`Error::NestingTooDeep`],
/// the same limit the readers apply.
pub fn write_named<W: Write>(
    sink: &mut NbtSink<W>,
    tree: &NbtTree,
    handle: TagHandle,
    depth: usize,
) -> Result<()> {
    let node = tree.node(handle)?;
    sink.write_tag_type(node.payload.tag_type())?;
    sink.write_string(node.name.as_deref().unwrap_or_default())?;
    write_payload(sink, tree, handle, depth)
}

/// Writes only the payload of a tag, as it appears inside a list.
pub fn write_payload<W: Write>(
    sink: &mut NbtSink<W>,
    tree: &NbtTree,
    handle: TagHandle,
    depth: usize,
) -> Result<()> {
    match &tree.node(handle)?.payload {
        Payload::Value(value) => sink.write_value(value),
        Payload::List(list) => {
            check_depth(depth)?;
            if list.element != TagType::Unknown {
                sink.check_allowed(list.element)?;
            }
            sink.write_tag_type(list.element)?;
            sink.write_length(list.items.len())?;
            list.items
                .iter()
                .try_for_each(|&item| write_payload(sink, tree, item, depth + 1))
        }
        Payload::Compound(items) => {
            check_depth(depth)?;
            for &child in items {
                write_named(sink, tree, child, depth + 1)?;
            }
            sink.write_tag_type(TagType::End)
        }
    }
}
