use crate::TagType;

/// The payload of a value tag or array tag.
///
/// This is what a cursor hands out from `read_value`, and what a tree node of one of
/// these kinds stores. Containers are not values: their children live in the tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Value {
    #[inline]
    pub fn tag_type(&self) -> TagType {
        match self {
            Value::Byte(_) => TagType::Byte,
            Value::Short(_) => TagType::Short,
            Value::Int(_) => TagType::Int,
            Value::Long(_) => TagType::Long,
            Value::Float(_) => TagType::Float,
            Value::Double(_) => TagType::Double,
            Value::ByteArray(_) => TagType::ByteArray,
            Value::String(_) => TagType::String,
            Value::IntArray(_) => TagType::IntArray,
            Value::LongArray(_) => TagType::LongArray,
        }
    }

    /// The zero value of a value or array tag type.
    pub fn default_for(tag: TagType) -> Option<Value> {
        Some(match tag {
            TagType::Byte => Value::Byte(0),
            TagType::Short => Value::Short(0),
            TagType::Int => Value::Int(0),
            TagType::Long => Value::Long(0),
            TagType::Float => Value::Float(0.0),
            TagType::Double => Value::Double(0.0),
            TagType::ByteArray => Value::ByteArray(Vec::new()),
            TagType::String => Value::String(String::new()),
            TagType::IntArray => Value::IntArray(Vec::new()),
            TagType::LongArray => Value::LongArray(Vec::new()),
            _ => return None,
        })
    }

    /// Equality that treats floats bit-for-bit, so a NaN equals the same NaN.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }

    /// Integral view of any primitive, for callers that don't care about width.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Byte(v) => Some(v as i64),
            Value::Short(v) => Some(v as i64),
            Value::Int(v) => Some(v as i64),
            Value::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric view of any primitive; integers are widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v as f64),
            Value::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Element count for arrays, byte length for strings.
    pub fn element_count(&self) -> Option<usize> {
        match self {
            Value::ByteArray(v) => Some(v.len()),
            Value::String(v) => Some(v.len()),
            Value::IntArray(v) => Some(v.len()),
            Value::LongArray(v) => Some(v.len()),
            _ => None,
        }
    }
}

/// Mutable access to a value in place. The variant, and so the tag type, is fixed.
pub enum ValueMut<'a> {
    Byte(&'a mut i8),
    Short(&'a mut i16),
    Int(&'a mut i32),
    Long(&'a mut i64),
    Float(&'a mut f32),
    Double(&'a mut f64),
    ByteArray(&'a mut Vec<i8>),
    String(&'a mut String),
    IntArray(&'a mut Vec<i32>),
    LongArray(&'a mut Vec<i64>),
}

impl<'a> From<&'a mut Value> for ValueMut<'a> {
    fn from(value: &'a mut Value) -> Self {
        match value {
            Value::Byte(v) => ValueMut::Byte(v),
            Value::Short(v) => ValueMut::Short(v),
            Value::Int(v) => ValueMut::Int(v),
            Value::Long(v) => ValueMut::Long(v),
            Value::Float(v) => ValueMut::Float(v),
            Value::Double(v) => ValueMut::Double(v),
            Value::ByteArray(v) => ValueMut::ByteArray(v),
            Value::String(v) => ValueMut::String(v),
            Value::IntArray(v) => ValueMut::IntArray(v),
            Value::LongArray(v) => ValueMut::LongArray(v),
        }
    }
}

/// Rust types that map onto exactly one value tag type.
pub trait FromValue: Clone + Sized {
    const TAG_TYPE: TagType;

    fn from_ref(value: &Value) -> Option<&Self>;

    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! value_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const TAG_TYPE: TagType = TagType::$variant;

                #[inline]
                fn from_ref(value: &Value) -> Option<&Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                #[inline]
                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_type!(
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Vec<i8> => ByteArray,
    String => String,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
);

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<&[i8]> for Value {
    fn from(value: &[i8]) -> Self {
        Value::ByteArray(value.to_vec())
    }
}

impl From<&[i32]> for Value {
    fn from(value: &[i32]) -> Self {
        Value::IntArray(value.to_vec())
    }
}

impl From<&[i64]> for Value {
    fn from(value: &[i64]) -> Self {
        Value::LongArray(value.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_exist_for_value_and_array_types_only() {
        for tag in [
            TagType::Byte,
            TagType::Short,
            TagType::Int,
            TagType::Long,
            TagType::Float,
            TagType::Double,
            TagType::ByteArray,
            TagType::String,
            TagType::IntArray,
            TagType::LongArray,
        ] {
            let value = Value::default_for(tag).unwrap();
            assert_eq!(value.tag_type(), tag);
        }
        assert_eq!(Value::default_for(TagType::String), Some(Value::String(String::new())));
        for tag in [TagType::End, TagType::List, TagType::Compound, TagType::Unknown] {
            assert_eq!(Value::default_for(tag), None);
        }
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::Short(-7).as_i64(), Some(-7));
        assert_eq!(Value::Float(1.5).as_i64(), None);

        assert_eq!(Value::Byte(-3).as_f64(), Some(-3.0));
        assert_eq!(Value::Long(1 << 40).as_f64(), Some((1i64 << 40) as f64));
        assert_eq!(Value::Float(0.25).as_f64(), Some(0.25));
        assert_eq!(Value::Double(-2.5).as_f64(), Some(-2.5));
        assert_eq!(Value::String("1".into()).as_f64(), None);
        assert_eq!(Value::IntArray(vec![1]).as_f64(), None);
    }
}
