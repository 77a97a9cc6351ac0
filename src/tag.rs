use std::fmt;

use crate::{Error, Result};

/// The closed set of NBT tag kinds.
///
/// Every variant except [`Unknown`](TagType::Unknown) has its wire byte as the
/// discriminant. `Unknown` marks a type that has not been decided yet, such as the
/// element type of a list that has never held anything.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagType {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
    Unknown = 0xFF,
}

impl TagType {
    /// Decodes a wire byte.
    ///
    /// `0xFF` is not a wire value, so `Unknown` is never produced here.
    ///
    /// # Example
    ///
    /// ```
    /// use nbt_flavors::TagType;
    ///
    /// assert_eq!(TagType::from_u8(10).unwrap(), TagType::Compound);
    /// assert!(TagType::from_u8(13).is_err());
    /// ```
    pub fn from_u8(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::End,
            1 => Self::Byte,
            2 => Self::Short,
            3 => Self::Int,
            4 => Self::Long,
            5 => Self::Float,
            6 => Self::Double,
            7 => Self::ByteArray,
            8 => Self::String,
            9 => Self::List,
            10 => Self::Compound,
            11 => Self::IntArray,
            12 => Self::LongArray,
            _ => return Err(Error::InvalidTagType(value)),
        })
    }

    /// Returns `true` for the fixed-width numeric tags.
    ///
    /// Primitive tags are: Byte, Short, Int, Long, Float, Double.
    pub const fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Short | Self::Int | Self::Long | Self::Float | Self::Double
        )
    }

    /// Returns `true` for tags holding exactly one scalar: the primitives and String.
    pub const fn is_value(self) -> bool {
        self.is_primitive() || matches!(self, Self::String)
    }

    /// Returns `true` if this is an array tag type.
    ///
    /// Array tags are: ByteArray, IntArray, LongArray.
    pub const fn is_array(self) -> bool {
        matches!(self, Self::ByteArray | Self::IntArray | Self::LongArray)
    }

    /// Returns `true` if this is a composite tag type.
    ///
    /// Composite tags are: List, Compound.
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::List | Self::Compound)
    }

    /// Width in bytes of a fixed-width primitive, or of one array element.
    pub(crate) const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Byte | Self::ByteArray => Some(1),
            Self::Short => Some(2),
            Self::Int | Self::Float | Self::IntArray => Some(4),
            Self::Long | Self::Double | Self::LongArray => Some(8),
            _ => None,
        }
    }

    /// The `TAG_Xxx` spelling used by the pretty printer.
    pub const fn name(self) -> &'static str {
        match self {
            Self::End => "TAG_End",
            Self::Byte => "TAG_Byte",
            Self::Short => "TAG_Short",
            Self::Int => "TAG_Int",
            Self::Long => "TAG_Long",
            Self::Float => "TAG_Float",
            Self::Double => "TAG_Double",
            Self::ByteArray => "TAG_Byte_Array",
            Self::String => "TAG_String",
            Self::List => "TAG_List",
            Self::Compound => "TAG_Compound",
            Self::IntArray => "TAG_Int_Array",
            Self::LongArray => "TAG_Long_Array",
            Self::Unknown => "TAG_Unknown",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for TagType {
    type Error = Error;

    #[inline]
    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value)
    }
}
