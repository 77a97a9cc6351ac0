use std::sync::atomic::{AtomicU8, Ordering};

/// One encoding variant of the NBT format.
///
/// A flavor is an immutable bundle of six switches. The presets cover the format
/// generations found in the wild; [`Flavor::new`] and the builder methods make
/// anything in between.
///
/// # Example
///
/// ```
/// use nbt_flavors::Flavor;
///
/// let flavor = Flavor::JAVA.unnamed_root_tag(true);
/// assert_eq!(flavor, Flavor::JAVA_NETWORK);
/// assert!(Flavor::BEDROCK.uses_var_int());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Flavor {
    big_endian: bool,
    allow_list_root_tag: bool,
    allow_int_array: bool,
    allow_long_array: bool,
    unnamed_root_tag: bool,
    use_var_int: bool,
}

const BIG_ENDIAN: u8 = 1 << 0;
const ALLOW_LIST_ROOT_TAG: u8 = 1 << 1;
const ALLOW_INT_ARRAY: u8 = 1 << 2;
const ALLOW_LONG_ARRAY: u8 = 1 << 3;
const UNNAMED_ROOT_TAG: u8 = 1 << 4;
const USE_VAR_INT: u8 = 1 << 5;

static DEFAULT_FLAVOR: AtomicU8 = AtomicU8::new(Flavor::JAVA.to_bits());

impl Flavor {
    /// Big-endian, named compound root, no int or long arrays.
    pub const JAVA_LEGACY: Flavor = Flavor::new();

    /// [`JAVA_LEGACY`](Self::JAVA_LEGACY) plus int arrays.
    pub const JAVA_ANVIL: Flavor = Flavor::JAVA_LEGACY.allow_int_array(true);

    /// [`JAVA_ANVIL`](Self::JAVA_ANVIL) plus long arrays. The initial process default.
    pub const JAVA: Flavor = Flavor::JAVA_ANVIL.allow_long_array(true);

    /// [`JAVA`](Self::JAVA) with an unnamed root, as sent over the network.
    pub const JAVA_NETWORK: Flavor = Flavor::JAVA.unnamed_root_tag(true);

    /// Little-endian, VarInt integers, unnamed root, list roots permitted.
    pub const BEDROCK: Flavor = Flavor::JAVA
        .big_endian(false)
        .use_var_int(true)
        .unnamed_root_tag(true)
        .allow_list_root_tag(true);

    /// The most restrictive flavor: big-endian with a named compound root and no arrays
    /// beyond byte arrays.
    pub const fn new() -> Self {
        Self {
            big_endian: true,
            allow_list_root_tag: false,
            allow_int_array: false,
            allow_long_array: false,
            unnamed_root_tag: false,
            use_var_int: false,
        }
    }

    pub const fn big_endian(mut self, value: bool) -> Self {
        self.big_endian = value;
        self
    }

    pub const fn allow_list_root_tag(mut self, value: bool) -> Self {
        self.allow_list_root_tag = value;
        self
    }

    pub const fn allow_int_array(mut self, value: bool) -> Self {
        self.allow_int_array = value;
        self
    }

    pub const fn allow_long_array(mut self, value: bool) -> Self {
        self.allow_long_array = value;
        self
    }

    pub const fn unnamed_root_tag(mut self, value: bool) -> Self {
        self.unnamed_root_tag = value;
        self
    }

    pub const fn use_var_int(mut self, value: bool) -> Self {
        self.use_var_int = value;
        self
    }

    #[inline]
    pub const fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    #[inline]
    pub const fn allows_list_root_tag(&self) -> bool {
        self.allow_list_root_tag
    }

    #[inline]
    pub const fn allows_int_array(&self) -> bool {
        self.allow_int_array
    }

    #[inline]
    pub const fn allows_long_array(&self) -> bool {
        self.allow_long_array
    }

    #[inline]
    pub const fn has_unnamed_root_tag(&self) -> bool {
        self.unnamed_root_tag
    }

    #[inline]
    pub const fn uses_var_int(&self) -> bool {
        self.use_var_int
    }

    /// Whether a tag of this type may appear anywhere in a tree of this flavor.
    pub const fn allows(&self, tag: crate::TagType) -> bool {
        match tag {
            crate::TagType::IntArray => self.allow_int_array,
            crate::TagType::LongArray => self.allow_long_array,
            crate::TagType::Unknown => false,
            _ => true,
        }
    }

    /// Whether this type may be used as the root of a file.
    pub const fn allows_root(&self, tag: crate::TagType) -> bool {
        match tag {
            crate::TagType::Compound => true,
            crate::TagType::List => self.allow_list_root_tag,
            _ => false,
        }
    }

    pub(crate) const fn to_bits(self) -> u8 {
        let mut bits = 0;
        if self.big_endian {
            bits |= BIG_ENDIAN;
        }
        if self.allow_list_root_tag {
            bits |= ALLOW_LIST_ROOT_TAG;
        }
        if self.allow_int_array {
            bits |= ALLOW_INT_ARRAY;
        }
        if self.allow_long_array {
            bits |= ALLOW_LONG_ARRAY;
        }
        if self.unnamed_root_tag {
            bits |= UNNAMED_ROOT_TAG;
        }
        if self.use_var_int {
            bits |= USE_VAR_INT;
        }
        bits
    }

    pub(crate) const fn from_bits(bits: u8) -> Self {
        Self {
            big_endian: bits & BIG_ENDIAN != 0,
            allow_list_root_tag: bits & ALLOW_LIST_ROOT_TAG != 0,
            allow_int_array: bits & ALLOW_INT_ARRAY != 0,
            allow_long_array: bits & ALLOW_LONG_ARRAY != 0,
            unnamed_root_tag: bits & UNNAMED_ROOT_TAG != 0,
            use_var_int: bits & USE_VAR_INT != 0,
        }
    }

    /// The process-wide default, consulted when a file is created without an explicit
    /// flavor.
    pub fn default_flavor() -> Flavor {
        Flavor::from_bits(DEFAULT_FLAVOR.load(Ordering::Relaxed))
    }

    /// Replaces the process-wide default. Existing files keep the flavor they were
    /// created with.
    pub fn set_default_flavor(flavor: Flavor) {
        DEFAULT_FLAVOR.store(flavor.to_bits(), Ordering::Relaxed);
    }
}

impl Default for Flavor {
    /// Returns [`Flavor::default_flavor`], not the restrictive [`Flavor::new`].
    fn default() -> Self {
        Flavor::default_flavor()
    }
}
