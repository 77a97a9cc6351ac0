//! Whole-file loading and saving.
//!
//! [`NbtFile`] owns a tree with one root and knows how to move it through a
//! compression envelope. Reading can detect the compression from the first byte when
//! the source can be rewound; writing always needs an explicit choice.
//!
//! # Example
//!
//! ```
//! use nbt_flavors::{Compression, Flavor, NbtFile};
//!
//! let mut file = NbtFile::new(Flavor::JAVA);
//! let root = file.root();
//! let tree = file.tree_mut();
//! let answer = tree.create(42i32);
//! tree.compound_set(root, "answer", answer).unwrap();
//!
//! let mut bytes = Vec::new();
//! file.save_to_writer(&mut bytes, Compression::GZip).unwrap();
//!
//! let mut copy = NbtFile::new(Flavor::JAVA);
//! copy.load_from_buffer(&bytes, Compression::AutoDetect, None).unwrap();
//! let root = copy.root();
//! let answer = copy.tree().child(root, "answer").unwrap();
//! assert_eq!(copy.tree().value_as::<i32>(answer).unwrap(), 42);
//! ```

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;

use crate::{
    Error, Flavor, NbtSink, NbtSource, NbtTree, Result, Selector, TagHandle, codec, cold_path,
    tree::Payload,
};

mod compression;

pub use compression::*;

static DEFAULT_BUFFER_SIZE: AtomicUsize = AtomicUsize::new(8 * 1024);

/// The buffer size new [`NbtFile`]s start with. The cursors use their reader or
/// writer as given and never consult it.
pub fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE.load(Ordering::Relaxed)
}

/// Changes the buffer size used by files created from now on.
pub fn set_default_buffer_size(size: usize) -> Result<()> {
    if size == 0 {
        cold_path();
        return Err(Error::ZeroBufferSize);
    }
    DEFAULT_BUFFER_SIZE.store(size, Ordering::Relaxed);
    Ok(())
}

/// An NBT file: one root tag, its name, and how it was last stored.
#[derive(Clone, Debug)]
pub struct NbtFile {
    tree: NbtTree,
    root: Option<TagHandle>,
    flavor: Flavor,
    path: Option<PathBuf>,
    compression: Compression,
    buffer_size: usize,
}

impl Default for NbtFile {
    fn default() -> Self {
        Self::new(Flavor::default())
    }
}

impl NbtFile {
    pub fn new(flavor: Flavor) -> Self {
        Self {
            tree: NbtTree::new(),
            root: None,
            flavor,
            path: None,
            compression: Compression::AutoDetect,
            buffer_size: default_buffer_size(),
        }
    }

    /// Wraps an existing tree. `root` must be a detached compound, or a detached list
    /// when the flavor allows list roots.
    pub fn with_root(tree: NbtTree, root: TagHandle, flavor: Flavor) -> Result<Self> {
        let mut file = Self::new(flavor);
        file.tree = tree;
        file.set_root(root)?;
        Ok(file)
    }

    #[inline]
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Changes the flavor used by subsequent loads and saves.
    pub fn set_flavor(&mut self, flavor: Flavor) {
        self.flavor = flavor;
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn set_buffer_size(&mut self, size: usize) -> Result<()> {
        if size == 0 {
            cold_path();
            return Err(Error::ZeroBufferSize);
        }
        self.buffer_size = size;
        Ok(())
    }

    /// Path of the last file loaded or saved.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Compression of the last load or save; after an auto-detected load this is the
    /// detected one.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn tree(&self) -> &NbtTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut NbtTree {
        &mut self.tree
    }

    /// The root tag, created as an empty compound on first access.
    pub fn root(&mut self) -> TagHandle {
        if let Some(root) = self.root.filter(|&root| self.tree.is_live(root)) {
            return root;
        }
        let name = (!self.flavor.has_unnamed_root_tag()).then(String::new);
        let root = self.tree.alloc_raw(name, Payload::Compound(Vec::new()));
        self.root = Some(root);
        root
    }

    /// The root, if one exists, without creating it.
    pub fn try_root(&self) -> Option<TagHandle> {
        self.root.filter(|&root| self.tree.is_live(root))
    }

    /// Replaces the root. The previous root stays in the tree, detached.
    pub fn set_root(&mut self, root: TagHandle) -> Result<()> {
        let tag = self.tree.tag_type(root)?;
        if !self.flavor.allows_root(tag) {
            cold_path();
            return Err(Error::InvalidRoot(tag));
        }
        if self.tree.parent(root)?.is_some() {
            cold_path();
            return Err(Error::AlreadyParented);
        }
        self.root = Some(root);
        Ok(())
    }

    pub fn root_name(&self) -> Option<&str> {
        self.try_root()
            .and_then(|root| self.tree.name(root).ok().flatten())
    }

    pub fn set_root_name(&mut self, name: Option<&str>) -> Result<()> {
        let root = self.root();
        self.tree.rename(root, name)
    }

    /// Opens `path` and loads it, remembering the path and compression.
    pub fn load_from_file(
        &mut self,
        path: impl AsRef<Path>,
        compression: Compression,
        selector: Option<Selector<'_>>,
    ) -> Result<u64> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let read = self.load_from_seekable(file, compression, selector)?;
        debug!("loaded {} ({read} bytes, {})", path.display(), self.compression);
        self.path = Some(path.to_path_buf());
        Ok(read)
    }

    /// Loads from a source that can be rewound by one byte, so `AutoDetect` works.
    pub fn load_from_seekable<R: Read + Seek>(
        &mut self,
        mut reader: R,
        compression: Compression,
        selector: Option<Selector<'_>>,
    ) -> Result<u64> {
        let compression = resolve_compression(&mut reader, compression, self.flavor)?;
        self.load_from_reader(reader, compression, selector)
    }

    /// Loads from a forward-only source. `AutoDetect` fails with
    /// [`Error::NotSeekable`]; use [`load_from_seekable`](Self::load_from_seekable) for it.
    ///
    /// Returns the number of bytes taken from `reader`. With compression this includes
    /// whatever the decompressor buffered ahead.
    pub fn load_from_reader<R: Read>(
        &mut self,
        reader: R,
        compression: Compression,
        selector: Option<Selector<'_>>,
    ) -> Result<u64> {
        let mut counter = CountingReader::new(reader);
        let mut tree = NbtTree::new();
        let (root, consumed) = {
            let stream = decoder(&mut counter, compression, self.buffer_size)?;
            let mut source = NbtSource::new(stream, self.flavor);
            let root = codec::read_root(&mut source, &mut tree, selector)?;
            (root, source.bytes_read())
        };
        let read = match compression {
            Compression::None => consumed,
            _ => counter.count(),
        };
        debug!(
            "read {} root with {} tags ({read} bytes, {compression})",
            tree.tag_type(root)?,
            tree.tag_count()
        );
        self.tree = tree;
        self.root = Some(root);
        self.compression = compression;
        Ok(read)
    }

    /// Loads from an in-memory buffer.
    pub fn load_from_buffer(
        &mut self,
        data: &[u8],
        compression: Compression,
        selector: Option<Selector<'_>>,
    ) -> Result<u64> {
        self.load_from_seekable(std::io::Cursor::new(data), compression, selector)
    }

    /// Loads from a shared, reference-counted buffer.
    #[cfg(feature = "shared")]
    pub fn load_from_bytes(
        &mut self,
        data: bytes::Bytes,
        compression: Compression,
        selector: Option<Selector<'_>>,
    ) -> Result<u64> {
        self.load_from_seekable(std::io::Cursor::new(data), compression, selector)
    }

    /// Writes the file to `path`, remembering the path and compression.
    pub fn save_to_file(&mut self, path: impl AsRef<Path>, compression: Compression) -> Result<u64> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let written = self.save_to_writer(file, compression)?;
        debug!("saved {} ({written} bytes, {compression})", path.display());
        self.path = Some(path.to_path_buf());
        Ok(written)
    }

    /// Saves again to the path and with the compression of the last load or save.
    pub fn save(&mut self) -> Result<u64> {
        let Some(path) = self.path.clone() else {
            cold_path();
            return Err(Error::NoPath);
        };
        let compression = match self.compression {
            Compression::AutoDetect => Compression::None,
            other => other,
        };
        self.save_to_file(path, compression)
    }

    /// Serializes the root into `writer`, returning the number of bytes written to it.
    pub fn save_to_writer<W: Write>(&mut self, writer: W, compression: Compression) -> Result<u64> {
        let root = self.root();
        let mut counter = CountingWriter::new(writer);
        {
            let encoder = Encoder::new(&mut counter, compression, self.buffer_size)?;
            let mut sink = NbtSink::new(encoder, self.flavor);
            codec::write_root(&mut sink, &self.tree, root)?;
            sink.into_inner().finish()?;
        }
        self.compression = compression;
        Ok(counter.count())
    }

    /// Serializes the root into a fresh byte vector.
    pub fn save_to_buffer(&mut self, compression: Compression) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.save_to_writer(&mut buffer, compression)?;
        Ok(buffer)
    }
}

/// Peeks at the first byte of `reader` when `compression` is `AutoDetect`, then
/// rewinds it.
fn resolve_compression<R: Read + Seek>(
    reader: &mut R,
    compression: Compression,
    flavor: Flavor,
) -> Result<Compression> {
    if compression != Compression::AutoDetect {
        return Ok(compression);
    }
    let mut first = [0u8; 1];
    reader.read_exact(&mut first)?;
    reader.seek(SeekFrom::Current(-1))?;
    let detected = detect_compression(first[0], flavor)?;
    debug!("detected {detected} compression from byte {:#04x}", first[0]);
    Ok(detected)
}

/// Reads only the root tag's name from the file at `path`, without parsing the tree.
///
/// Returns `None` for flavors with unnamed roots.
pub fn read_root_name(path: impl AsRef<Path>, flavor: Flavor) -> Result<Option<String>> {
    let file = File::open(path)?;
    read_root_name_from(file, Compression::AutoDetect, flavor)
}

/// Like [`read_root_name`], for any rewindable source.
pub fn read_root_name_from<R: Read + Seek>(
    mut reader: R,
    compression: Compression,
    flavor: Flavor,
) -> Result<Option<String>> {
    let compression = resolve_compression(&mut reader, compression, flavor)?;
    let stream = decoder(reader, compression, default_buffer_size())?;
    let mut source = NbtSource::new(stream, flavor);
    let (_, name) = source.read_root_header()?;
    Ok(name)
}
