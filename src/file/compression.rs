use std::fmt::{self, Display};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};

use crate::{Error, Flavor, Result, TagType, cold_path};

const GZIP_MAGIC: u8 = 0x1F;
const ZLIB_MAGIC: u8 = 0x78;

/// Compression envelope around a serialized root.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Compression {
    /// Raw, uncompressed tags.
    None,
    GZip,
    /// Deflate with a two-byte header and a trailing Adler-32 checksum.
    ZLib,
    /// Decide from the first byte of the input. Only valid for reading.
    #[default]
    AutoDetect,
}

impl Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Compression::None => "none",
            Compression::GZip => "gzip",
            Compression::ZLib => "zlib",
            Compression::AutoDetect => "auto-detect",
        })
    }
}

/// Picks the compression a stream uses from its first byte.
///
/// A compound marker (or a list marker, if the flavor allows list roots) means the
/// stream is uncompressed.
///
/// ```
/// use nbt_flavors::{Compression, Flavor, detect_compression};
///
/// assert_eq!(detect_compression(0x1F, Flavor::JAVA).unwrap(), Compression::GZip);
/// assert_eq!(detect_compression(0x0A, Flavor::JAVA).unwrap(), Compression::None);
/// assert!(detect_compression(0x09, Flavor::JAVA).is_err());
/// ```
pub fn detect_compression(first: u8, flavor: Flavor) -> Result<Compression> {
    match first {
        GZIP_MAGIC => Ok(Compression::GZip),
        ZLIB_MAGIC => Ok(Compression::ZLib),
        b if b == TagType::Compound as u8 => Ok(Compression::None),
        b if b == TagType::List as u8 && flavor.allows_list_root_tag() => Ok(Compression::None),
        other => {
            cold_path();
            Err(Error::InvalidCompression(other))
        }
    }
}

/// Passes reads through, counting the bytes.
pub(crate) struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R> CountingReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// Passes writes through, counting the bytes.
pub(crate) struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W> CountingWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Checks the two zlib header bytes: deflate method, a valid check sum and no preset
/// dictionary.
fn check_zlib_header(header: [u8; 2]) -> Result<()> {
    let [cmf, flg] = header;
    let check = ((u16::from(cmf) << 8) | u16::from(flg)) % 31;
    if cmf != ZLIB_MAGIC || check != 0 || flg & 0x20 != 0 {
        cold_path();
        return Err(Error::InvalidZlibHeader);
    }
    Ok(())
}

/// Wraps `reader` in the decompressor for `compression`, behind a buffer of
/// `buffer_size` bytes.
pub(crate) fn decoder<'a, R: Read + 'a>(
    mut reader: R,
    compression: Compression,
    buffer_size: usize,
) -> Result<Box<dyn Read + 'a>> {
    Ok(match compression {
        Compression::None => Box::new(BufReader::with_capacity(buffer_size, reader)),
        Compression::GZip => Box::new(BufReader::with_capacity(
            buffer_size,
            GzDecoder::new(BufReader::with_capacity(buffer_size, reader)),
        )),
        Compression::ZLib => {
            let mut header = [0u8; 2];
            reader.read_exact(&mut header)?;
            check_zlib_header(header)?;
            let stream = Cursor::new(header).chain(BufReader::with_capacity(buffer_size, reader));
            Box::new(BufReader::with_capacity(buffer_size, ZlibDecoder::new(stream)))
        }
        Compression::AutoDetect => {
            cold_path();
            return Err(Error::NotSeekable);
        }
    })
}

/// Output side of a compression envelope. [`Encoder::finish`] must be called to
/// write trailers and flush every layer.
pub(crate) enum Encoder<W: Write> {
    Plain(BufWriter<W>),
    GZip(BufWriter<GzEncoder<W>>),
    ZLib(BufWriter<ZlibEncoder<W>>),
}

impl<W: Write> Encoder<W> {
    pub(crate) fn new(writer: W, compression: Compression, buffer_size: usize) -> Result<Self> {
        let level = flate2::Compression::default();
        Ok(match compression {
            Compression::None => Encoder::Plain(BufWriter::with_capacity(buffer_size, writer)),
            Compression::GZip => Encoder::GZip(BufWriter::with_capacity(
                buffer_size,
                GzEncoder::new(writer, level),
            )),
            Compression::ZLib => Encoder::ZLib(BufWriter::with_capacity(
                buffer_size,
                ZlibEncoder::new(writer, level),
            )),
            Compression::AutoDetect => {
                cold_path();
                return Err(Error::CompressionRequired);
            }
        })
    }

    /// Flushes buffers, writes any trailer, and returns the underlying writer.
    pub(crate) fn finish(self) -> Result<W> {
        let mut writer = match self {
            Encoder::Plain(buffer) => buffer.into_inner().map_err(|e| e.into_error())?,
            Encoder::GZip(buffer) => buffer.into_inner().map_err(|e| e.into_error())?.finish()?,
            Encoder::ZLib(buffer) => buffer.into_inner().map_err(|e| e.into_error())?.finish()?,
        };
        writer.flush()?;
        Ok(writer)
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::Plain(w) => w.write(buf),
            Encoder::GZip(w) => w.write(buf),
            Encoder::ZLib(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::Plain(w) => w.flush(),
            Encoder::GZip(w) => w.flush(),
            Encoder::ZLib(w) => w.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_table() {
        assert_eq!(detect_compression(0x1F, Flavor::JAVA).unwrap(), Compression::GZip);
        assert_eq!(detect_compression(0x78, Flavor::JAVA).unwrap(), Compression::ZLib);
        assert_eq!(detect_compression(0x0A, Flavor::JAVA).unwrap(), Compression::None);
        assert_eq!(detect_compression(0x09, Flavor::BEDROCK).unwrap(), Compression::None);
        assert!(matches!(
            detect_compression(0x09, Flavor::JAVA),
            Err(Error::InvalidCompression(0x09))
        ));
        for byte in [0x00, 0x01, 0x08, 0x0B, 0x1E, 0x79, 0xFF] {
            assert!(matches!(
                detect_compression(byte, Flavor::BEDROCK),
                Err(Error::InvalidCompression(b)) if b == byte
            ));
        }
    }

    #[test]
    fn zlib_headers() {
        assert!(check_zlib_header([0x78, 0x9C]).is_ok());
        assert!(check_zlib_header([0x78, 0x01]).is_ok());
        assert!(check_zlib_header([0x78, 0xDA]).is_ok());
        assert!(matches!(
            check_zlib_header([0x78, 0x00]),
            Err(Error::InvalidZlibHeader)
        ));
        // FDICT set, check bits valid
        assert!(matches!(
            check_zlib_header([0x78, 0xBB]),
            Err(Error::InvalidZlibHeader)
        ));
    }

    #[test]
    fn counting_wrappers_count() {
        let mut reader = CountingReader::new(&[1u8, 2, 3, 4][..]);
        let mut buf = [0u8; 3];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(reader.count(), 3);

        let mut writer = CountingWriter::new(Vec::new());
        writer.write_all(b"hello").unwrap();
        assert_eq!(writer.count(), 5);
    }

    #[test]
    fn zlib_encoder_appends_adler32() {
        let mut encoder = Encoder::new(Vec::new(), Compression::ZLib, 64).unwrap();
        encoder.write_all(b"Wikipedia").unwrap();
        let bytes = encoder.finish().unwrap();
        // Adler-32 of "Wikipedia" is 0x11E60398
        assert_eq!(&bytes[bytes.len() - 4..], &[0x11, 0xE6, 0x03, 0x98]);
    }
}
