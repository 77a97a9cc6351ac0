use std::io::{self, Read};

use zerocopy::byteorder::{self, BigEndian, LittleEndian};

use crate::{Error, Flavor, MAX_DEPTH, MAX_STRING_LEN, Result, TagType, binary::varint, cold_path};

macro_rules! read_fixed {
    ($self:ident, $type:ident, $size:expr) => {{
        let bytes: [u8; $size] = $self.read_array()?;
        if $self.flavor.is_big_endian() {
            byteorder::$type::<BigEndian>::from_bytes(bytes).get()
        } else {
            byteorder::$type::<LittleEndian>::from_bytes(bytes).get()
        }
    }};
}

/// A byte source that decodes NBT primitives in one flavor.
///
/// The source counts every byte it consumes, so callers that only hold a
/// non-seekable reader still know how far they got.
pub struct NbtSource<R> {
    inner: R,
    flavor: Flavor,
    bytes_read: u64,
}

impl<R: Read> NbtSource<R> {
    pub fn new(inner: R, flavor: Flavor) -> Self {
        Self {
            inner,
            flavor,
            bytes_read: 0,
        }
    }

    #[inline]
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Number of bytes consumed so far, including skipped ones.
    #[inline]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        self.bytes_read += N as u64;
        Ok(buf)
    }

    fn read_var(&mut self, bits: u32) -> Result<i64> {
        let (raw, used) = varint::read_unsigned(&mut self.inner, bits)?;
        self.bytes_read += used as u64;
        Ok(varint::zigzag_decode(raw))
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads a type marker, failing on bytes that are not a known tag type.
    pub fn read_tag_type(&mut self) -> Result<TagType> {
        TagType::from_u8(self.read_u8()?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        if self.flavor.uses_var_int() {
            return Ok(self.read_var(16)? as i16);
        }
        Ok(read_fixed!(self, I16, 2))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        if self.flavor.uses_var_int() {
            return Ok(self.read_var(32)? as i32);
        }
        Ok(read_fixed!(self, I32, 4))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        if self.flavor.uses_var_int() {
            return self.read_var(64);
        }
        Ok(read_fixed!(self, I64, 8))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(read_fixed!(self, F32, 4))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(read_fixed!(self, F64, 8))
    }

    /// Reads a 32-bit length or element count. Negative values are rejected, never
    /// clamped.
    pub fn read_length(&mut self) -> Result<usize> {
        let len = self.read_i32()?;
        if len < 0 {
            cold_path();
            return Err(Error::NegativeLength(len));
        }
        Ok(len as usize)
    }

    fn read_string_len(&mut self) -> Result<usize> {
        // the prefix is big-endian in every flavor
        let bytes: [u8; 2] = self.read_array()?;
        Ok(byteorder::U16::<BigEndian>::from_bytes(bytes).get() as usize)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_string_len()?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(len.min(MAX_STRING_LEN));
        let got = (&mut self.inner).take(len as u64).read_to_end(&mut bytes)?;
        self.bytes_read += got as u64;
        if got != len {
            cold_path();
            return Err(Error::EndOfFile);
        }
        Ok(bytes)
    }

    pub fn read_byte_array(&mut self) -> Result<Vec<i8>> {
        let len = self.read_length()?;
        self.read_byte_elements(len)
    }

    pub fn read_int_array(&mut self) -> Result<Vec<i32>> {
        self.check_allowed(TagType::IntArray)?;
        let len = self.read_length()?;
        self.read_int_elements(len)
    }

    pub fn read_long_array(&mut self) -> Result<Vec<i64>> {
        self.check_allowed(TagType::LongArray)?;
        let len = self.read_length()?;
        self.read_long_elements(len)
    }

    /// Reads the elements of a byte array whose length was already read.
    pub(crate) fn read_byte_elements(&mut self, len: usize) -> Result<Vec<i8>> {
        Ok(self.read_bytes(len)?.into_iter().map(|b| b as i8).collect())
    }

    pub(crate) fn read_int_elements(&mut self, len: usize) -> Result<Vec<i32>> {
        let mut values = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            values.push(self.read_i32()?);
        }
        Ok(values)
    }

    pub(crate) fn read_long_elements(&mut self, len: usize) -> Result<Vec<i64>> {
        let mut values = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            values.push(self.read_i64()?);
        }
        Ok(values)
    }

    pub(crate) fn check_allowed(&self, tag: TagType) -> Result<()> {
        if !self.flavor.allows(tag) {
            cold_path();
            return Err(Error::DisallowedTag(tag));
        }
        Ok(())
    }

    /// Discards exactly `len` bytes.
    pub fn skip_bytes(&mut self, len: u64) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.inner).take(len), &mut io::sink())?;
        self.bytes_read += skipped;
        if skipped != len {
            cold_path();
            return Err(Error::EndOfFile);
        }
        Ok(())
    }

    pub fn skip_string(&mut self) -> Result<()> {
        let len = self.read_string_len()?;
        self.skip_bytes(len as u64)
    }

    /// Discards `count` consecutive values of a primitive type, or the elements of a
    /// numeric array.
    pub(crate) fn skip_primitives(&mut self, tag: TagType, count: usize) -> Result<()> {
        let var = self.flavor.uses_var_int();
        match tag {
            TagType::Short if var => (0..count).try_for_each(|_| self.read_i16().map(drop)),
            TagType::Int | TagType::IntArray if var => {
                (0..count).try_for_each(|_| self.read_i32().map(drop))
            }
            TagType::Long | TagType::LongArray if var => {
                (0..count).try_for_each(|_| self.read_i64().map(drop))
            }
            _ => match tag.fixed_width() {
                Some(width) => self.skip_bytes(width as u64 * count as u64),
                None => unreachable!("{tag} is not fixed-width"),
            },
        }
    }

    /// Discards the payload of a tag whose type byte (and name) were already read.
    ///
    /// Lists of primitives are skipped as one block when the flavor uses fixed-width
    /// integers; every other list element goes through this same routine.
    pub fn skip_payload(&mut self, tag: TagType) -> Result<()> {
        self.skip_payload_at(tag, 0)
    }

    pub(crate) fn skip_payload_at(&mut self, tag: TagType, depth: usize) -> Result<()> {
        match tag {
            TagType::End | TagType::Unknown => Err(Error::UnexpectedEnd),
            TagType::Byte
            | TagType::Short
            | TagType::Int
            | TagType::Long
            | TagType::Float
            | TagType::Double => self.skip_primitives(tag, 1),
            TagType::String => self.skip_string(),
            TagType::ByteArray | TagType::IntArray | TagType::LongArray => {
                self.check_allowed(tag)?;
                let len = self.read_length()?;
                self.skip_primitives(tag, len)
            }
            TagType::List => {
                check_depth(depth)?;
                let element = self.read_tag_type()?;
                let len = self.read_length()?;
                self.skip_list_elements(element, len, depth + 1)
            }
            TagType::Compound => {
                check_depth(depth)?;
                loop {
                    let child = self.read_tag_type()?;
                    if child == TagType::End {
                        return Ok(());
                    }
                    self.skip_string()?;
                    self.skip_payload_at(child, depth + 1)?;
                }
            }
        }
    }

    /// Discards `len` list elements of type `element`, after the list header.
    pub(crate) fn skip_list_elements(
        &mut self,
        element: TagType,
        len: usize,
        depth: usize,
    ) -> Result<()> {
        if element == TagType::End {
            if len > 0 {
                cold_path();
                return Err(Error::UnexpectedEnd);
            }
            return Ok(());
        }
        self.check_allowed(element)?;
        if element.is_primitive() {
            return self.skip_primitives(element, len);
        }
        for _ in 0..len {
            self.skip_payload_at(element, depth)?;
        }
        Ok(())
    }
}

#[inline]
pub(crate) fn check_depth(depth: usize) -> Result<()> {
    if depth >= MAX_DEPTH {
        cold_path();
        return Err(Error::NestingTooDeep);
    }
    Ok(())
}
