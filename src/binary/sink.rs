use std::io::Write;

use zerocopy::byteorder::{self, BigEndian, LittleEndian};

use crate::{Error, Flavor, MAX_STRING_LEN, Result, TagType, binary::varint, cold_path};

macro_rules! write_fixed {
    ($self:ident, $type:ident, $value:expr) => {{
        if $self.flavor.is_big_endian() {
            $self.write_raw(&byteorder::$type::<BigEndian>::new($value).to_bytes())
        } else {
            $self.write_raw(&byteorder::$type::<LittleEndian>::new($value).to_bytes())
        }
    }};
}

/// A byte sink that encodes NBT primitives in one flavor.
///
/// Like [`NbtSource`](crate::NbtSource) it counts what passes through it.
pub struct NbtSink<W> {
    inner: W,
    flavor: Flavor,
    bytes_written: u64,
}

impl<W: Write> NbtSink<W> {
    pub fn new(inner: W, flavor: Flavor) -> Self {
        Self {
            inner,
            flavor,
            bytes_written: 0,
        }
    }

    #[inline]
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(Error::IO)
    }

    #[inline]
    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(Error::IO)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    fn write_var(&mut self, value: i64) -> Result<()> {
        let used = varint::write_unsigned(&mut self.inner, varint::zigzag_encode(value))?;
        self.bytes_written += used as u64;
        Ok(())
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_raw(&[value])
    }

    #[inline]
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_raw(&[value as u8])
    }

    /// Writes a type marker. `Unknown` goes out as End, which is how an empty list
    /// with no element type is encoded.
    pub fn write_tag_type(&mut self, tag: TagType) -> Result<()> {
        let byte = match tag {
            TagType::Unknown => TagType::End as u8,
            tag => tag as u8,
        };
        self.write_u8(byte)
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        if self.flavor.uses_var_int() {
            return self.write_var(value as i64);
        }
        write_fixed!(self, I16, value)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        if self.flavor.uses_var_int() {
            return self.write_var(value as i64);
        }
        write_fixed!(self, I32, value)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        if self.flavor.uses_var_int() {
            return self.write_var(value);
        }
        write_fixed!(self, I64, value)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        write_fixed!(self, F32, value)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        write_fixed!(self, F64, value)
    }

    /// Writes a 32-bit length or element count.
    pub fn write_length(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len).map_err(|_| {
            cold_path();
            Error::Message(format!("length {len} does not fit in 32 bits"))
        })?;
        self.write_i32(len)
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        if bytes.len() > MAX_STRING_LEN {
            cold_path();
            return Err(Error::StringTooLong(bytes.len()));
        }
        // the prefix is big-endian in every flavor
        self.write_raw(&byteorder::U16::<BigEndian>::new(bytes.len() as u16).to_bytes())?;
        self.write_raw(bytes)
    }

    pub fn write_byte_array(&mut self, values: &[i8]) -> Result<()> {
        self.write_length(values.len())?;
        let bytes: Vec<u8> = values.iter().map(|&b| b as u8).collect();
        self.write_raw(&bytes)
    }

    pub fn write_int_array(&mut self, values: &[i32]) -> Result<()> {
        self.check_allowed(TagType::IntArray)?;
        self.write_length(values.len())?;
        values.iter().try_for_each(|&v| self.write_i32(v))
    }

    pub fn write_long_array(&mut self, values: &[i64]) -> Result<()> {
        self.check_allowed(TagType::LongArray)?;
        self.write_length(values.len())?;
        values.iter().try_for_each(|&v| self.write_i64(v))
    }

    pub(crate) fn check_allowed(&self, tag: TagType) -> Result<()> {
        if !self.flavor.allows(tag) {
            cold_path();
            return Err(Error::DisallowedTag(tag));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink(flavor: Flavor) -> NbtSink<Vec<u8>> {
        NbtSink::new(Vec::new(), flavor)
    }

    #[test]
    fn little_endian_int() {
        let mut out = sink(Flavor::JAVA.big_endian(false));
        out.write_i32(0x0102_0304).unwrap();
        assert_eq!(out.into_inner(), [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn var_int_long() {
        let mut out = sink(Flavor::BEDROCK);
        out.write_i64(-3).unwrap();
        out.write_i16(64).unwrap();
        assert_eq!(out.bytes_written(), 3);
        assert_eq!(out.into_inner(), [0x05, 0x80, 0x01]);
    }

    #[test]
    fn floats_ignore_var_int() {
        let mut out = sink(Flavor::BEDROCK);
        out.write_f32(1.0).unwrap();
        assert_eq!(out.into_inner(), 1.0f32.to_le_bytes());
    }

    #[test]
    fn unknown_list_type_is_written_as_end() {
        let mut out = sink(Flavor::JAVA);
        out.write_tag_type(TagType::Unknown).unwrap();
        assert_eq!(out.into_inner(), [0]);
    }

    #[test]
    fn oversized_string_is_rejected() {
        let long = "x".repeat(MAX_STRING_LEN + 1);
        let mut out = sink(Flavor::JAVA);
        assert!(matches!(
            out.write_string(&long),
            Err(Error::StringTooLong(65536))
        ));
        assert_eq!(out.bytes_written(), 0);
    }
}
