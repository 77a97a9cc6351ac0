use std::io::{Read, Write};

use crate::{Error, Result};

/// Maximum number of 7-bit groups for a value of `bits` width.
#[inline]
pub(crate) const fn max_groups(bits: u32) -> u32 {
    bits.div_ceil(7)
}

#[inline]
pub(crate) const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub(crate) const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Writes `value` as base-128 groups, least significant first. Returns the byte count.
pub(crate) fn write_unsigned(mut writer: impl Write, mut value: u64) -> Result<usize> {
    let mut buf = [0u8; 10];
    let mut len = 0;
    loop {
        let group = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf[len] = group;
            len += 1;
            break;
        }
        buf[len] = group | 0x80;
        len += 1;
    }
    writer.write_all(&buf[..len])?;
    Ok(len)
}

/// Reads base-128 groups for a value of `bits` width. Returns the value and the number
/// of bytes consumed.
pub(crate) fn read_unsigned(mut reader: impl Read, bits: u32) -> Result<(u64, usize)> {
    let limit = max_groups(bits);
    let mut value = 0u64;
    let mut count = 0u32;
    loop {
        if count == limit {
            return Err(Error::VarIntTooLong);
        }
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        value |= u64::from(byte[0] & 0x7F) << (7 * count);
        count += 1;
        if byte[0] & 0x80 == 0 {
            break;
        }
    }
    if bits < 64 && value >> bits != 0 {
        return Err(Error::VarIntTooLong);
    }
    Ok((value, count as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn encode(value: i64) -> Vec<u8> {
        let mut out = Vec::new();
        write_unsigned(&mut out, zigzag_encode(value)).unwrap();
        out
    }

    #[test]
    fn zigzag_small_values() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_encode(i64::MIN), u64::MAX);
    }

    #[test]
    fn groups_are_little_endian() {
        assert_eq!(encode(0), [0x00]);
        assert_eq!(encode(-1), [0x01]);
        assert_eq!(encode(64), [0x80, 0x01]);
        assert_eq!(encode(150), [0xAC, 0x02]);
    }

    #[test]
    fn rejects_too_many_groups() {
        let data = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert!(matches!(
            read_unsigned(&data[..], 32),
            Err(Error::VarIntTooLong)
        ));
        assert_eq!(read_unsigned(&data[..], 64).unwrap(), (1 << 35, 6));
    }

    #[test]
    fn rejects_overflowing_width() {
        // five groups but the top group sets bit 34
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        assert!(matches!(
            read_unsigned(&data[..], 32),
            Err(Error::VarIntTooLong)
        ));
    }

    #[test]
    fn truncated_input_is_end_of_file() {
        assert!(matches!(
            read_unsigned(&[0x80u8][..], 32),
            Err(Error::EndOfFile)
        ));
    }

    #[quickcheck]
    fn round_trip_i64(value: i64) -> bool {
        let bytes = encode(value);
        let (raw, used) = read_unsigned(&bytes[..], 64).unwrap();
        used == bytes.len() && zigzag_decode(raw) == value
    }

    #[quickcheck]
    fn round_trip_i32(value: i32) -> bool {
        let bytes = encode(value as i64);
        let (raw, _) = read_unsigned(&bytes[..], 32).unwrap();
        bytes.len() <= 5 && zigzag_decode(raw) == value as i64
    }
}
