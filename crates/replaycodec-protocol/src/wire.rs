//! Versioned wire grammar: structural tags and the signed varint.

use std::fmt;

use replaycodec_bits::BitCursor;

use crate::DecodeError;

/// Widest magnitude shift a varint may reach before it stops fitting in
/// an `i128`.
const MAX_VARINT_SHIFT: u32 = 120;

/// Deepest nesting of composite values any decoder follows. Real members
/// stay far below it; past it the input is taken to be corrupt.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Fails once `depth` passes [`MAX_NESTING_DEPTH`].
pub(crate) fn check_depth(depth: usize) -> Result<(), DecodeError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(DecodeError::DepthExceeded(MAX_NESTING_DEPTH));
    }
    Ok(())
}

/// The one-byte structural tag that prefixes every versioned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireTag {
    Array = 0,
    BitBlob = 1,
    Blob = 2,
    Choice = 3,
    Optional = 4,
    Struct = 5,
    /// Also carries `_bool`.
    U8 = 6,
    /// Also carries `_fourcc`.
    U32 = 7,
    U64 = 8,
    Varint = 9,
}

impl WireTag {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Reads one tag byte.
    pub fn read(cursor: &mut BitCursor<'_>) -> Result<Self, DecodeError> {
        let byte = read_u8(cursor)?;
        Self::try_from(byte)
    }
}

impl TryFrom<u8> for WireTag {
    type Error = DecodeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        let tag = match code {
            0 => Self::Array,
            1 => Self::BitBlob,
            2 => Self::Blob,
            3 => Self::Choice,
            4 => Self::Optional,
            5 => Self::Struct,
            6 => Self::U8,
            7 => Self::U32,
            8 => Self::U64,
            9 => Self::Varint,
            other => return Err(DecodeError::UnknownWireTag(other)),
        };
        Ok(tag)
    }
}

impl fmt::Display for WireTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Reads one byte as eight bits.
pub(crate) fn read_u8(cursor: &mut BitCursor<'_>) -> Result<u8, DecodeError> {
    // `read_bits(8)` never yields more than 8 bits.
    Ok(cursor.read_bits(8)? as u8)
}

/// Reads a signed varint.
///
/// The first byte holds the sign in bit 0 and the low six magnitude bits
/// in bits 1–6. While bit 7 of the last byte read is set, another byte
/// follows and contributes its low seven bits at the next free position
/// (6, 13, 20, ...).
///
/// # Errors
/// [`DecodeError::VarintOverflow`] if the magnitude would not fit in an
/// `i128`, or a truncation error from the cursor.
pub fn read_vint(cursor: &mut BitCursor<'_>) -> Result<i128, DecodeError> {
    let mut byte = read_u8(cursor)?;
    let negative = byte & 1 != 0;
    let mut magnitude = i128::from((byte >> 1) & 0x3F);
    let mut shift = 6u32;
    while byte & 0x80 != 0 {
        if shift > MAX_VARINT_SHIFT {
            return Err(DecodeError::VarintOverflow);
        }
        byte = read_u8(cursor)?;
        magnitude |= i128::from(byte & 0x7F) << shift;
        shift += 7;
    }
    Ok(if negative { -magnitude } else { magnitude })
}

/// Converts a decoded length or count to `usize`.
pub(crate) fn to_length(value: i128) -> Result<usize, DecodeError> {
    usize::try_from(value).map_err(|_| DecodeError::InvalidLength(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds the wire bytes of a varint, following the documented layout.
    fn encode_vint(value: i128) -> Vec<u8> {
        let mut magnitude = value.unsigned_abs();
        let mut first = ((magnitude & 0x3F) as u8) << 1;
        if value < 0 {
            first |= 1;
        }
        magnitude >>= 6;
        let mut out = vec![first];
        while magnitude != 0 {
            let last = out.len() - 1;
            out[last] |= 0x80;
            out.push((magnitude & 0x7F) as u8);
            magnitude >>= 7;
        }
        out
    }

    fn decode(bytes: &[u8]) -> i128 {
        let mut cursor = BitCursor::new(bytes);
        let value = read_vint(&mut cursor).unwrap();
        assert!(cursor.done(), "varint left bytes behind");
        value
    }

    #[test]
    fn test_single_byte_forms() {
        assert_eq!(decode(&[0x00]), 0);
        assert_eq!(decode(&[0x02]), 1);
        assert_eq!(decode(&[0x03]), -1);
        assert_eq!(decode(&[0x7E]), 63);
        assert_eq!(decode(&[0x7F]), -63);
    }

    #[test]
    fn test_continuation_bytes() {
        // 64: low six bits 0, continuation carries 1 at shift 6.
        assert_eq!(decode(&[0x80, 0x01]), 64);
        assert_eq!(decode(&[0x81, 0x01]), -64);
    }

    #[test]
    fn test_varint_law() {
        let samples = [
            0i128,
            1,
            -1,
            63,
            -63,
            64,
            -64,
            8191,
            8192,
            -8192,
            1 << 20,
            -(1 << 20) - 7,
            i128::from(i32::MAX),
            i128::from(i32::MIN),
            i128::from(i64::MAX),
            i128::from(i64::MIN),
            i128::from(u64::MAX),
        ];
        for value in samples {
            let bytes = encode_vint(value);
            assert_eq!(decode(&bytes), value, "bytes {bytes:02x?}");
        }
        assert_eq!(encode_vint(63).len(), 1);
        assert_eq!(encode_vint(64).len(), 2);
        assert_eq!(encode_vint(8192).len(), 3);
        assert!(encode_vint(1 << 20).len() >= 4);
    }

    #[test]
    fn test_overflow_is_reported() {
        let bytes = [0xFFu8; 24];
        let mut cursor = BitCursor::new(&bytes);
        assert!(matches!(
            read_vint(&mut cursor),
            Err(DecodeError::VarintOverflow)
        ));
    }

    #[test]
    fn test_truncated_varint() {
        let mut cursor = BitCursor::new(&[0x80]);
        assert!(read_vint(&mut cursor).unwrap_err().is_truncated());
    }

    #[test]
    fn test_wire_tags() {
        for code in 0..=9u8 {
            assert_eq!(WireTag::try_from(code).unwrap().code(), code);
        }
        assert!(matches!(
            WireTag::try_from(10),
            Err(DecodeError::UnknownWireTag(10))
        ));
    }

    #[test]
    fn test_to_length() {
        assert_eq!(to_length(3).unwrap(), 3);
        assert!(matches!(to_length(-1), Err(DecodeError::InvalidLength(-1))));
    }
}
