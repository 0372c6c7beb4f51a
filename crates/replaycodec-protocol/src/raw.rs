//! Schema-free structural decoding.
//!
//! Before a schema is chosen, a few fields of a versioned buffer still need
//! to be read (the protocol build number lives in the replay header). The
//! tag grammar alone is enough to walk the buffer; [`decode_raw`] keeps
//! what [`skip_instance`](crate::skip_instance) would discard, keyed by wire
//! field tags instead of schema names.

use std::collections::BTreeMap;

use replaycodec_bits::BitCursor;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::wire::{check_depth, read_u8, read_vint, to_length, WireTag};
use crate::DecodeError;

/// One tagged instance, decoded without a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Array(Vec<RawValue>),
    BitBlob { bits: usize, data: Vec<u8> },
    Blob(Vec<u8>),
    Choice { flag: i128, value: Box<RawValue> },
    Optional(Option<Box<RawValue>>),
    /// Field tag to value.
    Struct(BTreeMap<i128, RawValue>),
    /// A u8, u32 or u64 payload; multi-byte forms are big-endian.
    Unsigned(u64),
    Varint(i128),
}

impl RawValue {
    /// The element with field tag `tag`, if this is a struct.
    pub fn field(&self, tag: i128) -> Option<&RawValue> {
        match self {
            Self::Struct(fields) => fields.get(&tag),
            _ => None,
        }
    }

    /// Follows a chain of struct field tags.
    ///
    /// ```rust
    /// use replaycodec_bits::BitCursor;
    /// use replaycodec_protocol::decode_raw;
    ///
    /// // struct { 1: struct { 4: varint 7 } }
    /// let bytes = [0x05, 0x02, 0x02, 0x05, 0x02, 0x08, 0x09, 0x0E];
    /// let raw = decode_raw(&mut BitCursor::new(&bytes)).unwrap();
    /// assert_eq!(raw.path(&[1, 4]).and_then(|v| v.as_int()), Some(7));
    /// ```
    pub fn path(&self, tags: &[i128]) -> Option<&RawValue> {
        tags.iter().try_fold(self, |value, tag| value.field(*tag))
    }

    /// The integer payload of a varint or unsigned instance.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Self::Varint(value) => Some(*value),
            Self::Unsigned(value) => Some(i128::from(*value)),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Decodes one tagged instance, keeping everything.
///
/// # Errors
/// [`DecodeError::UnknownWireTag`] for a tag byte above 9,
/// [`DecodeError::DepthExceeded`] for composites nested past
/// [`MAX_NESTING_DEPTH`](crate::MAX_NESTING_DEPTH), or a truncation error
/// from the cursor.
pub fn decode_raw(cursor: &mut BitCursor<'_>) -> Result<RawValue, DecodeError> {
    decode_nested(cursor, 0)
}

fn decode_nested(cursor: &mut BitCursor<'_>, depth: usize) -> Result<RawValue, DecodeError> {
    let depth = depth + 1;
    check_depth(depth)?;
    let value = match WireTag::read(cursor)? {
        WireTag::Array => {
            let length = to_length(read_vint(cursor)?)?;
            let items = (0..length)
                .map(|_| decode_nested(cursor, depth))
                .collect::<Result<_, _>>()?;
            RawValue::Array(items)
        }
        WireTag::BitBlob => {
            let bits = to_length(read_vint(cursor)?)?;
            let data = cursor.read_blob(bits.div_ceil(8))?.to_vec();
            RawValue::BitBlob { bits, data }
        }
        WireTag::Blob => {
            let length = to_length(read_vint(cursor)?)?;
            RawValue::Blob(cursor.read_blob(length)?.to_vec())
        }
        WireTag::Choice => {
            let flag = read_vint(cursor)?;
            let value = Box::new(decode_nested(cursor, depth)?);
            RawValue::Choice { flag, value }
        }
        WireTag::Optional => {
            let present = read_u8(cursor)? != 0;
            RawValue::Optional(if present {
                Some(Box::new(decode_nested(cursor, depth)?))
            } else {
                None
            })
        }
        WireTag::Struct => {
            let count = to_length(read_vint(cursor)?)?;
            let mut fields = BTreeMap::new();
            for _ in 0..count {
                let tag = read_vint(cursor)?;
                fields.insert(tag, decode_nested(cursor, depth)?);
            }
            RawValue::Struct(fields)
        }
        WireTag::U8 => RawValue::Unsigned(read_unsigned(cursor, 1)?),
        WireTag::U32 => RawValue::Unsigned(read_unsigned(cursor, 4)?),
        WireTag::U64 => RawValue::Unsigned(read_unsigned(cursor, 8)?),
        WireTag::Varint => RawValue::Varint(read_vint(cursor)?),
    };
    Ok(value)
}

fn read_unsigned(cursor: &mut BitCursor<'_>, width: usize) -> Result<u64, DecodeError> {
    let bytes = cursor.read_aligned_bytes(width)?;
    Ok(bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Array(items) => items.serialize(serializer),
            Self::BitBlob { bits, data } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("bits", bits)?;
                map.serialize_entry("data", data)?;
                map.end()
            }
            Self::Blob(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
            Self::Choice { flag, value } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(&flag.to_string(), value)?;
                map.end()
            }
            Self::Optional(value) => value.serialize(serializer),
            Self::Struct(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (tag, value) in fields {
                    map.serialize_entry(&tag.to_string(), value)?;
                }
                map.end()
            }
            Self::Unsigned(value) => serializer.serialize_u64(*value),
            Self::Varint(value) => serializer.serialize_i128(*value),
        }
    }
}
