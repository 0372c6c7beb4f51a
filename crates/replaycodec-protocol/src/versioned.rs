//! The versioned grammar.
//!
//! Every value is prefixed by a [`WireTag`]. The decoder checks that tag
//! against the one the schema implies for the position and fails with
//! [`DecodeError::CorruptData`] on a mismatch.
//!
//! Struct elements carry their own field tags, which is what makes the
//! format forward compatible: a reader skips elements it does not expect
//! with [`skip_instance`], and a writer may leave trailing fields off.

use std::collections::BTreeMap;

use replaycodec_bits::BitCursor;
use tracing::{debug, trace};

use crate::decoder::{Wire, WireDecoder};
use crate::merge::StructBuilder;
use crate::types::{Field, TypeInfo, TypeRef, Variant};
use crate::wire::{check_depth, read_u8, read_vint, to_length, WireTag};
use crate::{DecodeError, ProtocolContext, Value};

/// Decoder for tagged, self-describing members.
pub struct VersionedDecoder<'c, 'a> {
    ctx: &'c ProtocolContext,
    cursor: &'c mut BitCursor<'a>,
    /// Composite values currently open.
    depth: usize,
}

impl<'c, 'a> VersionedDecoder<'c, 'a> {
    pub fn new(ctx: &'c ProtocolContext, cursor: &'c mut BitCursor<'a>) -> Self {
        Self {
            ctx,
            cursor,
            depth: 0,
        }
    }

    /// Reads the tag byte and checks it against `expected`.
    fn expect_tag(&mut self, expected: WireTag) -> Result<(), DecodeError> {
        let actual = read_u8(self.cursor)?;
        if actual != expected.code() {
            return Err(DecodeError::CorruptData {
                expected: expected.code(),
                actual,
            });
        }
        Ok(())
    }

    fn vint(&mut self) -> Result<i128, DecodeError> {
        read_vint(self.cursor)
    }

    fn length(&mut self) -> Result<usize, DecodeError> {
        let length = self.vint()?;
        to_length(length)
    }

    fn int(&mut self) -> Result<Value, DecodeError> {
        self.expect_tag(WireTag::Varint)?;
        self.vint().map(Value::Int)
    }

    fn bool(&mut self) -> Result<Value, DecodeError> {
        self.expect_tag(WireTag::U8)?;
        Ok(Value::Bool(read_u8(self.cursor)? != 0))
    }

    fn fourcc(&mut self) -> Result<Value, DecodeError> {
        self.expect_tag(WireTag::U32)?;
        Ok(Value::Blob(self.cursor.read_aligned_bytes(4)?.to_vec()))
    }

    fn blob(&mut self) -> Result<Value, DecodeError> {
        self.expect_tag(WireTag::Blob)?;
        let length = self.length()?;
        Ok(Value::Blob(self.cursor.read_blob(length)?.to_vec()))
    }

    fn optional(&mut self, inner: &TypeRef) -> Result<Value, DecodeError> {
        self.expect_tag(WireTag::Optional)?;
        if read_u8(self.cursor)? != 0 {
            self.decode(inner)
        } else {
            Ok(Value::Null)
        }
    }

    fn array(&mut self, element: &TypeRef) -> Result<Value, DecodeError> {
        self.expect_tag(WireTag::Array)?;
        let length = self.length()?;
        let items = (0..length)
            .map(|_| self.decode(element))
            .collect::<Result<_, _>>()?;
        Ok(Value::Array(items))
    }

    /// An unknown selector is tolerated: one instance is skipped and the
    /// result is an empty mapping.
    fn choice(&mut self, variants: &BTreeMap<i64, Variant>) -> Result<Value, DecodeError> {
        self.expect_tag(WireTag::Choice)?;
        let selector = self.vint()?;
        let variant = i64::try_from(selector)
            .ok()
            .and_then(|selector| variants.get(&selector));
        let Some(variant) = variant else {
            debug!(selector = %selector, "unknown choice selector, skipping instance");
            skip_nested(self.cursor, self.depth)?;
            return Ok(Value::empty_map());
        };
        let value = self.decode(&variant.type_ref)?;
        let mut map = BTreeMap::new();
        map.insert(variant.name.clone(), value);
        Ok(Value::Map(map))
    }

    /// Wire element `i` is matched against declared field `i` only. A tag
    /// mismatch, or an index past the declared fields, skips that one
    /// element; nothing is searched for.
    fn structure(&mut self, fields: &[Field]) -> Result<Value, DecodeError> {
        self.expect_tag(WireTag::Struct)?;
        let count = self.length()?;
        let mut builder = StructBuilder::new(fields.len());
        for index in 0..count {
            let tag = self.vint()?;
            match fields.get(index) {
                Some(field) if field.tag.map(i128::from) == Some(tag) => {
                    builder.decode_field(field, |type_ref| self.decode(type_ref))?;
                }
                field => {
                    trace!(
                        index,
                        tag = %tag,
                        expected = ?field.and_then(|f| f.tag),
                        "skipping struct element"
                    );
                    skip_nested(self.cursor, self.depth)?;
                }
            }
        }
        Ok(builder.finish())
    }
}

impl<'a> WireDecoder<'a> for VersionedDecoder<'_, 'a> {
    fn wire(&self) -> Wire {
        Wire::Versioned
    }

    fn context(&self) -> &ProtocolContext {
        self.ctx
    }

    fn cursor(&mut self) -> &mut BitCursor<'a> {
        self.cursor
    }

    fn decode(&mut self, type_ref: &TypeRef) -> Result<Value, DecodeError> {
        let ctx = self.ctx;
        let info = ctx.resolve(type_ref)?;
        trace!(%type_ref, kind = %info.kind(), bit = self.cursor.used_bits(), "versioned decode");
        check_depth(self.depth + 1)?;
        self.depth += 1;
        let result = self.dispatch(info);
        self.depth -= 1;
        result
    }
}

impl VersionedDecoder<'_, '_> {
    fn dispatch(&mut self, info: &TypeInfo) -> Result<Value, DecodeError> {
        match info {
            TypeInfo::Int(_) => self.int(),
            TypeInfo::Bool => self.bool(),
            TypeInfo::FourCC => self.fourcc(),
            TypeInfo::Blob(_) => self.blob(),
            TypeInfo::Optional(inner) => self.optional(inner),
            TypeInfo::Array { element, .. } => self.array(element),
            TypeInfo::Choice { variants, .. } => self.choice(variants),
            TypeInfo::Struct(fields) => self.structure(fields),
            TypeInfo::BitArray(_) | TypeInfo::Null | TypeInfo::Real32 | TypeInfo::Real64 => {
                Err(DecodeError::NotImplemented { kind: info.kind() })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Schema-free skip
// ---------------------------------------------------------------------------

/// Discards exactly one tagged instance, with no schema.
///
/// Composites are walked recursively using the tag and varint grammar
/// alone. A bit-blob discards `ceil(bits / 8)` bytes.
///
/// # Errors
/// [`DecodeError::UnknownWireTag`] for a tag byte above 9,
/// [`DecodeError::DepthExceeded`] for composites nested past
/// [`MAX_NESTING_DEPTH`](crate::MAX_NESTING_DEPTH), or a truncation error
/// from the cursor.
pub fn skip_instance(cursor: &mut BitCursor<'_>) -> Result<(), DecodeError> {
    skip_nested(cursor, 0)
}

/// [`skip_instance`] for an instance found `depth` composites down.
fn skip_nested(cursor: &mut BitCursor<'_>, depth: usize) -> Result<(), DecodeError> {
    let depth = depth + 1;
    check_depth(depth)?;
    match WireTag::read(cursor)? {
        WireTag::Array => {
            let length = to_length(read_vint(cursor)?)?;
            for _ in 0..length {
                skip_nested(cursor, depth)?;
            }
        }
        WireTag::BitBlob => {
            let bits = to_length(read_vint(cursor)?)?;
            cursor.read_blob(bits.div_ceil(8))?;
        }
        WireTag::Blob => {
            let length = to_length(read_vint(cursor)?)?;
            cursor.read_blob(length)?;
        }
        WireTag::Choice => {
            read_vint(cursor)?;
            skip_nested(cursor, depth)?;
        }
        WireTag::Optional => {
            if read_u8(cursor)? != 0 {
                skip_nested(cursor, depth)?;
            }
        }
        WireTag::Struct => {
            let count = to_length(read_vint(cursor)?)?;
            for _ in 0..count {
                read_vint(cursor)?;
                skip_nested(cursor, depth)?;
            }
        }
        WireTag::U8 => {
            cursor.read_aligned_bytes(1)?;
        }
        WireTag::U32 => {
            cursor.read_aligned_bytes(4)?;
        }
        WireTag::U64 => {
            cursor.read_aligned_bytes(8)?;
        }
        WireTag::Varint => {
            read_vint(cursor)?;
        }
    }
    Ok(())
}
