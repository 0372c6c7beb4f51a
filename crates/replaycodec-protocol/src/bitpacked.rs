//! The bit-packed grammar.

use replaycodec_bits::BitCursor;
use tracing::trace;

use crate::decoder::{Wire, WireDecoder};
use crate::merge::StructBuilder;
use crate::types::{Bounds, Field, TypeInfo, TypeRef};
use crate::wire::{check_depth, to_length};
use crate::{DecodeError, ProtocolContext, Value};

/// Decoder for dense, untagged members.
///
/// No tag is read or validated and nothing is skippable: the schema must
/// match the writer exactly. Kinds with no bit-packed form (`_choice`,
/// `_null`, `_real32`, `_real64`) fail with [`DecodeError::NoDecoder`].
pub struct BitPackedDecoder<'c, 'a> {
    ctx: &'c ProtocolContext,
    cursor: &'c mut BitCursor<'a>,
    /// Composite values currently open.
    depth: usize,
}

impl<'c, 'a> BitPackedDecoder<'c, 'a> {
    pub fn new(ctx: &'c ProtocolContext, cursor: &'c mut BitCursor<'a>) -> Self {
        Self {
            ctx,
            cursor,
            depth: 0,
        }
    }

    /// `lower + read_bits(width)`.
    fn int(&mut self, bounds: Bounds) -> Result<i128, DecodeError> {
        let raw = self.cursor.read_bits(bounds.bits)?;
        Ok(i128::from(bounds.offset) + i128::from(raw))
    }

    fn length(&mut self, bounds: Bounds) -> Result<usize, DecodeError> {
        let length = self.int(bounds)?;
        to_length(length)
    }

    fn bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.int(Bounds::new(0, 1))? != 0)
    }

    fn blob(&mut self, bounds: Bounds) -> Result<Value, DecodeError> {
        let length = self.length(bounds)?;
        Ok(Value::Blob(self.cursor.read_blob(length)?.to_vec()))
    }

    fn array(&mut self, bounds: Bounds, element: &TypeRef) -> Result<Value, DecodeError> {
        let length = self.length(bounds)?;
        let items = (0..length)
            .map(|_| self.decode(element))
            .collect::<Result<_, _>>()?;
        Ok(Value::Array(items))
    }

    fn bit_array(&mut self, bounds: Bounds) -> Result<Value, DecodeError> {
        let length = self.length(bounds)?;
        let mut bits = Vec::with_capacity(length.min(self.cursor.remaining_bits()));
        for _ in 0..length {
            bits.push(Value::Int(i128::from(self.cursor.read_bits(1)?)));
        }
        Ok(Value::Array(bits))
    }

    fn structure(&mut self, fields: &[Field]) -> Result<Value, DecodeError> {
        let mut builder = StructBuilder::new(fields.len());
        for field in fields {
            builder.decode_field(field, |type_ref| self.decode(type_ref))?;
        }
        Ok(builder.finish())
    }

    fn optional(&mut self, inner: &TypeRef) -> Result<Value, DecodeError> {
        if self.bool()? {
            self.decode(inner)
        } else {
            Ok(Value::Null)
        }
    }

    fn fourcc(&mut self) -> Result<Value, DecodeError> {
        Ok(Value::Blob(self.cursor.read_unaligned_bytes(4)?))
    }
}

impl<'a> WireDecoder<'a> for BitPackedDecoder<'_, 'a> {
    fn wire(&self) -> Wire {
        Wire::BitPacked
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
        trace!(%type_ref, kind = %info.kind(), bit = self.cursor.used_bits(), "bit-packed decode");
        check_depth(self.depth + 1)?;
        self.depth += 1;
        let result = self.dispatch(info);
        self.depth -= 1;
        result
    }
}

impl BitPackedDecoder<'_, '_> {
    /// A self-referencing struct reads no bits per level, so only the depth
    /// limit ends it.
    fn dispatch(&mut self, info: &TypeInfo) -> Result<Value, DecodeError> {
        match info {
            TypeInfo::Bool => self.bool().map(Value::Bool),
            TypeInfo::Int(bounds) => self.int(*bounds).map(Value::Int),
            TypeInfo::Blob(bounds) => self.blob(*bounds),
            TypeInfo::Array { bounds, element } => self.array(*bounds, element),
            TypeInfo::BitArray(bounds) => self.bit_array(*bounds),
            TypeInfo::Struct(fields) => self.structure(fields),
            TypeInfo::Optional(inner) => self.optional(inner),
            TypeInfo::FourCC => self.fourcc(),
            TypeInfo::Choice { .. } | TypeInfo::Null | TypeInfo::Real32 | TypeInfo::Real64 => {
                Err(DecodeError::NoDecoder { kind: info.kind() })
            }
        }
    }
}
