//! The decoder seam shared by both wire modes.
//!
//! Replay members use one of two incompatible grammars:
//!
//! - **bit-packed**: dense, no tags, fields laid out back to back at bit
//!   granularity. Used by `replay.initData` and the game/message streams.
//! - **versioned**: every value starts with a one-byte structural tag, and
//!   struct fields carry their own tags so older readers can skip fields
//!   they do not know. Used by the header, details and tracker stream.
//!
//! Both are driven by the same [`ProtocolContext`] and produce the same
//! [`Value`] tree. The [`WireDecoder`] trait is the seam between them: code
//! that does not care which grammar it is reading (the event-stream loop,
//! for one) is written once against the trait.

use replaycodec_bits::BitCursor;
use serde::{Deserialize, Serialize};

use crate::bitpacked::BitPackedDecoder;
use crate::types::TypeRef;
use crate::versioned::VersionedDecoder;
use crate::{DecodeError, ProtocolContext, Value};

/// Which grammar a buffer is encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wire {
    BitPacked,
    #[default]
    Versioned,
}

/// A schema-driven decoder bound to one context and one cursor.
///
/// Implementations hold `&ProtocolContext` (shared, read-only) and
/// `&mut BitCursor` (exclusive to this decode call tree). Calling
/// [`decode`](Self::decode) repeatedly reads consecutive values.
pub trait WireDecoder<'a> {
    /// The grammar this decoder reads.
    fn wire(&self) -> Wire;

    fn context(&self) -> &ProtocolContext;

    /// The underlying cursor, for alignment and bit accounting.
    fn cursor(&mut self) -> &mut BitCursor<'a>;

    /// Decodes one value of the referenced type.
    ///
    /// # Errors
    /// [`DecodeError::UnknownType`] if the reference does not resolve,
    /// otherwise whatever the grammar raises for malformed or truncated
    /// data.
    fn decode(&mut self, type_ref: &TypeRef) -> Result<Value, DecodeError>;
}

/// Decodes one bit-packed value.
///
/// ```rust
/// use replaycodec_bits::BitCursor;
/// use replaycodec_protocol::{decode_bit_packed, ProtocolContext, Value};
///
/// let ctx = ProtocolContext::from_source("typeinfos = [('_int',[(5,3)])]").unwrap();
/// let mut cursor = BitCursor::new(&[0b101]);
///
/// assert_eq!(decode_bit_packed(&ctx, &mut cursor, 0u32).unwrap(), Value::Int(10));
/// ```
pub fn decode_bit_packed(
    ctx: &ProtocolContext,
    cursor: &mut BitCursor<'_>,
    type_ref: impl Into<TypeRef>,
) -> Result<Value, DecodeError> {
    BitPackedDecoder::new(ctx, cursor).decode(&type_ref.into())
}

/// Decodes one versioned value.
pub fn decode_versioned(
    ctx: &ProtocolContext,
    cursor: &mut BitCursor<'_>,
    type_ref: impl Into<TypeRef>,
) -> Result<Value, DecodeError> {
    VersionedDecoder::new(ctx, cursor).decode(&type_ref.into())
}

/// Decodes one value with the given grammar.
pub fn decode(
    wire: Wire,
    ctx: &ProtocolContext,
    cursor: &mut BitCursor<'_>,
    type_ref: impl Into<TypeRef>,
) -> Result<Value, DecodeError> {
    match wire {
        Wire::BitPacked => decode_bit_packed(ctx, cursor, type_ref),
        Wire::Versioned => decode_versioned(ctx, cursor, type_ref),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_defaults_to_versioned() {
        assert_eq!(Wire::default(), Wire::Versioned);
    }

    #[test]
    fn test_wire_serde_names() {
        assert_eq!(
            serde_json::to_string(&Wire::BitPacked).unwrap(),
            "\"bit_packed\""
        );
        let wire: Wire = serde_json::from_str("\"versioned\"").unwrap();
        assert_eq!(wire, Wire::Versioned);
    }

    #[test]
    fn test_dispatch_by_wire() {
        let ctx = ProtocolContext::from_source("typeinfos = [('_bool',[])]").unwrap();

        let mut cursor = BitCursor::new(&[0x01]);
        assert_eq!(
            decode(Wire::BitPacked, &ctx, &mut cursor, 0u32).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(cursor.used_bits(), 1);

        let mut cursor = BitCursor::new(&[0x06, 0x00]);
        assert_eq!(
            decode(Wire::Versioned, &ctx, &mut cursor, 0u32).unwrap(),
            Value::Bool(false)
        );
        assert!(cursor.done());
    }
}
