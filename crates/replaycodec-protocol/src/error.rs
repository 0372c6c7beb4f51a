//! Error types for the protocol layer.
//!
//! Two enums, split by *when* they happen:
//!
//! - [`ProtocolError`] — while building a [`ProtocolContext`](crate::ProtocolContext)
//!   at startup. Any of these means no context exists at all.
//! - [`DecodeError`] — while decoding one buffer. These abort that one
//!   decode call; the context is unaffected.

use replaycodec_bits::BitsError;
use replaycodec_schema::SchemaError;

use crate::types::{Kind, TypeRef};

/// Errors raised while compiling a schema into a type table.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The schema source itself did not load.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A descriptor names a kind no decoder knows about.
    ///
    /// Rejected here rather than at decode time, so a table that builds
    /// only ever contains kinds the decoders can dispatch on.
    #[error("type {id}: unknown kind `{kind}`")]
    UnknownKind { id: u32, kind: String },

    /// A descriptor has the wrong shape for its kind, e.g. an `_int`
    /// without bounds or a struct field without a name.
    #[error("type {id}: malformed descriptor: {reason}")]
    MalformedDescriptor { id: u32, reason: String },

    /// The supplemental table was not valid JSON.
    #[error("supplemental type table: {0}")]
    Supplemental(#[source] serde_json::Error),
}

/// Errors raised while decoding a buffer.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The type reference resolves to no entry in either table.
    #[error("unknown type {0}")]
    UnknownType(TypeRef),

    /// A versioned wire tag did not match the tag the schema expects at
    /// this position.
    #[error("corrupt data: expected wire tag {expected}, got {actual}")]
    CorruptData { expected: u8, actual: u8 },

    /// The versioned decoder has no handler for this kind.
    #[error("versioned decoding of `{kind}` is not implemented")]
    NotImplemented { kind: Kind },

    /// The bit-packed decoder has no decode function for this kind.
    #[error("no bit-packed decode function for `{kind}`")]
    NoDecoder { kind: Kind },

    /// A tag byte outside the versioned grammar (0–9).
    #[error("unknown wire tag {0}")]
    UnknownWireTag(u8),

    /// A varint carried more magnitude bits than fit in an `i128`.
    #[error("varint overflow")]
    VarintOverflow,

    /// A decoded length or count was negative or does not fit in memory.
    #[error("invalid length {0}")]
    InvalidLength(i128),

    /// Composite instances nested deeper than the decoders follow.
    #[error("nesting deeper than {0} levels")]
    DepthExceeded(usize),

    /// The underlying cursor failed (usually a truncated read).
    #[error(transparent)]
    Bits(#[from] BitsError),
}

impl DecodeError {
    /// Returns `true` if the cursor ran out of data mid-field.
    ///
    /// This is the one condition the event-stream loop may tolerate.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Bits(BitsError::Truncated { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_data_message_names_both_tags() {
        let err = DecodeError::CorruptData {
            expected: 5,
            actual: 9,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected wire tag 5"));
        assert!(msg.contains("got 9"));
    }

    #[test]
    fn test_is_truncated() {
        let truncated = DecodeError::from(BitsError::Truncated {
            requested: 8,
            remaining: 0,
        });
        assert!(truncated.is_truncated());
        assert!(!DecodeError::VarintOverflow.is_truncated());
        assert!(!DecodeError::DepthExceeded(256).is_truncated());
        assert!(!DecodeError::from(BitsError::Unaligned { bit_offset: 3 }).is_truncated());
    }

    #[test]
    fn test_unknown_type_display() {
        let err = DecodeError::UnknownType(TypeRef::Id(999));
        assert_eq!(err.to_string(), "unknown type 999");
    }
}
