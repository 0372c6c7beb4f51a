//! Error types for event-stream decoding.

use replaycodec_protocol::{DecodeError, Value};

/// Errors that abort an event-stream decode.
///
/// A truncated read inside the loop is only surfaced here when the stream
/// config does not tolerate truncation.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Decoding one of the record's values failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The configured catalog is not a binding of the schema.
    #[error("unknown event catalog `{0}`")]
    UnknownCatalog(String),

    /// The selector has no entry in the catalog.
    #[error("unknown event {selector} in catalog `{catalog}`")]
    UnknownEvent { catalog: String, selector: i64 },

    /// The selector type decoded to something other than an integer.
    #[error("event selector is not an integer: {0:?}")]
    InvalidSelector(Value),

    /// The delta-tick type decoded to something that carries no integer.
    #[error("game loop delta is not an integer: {0:?}")]
    InvalidGameLoop(Value),
}

impl EventError {
    /// Returns `true` if the stream ran out of data mid-record.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Decode(err) if err.is_truncated())
    }
}
