//! Unified error type for the replaycodec workspace.

use replaycodec_events::EventError;
use replaycodec_protocol::{DecodeError, ProtocolError};

use crate::archive::ArchiveError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so `?`
/// lifts sub-crate errors into this one.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The protocol context could not be built, including a schema source
    /// that did not load.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A member did not decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// An event stream did not decode.
    #[error(transparent)]
    Event(#[from] EventError),

    /// The archive could not provide a member.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// A raw header field needed for version detection is missing or
    /// does not fit.
    #[error("replay header field {0} is missing or out of range")]
    HeaderField(String),
}

#[cfg(test)]
mod tests {
    use replaycodec_schema::SchemaError;

    use super::*;

    #[test]
    fn test_schema_error_arrives_through_protocol() {
        let err = ProtocolError::from(SchemaError::Unclosed(3));
        let replay_err: ReplayError = err.into();
        assert!(matches!(
            replay_err,
            ReplayError::Protocol(ProtocolError::Schema(SchemaError::Unclosed(3)))
        ));
    }

    #[test]
    fn test_from_decode_error() {
        let err = DecodeError::CorruptData {
            expected: 5,
            actual: 2,
        };
        let replay_err: ReplayError = err.into();
        assert!(matches!(replay_err, ReplayError::Decode(_)));
        assert!(replay_err.to_string().contains("expected wire tag 5"));
    }

    #[test]
    fn test_from_archive_error() {
        let err = ArchiveError::MissingMember("replay.details".into());
        let replay_err: ReplayError = err.into();
        assert!(matches!(replay_err, ReplayError::Archive(_)));
        assert!(replay_err.to_string().contains("replay.details"));
    }

    #[test]
    fn test_from_event_error() {
        let err = EventError::UnknownCatalog("game_event_types".into());
        let replay_err: ReplayError = err.into();
        assert!(matches!(replay_err, ReplayError::Event(_)));
    }
}
