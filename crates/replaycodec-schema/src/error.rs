//! Error types for the schema loader.
//!
//! Every variant is a syntax error in the broad sense: the source text did
//! not tokenize, transcode or parse into a structured value. None of them
//! leave a usable partial schema behind.

use crate::token::Delimiter;

/// Errors raised while turning schema source text into a [`SchemaDocument`](crate::SchemaDocument).
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A closer did not match the innermost open delimiter.
    ///
    /// For example `[1, 2)` opens a list and closes a tuple.
    #[error("syntax error at byte {offset}: expected to close a {expected}, found a {found} closer")]
    Mismatched {
        expected: Delimiter,
        found: Delimiter,
        offset: usize,
    },

    /// A closer appeared with nothing open.
    #[error("syntax error at byte {offset}: unexpected {found} closer")]
    UnexpectedCloser { found: Delimiter, offset: usize },

    /// The input ended while delimiters were still open.
    #[error("syntax error: {0} delimiter(s) left open at end of input")]
    Unclosed(usize),

    /// The transcoded text was not valid JSON.
    ///
    /// This is where bare constructs the transcoder passes through
    /// (operators, stray punctuation) end up being rejected.
    #[error("syntax error in transcoded schema: {0}")]
    Parse(#[source] serde_json::Error),
}
