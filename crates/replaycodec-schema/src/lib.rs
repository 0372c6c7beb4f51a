//! Schema loader for the replay protocol.
//!
//! Protocol schemas ship as source modules of literal declarations:
//!
//! ```text
//! typeinfos = [
//!     ('_int',[(0,7)]),  #0
//!     ('_struct',[[('m_userId',0,-1)]]),  #1
//! ]
//! replay_userid_typeid = 1
//! ```
//!
//! This crate turns such a module into a [`SchemaDocument`] in three steps:
//!
//! 1. [`tokenize`] classifies character runs into [`Token`]s.
//! 2. [`transcode`] rewrites the tokens into JSON text.
//! 3. `serde_json` parses that text.
//!
//! It knows nothing about the binary codec. The protocol crate reads the
//! document's bindings and compiles them into a type table.

mod document;
mod error;
mod token;
mod transcode;

pub use document::{SchemaDocument, TYPEINFOS};
pub use error::SchemaError;
pub use token::{next_meaningful, tokenize, Delimiter, Token, TokenKind};
pub use transcode::{transcode, transcode_tokens, Rendering};

/// Shorthand for [`SchemaDocument::load`].
pub fn load(source: &str) -> Result<SchemaDocument, SchemaError> {
    SchemaDocument::load(source)
}
