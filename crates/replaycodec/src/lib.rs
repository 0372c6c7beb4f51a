//! # Replaycodec
//!
//! Schema-driven decoder for the members of game replay archives.
//!
//! A replay protocol ships as a schema source module. Replaycodec loads
//! that module, compiles its type table and decodes archive members with
//! it: the versioned header and details, the bit-packed init data, and the
//! event streams.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use replaycodec::prelude::*;
//!
//! # fn main() -> Result<(), ReplayError> {
//! let source = std::fs::read_to_string("protocol.py").map_err(|source| {
//!     ArchiveError::Io { member: "protocol.py".into(), source }
//! })?;
//! let ctx = ProtocolContext::from_source(&source)?;
//!
//! let archive = MemoryArchive::new(vec![/* user data */]);
//! let replay = Replay::new(&ctx, &archive);
//! println!("build {}", replay.version()?.build);
//! for event in replay.tracker_events()? {
//!     println!("{} @ {}", event.name, event.game_loop);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Crate | Re-exported as | Role |
//! |-------|----------------|------|
//! | `replaycodec-bits` | [`bits`] | Bit cursor |
//! | `replaycodec-schema` | [`schema`] | Schema source → JSON document |
//! | `replaycodec-protocol` | [`protocol`] | Type table and decoders |
//! | `replaycodec-events` | [`events`] | Event-stream loop |

mod archive;
mod config;
mod error;
mod replay;

pub use replaycodec_bits as bits;
pub use replaycodec_events as events;
pub use replaycodec_protocol as protocol;
pub use replaycodec_schema as schema;

pub use archive::{ArchiveError, MemoryArchive, ReplayArchive};
pub use config::ReplayConfig;
pub use error::ReplayError;
pub use replay::{Replay, ReplayVersion};

/// The types most callers need.
pub mod prelude {
    pub use crate::{
        ArchiveError, MemoryArchive, Replay, ReplayArchive, ReplayConfig, ReplayError,
        ReplayVersion,
    };
    pub use replaycodec_events::{EventRecord, EventStreamConfig};
    pub use replaycodec_protocol::{ProtocolContext, RawValue, Value, Wire};
}
