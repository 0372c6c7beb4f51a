//! The replay facade: one archive, one protocol context.

use replaycodec_bits::BitCursor;
use replaycodec_events::{decode_events, EventRecord, EventStreamConfig};
use replaycodec_protocol::{
    decode_bit_packed, decode_raw, decode_versioned, ProtocolContext, RawValue, Value,
};
use serde::Serialize;
use tracing::debug;

use crate::archive::ReplayArchive;
use crate::config::ReplayConfig;
use crate::error::ReplayError;

/// Builds below this one always report major version 1.
const MAJOR_VERSION_CUTOFF: u32 = 51978;

/// From this build on, the header's data build number is the protocol build.
const DATA_BUILD_CUTOFF: u32 = 39951;

// Raw header field tags.
const VERSION_FIELD: i128 = 1;
const VERSION_MAJOR: i128 = 1;
const VERSION_MINOR: i128 = 2;
const VERSION_PATCH: i128 = 3;
const VERSION_BUILD: i128 = 4;
const ELAPSED_LOOPS_FIELD: i128 = 3;
const DATA_BUILD_FIELD: i128 = 6;

// ---------------------------------------------------------------------------
// ReplayVersion
// ---------------------------------------------------------------------------

/// Version numbers read from the header without a schema.
///
/// `build` selects the schema for the rest of the replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplayVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// Protocol build.
    pub build: u32,
    /// Build number from the version struct, before the data build override.
    pub version_build: u32,
    /// Length of the replay in game loops.
    pub frames: u32,
}

impl ReplayVersion {
    /// Reads the version from a raw header.
    ///
    /// # Errors
    /// [`ReplayError::HeaderField`] when a version field is absent or does
    /// not fit a `u32`.
    pub fn from_raw_header(header: &RawValue) -> Result<Self, ReplayError> {
        let version_build = header_u32(header, &[VERSION_FIELD, VERSION_BUILD])?;
        let mut major = header_u32(header, &[VERSION_FIELD, VERSION_MAJOR])?;
        if version_build < MAJOR_VERSION_CUTOFF {
            major = 1;
        }

        let build = if version_build >= DATA_BUILD_CUTOFF {
            match header.path(&[DATA_BUILD_FIELD]) {
                Some(_) => header_u32(header, &[DATA_BUILD_FIELD])?,
                None => {
                    debug!(version_build, "header has no data build number");
                    version_build
                }
            }
        } else {
            version_build
        };

        Ok(Self {
            major,
            minor: header_u32(header, &[VERSION_FIELD, VERSION_MINOR])?,
            patch: header_u32(header, &[VERSION_FIELD, VERSION_PATCH])?,
            build,
            version_build,
            frames: header_u32(header, &[ELAPSED_LOOPS_FIELD])?,
        })
    }
}

fn header_u32(header: &RawValue, path: &[i128]) -> Result<u32, ReplayError> {
    header
        .path(path)
        .and_then(RawValue::as_int)
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| {
            let path: Vec<String> = path.iter().map(i128::to_string).collect();
            ReplayError::HeaderField(path.join("."))
        })
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Decodes the members of one replay against one protocol.
///
/// Each call fetches its member from the archive and decodes it with a
/// fresh cursor; nothing is cached.
pub struct Replay<'c, A> {
    ctx: &'c ProtocolContext,
    archive: A,
    config: ReplayConfig,
}

impl<'c, A: ReplayArchive> Replay<'c, A> {
    /// Uses the default member names and type bindings.
    pub fn new(ctx: &'c ProtocolContext, archive: A) -> Self {
        Self::with_config(ctx, archive, ReplayConfig::default())
    }

    pub fn with_config(ctx: &'c ProtocolContext, archive: A, config: ReplayConfig) -> Self {
        Self {
            ctx,
            archive,
            config,
        }
    }

    pub fn context(&self) -> &ProtocolContext {
        self.ctx
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// The replay header, decoded with the schema.
    pub fn header(&self) -> Result<Value, ReplayError> {
        let data = self.archive.user_data()?;
        let mut cursor = BitCursor::new(&data);
        Ok(decode_versioned(
            self.ctx,
            &mut cursor,
            self.config.header_type.as_str(),
        )?)
    }

    /// The replay header, decoded from its wire tags alone.
    pub fn raw_header(&self) -> Result<RawValue, ReplayError> {
        let data = self.archive.user_data()?;
        Ok(decode_raw(&mut BitCursor::new(&data))?)
    }

    /// Version numbers from the raw header.
    ///
    /// Works with any context, so it can pick the schema for a second one.
    pub fn version(&self) -> Result<ReplayVersion, ReplayError> {
        let version = ReplayVersion::from_raw_header(&self.raw_header()?)?;
        debug!(
            build = version.build,
            frames = version.frames,
            "replay version read"
        );
        Ok(version)
    }

    /// The versioned details member.
    pub fn details(&self) -> Result<Value, ReplayError> {
        let data = self.archive.read_member(&self.config.details_member)?;
        let mut cursor = BitCursor::new(&data);
        Ok(decode_versioned(
            self.ctx,
            &mut cursor,
            self.config.details_type.as_str(),
        )?)
    }

    /// The bit-packed init data member.
    pub fn init_data(&self) -> Result<Value, ReplayError> {
        let data = self.archive.read_member(&self.config.init_data_member)?;
        let mut cursor = BitCursor::new(&data);
        Ok(decode_bit_packed(
            self.ctx,
            &mut cursor,
            self.config.init_data_type.as_str(),
        )?)
    }

    /// Every record of the tracker event stream.
    pub fn tracker_events(&self) -> Result<Vec<EventRecord>, ReplayError> {
        self.events(
            &self.config.tracker_events_member,
            &self.config.tracker_events,
        )
    }

    /// Every record of the game event stream.
    ///
    /// The stream is bit-packed, which has no `_choice` decoder, so its
    /// delta type in `config.game_events` must name an integer type.
    pub fn game_events(&self) -> Result<Vec<EventRecord>, ReplayError> {
        self.events(&self.config.game_events_member, &self.config.game_events)
    }

    /// Every record of the message event stream. Same delta constraint as
    /// [`game_events`](Self::game_events).
    pub fn message_events(&self) -> Result<Vec<EventRecord>, ReplayError> {
        self.events(
            &self.config.message_events_member,
            &self.config.message_events,
        )
    }

    /// Decodes any member as an event stream.
    pub fn events(
        &self,
        member: &str,
        stream: &EventStreamConfig,
    ) -> Result<Vec<EventRecord>, ReplayError> {
        let data = self.archive.read_member(member)?;
        let mut cursor = BitCursor::new(&data);
        let records = decode_events(self.ctx, &mut cursor, stream)?;
        debug!(member, events = records.len(), "member decoded");
        Ok(records)
    }
}
