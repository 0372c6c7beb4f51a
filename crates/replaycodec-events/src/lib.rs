//! Event-stream decoding for replay members.
//!
//! A stream member (`replay.tracker.events`, `replay.game.events`,
//! `replay.message.events`) is a flat run of records, each laid out as:
//!
//! ```text
//! delta ticks │ [origin id] │ event selector │ event body │ pad to byte
//! ```
//!
//! The selector is looked up in a schema catalog, which names the body type
//! and the event. [`decode_events`] walks the buffer until it is exhausted
//! and returns the records in wire order.
//!
//! # Truncation
//!
//! Replays written by a crashed client often end mid-record. With
//! [`EventStreamConfig::tolerate_truncation`] set, a truncated read drops
//! the partial record and ends the stream; every record completed before it
//! is returned.

mod error;

use std::collections::BTreeMap;

use replaycodec_bits::BitCursor;
use replaycodec_protocol::{
    BitPackedDecoder, CatalogEntry, ProtocolContext, TypeRef, Value, VersionedDecoder, Wire,
    WireDecoder,
};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, trace, warn};

pub use error::EventError;

/// Reserved key: the event's display name.
pub const EVENT_KEY: &str = "_event";
/// Reserved key: the catalog selector.
pub const EVENT_ID_KEY: &str = "_eventid";
/// Reserved key: the accumulated game loop.
pub const GAME_LOOP_KEY: &str = "_gameloop";
/// Reserved key: the origin id, or null.
pub const USER_ID_KEY: &str = "_userid";
/// Reserved key: bits the record occupied on the wire.
pub const BITS_KEY: &str = "_bits";
/// Key a non-mapping body is stored under.
pub const VALUE_KEY: &str = "_value";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How to read one event stream.
///
/// Type names are schema bindings (`"svaruint32_typeid"`) or literal ids
/// (`"7"`). The [`Default`] is the tracker stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventStreamConfig {
    /// Grammar of the member.
    pub wire: Wire,

    /// Type of the per-record event selector.
    pub selector_type: String,

    /// Binding name of the selector → `(type, name)` catalog.
    pub catalog: String,

    /// Type of the per-record game loop delta.
    pub delta_type: String,

    /// Type of the per-record origin id.
    pub origin_type: String,

    /// Whether records carry an origin id after the delta.
    pub read_origin_id: bool,

    /// Whether a truncated final record ends the stream instead of failing it.
    pub tolerate_truncation: bool,
}

impl Default for EventStreamConfig {
    fn default() -> Self {
        Self {
            wire: Wire::Versioned,
            selector_type: "tracker_eventid_typeid".into(),
            catalog: "tracker_event_types".into(),
            delta_type: "svaruint32_typeid".into(),
            origin_type: "replay_userid_typeid".into(),
            read_origin_id: false,
            tolerate_truncation: true,
        }
    }
}

impl EventStreamConfig {
    /// `replay.tracker.events`: versioned, no origin id.
    pub fn tracker() -> Self {
        Self::default()
    }

    /// `replay.game.events`: bit-packed, with origin id.
    pub fn game() -> Self {
        Self {
            wire: Wire::BitPacked,
            selector_type: "game_eventid_typeid".into(),
            catalog: "game_event_types".into(),
            read_origin_id: true,
            ..Self::default()
        }
    }

    /// `replay.message.events`: bit-packed, with origin id.
    pub fn message() -> Self {
        Self {
            wire: Wire::BitPacked,
            selector_type: "message_eventid_typeid".into(),
            catalog: "message_event_types".into(),
            read_origin_id: true,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// EventRecord
// ---------------------------------------------------------------------------

/// One decoded event with its bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Display name from the catalog.
    pub name: String,
    pub selector: i64,
    /// Sum of every delta up to and including this record.
    pub game_loop: i128,
    /// `None` when the stream carries no origin ids.
    pub origin: Option<Value>,
    /// Bits from the start of the record through its padding.
    pub bits: usize,
    pub body: Value,
}

impl EventRecord {
    /// The body mapping with the reserved keys attached.
    ///
    /// A body that is not a mapping is stored under [`VALUE_KEY`].
    pub fn to_value(&self) -> Value {
        let mut map = match &self.body {
            Value::Map(map) => map.clone(),
            other => BTreeMap::from([(VALUE_KEY.to_owned(), other.clone())]),
        };
        map.insert(EVENT_KEY.to_owned(), Value::from(self.name.as_str()));
        map.insert(EVENT_ID_KEY.to_owned(), Value::from(self.selector));
        map.insert(GAME_LOOP_KEY.to_owned(), Value::Int(self.game_loop));
        map.insert(
            USER_ID_KEY.to_owned(),
            self.origin.clone().unwrap_or(Value::Null),
        );
        map.insert(BITS_KEY.to_owned(), Value::Int(self.bits as i128));
        Value::Map(map)
    }
}

impl Serialize for EventRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes every record of a stream member.
///
/// # Errors
/// [`EventError::UnknownCatalog`] before reading anything if the catalog is
/// missing; otherwise the first error of any record, except a tolerated
/// truncation.
pub fn decode_events(
    ctx: &ProtocolContext,
    cursor: &mut BitCursor<'_>,
    config: &EventStreamConfig,
) -> Result<Vec<EventRecord>, EventError> {
    match config.wire {
        Wire::BitPacked => decode_stream(&mut BitPackedDecoder::new(ctx, cursor), config),
        Wire::Versioned => decode_stream(&mut VersionedDecoder::new(ctx, cursor), config),
    }
}

/// The record loop, for any grammar.
///
/// `config.wire` is ignored; the decoder decides the grammar.
pub fn decode_stream<'a, D>(
    decoder: &mut D,
    config: &EventStreamConfig,
) -> Result<Vec<EventRecord>, EventError>
where
    D: WireDecoder<'a>,
{
    if decoder.context().catalog(&config.catalog).is_none() {
        return Err(EventError::UnknownCatalog(config.catalog.clone()));
    }
    let types = StreamTypes::new(config);
    let mut records = Vec::new();
    let mut game_loop = 0i128;

    while !decoder.cursor().done() {
        match decode_record(decoder, config, &types, &mut game_loop) {
            Ok(record) => {
                trace!(
                    event = %record.name,
                    game_loop = %record.game_loop,
                    bits = record.bits,
                    "event decoded"
                );
                records.push(record);
            }
            Err(err) if err.is_truncated() && config.tolerate_truncation => {
                warn!(
                    catalog = %config.catalog,
                    decoded = records.len(),
                    error = %err,
                    "event stream truncated, dropping partial record"
                );
                break;
            }
            Err(err) => return Err(err),
        }
    }

    debug!(
        catalog = %config.catalog,
        wire = ?decoder.wire(),
        events = records.len(),
        "event stream decoded"
    );
    Ok(records)
}

/// Type references parsed once per stream.
struct StreamTypes {
    delta: TypeRef,
    origin: TypeRef,
    selector: TypeRef,
}

impl StreamTypes {
    fn new(config: &EventStreamConfig) -> Self {
        Self {
            delta: TypeRef::from(config.delta_type.as_str()),
            origin: TypeRef::from(config.origin_type.as_str()),
            selector: TypeRef::from(config.selector_type.as_str()),
        }
    }
}

fn decode_record<'a, D>(
    decoder: &mut D,
    config: &EventStreamConfig,
    types: &StreamTypes,
    game_loop: &mut i128,
) -> Result<EventRecord, EventError>
where
    D: WireDecoder<'a>,
{
    let start = decoder.cursor().used_bits();

    let delta = decoder.decode(&types.delta)?;
    // No sign check: a negative delta moves the loop backwards.
    *game_loop += delta_ticks(delta)?;

    let origin = if config.read_origin_id {
        Some(decoder.decode(&types.origin)?)
    } else {
        None
    };

    let selector_value = decoder.decode(&types.selector)?;
    let selector = selector_value
        .as_int()
        .and_then(|selector| i64::try_from(selector).ok())
        .ok_or(EventError::InvalidSelector(selector_value))?;
    let CatalogEntry { type_ref, name } = lookup(decoder.context(), config, selector)?;

    let body = decoder.decode(&type_ref)?;

    let cursor = decoder.cursor();
    cursor.align_to_byte();
    let bits = cursor.used_bits() - start;

    Ok(EventRecord {
        name,
        selector,
        game_loop: *game_loop,
        origin,
        bits,
        body,
    })
}

fn lookup(
    ctx: &ProtocolContext,
    config: &EventStreamConfig,
    selector: i64,
) -> Result<CatalogEntry, EventError> {
    ctx.catalog(&config.catalog)
        .and_then(|catalog| catalog.get(selector))
        .cloned()
        .ok_or_else(|| EventError::UnknownEvent {
            catalog: config.catalog.clone(),
            selector,
        })
}

/// The tick count carried by a delta value.
///
/// Deltas are usually a choice between integer widths, which decodes to a
/// one-key mapping; an empty mapping (an unknown width, skipped) counts
/// as zero.
fn delta_ticks(delta: Value) -> Result<i128, EventError> {
    match &delta {
        Value::Int(ticks) => return Ok(*ticks),
        Value::Map(map) if map.is_empty() => return Ok(0),
        Value::Map(map) if map.len() == 1 => {
            if let Some(ticks) = map.values().next().and_then(Value::as_int) {
                return Ok(ticks);
            }
        }
        _ => {}
    }
    Err(EventError::InvalidGameLoop(delta))
}
