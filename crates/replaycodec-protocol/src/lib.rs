//! Type-driven binary decoding for replay members.
//!
//! This crate turns a loaded schema into something that can decode bytes:
//!
//! - **Types** ([`TypeInfo`], [`TypeTable`]) — the schema's `typeinfos`
//!   compiled into a closed enum, one variant per kind.
//! - **Context** ([`ProtocolContext`]) — the type table, a supplemental
//!   fallback table and the event catalogs, built once and shared.
//! - **Decoders** ([`BitPackedDecoder`], [`VersionedDecoder`], both behind
//!   the [`WireDecoder`] trait) — the two wire grammars.
//! - **Schema-free readers** ([`skip_instance`], [`decode_raw`]) — walk a
//!   versioned buffer using its tags alone.
//! - **Errors** ([`ProtocolError`] at build time, [`DecodeError`] per
//!   decode call).
//!
//! # Architecture
//!
//! ```text
//! schema source → SchemaDocument → ProtocolContext ─┐
//!                                                   ├→ decoder → Value
//!                               bytes → BitCursor ──┘
//! ```
//!
//! The context is read-only and shared; the cursor is owned by one decode
//! call tree. Several members can be decoded at once, each with its own
//! cursor, against the same context.

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod bitpacked;
mod context;
mod decoder;
mod error;
mod merge;
mod raw;
mod table;
mod types;
mod value;
mod versioned;
mod wire;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use bitpacked::BitPackedDecoder;
pub use context::{Catalog, CatalogEntry, ProtocolContext, ProtocolContextBuilder};
pub use decoder::{decode, decode_bit_packed, decode_versioned, Wire, WireDecoder};
pub use error::{DecodeError, ProtocolError};
pub use merge::PARENT_FIELD;
pub use raw::{decode_raw, RawValue};
pub use table::{parse_descriptor, TypeTable};
pub use types::{Bounds, Field, Kind, TypeInfo, TypeRef, Variant};
pub use value::Value;
pub use versioned::{skip_instance, VersionedDecoder};
pub use wire::{read_vint, WireTag, MAX_NESTING_DEPTH};
