//! Type tables: compiled descriptors keyed by type id.
//!
//! Descriptors arrive as JSON, either from a loaded schema's `typeinfos`
//! binding or from a hand-written supplemental table:
//!
//! ```text
//! ["_int", [[0, 7]]]
//! ["_array", [[0, 8], 12]]
//! ["_struct", [[["m_name", 9, 0], ["__parent", 11, 1]]]]
//! ["_choice", [[0, 2], {"0": ["m_uint6", 3], "1": ["m_uint14", 4]}]]
//! ```
//!
//! Numbers may appear either as JSON numbers or as decimal strings.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value as Json;

use crate::types::{Bounds, Field, Kind, TypeInfo, TypeRef, Variant};
use crate::ProtocolError;

/// Widest field a bit cursor reads in one go.
const MAX_BIT_WIDTH: u32 = 64;

/// Compiled descriptors keyed by type id. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTable {
    entries: HashMap<u32, TypeInfo>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles a `typeinfos` value: an array whose index is the type id,
    /// or an object keyed by decimal id.
    pub fn from_typeinfos(typeinfos: &Json) -> Result<Self, ProtocolError> {
        let mut table = Self::new();
        match typeinfos {
            Json::Array(entries) => {
                for (index, entry) in entries.iter().enumerate() {
                    let id = u32::try_from(index).map_err(|_| ProtocolError::MalformedDescriptor {
                        id: u32::MAX,
                        reason: "too many type descriptors".into(),
                    })?;
                    table.insert(id, parse_descriptor(id, entry)?);
                }
            }
            Json::Object(entries) => {
                for (key, entry) in entries {
                    let id = key.trim().parse().map_err(|_| ProtocolError::MalformedDescriptor {
                        id: u32::MAX,
                        reason: format!("type id `{key}` is not a number"),
                    })?;
                    table.insert(id, parse_descriptor(id, entry)?);
                }
            }
            other => {
                return Err(ProtocolError::MalformedDescriptor {
                    id: u32::MAX,
                    reason: format!("typeinfos must be an array or object, got {other}"),
                });
            }
        }
        Ok(table)
    }

    /// Parses a supplemental table from JSON text.
    ///
    /// Accepts `{"typeinfos": ...}` or a bare `typeinfos` value.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let json: Json = serde_json::from_str(text).map_err(ProtocolError::Supplemental)?;
        match json.get("typeinfos") {
            Some(typeinfos) => Self::from_typeinfos(typeinfos),
            None => Self::from_typeinfos(&json),
        }
    }

    /// Adds or replaces one entry.
    pub fn insert(&mut self, id: u32, info: TypeInfo) -> Option<TypeInfo> {
        self.entries.insert(id, info)
    }

    pub fn get(&self, id: u32) -> Option<&TypeInfo> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &TypeInfo)> {
        self.entries.iter().map(|(id, info)| (*id, info))
    }
}

// ---------------------------------------------------------------------------
// JSON helpers
// ---------------------------------------------------------------------------

/// Reads an integer from a JSON number or a decimal string.
pub(crate) fn json_int(value: &Json) -> Option<i64> {
    match value {
        Json::Number(n) => n.as_i64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a type reference from a JSON number or string.
pub(crate) fn json_type_ref(value: &Json) -> Option<TypeRef> {
    match value {
        Json::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).map(TypeRef::Id),
        Json::String(s) => Some(TypeRef::parse(s.trim())),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Descriptor parsing
// ---------------------------------------------------------------------------

/// Compiles one `[kind, params]` descriptor.
pub fn parse_descriptor(id: u32, entry: &Json) -> Result<TypeInfo, ProtocolError> {
    let malformed = |reason: &str| ProtocolError::MalformedDescriptor {
        id,
        reason: reason.to_owned(),
    };

    let parts = entry
        .as_array()
        .ok_or_else(|| malformed("descriptor is not a sequence"))?;
    let kind_name = parts
        .first()
        .and_then(Json::as_str)
        .ok_or_else(|| malformed("descriptor has no kind name"))?;
    let kind = Kind::from_name(kind_name).ok_or_else(|| ProtocolError::UnknownKind {
        id,
        kind: kind_name.to_owned(),
    })?;
    let params: &[Json] = match parts.get(1) {
        Some(Json::Array(params)) => params.as_slice(),
        Some(_) => return Err(malformed("descriptor parameters are not a sequence")),
        None => &[],
    };

    let param = |index: usize| {
        params
            .get(index)
            .ok_or_else(|| malformed(&format!("{kind} expects parameter {index}")))
    };
    let bounds = |index: usize| {
        let bounds = param(index)
            .and_then(|p| parse_bounds(p).ok_or_else(|| malformed("invalid bounds")))?;
        if bounds.bits > MAX_BIT_WIDTH {
            return Err(malformed(&format!(
                "bit width {} exceeds {MAX_BIT_WIDTH}",
                bounds.bits
            )));
        }
        Ok(bounds)
    };
    let type_ref = |index: usize| {
        param(index).and_then(|p| json_type_ref(p).ok_or_else(|| malformed("invalid type reference")))
    };

    let info = match kind {
        Kind::Int => TypeInfo::Int(bounds(0)?),
        Kind::Bool => TypeInfo::Bool,
        Kind::Blob => TypeInfo::Blob(bounds(0)?),
        Kind::Array => TypeInfo::Array {
            bounds: bounds(0)?,
            element: type_ref(1)?,
        },
        Kind::BitArray => TypeInfo::BitArray(bounds(0)?),
        Kind::Struct => {
            let fields = param(0)?
                .as_array()
                .ok_or_else(|| malformed("struct fields are not a sequence"))?;
            TypeInfo::Struct(
                fields
                    .iter()
                    .map(|f| parse_field(f).ok_or_else(|| malformed("invalid struct field")))
                    .collect::<Result<_, _>>()?,
            )
        }
        Kind::Optional => TypeInfo::Optional(type_ref(0)?),
        Kind::FourCC => TypeInfo::FourCC,
        Kind::Choice => TypeInfo::Choice {
            bounds: bounds(0)?,
            variants: parse_variants(param(1)?).ok_or_else(|| malformed("invalid choice variants"))?,
        },
        Kind::Null => TypeInfo::Null,
        Kind::Real32 => TypeInfo::Real32,
        Kind::Real64 => TypeInfo::Real64,
    };
    Ok(info)
}

fn parse_bounds(value: &Json) -> Option<Bounds> {
    let pair = value.as_array()?;
    let offset = json_int(pair.first()?)?;
    let bits = u32::try_from(json_int(pair.get(1)?)?).ok()?;
    Some(Bounds::new(offset, bits))
}

/// `[name, typeRef, tag]`; the tag may be missing or null.
fn parse_field(value: &Json) -> Option<Field> {
    let triple = value.as_array()?;
    let name = triple.first()?.as_str()?.to_owned();
    let type_ref = json_type_ref(triple.get(1)?)?;
    let tag = match triple.get(2) {
        None | Some(Json::Null) => None,
        Some(tag) => Some(json_int(tag)?),
    };
    Some(Field { name, type_ref, tag })
}

/// `{selector: [name, typeRef]}`.
fn parse_variants(value: &Json) -> Option<BTreeMap<i64, Variant>> {
    value
        .as_object()?
        .iter()
        .map(|(selector, variant)| {
            let selector = selector.trim().parse().ok()?;
            let pair = variant.as_array()?;
            let name = pair.first()?.as_str()?.to_owned();
            let type_ref = json_type_ref(pair.get(1)?)?;
            Some((selector, Variant { name, type_ref }))
        })
        .collect()
}
