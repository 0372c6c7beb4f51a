//! Compiled type descriptors.
//!
//! A schema descriptor is a `(kind, params)` pair such as
//! `('_int', [(0, 7)])`. Here each kind becomes one [`TypeInfo`] variant
//! carrying its parameters already parsed, so decoders dispatch with an
//! exhaustive `match` instead of looking functions up by name.

use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// TypeRef
// ---------------------------------------------------------------------------

/// A reference to a type: either a numeric id or a symbolic name.
///
/// Names are resolved through the schema's top-level bindings
/// (`replay_header_typeid = 18`). A name made only of decimal digits is
/// always taken as an id, never looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Id(u32),
    Name(String),
}

impl TypeRef {
    /// Parses a textual reference. `"12"` is `Id(12)`, anything else a name.
    pub fn parse(text: &str) -> Self {
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = text.parse() {
                return Self::Id(id);
            }
        }
        Self::Name(text.to_owned())
    }
}

impl From<u32> for TypeRef {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for TypeRef {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for TypeRef {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<&TypeRef> for TypeRef {
    fn from(type_ref: &TypeRef) -> Self {
        type_ref.clone()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "`{name}`"),
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor parameters
// ---------------------------------------------------------------------------

/// Integer bounds `(offset, bits)`: a bit-packed integer is `offset` plus
/// an unsigned value `bits` wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub offset: i64,
    pub bits: u32,
}

impl Bounds {
    pub const fn new(offset: i64, bits: u32) -> Self {
        Self { offset, bits }
    }
}

/// One struct field.
///
/// `tag` is the versioned-mode field tag; bit-packed schemas carry `-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub type_ref: TypeRef,
    pub tag: Option<i64>,
}

/// One variant of a choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub name: String,
    pub type_ref: TypeRef,
}

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// The decode kind of a descriptor, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Int,
    Bool,
    Blob,
    Array,
    BitArray,
    Struct,
    Optional,
    FourCC,
    Choice,
    Null,
    Real32,
    Real64,
}

impl Kind {
    /// Parses a schema kind name. The leading underscore is optional.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.strip_prefix('_').unwrap_or(name) {
            "int" => Self::Int,
            "bool" => Self::Bool,
            "blob" => Self::Blob,
            "array" => Self::Array,
            "bitarray" => Self::BitArray,
            "struct" => Self::Struct,
            "optional" => Self::Optional,
            "fourcc" => Self::FourCC,
            "choice" => Self::Choice,
            "null" => Self::Null,
            "real32" => Self::Real32,
            "real64" => Self::Real64,
            _ => return None,
        };
        Some(kind)
    }

    /// The schema spelling, e.g. `"_int"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "_int",
            Self::Bool => "_bool",
            Self::Blob => "_blob",
            Self::Array => "_array",
            Self::BitArray => "_bitarray",
            Self::Struct => "_struct",
            Self::Optional => "_optional",
            Self::FourCC => "_fourcc",
            Self::Choice => "_choice",
            Self::Null => "_null",
            Self::Real32 => "_real32",
            Self::Real64 => "_real64",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// TypeInfo
// ---------------------------------------------------------------------------

/// A compiled type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeInfo {
    Int(Bounds),
    Bool,
    /// Bounds of the length prefix.
    Blob(Bounds),
    Array {
        bounds: Bounds,
        element: TypeRef,
    },
    /// Bounds of the bit count.
    BitArray(Bounds),
    /// Fields in declaration order, which is also ascending tag order.
    Struct(Vec<Field>),
    Optional(TypeRef),
    FourCC,
    Choice {
        bounds: Bounds,
        variants: BTreeMap<i64, Variant>,
    },
    Null,
    Real32,
    Real64,
}

impl TypeInfo {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Int(_) => Kind::Int,
            Self::Bool => Kind::Bool,
            Self::Blob(_) => Kind::Blob,
            Self::Array { .. } => Kind::Array,
            Self::BitArray(_) => Kind::BitArray,
            Self::Struct(_) => Kind::Struct,
            Self::Optional(_) => Kind::Optional,
            Self::FourCC => Kind::FourCC,
            Self::Choice { .. } => Kind::Choice,
            Self::Null => Kind::Null,
            Self::Real32 => Kind::Real32,
            Self::Real64 => Kind::Real64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_digits_are_ids() {
        assert_eq!(TypeRef::parse("18"), TypeRef::Id(18));
        assert_eq!(TypeRef::parse("007"), TypeRef::Id(7));
    }

    #[test]
    fn test_type_ref_names() {
        assert_eq!(
            TypeRef::parse("replay_header_typeid"),
            TypeRef::Name("replay_header_typeid".into())
        );
        assert_eq!(TypeRef::parse("-1"), TypeRef::Name("-1".into()));
        assert_eq!(TypeRef::parse(""), TypeRef::Name(String::new()));
    }

    #[test]
    fn test_type_ref_oversized_digits_stay_names() {
        assert!(matches!(
            TypeRef::parse("99999999999999999999"),
            TypeRef::Name(_)
        ));
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [
            Kind::Int,
            Kind::Bool,
            Kind::Blob,
            Kind::Array,
            Kind::BitArray,
            Kind::Struct,
            Kind::Optional,
            Kind::FourCC,
            Kind::Choice,
            Kind::Null,
            Kind::Real32,
            Kind::Real64,
        ] {
            assert_eq!(Kind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(Kind::from_name("struct"), Some(Kind::Struct));
        assert_eq!(Kind::from_name("_float"), None);
    }

    #[test]
    fn test_type_info_kind() {
        let info = TypeInfo::Array {
            bounds: Bounds::new(0, 4),
            element: TypeRef::Id(0),
        };
        assert_eq!(info.kind(), Kind::Array);
        assert_eq!(info.kind().to_string(), "_array");
    }
}
