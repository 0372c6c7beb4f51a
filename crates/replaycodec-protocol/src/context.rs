//! The process-wide protocol context.
//!
//! A [`ProtocolContext`] bundles everything a decoder needs to know about
//! the protocol: the loaded schema document, the compiled type table, the
//! supplemental fallback table and the event catalogs. It is built once at
//! startup and then only ever borrowed, so any number of decode calls (on
//! any number of threads) can share it without locking.

use std::collections::{BTreeMap, HashMap};

use replaycodec_schema::SchemaDocument;
use serde_json::Value as Json;
use tracing::{debug, warn};

use crate::table::{json_int, json_type_ref};
use crate::types::{TypeInfo, TypeRef};
use crate::{DecodeError, ProtocolError, TypeTable};

// ---------------------------------------------------------------------------
// Catalogs
// ---------------------------------------------------------------------------

/// One event kind: the type its body decodes with, and its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub type_ref: TypeRef,
    pub name: String,
}

/// Maps event selectors to [`CatalogEntry`]s.
///
/// Compiled from schema bindings shaped like
/// `tracker_event_types = {0: (46, 'NNet.Replay.Tracker.SPlayerStatsEvent')}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<i64, CatalogEntry>,
}

impl Catalog {
    /// Compiles a binding if it has catalog shape: a non-empty mapping
    /// whose values are all `[typeRef, name]` pairs.
    pub fn from_json(value: &Json) -> Option<Self> {
        let object = value.as_object()?;
        if object.is_empty() {
            return None;
        }
        let entries = object
            .iter()
            .map(|(selector, entry)| {
                let selector = selector.trim().parse().ok()?;
                let pair = entry.as_array()?;
                if pair.len() != 2 {
                    return None;
                }
                let type_ref = json_type_ref(&pair[0])?;
                let name = pair[1].as_str()?.to_owned();
                Some((selector, CatalogEntry { type_ref, name }))
            })
            .collect::<Option<_>>()?;
        Some(Self { entries })
    }

    pub fn get(&self, selector: i64) -> Option<&CatalogEntry> {
        self.entries.get(&selector)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &CatalogEntry)> {
        self.entries.iter().map(|(selector, entry)| (*selector, entry))
    }
}

// ---------------------------------------------------------------------------
// ProtocolContext
// ---------------------------------------------------------------------------

/// Immutable, shareable protocol knowledge. See the module docs.
#[derive(Debug, Clone)]
pub struct ProtocolContext {
    document: SchemaDocument,
    types: TypeTable,
    supplemental: TypeTable,
    catalogs: HashMap<String, Catalog>,
}

impl ProtocolContext {
    /// Starts building a context.
    pub fn builder() -> ProtocolContextBuilder {
        ProtocolContextBuilder::new()
    }

    /// Builds a context from schema source alone, with no supplemental table.
    pub fn from_source(source: &str) -> Result<Self, ProtocolError> {
        Self::builder().schema_source(source).build()
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    /// The table compiled from the schema's `typeinfos`.
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// The hand-written fallback table.
    pub fn supplemental(&self) -> &TypeTable {
        &self.supplemental
    }

    /// Looks up an id in the schema table, then in the supplemental table.
    pub fn type_info(&self, id: u32) -> Option<&TypeInfo> {
        self.types.get(id).or_else(|| self.supplemental.get(id))
    }

    /// Turns a reference into a numeric id.
    ///
    /// Ids pass through. Names are looked up among the document's
    /// bindings; a name with no numeric binding has no id.
    pub fn resolve_id(&self, type_ref: &TypeRef) -> Option<u32> {
        match type_ref {
            TypeRef::Id(id) => Some(*id),
            TypeRef::Name(name) => match self.document.get(name).and_then(json_type_ref) {
                Some(TypeRef::Id(id)) => Some(id),
                _ => None,
            },
        }
    }

    /// Resolves a reference all the way to its descriptor.
    ///
    /// # Errors
    /// [`DecodeError::UnknownType`] if the reference names no entry in
    /// either table.
    pub fn resolve(&self, type_ref: &TypeRef) -> Result<&TypeInfo, DecodeError> {
        self.resolve_id(type_ref)
            .and_then(|id| self.type_info(id))
            .ok_or_else(|| DecodeError::UnknownType(type_ref.clone()))
    }

    /// A compiled event catalog by binding name, e.g. `"tracker_event_types"`.
    pub fn catalog(&self, name: &str) -> Option<&Catalog> {
        self.catalogs.get(name)
    }

    /// Names of every binding compiled as a catalog.
    pub fn catalog_names(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }

    /// A top-level schema binding as an integer, e.g. a `*_typeid` constant.
    pub fn constant(&self, name: &str) -> Option<i64> {
        self.document.get(name).and_then(json_int)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`ProtocolContext`].
///
/// ```rust
/// use replaycodec_protocol::ProtocolContext;
///
/// let ctx = ProtocolContext::builder()
///     .schema_source("typeinfos = [('_int',[(0,7)])]\nsmall_typeid = 0")
///     .supplemental_json(r#"{"typeinfos": {"100": ["_bool", []]}}"#)
///     .build()
///     .unwrap();
///
/// assert!(ctx.resolve(&"small_typeid".into()).is_ok());
/// assert!(ctx.resolve(&100u32.into()).is_ok());
/// ```
#[derive(Debug, Default)]
pub struct ProtocolContextBuilder {
    document: Option<SchemaDocument>,
    source: Option<String>,
    supplemental: TypeTable,
    supplemental_json: Vec<String>,
}

impl ProtocolContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an already-loaded schema document.
    pub fn schema(mut self, document: SchemaDocument) -> Self {
        self.document = Some(document);
        self.source = None;
        self
    }

    /// Loads the schema from source text at [`build`](Self::build) time.
    pub fn schema_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self.document = None;
        self
    }

    /// Merges entries into the supplemental table. Later entries win.
    pub fn supplemental(mut self, table: TypeTable) -> Self {
        for (id, info) in table.iter() {
            self.supplemental.insert(id, info.clone());
        }
        self
    }

    /// Parses and merges a supplemental table at build time.
    pub fn supplemental_json(mut self, json: impl Into<String>) -> Self {
        self.supplemental_json.push(json.into());
        self
    }

    /// Loads the schema, compiles both tables and the catalogs.
    ///
    /// # Errors
    /// [`ProtocolError`] if the schema source does not load or any
    /// descriptor fails to compile.
    pub fn build(self) -> Result<ProtocolContext, ProtocolError> {
        let document = match (self.document, self.source) {
            (Some(document), _) => document,
            (None, Some(source)) => SchemaDocument::load(&source)?,
            (None, None) => SchemaDocument::default(),
        };

        let types = match document.typeinfos() {
            Some(typeinfos) => TypeTable::from_typeinfos(typeinfos)?,
            None => {
                warn!("schema has no typeinfos binding; only supplemental types are available");
                TypeTable::new()
            }
        };

        let mut supplemental = self.supplemental;
        for json in &self.supplemental_json {
            for (id, info) in TypeTable::from_json(json)?.iter() {
                supplemental.insert(id, info.clone());
            }
        }

        let catalogs: HashMap<String, Catalog> = document
            .iter()
            .filter_map(|(name, value)| Catalog::from_json(value).map(|c| (name.clone(), c)))
            .collect();

        debug!(
            types = types.len(),
            supplemental = supplemental.len(),
            catalogs = catalogs.len(),
            "protocol context built"
        );

        Ok(ProtocolContext {
            document,
            types,
            supplemental,
            catalogs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
typeinfos = [
    ('_int',[(0,7)]),  #0
    ('_bool',[]),  #1
]
small_typeid = 0
quoted_typeid = '1'
label = 'not a type'
game_event_types = {
    5: (1, 'NNet.Game.SSaveGameEvent'),
    7: (0, 'NNet.Game.SCommandManagerResetEvent'),
}
"#;

    fn ctx() -> ProtocolContext {
        ProtocolContext::from_source(SOURCE).unwrap()
    }

    #[test]
    fn test_resolve_by_id_and_name() {
        let ctx = ctx();
        assert_eq!(ctx.resolve(&TypeRef::Id(1)).unwrap(), &TypeInfo::Bool);
        assert_eq!(ctx.resolve_id(&"small_typeid".into()), Some(0));
        assert_eq!(ctx.resolve_id(&"quoted_typeid".into()), Some(1));
        assert_eq!(ctx.resolve_id(&"1".into()), Some(1));
    }

    #[test]
    fn test_unresolvable_names_are_unknown_types() {
        let ctx = ctx();
        for name in ["label", "missing_typeid"] {
            let err = ctx.resolve(&name.into()).unwrap_err();
            assert!(matches!(err, DecodeError::UnknownType(TypeRef::Name(ref n)) if n == name));
        }
        assert!(matches!(
            ctx.resolve(&TypeRef::Id(2)),
            Err(DecodeError::UnknownType(TypeRef::Id(2)))
        ));
    }

    #[test]
    fn test_supplemental_only_fills_misses() {
        let ctx = ProtocolContext::builder()
            .schema_source(SOURCE)
            .supplemental_json(r#"{"typeinfos": {"0": ["_fourcc", []], "9": ["_fourcc", []]}}"#)
            .build()
            .unwrap();
        assert!(matches!(ctx.resolve(&TypeRef::Id(0)).unwrap(), TypeInfo::Int(_)));
        assert_eq!(ctx.resolve(&TypeRef::Id(9)).unwrap(), &TypeInfo::FourCC);
        assert_eq!(ctx.supplemental().len(), 2);
    }

    #[test]
    fn test_catalogs_are_compiled() {
        let ctx = ctx();
        let catalog = ctx.catalog("game_event_types").unwrap();
        assert_eq!(catalog.len(), 2);
        let entry = catalog.get(7).unwrap();
        assert_eq!(entry.type_ref, TypeRef::Id(0));
        assert_eq!(entry.name, "NNet.Game.SCommandManagerResetEvent");
        assert!(ctx.catalog("typeinfos").is_none());
        assert_eq!(ctx.catalog_names().collect::<Vec<_>>(), vec!["game_event_types"]);
    }

    #[test]
    fn test_constants() {
        let ctx = ctx();
        assert_eq!(ctx.constant("small_typeid"), Some(0));
        assert_eq!(ctx.constant("label"), None);
    }

    #[test]
    fn test_empty_builder_has_no_types() {
        let ctx = ProtocolContext::builder().build().unwrap();
        assert!(ctx.types().is_empty());
        assert!(ctx.document().is_empty());
    }

    #[test]
    fn test_bad_schema_source_fails_build() {
        let err = ProtocolContext::from_source("typeinfos = [(]").unwrap_err();
        assert!(matches!(err, ProtocolError::Schema(_)));
    }

    #[test]
    fn test_context_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProtocolContext>();
    }
}
