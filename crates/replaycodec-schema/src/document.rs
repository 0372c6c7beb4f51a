//! The parsed schema: every top-level binding of the source module.

use serde_json::{Map, Value};
use tracing::debug;

use crate::transcode::{transcode, Rendering};
use crate::SchemaError;

/// Name of the binding that holds the type descriptors.
pub const TYPEINFOS: &str = "typeinfos";

/// All `name = literal` bindings of a schema source, as JSON values.
///
/// Built once at startup and read-only afterwards. Besides
/// [`TYPEINFOS`] it typically holds event catalogs
/// (`tracker_event_types = {...}`) and type-id constants
/// (`replay_header_typeid = 18`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDocument {
    bindings: Map<String, Value>,
}

impl SchemaDocument {
    /// Tokenizes, transcodes and parses a schema source.
    ///
    /// # Errors
    /// Any [`SchemaError`]; no partial document is returned.
    pub fn load(source: &str) -> Result<Self, SchemaError> {
        let json = transcode(source, Rendering::Minified)?;
        let document = Self::from_json(&json)?;
        debug!(
            bindings = document.len(),
            has_typeinfos = document.typeinfos().is_some(),
            "schema document loaded"
        );
        Ok(document)
    }

    /// Parses already-transcoded JSON text. The top level must be an object.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let bindings = serde_json::from_str(json).map_err(SchemaError::Parse)?;
        Ok(Self { bindings })
    }

    /// Looks up a top-level binding.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// The `typeinfos` binding, if present.
    pub fn typeinfos(&self) -> Option<&Value> {
        self.get(TYPEINFOS)
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Borrows the bindings as a JSON object map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.bindings
    }

    /// Consumes the document, returning it as a JSON object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_collects_bindings() {
        let doc = SchemaDocument::load("a = 1\nb = [2, 3]").unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get("a"), Some(&Value::from(1)));
        assert_eq!(doc.get("b").unwrap()[1], 3);
        assert!(doc.typeinfos().is_none());
    }

    #[test]
    fn test_load_empty_source() {
        let doc = SchemaDocument::load("# nothing here\n").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_invalid_structure_is_parse_error() {
        // Passthrough `*` makes the JSON invalid.
        let err = SchemaDocument::load("from decoders import *").unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(SchemaDocument::from_json("[1, 2]").is_err());
    }
}
