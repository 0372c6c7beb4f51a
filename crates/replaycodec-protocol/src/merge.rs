//! The struct assembly rule shared by both wire modes.

use std::collections::BTreeMap;

use crate::types::{Field, TypeRef};
use crate::{DecodeError, Value};

/// Field name that marks inheritance by composition.
pub const PARENT_FIELD: &str = "__parent";

/// Accumulates decoded struct fields.
///
/// Ordinary fields are stored by name. A [`PARENT_FIELD`] value is merged:
///
/// - a mapping has its keys copied into the result, overwriting earlier
///   ones and overwritten by later ones;
/// - otherwise, when the struct declares exactly one field, the parent
///   value becomes the whole result;
/// - otherwise it is stored under `__parent` like any other field.
///
/// Each decoder passes its own field decoder to
/// [`decode_field`](Self::decode_field), so the rule exists once for both
/// grammars.
#[derive(Debug)]
pub(crate) struct StructBuilder {
    fields: BTreeMap<String, Value>,
    replacement: Option<Value>,
    declared: usize,
}

impl StructBuilder {
    pub(crate) fn new(declared: usize) -> Self {
        Self {
            fields: BTreeMap::new(),
            replacement: None,
            declared,
        }
    }

    /// Decodes one field with `decode` and folds it into the result.
    pub(crate) fn decode_field<F>(&mut self, field: &Field, decode: F) -> Result<(), DecodeError>
    where
        F: FnOnce(&TypeRef) -> Result<Value, DecodeError>,
    {
        let value = decode(&field.type_ref)?;
        self.absorb(&field.name, value);
        Ok(())
    }

    pub(crate) fn absorb(&mut self, name: &str, value: Value) {
        if name != PARENT_FIELD {
            self.fields.insert(name.to_owned(), value);
            return;
        }
        match value {
            Value::Map(map) => self.fields.extend(map),
            other if self.declared == 1 => self.replacement = Some(other),
            other => {
                self.fields.insert(PARENT_FIELD.to_owned(), other);
            }
        }
    }

    pub(crate) fn finish(self) -> Value {
        self.replacement.unwrap_or(Value::Map(self.fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> Field {
        Field {
            name: name.to_owned(),
            type_ref: TypeRef::Id(0),
            tag: None,
        }
    }

    #[test]
    fn test_plain_fields_by_name() {
        let mut builder = StructBuilder::new(2);
        builder.decode_field(&field("m_a"), |_| Ok(Value::Int(1))).unwrap();
        builder.decode_field(&field("m_b"), |_| Ok(Value::Bool(true))).unwrap();
        let value = builder.finish();
        assert_eq!(value.get("m_a"), Some(&Value::Int(1)));
        assert_eq!(value.get("m_b"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_mapping_parent_merges_and_later_fields_win() {
        let mut parent = BTreeMap::new();
        parent.insert("m_a".to_owned(), Value::Int(1));
        parent.insert("m_b".to_owned(), Value::Int(2));

        let mut builder = StructBuilder::new(2);
        builder.absorb(PARENT_FIELD, Value::Map(parent));
        builder.absorb("m_b", Value::Int(9));
        let value = builder.finish();
        assert_eq!(value.get("m_a"), Some(&Value::Int(1)));
        assert_eq!(value.get("m_b"), Some(&Value::Int(9)));
        assert!(value.get(PARENT_FIELD).is_none());
    }

    #[test]
    fn test_lone_scalar_parent_replaces_result() {
        let mut builder = StructBuilder::new(1);
        builder.absorb(PARENT_FIELD, Value::Int(42));
        assert_eq!(builder.finish(), Value::Int(42));
    }

    #[test]
    fn test_scalar_parent_among_fields_is_kept_under_marker() {
        let mut builder = StructBuilder::new(2);
        builder.absorb(PARENT_FIELD, Value::Int(42));
        builder.absorb("m_c", Value::Bool(false));
        let value = builder.finish();
        assert_eq!(value.get(PARENT_FIELD), Some(&Value::Int(42)));
        assert_eq!(value.get("m_c"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_decoder_error_propagates() {
        let mut builder = StructBuilder::new(1);
        let err = builder
            .decode_field(&field("m_a"), |r| Err(DecodeError::UnknownType(r.clone())))
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownType(TypeRef::Id(0))));
    }
}
