//! Open-ended option bags (`type_properties`, each `parser_settings` section).

use serde_json::{Map, Value};

use super::meta::{property_schema, validate_against};
use crate::error::{LoaderError, LoaderResult};

/// A key/value options bag whose key space is fixed by a meta-schema object node.
///
/// Reads fall back to the meta-schema default. Writing a value equal to the default removes the
/// explicit entry, so serialized documents stay minimal.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBag {
    schema: &'static Value,
    values: Map<String, Value>,
}

impl PropertyBag {
    pub(crate) fn new(schema: &'static Value) -> Self {
        Self {
            schema,
            values: Map::new(),
        }
    }

    /// Build from an already validated map.
    pub(crate) fn from_map(schema: &'static Value, values: Map<String, Value>) -> Self {
        Self { schema, values }
    }

    /// Keys declared by the meta-schema, in declaration order.
    pub fn available_keys(&self) -> Vec<&'static str> {
        let schema: &'static Value = self.schema;
        schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn property(&self, key: &str) -> LoaderResult<&'static Value> {
        let schema: &'static Value = self.schema;
        property_schema(schema, key).ok_or_else(|| LoaderError::UnknownKey {
            key: key.to_string(),
        })
    }

    /// Explicit value or the meta-schema default; `None` when neither exists.
    pub fn get(&self, key: &str) -> LoaderResult<Option<&Value>> {
        let property = self.property(key)?;
        Ok(self.values.get(key).or_else(|| property.get("default")))
    }

    /// String-typed [`Self::get`].
    pub fn get_str(&self, key: &str) -> LoaderResult<Option<&str>> {
        Ok(self.get(key)?.and_then(Value::as_str))
    }

    /// Boolean-typed [`Self::get`].
    pub fn get_bool(&self, key: &str) -> LoaderResult<Option<bool>> {
        Ok(self.get(key)?.and_then(Value::as_bool))
    }

    /// Returns true if `key` is stored explicitly rather than defaulted.
    pub fn is_explicit(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Set `key`, validating the value against its property schema.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> LoaderResult<()> {
        let property = self.property(key)?;
        let value = value.into();
        let violations = validate_against(property, &value, &format!("/{key}"));
        if !violations.is_empty() {
            return Err(LoaderError::Validation { violations });
        }
        if property.get("default") == Some(&value) {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Remove an explicit entry, returning it.
    pub fn remove(&mut self, key: &str) -> LoaderResult<Option<Value>> {
        self.property(key)?;
        Ok(self.values.remove(key))
    }

    /// The `description` of a property.
    pub fn property_docs(&self, key: &str) -> LoaderResult<&'static str> {
        Ok(self
            .property(key)?
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or(""))
    }

    /// Allowed values of an enum property.
    pub fn enum_values(&self, key: &str) -> LoaderResult<Option<&'static [Value]>> {
        Ok(self
            .property(key)?
            .get("enum")
            .and_then(Value::as_array)
            .map(Vec::as_slice))
    }

    /// Returns true if nothing is stored explicitly.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Explicit entries only.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}
