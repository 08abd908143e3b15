//! The embedded meta-schema and a validator for the JSON-Schema subset it uses.
//!
//! Supported keywords are listed in [`VALIDATED_KEYWORDS`]; any other keyword in `schema.json`
//! would be ignored, so a unit test keeps the two in sync. Every violation in an instance is
//! reported, not only the first one.

use std::fmt;
use std::sync::OnceLock;

use serde_json::Value;

const META_SCHEMA_JSON: &str = include_str!("schema.json");

/// Keywords enforced by the validator. `additionalProperties` is honoured only as `false`.
pub const VALIDATED_KEYWORDS: &[&str] = &[
    "type",
    "enum",
    "properties",
    "required",
    "additionalProperties",
    "items",
    "minLength",
    "maxLength",
];

/// Pointer to the `type_properties` bag schema.
pub(crate) const TYPE_PROPERTIES_POINTER: &str = "/properties/columns/items/properties/type_properties";
/// Pointer to the `parser_settings` object schema.
pub(crate) const PARSER_SETTINGS_POINTER: &str = "/properties/parser_settings";

/// A single meta-schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer to the offending value (empty for the document root).
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl Violation {
    pub(crate) fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// The fixed meta-schema every schema document is validated against.
#[derive(Debug)]
pub struct MetaSchema {
    root: Value,
}

impl MetaSchema {
    /// Shared, lazily parsed instance.
    pub fn get() -> &'static MetaSchema {
        static META: OnceLock<MetaSchema> = OnceLock::new();
        META.get_or_init(|| MetaSchema {
            root: serde_json::from_str(META_SCHEMA_JSON).expect("embedded meta-schema is valid JSON"),
        })
    }

    /// The raw meta-schema document.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Resolve a JSON pointer inside the meta-schema.
    pub fn node(&'static self, pointer: &str) -> Option<&'static Value> {
        self.root.pointer(pointer)
    }

    /// Validate a whole document instance.
    pub fn validate(&self, instance: &Value) -> Vec<Violation> {
        let mut out = Vec::new();
        validate_node(&self.root, instance, "", &mut out);
        out
    }
}

/// Validate `instance` against a schema node, reporting paths relative to `path`.
pub(crate) fn validate_against(schema: &Value, instance: &Value, path: &str) -> Vec<Violation> {
    let mut out = Vec::new();
    validate_node(schema, instance, path, &mut out);
    out
}

/// Schema of property `key` inside an object schema node.
pub(crate) fn property_schema<'a>(object_schema: &'a Value, key: &str) -> Option<&'a Value> {
    object_schema.get("properties")?.get(key)
}

fn validate_node(schema: &Value, instance: &Value, path: &str, out: &mut Vec<Violation>) {
    if let Some(expected) = schema.get("type").and_then(Value::as_str) {
        if !matches_type(expected, instance) {
            out.push(Violation::new(
                path,
                format!("expected {expected}, found {}", type_name(instance)),
            ));
            return;
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(instance) {
            out.push(Violation::new(
                path,
                format!("{instance} is not one of {}", Value::Array(allowed.clone())),
            ));
        }
    }

    match instance {
        Value::String(s) => {
            let len = s.chars().count() as u64;
            if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
                if len < min {
                    out.push(Violation::new(path, format!("string shorter than {min} character(s)")));
                }
            }
            if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
                if len > max {
                    out.push(Violation::new(path, format!("string longer than {max} character(s)")));
                }
            }
        }
        Value::Object(map) => {
            if let Some(required) = schema.get("required").and_then(Value::as_array) {
                for name in required.iter().filter_map(Value::as_str) {
                    if !map.contains_key(name) {
                        out.push(Violation::new(path, format!("missing required property '{name}'")));
                    }
                }
            }
            let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));
            for (key, value) in map {
                let child_path = format!("{path}/{}", escape_pointer(key));
                match property_schema(schema, key) {
                    Some(child) => validate_node(child, value, &child_path, out),
                    None if closed => {
                        out.push(Violation::new(path, format!("unknown property '{key}'")));
                    }
                    None => {}
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for (idx, item) in items.iter().enumerate() {
                    validate_node(item_schema, item, &format!("{path}/{idx}"), out);
                }
            }
        }
        _ => {}
    }
}

fn matches_type(expected: &str, instance: &Value) -> bool {
    match expected {
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "boolean" => instance.is_boolean(),
        "integer" => instance.is_i64() || instance.is_u64(),
        "number" => instance.is_number(),
        "null" => instance.is_null(),
        _ => true,
    }
}

fn type_name(instance: &Value) -> &'static str {
    match instance {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Documentation and defaults; never validated.
    const ANNOTATION_KEYWORDS: &[&str] = &["$schema", "title", "description", "default"];

    #[test]
    fn reports_every_violation() {
        let doc = json!({
            "format": "TSV",
            "columns": [{"name": "", "type": "integer", "extra": 1}],
            "bogus": true
        });
        let violations = MetaSchema::get().validate(&doc);
        let text: Vec<String> = violations.iter().map(|v| v.to_string()).collect();

        assert!(text.iter().any(|t| t.contains("missing required property 'table'")));
        assert!(text.iter().any(|t| t.contains("unknown property 'bogus'")));
        assert!(text.iter().any(|t| t.starts_with("/format")));
        assert!(text.iter().any(|t| t.starts_with("/columns/0/name")));
        assert!(text.iter().any(|t| t.contains("unknown property 'extra'")));
    }

    fn unsupported_keywords(schema: &Value, path: &str, out: &mut Vec<String>) {
        let Some(map) = schema.as_object() else {
            return;
        };
        for (key, value) in map {
            if !VALIDATED_KEYWORDS.contains(&key.as_str()) && !ANNOTATION_KEYWORDS.contains(&key.as_str()) {
                out.push(format!("{path}/{key}"));
            }
        }
        if let Some(props) = map.get("properties").and_then(Value::as_object) {
            for (name, child) in props {
                unsupported_keywords(child, &format!("{path}/properties/{name}"), out);
            }
        }
        if let Some(items) = map.get("items") {
            unsupported_keywords(items, &format!("{path}/items"), out);
        }
        if let Some(extra) = map.get("additionalProperties") {
            if extra != &Value::Bool(false) {
                out.push(format!("{path}/additionalProperties"));
            }
        }
        if let Some(ty) = map.get("type").and_then(Value::as_str) {
            if !["object", "array", "string", "boolean", "integer", "number", "null"].contains(&ty) {
                out.push(format!("{path}/type"));
            }
        }
    }

    #[test]
    fn embedded_schema_uses_only_validated_keywords() {
        let mut unsupported = Vec::new();
        unsupported_keywords(MetaSchema::get().root(), "", &mut unsupported);
        assert!(unsupported.is_empty(), "unsupported keywords: {unsupported:?}");
    }

    #[test]
    fn minimal_document_is_valid() {
        let doc = json!({"table": "t", "columns": []});
        assert!(MetaSchema::get().validate(&doc).is_empty());
    }
}
