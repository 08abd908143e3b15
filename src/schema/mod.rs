//! Schema documents: validated descriptions of one loadable data file and its target table.
//!
//! A [`Document`] is loaded from JSON and validated against the embedded [`MetaSchema`]
//! before any field is read. Top-level keys are typed fields; the open-ended
//! `parser_settings` sections and each column's `type_properties` are [`PropertyBag`]s whose key
//! space is still fixed by the meta-schema.
//!
//! ```no_run
//! use datafile_loader::schema::Document;
//!
//! # fn main() -> Result<(), datafile_loader::LoaderError> {
//! let doc = Document::load("detector_.json")?;
//! println!("table={} columns={}", doc.table(), doc.columns().len());
//! # Ok(())
//! # }
//! ```

mod bag;
mod meta;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{LoaderError, LoaderResult};
use crate::ingestion::SourceFormat;

pub use bag::PropertyBag;
pub use meta::{MetaSchema, VALIDATED_KEYWORDS, Violation};

use meta::{property_schema, validate_against, PARSER_SETTINGS_POINTER, TYPE_PROPERTIES_POINTER};

fn schema_node(pointer: &str) -> &'static Value {
    MetaSchema::get()
        .node(pointer)
        .expect("pointer exists in embedded meta-schema")
}

/// One column descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    type_name: String,
    type_properties: PropertyBag,
}

impl Column {
    /// Create a column with empty `type_properties`.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            type_properties: PropertyBag::new(schema_node(TYPE_PROPERTIES_POINTER)),
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared logical type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn set_type_name(&mut self, type_name: impl Into<String>) {
        self.type_name = type_name.into();
    }

    /// Type-specific options.
    pub fn type_properties(&self) -> &PropertyBag {
        &self.type_properties
    }

    pub fn type_properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.type_properties
    }

    fn from_map(mut map: Map<String, Value>) -> Self {
        let mut column = Column::new(
            take_string(&mut map, "name").unwrap_or_default(),
            take_string(&mut map, "type").unwrap_or_default(),
        );
        if let Some(Value::Object(props)) = map.remove("type_properties") {
            column.type_properties = PropertyBag::from_map(schema_node(TYPE_PROPERTIES_POINTER), props);
        }
        column
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("type".to_string(), Value::String(self.type_name.clone()));
        if !self.type_properties.is_empty() {
            map.insert("type_properties".to_string(), self.type_properties.to_value());
        }
        Value::Object(map)
    }
}

/// A validated schema document.
///
/// Cloning produces a fully independent copy; only the immutable meta-schema is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    table: String,
    format: Option<String>,
    columns: Vec<Column>,
    parser_settings: BTreeMap<String, PropertyBag>,
}

impl Document {
    /// Read and validate a document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> LoaderResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a document from JSON text.
    pub fn from_json_str(input: &str) -> LoaderResult<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Validate and convert a JSON value.
    ///
    /// Absent object/array properties are built eagerly as empty containers.
    pub fn from_value(value: Value) -> LoaderResult<Self> {
        let violations = Self::validate_value(&value);
        if !violations.is_empty() {
            return Err(LoaderError::Validation { violations });
        }
        let mut root = match value {
            Value::Object(map) => map,
            _ => {
                return Err(LoaderError::Validation {
                    violations: vec![Violation::new("", "expected object")],
                });
            }
        };

        let table = take_string(&mut root, "table").unwrap_or_default();
        let format = take_string(&mut root, "format");
        let columns = match root.remove("columns") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(Column::from_map(map)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        let mut sections = match root.remove("parser_settings") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let mut parser_settings = BTreeMap::new();
        for name in section_names() {
            let schema = section_schema(name);
            let bag = match sections.remove(name) {
                Some(Value::Object(values)) => PropertyBag::from_map(schema, values),
                _ => PropertyBag::new(schema),
            };
            parser_settings.insert(name.to_string(), bag);
        }

        Ok(Self {
            table,
            format,
            columns,
            parser_settings,
        })
    }

    /// Placeholder document used when authoring a new description.
    pub fn empty() -> Self {
        let mut doc = Self {
            table: String::new(),
            format: None,
            columns: vec![Column::new("column 1", "float")],
            parser_settings: BTreeMap::new(),
        };
        for name in section_names() {
            doc.parser_settings
                .insert(name.to_string(), PropertyBag::new(section_schema(name)));
        }
        doc
    }

    /// All meta-schema violations of a raw JSON value, plus duplicate column names.
    pub fn validate_value(value: &Value) -> Vec<Violation> {
        let mut violations = MetaSchema::get().validate(value);

        if let Some(columns) = value.get("columns").and_then(Value::as_array) {
            let mut seen = HashSet::new();
            for (idx, column) in columns.iter().enumerate() {
                if let Some(name) = column.get("name").and_then(Value::as_str) {
                    if !seen.insert(name) {
                        violations.push(Violation::new(
                            format!("/columns/{idx}/name"),
                            format!("duplicate column name '{name}'"),
                        ));
                    }
                }
            }
        }
        violations
    }

    /// Target table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn set_table(&mut self, table: impl Into<String>) {
        self.table = table.into();
    }

    /// The `format` value, or the meta-schema default when not set explicitly.
    pub fn format_name(&self) -> &str {
        match &self.format {
            Some(name) => name.as_str(),
            None => schema_node("/properties/format/default")
                .as_str()
                .unwrap_or_default(),
        }
    }

    /// Resolve the `format` value into a reader selection.
    pub fn source_format(&self) -> LoaderResult<SourceFormat> {
        SourceFormat::from_name(self.format_name())
    }

    /// Set `format`; the default value is stored implicitly.
    pub fn set_format(&mut self, format: impl Into<String>) -> LoaderResult<()> {
        self.set("format", Value::String(format.into()))
    }

    /// Column descriptors in file order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Mutable handle on the column list; changes apply to this document.
    pub fn columns_mut(&mut self) -> &mut Vec<Column> {
        &mut self.columns
    }

    /// Append a column, rejecting duplicate names.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> LoaderResult<&mut Column> {
        let name = name.into();
        if self.columns.iter().any(|c| c.name == name) {
            return Err(LoaderError::Validation {
                violations: vec![Violation::new(
                    format!("/columns/{}/name", self.columns.len()),
                    format!("duplicate column name '{name}'"),
                )],
            });
        }
        self.columns.push(Column::new(name, type_name));
        let last = self.columns.len() - 1;
        Ok(&mut self.columns[last])
    }

    /// Options section for a format name (e.g. `"CSV"`).
    pub fn parser_settings(&self, format: &str) -> LoaderResult<&PropertyBag> {
        self.parser_settings
            .get(format)
            .ok_or_else(|| LoaderError::UnknownKey {
                key: format!("parser_settings.{format}"),
            })
    }

    /// Mutable options section; changes apply to this document.
    pub fn parser_settings_mut(&mut self, format: &str) -> LoaderResult<&mut PropertyBag> {
        self.parser_settings
            .get_mut(format)
            .ok_or_else(|| LoaderError::UnknownKey {
                key: format!("parser_settings.{format}"),
            })
    }

    /// Top-level keys declared by the meta-schema.
    pub fn available_keys() -> Vec<&'static str> {
        MetaSchema::get()
            .node("/properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Read a top-level property as JSON, resolving defaults.
    pub fn get(&self, key: &str) -> LoaderResult<Value> {
        match key {
            "table" => Ok(Value::String(self.table.clone())),
            "format" => Ok(Value::String(self.format_name().to_string())),
            "columns" => Ok(Value::Array(self.columns.iter().map(Column::to_value).collect())),
            "parser_settings" => Ok(self.parser_settings_value()),
            _ => Err(LoaderError::UnknownKey { key: key.to_string() }),
        }
    }

    /// Write a scalar top-level property after validating it against the meta-schema.
    ///
    /// `columns` and `parser_settings` are edited through [`Self::columns_mut`] and
    /// [`Self::parser_settings_mut`].
    pub fn set(&mut self, key: &str, value: Value) -> LoaderResult<()> {
        let property = property_schema(MetaSchema::get().root(), key).ok_or_else(|| {
            LoaderError::UnknownKey { key: key.to_string() }
        })?;
        let violations = validate_against(property, &value, &format!("/{key}"));
        if !violations.is_empty() {
            return Err(LoaderError::Validation { violations });
        }
        match (key, value) {
            ("table", Value::String(table)) => self.table = table,
            ("format", Value::String(format)) => {
                let is_default = property.get("default").and_then(Value::as_str) == Some(format.as_str());
                self.format = if is_default { None } else { Some(format) };
            }
            (key, _) => {
                return Err(LoaderError::Validation {
                    violations: vec![Violation::new(
                        format!("/{key}"),
                        "only scalar properties can be set directly",
                    )],
                });
            }
        }
        Ok(())
    }

    /// `description` of a top-level property.
    pub fn property_docs(key: &str) -> LoaderResult<&'static str> {
        let root: &'static Value = MetaSchema::get().root();
        property_schema(root, key)
            .map(|p| p.get("description").and_then(Value::as_str).unwrap_or(""))
            .ok_or_else(|| LoaderError::UnknownKey { key: key.to_string() })
    }

    /// Allowed values of an enum top-level property.
    pub fn enum_values(key: &str) -> LoaderResult<Option<&'static [Value]>> {
        let root: &'static Value = MetaSchema::get().root();
        property_schema(root, key)
            .map(|p| p.get("enum").and_then(Value::as_array).map(Vec::as_slice))
            .ok_or_else(|| LoaderError::UnknownKey { key: key.to_string() })
    }

    /// Minimal JSON form: defaults and empty containers are omitted.
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        root.insert("table".to_string(), Value::String(self.table.clone()));
        if let Some(format) = &self.format {
            root.insert("format".to_string(), Value::String(format.clone()));
        }
        root.insert(
            "columns".to_string(),
            Value::Array(self.columns.iter().map(Column::to_value).collect()),
        );
        let settings = self.parser_settings_value();
        if settings.as_object().is_some_and(|m| !m.is_empty()) {
            root.insert("parser_settings".to_string(), settings);
        }
        Value::Object(root)
    }

    /// Write the document as pretty JSON.
    pub fn dump(&self, path: impl AsRef<Path>) -> LoaderResult<()> {
        let text = serde_json::to_string_pretty(&self.to_value())?;
        fs::write(path, text)?;
        Ok(())
    }

    fn parser_settings_value(&self) -> Value {
        Value::Object(
            self.parser_settings
                .iter()
                .filter(|(_, bag)| !bag.is_empty())
                .map(|(name, bag)| (name.clone(), bag.to_value()))
                .collect(),
        )
    }
}

fn section_names() -> Vec<&'static str> {
    schema_node(PARSER_SETTINGS_POINTER)
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

fn section_schema(name: &str) -> &'static Value {
    property_schema(schema_node(PARSER_SETTINGS_POINTER), name)
        .expect("section name comes from the meta-schema")
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_format_is_not_stored() {
        let mut doc = Document::empty();
        doc.set_format("XML").unwrap();
        assert_eq!(doc.to_value()["format"], json!("XML"));
        doc.set_format("CSV").unwrap();
        assert!(doc.to_value().get("format").is_none());
        assert_eq!(doc.format_name(), "CSV");
    }

    #[test]
    fn empty_sections_are_omitted() {
        let mut doc = Document::empty();
        assert!(doc.to_value().get("parser_settings").is_none());
        doc.parser_settings_mut("XML").unwrap().set("header", true).unwrap();
        assert_eq!(doc.to_value()["parser_settings"], json!({"XML": {"header": true}}));
    }
}
