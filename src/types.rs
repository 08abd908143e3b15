//! Core data model types shared by the readers and the database loader.
//!
//! Format readers produce [`RowRecord`]s of typed [`Value`]s; the loader compares declared
//! columns against live [`TableMetadata`] reflected from the database.

use std::fmt;

use chrono::NaiveDateTime;

/// A single value in a [`RowRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string. CSV readers produce raw text in this variant.
    Utf8(String),
    /// Raw bytes.
    Binary(Vec<u8>),
    /// Timestamp without time zone (UTC when the source carried an offset).
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns the raw text if this is a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v:?}"),
            Value::Utf8(v) => f.write_str(v),
            Value::Binary(v) => write!(f, "{}", String::from_utf8_lossy(v)),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

/// One decoded row: `(column name, value)` pairs in declared column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowRecord {
    fields: Vec<(String, Value)>,
}

impl RowRecord {
    /// Create an empty record with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Append a field. Column names are unique per document, so no de-duplication happens here.
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.fields.push((column.into(), value));
    }

    /// Look up a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in record order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate `(column, value)` pairs in record order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, v)| (name.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for RowRecord {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Scalar kind of a live database column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeKind {
    Boolean,
    Integer,
    Float,
    Text,
    Binary,
    Timestamp,
    Date,
    Time,
    /// Fixed-point numeric (`NUMERIC`, `DECIMAL`); compatible with no primitive.
    Numeric,
    /// Declared type the loader does not recognise.
    Other(String),
}

impl NativeKind {
    /// Classify a declared SQL column type.
    ///
    /// Timestamp-like and boolean names are matched first; the remaining rules follow
    /// SQLite's column affinity (`INT` → integer, `CHAR`/`CLOB`/`TEXT` → text, `BLOB` or
    /// no type → binary, `REAL`/`FLOA`/`DOUB` → float).
    pub fn from_declared_type(declared: &str) -> Self {
        let upper = declared.trim().to_ascii_uppercase();
        if upper.contains("DATETIME") || upper.contains("TIMESTAMP") {
            NativeKind::Timestamp
        } else if upper.starts_with("BOOL") {
            NativeKind::Boolean
        } else if upper == "DATE" {
            NativeKind::Date
        } else if upper == "TIME" {
            NativeKind::Time
        } else if upper.contains("INT") {
            NativeKind::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            NativeKind::Text
        } else if upper.is_empty() || upper.contains("BLOB") || upper.contains("BINARY") {
            NativeKind::Binary
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            NativeKind::Float
        } else if upper.starts_with("NUMERIC") || upper.starts_with("DECIMAL") {
            NativeKind::Numeric
        } else {
            NativeKind::Other(declared.trim().to_string())
        }
    }
}

/// A live column reflected from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// Type name exactly as declared in the database.
    pub declared_type: String,
    /// Scalar kind derived from `declared_type`.
    pub kind: NativeKind,
}

impl ColumnMetadata {
    /// Create column metadata, classifying `declared_type`.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        let declared_type = declared_type.into();
        Self {
            name: name.into(),
            kind: NativeKind::from_declared_type(&declared_type),
            declared_type,
        }
    }
}

/// A live table reflected from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    /// Table name.
    pub name: String,
    /// Columns in table order.
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Iterate column names in table order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}
