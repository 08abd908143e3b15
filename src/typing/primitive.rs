//! Primitive logical types: direct mappings onto a native scalar kind.

use std::sync::Arc;

use super::{LogicalType, Resolution, TypeResolver};
use crate::schema::PropertyBag;
use crate::types::{NativeKind, Value};

/// The closed set of primitive type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Boolean,
    Integer,
    Float,
    String,
    Binary,
}

impl PrimitiveKind {
    /// Exact, case-sensitive name match.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "string" => Some(Self::String),
            "binary" => Some(Self::Binary),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Binary => "binary",
        }
    }

    /// The native kind this primitive coerces to.
    pub fn native_kind(self) -> NativeKind {
        match self {
            Self::Boolean => NativeKind::Boolean,
            Self::Integer => NativeKind::Integer,
            Self::Float => NativeKind::Float,
            Self::String => NativeKind::Text,
            Self::Binary => NativeKind::Binary,
        }
    }
}

/// A resolved primitive type. `encoding` only matters for `binary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveType {
    kind: PrimitiveKind,
    encoding: String,
}

impl PrimitiveType {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            encoding: "utf-8".to_string(),
        }
    }

    /// Read `encoding` from the column's type properties.
    pub fn with_properties(kind: PrimitiveKind, properties: &PropertyBag) -> Self {
        let mut ty = Self::new(kind);
        if let Ok(Some(encoding)) = properties.get_str("encoding") {
            ty.encoding = encoding.to_string();
        }
        ty
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    fn encode(&self, raw: &str) -> Result<Vec<u8>, String> {
        match self.encoding.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(raw.as_bytes().to_vec()),
            "ascii" | "us-ascii" => {
                if raw.is_ascii() {
                    Ok(raw.as_bytes().to_vec())
                } else {
                    Err("text is not ascii".to_string())
                }
            }
            "latin-1" | "latin1" | "iso-8859-1" => raw
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| format!("'{c}' is not latin-1")))
                .collect(),
            other => Err(format!("unsupported encoding '{other}'")),
        }
    }
}

impl LogicalType for PrimitiveType {
    fn name(&self) -> &str {
        self.kind.name()
    }

    /// Empty or whitespace-only text is `Null` for every primitive except `string`.
    fn parse(&self, raw: &str) -> Result<Value, String> {
        if self.kind == PrimitiveKind::String {
            return Ok(Value::Utf8(raw.to_owned()));
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        match self.kind {
            PrimitiveKind::Boolean => parse_bool(trimmed).map(Value::Bool),
            PrimitiveKind::Integer => trimmed
                .parse::<i64>()
                .map(Value::Int64)
                .map_err(|e| e.to_string()),
            PrimitiveKind::Float => trimmed
                .parse::<f64>()
                .map(Value::Float64)
                .map_err(|e| e.to_string()),
            PrimitiveKind::Binary => self.encode(raw).map(Value::Binary),
            PrimitiveKind::String => Ok(Value::Utf8(raw.to_owned())),
        }
    }

    fn is_target(&self, native: &NativeKind) -> bool {
        *native == self.kind.native_kind()
    }

    fn represent(&self, value: &Value) -> String {
        match value {
            Value::Utf8(s) if self.kind != PrimitiveKind::String => match self.parse(s) {
                Ok(parsed) => parsed.to_string(),
                Err(_) => s.clone(),
            },
            other => other.to_string(),
        }
    }

    fn sample(&self, n: usize) -> String {
        match self.kind {
            PrimitiveKind::Boolean => (n % 2 == 1).to_string(),
            PrimitiveKind::Integer => n.to_string(),
            PrimitiveKind::Float => format!("{n}.0"),
            PrimitiveKind::String | PrimitiveKind::Binary => format!("value {n}"),
        }
    }
}

/// Resolves the five primitive names.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimitiveResolver;

impl TypeResolver for PrimitiveResolver {
    fn resolve(&self, name: &str, properties: &PropertyBag) -> Resolution {
        match PrimitiveKind::from_name(name) {
            Some(kind) => Resolution::Found(Arc::new(PrimitiveType::with_properties(kind, properties))),
            None => Resolution::NotFound,
        }
    }
}

/// Parse common boolean spellings (case-insensitive).
pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;

    fn resolve(column: &Column) -> PrimitiveType {
        PrimitiveType::with_properties(
            PrimitiveKind::from_name(column.type_name()).unwrap(),
            column.type_properties(),
        )
    }

    #[test]
    fn binary_honours_encoding() {
        let mut column = Column::new("payload", "binary");
        assert_eq!(
            resolve(&column).parse("é").unwrap(),
            Value::Binary(vec![0xc3, 0xa9])
        );

        column.type_properties_mut().set("encoding", "latin-1").unwrap();
        assert_eq!(resolve(&column).parse("é").unwrap(), Value::Binary(vec![0xe9]));

        column.type_properties_mut().set("encoding", "ascii").unwrap();
        assert!(resolve(&column).parse("é").is_err());
    }

    #[test]
    fn blank_numeric_text_is_null_but_blank_string_is_kept() {
        let int = PrimitiveType::new(PrimitiveKind::Integer);
        assert_eq!(int.parse("  ").unwrap(), Value::Null);
        assert!(int.parse("1.5").is_err());

        let s = PrimitiveType::new(PrimitiveKind::String);
        assert_eq!(s.parse(" ").unwrap(), Value::Utf8(" ".to_string()));
    }

    #[test]
    fn samples_parse_back() {
        for kind in [
            PrimitiveKind::Boolean,
            PrimitiveKind::Integer,
            PrimitiveKind::Float,
            PrimitiveKind::String,
            PrimitiveKind::Binary,
        ] {
            let ty = PrimitiveType::new(kind);
            for n in 0..3 {
                assert!(ty.parse(&ty.sample(n)).is_ok(), "{kind:?} sample {n}");
            }
        }
    }
}
