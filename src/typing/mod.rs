//! Logical types and the resolver chain that maps declared type names onto them.
//!
//! A [`TypeRegistry`] is an ordered list of [`TypeResolver`]s. Resolution is first-match: the
//! first resolver returning [`Resolution::Found`] wins, so resolvers registered later can add
//! type names without shadowing the built-in ones.
//!
//! ```rust
//! use datafile_loader::schema::Column;
//! use datafile_loader::types::NativeKind;
//! use datafile_loader::typing::TypeRegistry;
//!
//! let registry = TypeRegistry::default();
//! let column = Column::new("value", "float");
//! let ty = registry.resolve_column(&column).found().unwrap();
//! assert!(ty.is_target(&NativeKind::Float));
//! assert!(!ty.is_target(&NativeKind::Text));
//! ```

mod datetime;
mod primitive;

use std::fmt;
use std::sync::Arc;

use crate::error::{LoaderError, LoaderResult};
use crate::schema::{Column, PropertyBag};
use crate::types::{NativeKind, Value};

pub use datetime::{DatetimeResolver, IsoDatetimeType};
pub use primitive::{parse_bool, PrimitiveKind, PrimitiveResolver, PrimitiveType};

/// A named rule for coercing raw text and checking live column compatibility.
pub trait LogicalType: fmt::Debug + Send + Sync {
    /// Declared type name (e.g. `"integer"`).
    fn name(&self) -> &str;

    /// Coerce raw text into a typed value. The error is a human-readable reason.
    fn parse(&self, raw: &str) -> Result<Value, String>;

    /// Returns true if a live column of kind `native` can store values of this type.
    fn is_target(&self, native: &NativeKind) -> bool;

    /// Display form of a value of this type.
    fn represent(&self, value: &Value) -> String {
        value.to_string()
    }

    /// The `n`-th sample value, as raw text that [`Self::parse`] accepts.
    fn sample(&self, n: usize) -> String;
}

/// Outcome of resolving a declared type.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(Arc<dyn LogicalType>),
    NotFound,
}

impl Resolution {
    /// Returns the resolved type, if any.
    pub fn found(self) -> Option<Arc<dyn LogicalType>> {
        match self {
            Resolution::Found(ty) => Some(ty),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// One link of the resolver chain.
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, name: &str, properties: &PropertyBag) -> Resolution;
}

/// Ordered chain of [`TypeResolver`]s.
pub struct TypeRegistry {
    resolvers: Vec<Box<dyn TypeResolver>>,
}

impl TypeRegistry {
    /// A registry with no resolvers; every name is unknown.
    pub fn empty() -> Self {
        Self { resolvers: Vec::new() }
    }

    /// Append a resolver at the end of the chain.
    pub fn register(&mut self, resolver: impl TypeResolver + 'static) -> &mut Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Resolve a type name with its properties; first match wins.
    pub fn resolve(&self, name: &str, properties: &PropertyBag) -> Resolution {
        self.resolvers
            .iter()
            .map(|r| r.resolve(name, properties))
            .find(Resolution::is_found)
            .unwrap_or(Resolution::NotFound)
    }

    /// Resolve a column's declared type.
    pub fn resolve_column(&self, column: &Column) -> Resolution {
        self.resolve(column.type_name(), column.type_properties())
    }

    /// Resolve a column's declared type, failing with [`LoaderError::UnknownType`].
    pub fn require_column(&self, column: &Column) -> LoaderResult<Arc<dyn LogicalType>> {
        self.resolve_column(column)
            .found()
            .ok_or_else(|| LoaderError::UnknownType {
                column: column.name().to_string(),
                name: column.type_name().to_string(),
            })
    }
}

impl Default for TypeRegistry {
    /// Primitive types followed by `datetime`.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(PrimitiveResolver).register(DatetimeResolver);
        registry
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("resolvers_len", &self.resolvers.len())
            .finish()
    }
}

/// Declared type name that the built-in resolvers map onto a live column kind.
///
/// Returns `None` for kinds no built-in type targets (`DATE`, `TIME`, `NUMERIC`, unknown).
pub fn declared_type_for(native: &NativeKind) -> Option<&'static str> {
    match native {
        NativeKind::Boolean => Some(PrimitiveKind::Boolean.name()),
        NativeKind::Integer => Some(PrimitiveKind::Integer.name()),
        NativeKind::Float => Some(PrimitiveKind::Float.name()),
        NativeKind::Text => Some(PrimitiveKind::String.name()),
        NativeKind::Binary => Some(PrimitiveKind::Binary.name()),
        NativeKind::Timestamp => Some(datetime::DATETIME_TYPE_NAME),
        NativeKind::Date | NativeKind::Time | NativeKind::Numeric | NativeKind::Other(_) => None,
    }
}
