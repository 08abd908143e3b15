//! Format readers and load observability.
//!
//! Most callers should use [`open_reader`] (from [`unified`]) which:
//!
//! - selects the reader from the document's `format` (failing fast on unknown formats)
//! - resolves every column's logical type through a [`crate::typing::TypeRegistry`]
//! - yields [`crate::types::RowRecord`]s lazily
//!
//! Format-specific readers live under:
//! - [`csv`]
//! - [`xml`]

pub mod csv;
pub mod observability;
pub mod unified;
pub mod xml;

pub use observability::{
    CompositeObserver, FileObserver, LoadContext, LoadObserver, LoadSeverity, LoadStats, TracingObserver,
};
pub use unified::{open_reader, read_rows_from_path, resolve_columns, RowReader, SourceFormat, TypedColumn};
