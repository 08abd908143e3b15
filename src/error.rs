use thiserror::Error;

use crate::schema::Violation;

/// Convenience result type for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Error type returned by document loading, format readers and the database loader.
///
/// Validation findings against live database metadata (missing table, missing column, type
/// mismatch) are *not* errors; they are collected into
/// [`crate::database::LoadResult::errors`].
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema document or configuration file is not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV decoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// XML parsing error.
    #[error("xml error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Connection, reflection or insert failure at the database layer.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The schema document does not conform to the meta-schema.
    #[error("document validation failed: {}", join_violations(.violations))]
    Validation { violations: Vec<Violation> },

    /// A key outside the meta-schema property set was accessed.
    #[error("'{key}' is not a valid key")]
    UnknownKey { key: String },

    /// Connection settings are malformed or the engine cannot be constructed.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The document's `format` value has no matching reader.
    #[error("unsupported format '{format}'")]
    UnsupportedFormat { format: String },

    /// A declared type name could not be resolved by the type registry.
    #[error("unknown type '{name}' for column '{column}'")]
    UnknownType { column: String, name: String },

    /// A raw value could not be coerced to its column's logical type.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    Decode {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// The input stream does not have the structure the format reader expects.
    #[error("malformed source: {message}")]
    MalformedSource { message: String },
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
