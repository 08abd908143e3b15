//! Outcome of one load attempt.

use std::fmt;
use std::path::Path;

use crate::error::LoaderError;

/// Terminal state of a load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStatus {
    /// Every row was committed.
    Success,
    /// Validation findings or an exception; nothing was committed.
    Rejected,
    /// The source file vanished between being queued and loaded.
    Deleted,
    /// Queued but not yet attempted. Produced by callers, never by the loader.
    New,
}

impl LoadStatus {
    pub fn name(self) -> &'static str {
        match self {
            LoadStatus::Success => "SUCCESS",
            LoadStatus::Rejected => "REJECTED",
            LoadStatus::Deleted => "DELETED",
            LoadStatus::New => "NEW",
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A mismatch between a document and live database metadata.
///
/// Findings are collected for every column before a load is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFinding {
    /// The loader has no storage engine configured.
    NoEngine,
    MissingTable { table: String, database: String },
    MissingColumn { column: String, table: String },
    UnknownType { column: String, type_name: String },
    TypeMismatch {
        column: String,
        declared: String,
        native: String,
    },
}

impl ValidationFinding {
    /// The column a finding is about, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            ValidationFinding::MissingColumn { column, .. }
            | ValidationFinding::UnknownType { column, .. }
            | ValidationFinding::TypeMismatch { column, .. } => Some(column),
            ValidationFinding::NoEngine | ValidationFinding::MissingTable { .. } => None,
        }
    }
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFinding::NoEngine => f.write_str("no database engine"),
            ValidationFinding::MissingTable { table, database } => {
                write!(f, "Table {table} doesn't exist in database {database}.")
            }
            ValidationFinding::MissingColumn { column, table } => {
                write!(f, "Column {column} doesn't exist in table {table}")
            }
            ValidationFinding::UnknownType { column, type_name } => {
                write!(f, "Column {column} has unknown type \"{type_name}\"")
            }
            ValidationFinding::TypeMismatch {
                column,
                declared,
                native,
            } => write!(
                f,
                "Column {column} has type \"{declared}\", when target column has type \"{native}\""
            ),
        }
    }
}

/// Outcome of one [`super::Database::load_data`] call.
#[derive(Debug)]
pub struct LoadResult {
    pub status: LoadStatus,
    /// Validation findings, in column order.
    pub errors: Vec<ValidationFinding>,
    /// Lower-level failures raised while loading.
    pub exceptions: Vec<LoaderError>,
}

impl LoadResult {
    pub fn new(status: LoadStatus) -> Self {
        Self {
            status,
            errors: Vec::new(),
            exceptions: Vec::new(),
        }
    }

    pub fn success() -> Self {
        Self::new(LoadStatus::Success)
    }

    pub fn deleted() -> Self {
        Self::new(LoadStatus::Deleted)
    }

    /// Rejected with validation findings.
    pub fn rejected(errors: Vec<ValidationFinding>) -> Self {
        Self {
            status: LoadStatus::Rejected,
            errors,
            exceptions: Vec::new(),
        }
    }

    /// Rejected because of an exception.
    pub fn failed(exception: LoaderError) -> Self {
        Self {
            status: LoadStatus::Rejected,
            errors: Vec::new(),
            exceptions: vec![exception],
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == LoadStatus::Success
    }

    /// Text report: a status line followed by one `ERROR:`/`EXCEPTION:` line per entry.
    pub fn report(&self, path: impl AsRef<Path>) -> String {
        let mut out = format!("Loading {}: {}", path.as_ref().display(), self.status);
        for error in &self.errors {
            out.push_str(&format!("\nERROR: {error}"));
        }
        for exception in &self.exceptions {
            out.push_str(&format!("\nEXCEPTION: {exception}"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_errors_then_exceptions() {
        let mut result = LoadResult::rejected(vec![ValidationFinding::MissingColumn {
            column: "value".to_string(),
            table: "detector_".to_string(),
        }]);
        result.exceptions.push(LoaderError::UnsupportedFormat {
            format: "TSV".to_string(),
        });

        assert_eq!(
            result.report("data.csv"),
            "Loading data.csv: REJECTED\n\
             ERROR: Column value doesn't exist in table detector_\n\
             EXCEPTION: unsupported format 'TSV'"
        );
    }
}
