//! `datafile-loader` loads CSV and XML data files into one existing SQL table per file, driven by
//! a JSON schema document that describes the file layout and the target table.
//!
//! The primary entrypoint is [`database::Database::load_data`], which checks the document
//! against live table metadata and then streams the file into the table inside one transaction.
//! Every attempt ends in a [`database::LoadResult`]; the library never prints.
//!
//! ## Schema documents
//!
//! A [`schema::Document`] names the target `table`, the source `format` (`CSV` or `XML`), the
//! ordered `columns` (name + logical type + type properties) and per-format `parser_settings`.
//! Documents are validated against an embedded meta-schema on load; every violation is reported.
//!
//! ```json
//! {
//!   "table": "detector_",
//!   "format": "CSV",
//!   "columns": [
//!     { "name": "name", "type": "string" },
//!     { "name": "runs", "type": "integer" },
//!     { "name": "taken_at", "type": "datetime", "type_properties": { "datetime_flavour": "iso" } }
//!   ],
//!   "parser_settings": { "CSV": { "delimiter": ";" } }
//! }
//! ```
//!
//! ## Logical types
//!
//! Declared type names are resolved by a [`typing::TypeRegistry`], a chain of resolvers where
//! the first match wins. Built in:
//!
//! - `boolean`, `integer`, `float`, `string`, `binary`
//! - `datetime` (ISO 8601 / RFC 3339)
//!
//! Register your own [`typing::TypeResolver`] to add types.
//!
//! ## Quick example: load one file
//!
//! ```no_run
//! use datafile_loader::database::{Database, DatabaseSettings, LoadStatus};
//! use datafile_loader::schema::Document;
//!
//! # fn main() -> Result<(), datafile_loader::LoaderError> {
//! let database = Database::new(&DatabaseSettings::sqlite("runs.db"))?;
//! let document = Document::load("detector_.json")?;
//!
//! let result = database.load_data(&document, "detector_.csv");
//! if result.status != LoadStatus::Success {
//!     eprintln!("{}", result.report("detector_.csv"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Observability
//!
//! Attach a [`ingestion::LoadObserver`] with [`database::Database::with_observer`] to record
//! outcomes. [`ingestion::TracingObserver`] emits `tracing` events and
//! [`ingestion::FileObserver`] appends plain lines to a log file.
//!
//! ## Modules
//!
//! - [`schema`]: schema documents and property bags
//! - [`typing`]: logical types and the type registry
//! - [`ingestion`]: CSV/XML row readers and load observers
//! - [`database`]: the loader, load results and the storage engine seam
//! - [`generate`]: draft documents and sample data for development
//! - [`types`]: row values and table metadata
//! - [`error`]: the crate error type

pub mod database;
pub mod error;
pub mod generate;
pub mod ingestion;
pub mod schema;
pub mod types;
pub mod typing;

pub use error::{LoaderError, LoaderResult};
