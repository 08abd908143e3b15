//! Reader selection.
//!
//! [`open_reader`] turns a [`Document`] and an input stream into a [`RowReader`]. The reader is
//! chosen from the document's `format` alone; an unknown format fails before the input is
//! touched.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use crate::error::{LoaderError, LoaderResult};
use crate::schema::Document;
use crate::types::RowRecord;
use crate::typing::{LogicalType, TypeRegistry};

use super::csv::CsvRows;
use super::xml::XmlRows;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Delimited text, no header row.
    Csv,
    /// XML document containing a `tbody` element.
    Xml,
}

impl SourceFormat {
    /// Parse the document's `format` value (case-sensitive, as in the meta-schema).
    pub fn from_name(name: &str) -> LoaderResult<Self> {
        match name {
            "CSV" => Ok(Self::Csv),
            "XML" => Ok(Self::Xml),
            other => Err(LoaderError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }

    /// Name used for `format` and as the `parser_settings` key.
    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Xml => "XML",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declared column with its resolved logical type.
#[derive(Debug, Clone)]
pub struct TypedColumn {
    pub name: String,
    pub logical_type: Arc<dyn LogicalType>,
}

/// Resolve every column of `document`, failing on the first unknown type.
pub fn resolve_columns(document: &Document, registry: &TypeRegistry) -> LoaderResult<Vec<TypedColumn>> {
    document
        .columns()
        .iter()
        .map(|column| {
            Ok(TypedColumn {
                name: column.name().to_string(),
                logical_type: registry.require_column(column)?,
            })
        })
        .collect()
}

/// Row sequence for one input stream. Consuming it exhausts the stream; it cannot be restarted.
pub enum RowReader<R> {
    Csv(CsvRows<R>),
    Xml(XmlRows),
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = LoaderResult<RowRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RowReader::Csv(rows) => rows.next(),
            RowReader::Xml(rows) => rows.next(),
        }
    }
}

impl<R> fmt::Debug for RowReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = match self {
            RowReader::Csv(_) => SourceFormat::Csv,
            RowReader::Xml(_) => SourceFormat::Xml,
        };
        f.debug_struct("RowReader").field("format", &format).finish()
    }
}

/// Open a reader over `input` for `document`.
///
/// ```rust
/// use datafile_loader::ingestion::open_reader;
/// use datafile_loader::schema::Document;
/// use datafile_loader::types::Value;
/// use datafile_loader::typing::TypeRegistry;
///
/// # fn main() -> Result<(), datafile_loader::LoaderError> {
/// let doc = Document::from_json_str(
///     r#"{"table": "detector_", "columns": [
///         {"name": "detector_name", "type": "string"},
///         {"name": "value", "type": "float"}]}"#,
/// )?;
/// let rows = open_reader(&doc, &TypeRegistry::default(), "a,1.5\nb,2.0\n".as_bytes())?
///     .collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0].get("value"), Some(&Value::Utf8("1.5".to_string())));
/// # Ok(())
/// # }
/// ```
pub fn open_reader<R: Read>(
    document: &Document,
    registry: &TypeRegistry,
    mut input: R,
) -> LoaderResult<RowReader<R>> {
    let format = document.source_format()?;
    let columns = resolve_columns(document, registry)?;
    let settings = document.parser_settings(format.name())?;

    match format {
        SourceFormat::Csv => {
            let names = columns.into_iter().map(|c| c.name).collect();
            Ok(RowReader::Csv(CsvRows::new(input, names, settings)?))
        }
        SourceFormat::Xml => {
            let header = settings.get_bool("header")?.unwrap_or(false);
            let mut text = String::new();
            input.read_to_string(&mut text)?;
            Ok(RowReader::Xml(XmlRows::parse(&text, columns, header)?))
        }
    }
}

/// Read every row of the file at `path`.
pub fn read_rows_from_path(
    document: &Document,
    registry: &TypeRegistry,
    path: impl AsRef<Path>,
) -> LoaderResult<Vec<RowRecord>> {
    document.source_format()?;
    let file = BufReader::new(File::open(path)?);
    open_reader(document, registry, file)?.collect()
}
