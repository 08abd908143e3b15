//! Scaffolding: draft documents from live tables and sample files from documents.
//!
//! Drafts are starting points. Columns whose native type has no built-in logical type keep
//! the lowercased native name, so loading with an unedited draft reports them as unknown types.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::database::{Database, StorageEngine};
use crate::error::LoaderResult;
use crate::ingestion::csv::single_byte;
use crate::ingestion::SourceFormat;
use crate::schema::Document;
use crate::types::TableMetadata;
use crate::typing::{declared_type_for, TypeRegistry};

/// Number of rows [`generate_fake_data`] writes by default.
pub const DEFAULT_FAKE_ROWS: usize = 10;

/// A CSV document for `table` with one column per live column, in table order.
pub fn describe_table(table: &TableMetadata) -> LoaderResult<Document> {
    let mut document = Document::empty();
    document.set_table(&table.name);
    document.columns_mut().clear();
    for column in &table.columns {
        let type_name = match declared_type_for(&column.kind) {
            Some(name) => name.to_string(),
            None => column.declared_type.to_lowercase(),
        };
        document.add_column(&column.name, type_name)?;
    }
    Ok(document)
}

/// Write a draft `<table>.json` into `out_folder` for every table of the database.
///
/// Returns the written paths in table-name order.
pub fn generate_descriptions<E: StorageEngine>(
    database: &Database<E>,
    out_folder: impl AsRef<Path>,
) -> LoaderResult<Vec<PathBuf>> {
    let out_folder = out_folder.as_ref();
    fs::create_dir_all(out_folder)?;

    let mut written = Vec::new();
    for table in database.reflect_all()? {
        tracing::debug!(target: "datafile_loader::generate", table = %table.name, "describing table");
        let path = out_folder.join(format!("{}.json", table.name));
        describe_table(&table)?.dump(&path)?;
        written.push(path);
    }
    Ok(written)
}

/// Write `rows` headerless CSV rows of sample values for `document`.
///
/// Row `n` holds each column type's `n`-th sample. Fields are separated by the document's CSV
/// delimiter, so the output loads back with the same document.
pub fn generate_fake_data<W: Write>(
    writer: W,
    document: &Document,
    registry: &TypeRegistry,
    rows: usize,
) -> LoaderResult<()> {
    let types = document
        .columns()
        .iter()
        .map(|column| registry.require_column(column))
        .collect::<LoaderResult<Vec<_>>>()?;

    let mut builder = csv::WriterBuilder::new();
    builder.has_headers(false);
    let settings = document.parser_settings(SourceFormat::Csv.name())?;
    if let Some(delimiter) = settings.get_str("delimiter")? {
        builder.delimiter(single_byte("delimiter", delimiter)?);
    }
    if let Some(quote) = settings.get_str("quotechar")? {
        builder.quote(single_byte("quotechar", quote)?);
    }

    let mut out = builder.from_writer(writer);
    for n in 0..rows {
        out.write_record(types.iter().map(|ty| ty.sample(n)))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnMetadata;

    #[test]
    fn unmapped_native_types_keep_their_name() {
        let table = TableMetadata {
            name: "runs".to_string(),
            columns: vec![
                ColumnMetadata::new("id", "INTEGER"),
                ColumnMetadata::new("price", "NUMERIC(10,2)"),
            ],
        };
        let document = describe_table(&table).unwrap();
        let types: Vec<_> = document.columns().iter().map(|c| c.type_name()).collect();
        assert_eq!(types, vec!["integer", "numeric(10,2)"]);
        assert_eq!(document.table(), "runs");
        assert_eq!(document.format_name(), "CSV");
    }
}
