//! CSV row reader.
//!
//! Records are zipped positionally against the declared columns. Values stay raw
//! [`Value::Utf8`] text; coercion to column types happens when rows are bound for insertion.

use std::io::{self, Read};

use crate::error::{LoaderError, LoaderResult};
use crate::schema::{PropertyBag, Violation};
use crate::types::{RowRecord, Value};

/// Build a headerless, flexible [`csv::ReaderBuilder`] from a `parser_settings.CSV` bag.
///
/// Recognised keys: `delimiter`, `quotechar`, `escapechar`, `doublequote`, `quoting`.
/// `skipinitialspace` is applied ahead of the decoder by [`SkipInitialSpace`].
pub fn csv_reader_builder(settings: &PropertyBag) -> LoaderResult<csv::ReaderBuilder> {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true);

    if let Some(delimiter) = settings.get_str("delimiter")? {
        builder.delimiter(single_byte("delimiter", delimiter)?);
    }
    if let Some(quote) = settings.get_str("quotechar")? {
        builder.quote(single_byte("quotechar", quote)?);
    }
    if let Some(escape) = settings.get_str("escapechar")? {
        builder.escape(Some(single_byte("escapechar", escape)?));
    }
    if let Some(double_quote) = settings.get_bool("doublequote")? {
        builder.double_quote(double_quote);
    }
    if let Some(quoting) = settings.get_bool("quoting")? {
        builder.quoting(quoting);
    }
    Ok(builder)
}

pub(crate) fn single_byte(key: &str, value: &str) -> LoaderResult<u8> {
    match value.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(LoaderError::Validation {
            violations: vec![Violation::new(
                format!("/parser_settings/CSV/{key}"),
                format!("'{value}' must be a single ASCII character"),
            )],
        }),
    }
}

/// Drops spaces at the start of every unquoted field before the decoder sees them.
///
/// Runs ahead of the csv decoder so a quoted field after `", "` is still recognised as quoted.
/// Only `' '` is dropped; tabs and other whitespace are field content.
pub struct SkipInitialSpace<R> {
    inner: R,
    enabled: bool,
    delimiter: u8,
    quote: u8,
    escape: Option<u8>,
    quoting: bool,
    field_start: bool,
    in_quotes: bool,
    escaped: bool,
}

impl<R: Read> SkipInitialSpace<R> {
    /// Wrap `inner` using the `parser_settings.CSV` options.
    pub fn new(inner: R, settings: &PropertyBag) -> LoaderResult<Self> {
        let byte_setting = |key: &str, fallback: u8| -> LoaderResult<u8> {
            match settings.get_str(key)? {
                Some(value) => single_byte(key, value),
                None => Ok(fallback),
            }
        };
        let escape = match settings.get_str("escapechar")? {
            Some(value) => Some(single_byte("escapechar", value)?),
            None => None,
        };
        Ok(Self {
            inner,
            enabled: settings.get_bool("skipinitialspace")?.unwrap_or(false),
            delimiter: byte_setting("delimiter", b',')?,
            quote: byte_setting("quotechar", b'"')?,
            escape,
            quoting: settings.get_bool("quoting")?.unwrap_or(true),
            field_start: true,
            in_quotes: false,
            escaped: false,
        })
    }

    fn keep(&mut self, b: u8) -> bool {
        if self.escaped {
            self.escaped = false;
            return true;
        }
        if self.field_start && b == b' ' {
            return false;
        }
        self.field_start = false;
        if self.in_quotes {
            if Some(b) == self.escape {
                self.escaped = true;
            } else if b == self.quote {
                self.in_quotes = false;
            }
        } else if self.quoting && b == self.quote {
            self.in_quotes = true;
        } else if b == self.delimiter || b == b'\n' || b == b'\r' {
            self.field_start = true;
        }
        true
    }
}

impl<R: Read> Read for SkipInitialSpace<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.enabled {
            return self.inner.read(buf);
        }
        loop {
            let n = self.inner.read(buf)?;
            if n == 0 {
                return Ok(0);
            }
            let mut kept = 0;
            for i in 0..n {
                let b = buf[i];
                if self.keep(b) {
                    buf[kept] = b;
                    kept += 1;
                }
            }
            // A chunk of only skipped spaces must not read as end of input.
            if kept > 0 {
                return Ok(kept);
            }
        }
    }
}

/// Lazy, forward-only sequence of CSV rows.
pub struct CsvRows<R> {
    records: csv::StringRecordsIntoIter<SkipInitialSpace<R>>,
    columns: Vec<String>,
    failed: bool,
}

impl<R: Read> CsvRows<R> {
    /// Wrap `input` using the `parser_settings.CSV` options.
    pub fn new(input: R, columns: Vec<String>, settings: &PropertyBag) -> LoaderResult<Self> {
        let builder = csv_reader_builder(settings)?;
        let input = SkipInitialSpace::new(input, settings)?;
        Ok(Self {
            records: builder.from_reader(input).into_records(),
            columns,
            failed: false,
        })
    }
}

impl<R: Read> Iterator for CsvRows<R> {
    type Item = LoaderResult<RowRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => {
                self.failed = true;
                return Some(Err(e.into()));
            }
        };

        let row = self
            .columns
            .iter()
            .zip(record.iter())
            .map(|(column, raw)| (column.as_str(), Value::Utf8(raw.to_owned())))
            .collect();
        Some(Ok(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Document;

    fn skipping(input: &str) -> String {
        let mut doc = Document::empty();
        doc.parser_settings_mut("CSV")
            .unwrap()
            .set("skipinitialspace", true)
            .unwrap();
        let mut out = String::new();
        SkipInitialSpace::new(input.as_bytes(), doc.parser_settings("CSV").unwrap())
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn spaces_inside_quotes_and_tabs_are_kept() {
        assert_eq!(skipping("  a,  \"b,  c\", d\n e"), "a,\"b,  c\",d\ne");
        assert_eq!(skipping("a,\tb"), "a,\tb");
    }
}
