//! XML row reader.
//!
//! The document is parsed as a tree; rows are the child elements of the first `tbody`
//! element (matched by local name, so any namespace works) and cells are each row's child
//! elements. A cell's content is its direct text plus the literal markup of nested elements,
//! which keeps embedded markup as text. Every cell is coerced through its column's logical type
//! as the row is consumed; the first failure ends the sequence.

use roxmltree::{Document, Node, ParsingOptions};

use crate::error::{LoaderError, LoaderResult};
use crate::types::RowRecord;
use crate::typing::LogicalType;

use super::unified::TypedColumn;

/// Lazy, forward-only sequence of decoded XML rows.
pub struct XmlRows {
    rows: std::vec::IntoIter<Vec<String>>,
    columns: Vec<TypedColumn>,
    row_number: usize,
    failed: bool,
}

impl XmlRows {
    /// Parse `text` and collect the raw cell contents of the table body.
    ///
    /// With `header`, the first row of the table body is discarded.
    pub fn parse(text: &str, columns: Vec<TypedColumn>, header: bool) -> LoaderResult<Self> {
        // Table exports are often XHTML with a DOCTYPE line.
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(text, options)?;
        let tbody = doc
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "tbody")
            .ok_or_else(|| LoaderError::MalformedSource {
                message: "no tbody element found".to_string(),
            })?;

        let mut rows: Vec<Vec<String>> = tbody
            .children()
            .filter(Node::is_element)
            .map(|row| {
                row.children()
                    .filter(Node::is_element)
                    .map(|cell| element_content(text, cell))
                    .collect()
            })
            .collect();

        let mut row_number = 0;
        if header && !rows.is_empty() {
            rows.remove(0);
            row_number = 1;
        }

        Ok(Self {
            rows: rows.into_iter(),
            columns,
            row_number,
            failed: false,
        })
    }
}

/// Direct text of `element` plus the source markup of its child elements and their tails.
pub fn element_content(source: &str, element: Node<'_, '_>) -> String {
    let mut content = String::new();
    for child in element.children() {
        if child.is_text() {
            content.push_str(child.text().unwrap_or_default());
        } else if child.is_element() {
            content.push_str(&source[child.range()]);
        }
    }
    content
}

impl Iterator for XmlRows {
    type Item = LoaderResult<RowRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let cells = self.rows.next()?;
        self.row_number += 1;

        let mut row = RowRecord::with_capacity(self.columns.len());
        for (column, raw) in self.columns.iter().zip(cells) {
            match column.logical_type.parse(&raw) {
                Ok(value) => row.push(column.name.as_str(), value),
                Err(message) => {
                    self.failed = true;
                    return Some(Err(LoaderError::Decode {
                        row: self.row_number,
                        column: column.name.clone(),
                        raw,
                        message,
                    }));
                }
            }
        }
        Some(Ok(row))
    }
}
