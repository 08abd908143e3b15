use datafile_loader::LoaderError;
use datafile_loader::ingestion::{open_reader, read_rows_from_path};
use datafile_loader::schema::Document;
use datafile_loader::types::{RowRecord, Value};
use datafile_loader::typing::TypeRegistry;
use serde_json::json;

fn utf8(s: &str) -> Value {
    Value::Utf8(s.to_string())
}

fn read_all(doc: &Document, input: &str) -> Result<Vec<RowRecord>, LoaderError> {
    open_reader(doc, &TypeRegistry::default(), input.as_bytes())?.collect()
}

#[test]
fn detector_rows_are_raw_text() {
    let doc = Document::load("tests/fixtures/detector_.json").unwrap();
    let rows = read_rows_from_path(&doc, &TypeRegistry::default(), "tests/fixtures/detector_.csv").unwrap();

    let expected: Vec<RowRecord> = vec![
        [("detector_name", utf8("a")), ("value", utf8("1.5"))].into_iter().collect(),
        [("detector_name", utf8("b")), ("value", utf8("2.0"))].into_iter().collect(),
    ];
    assert_eq!(rows, expected);
}

#[test]
fn n_lines_by_m_columns_gives_n_rows_with_m_keys() {
    let doc = Document::from_value(json!({
        "table": "t",
        "columns": [
            {"name": "a", "type": "integer"},
            {"name": "b", "type": "float"},
            {"name": "c", "type": "string"}
        ]
    }))
    .unwrap();
    let input: String = (0..25).map(|i| format!("{i},{i}.5,row {i}\n")).collect();

    let rows = read_all(&doc, &input).unwrap();
    assert_eq!(rows.len(), 25);
    for row in &rows {
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
    assert_eq!(rows[24].get("c"), Some(&utf8("row 24")));
}

#[test]
fn first_line_is_data_not_a_header() {
    let doc = Document::load("tests/fixtures/detector_.json").unwrap();
    let rows = read_all(&doc, "detector_name,value\n").unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("value"), Some(&utf8("value")));
}

#[test]
fn short_and_long_records_zip_positionally() {
    let doc = Document::load("tests/fixtures/detector_.json").unwrap();
    let rows = read_all(&doc, "a\nb,2.0,extra\n").unwrap();

    assert_eq!(rows[0].len(), 1);
    assert_eq!(rows[0].get("value"), None);
    assert_eq!(rows[1].len(), 2);
}

#[test]
fn parser_settings_are_forwarded() {
    let doc = Document::load("tests/fixtures/runs.json").unwrap();
    let rows = read_rows_from_path(&doc, &TypeRegistry::default(), "tests/fixtures/runs.csv").unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get("note"), Some(&utf8("first; short")));
    assert_eq!(rows[2].get("note"), Some(&utf8("padded")));
    assert_eq!(rows[2].get("taken_at"), Some(&utf8("2021-03-05")));
}

#[test]
fn skipinitialspace_keeps_quoted_fields_quoted() {
    let mut doc = Document::load("tests/fixtures/detector_.json").unwrap();
    doc.parser_settings_mut("CSV")
        .unwrap()
        .set("skipinitialspace", true)
        .unwrap();

    let rows = read_all(&doc, "x, \"y,z\"\nw,\t1.0\n").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("detector_name"), Some(&utf8("x")));
    assert_eq!(rows[0].get("value"), Some(&utf8("y,z")));
    // Only spaces are skipped.
    assert_eq!(rows[1].get("value"), Some(&utf8("\t1.0")));
}

#[test]
fn custom_quote_and_escape_characters() {
    let mut doc = Document::load("tests/fixtures/detector_.json").unwrap();
    let csv = doc.parser_settings_mut("CSV").unwrap();
    csv.set("quotechar", "'").unwrap();
    csv.set("escapechar", "\\").unwrap();
    csv.set("doublequote", false).unwrap();

    let rows = read_all(&doc, "'it\\'s, fine',1\n").unwrap();
    assert_eq!(rows[0].get("detector_name"), Some(&utf8("it's, fine")));
}

#[test]
fn unknown_type_fails_before_reading() {
    struct Untouchable;
    impl std::io::Read for Untouchable {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            panic!("input must not be read");
        }
    }

    let mut doc = Document::load("tests/fixtures/detector_.json").unwrap();
    doc.columns_mut()[0].set_type_name("uuid");
    let err = open_reader(&doc, &TypeRegistry::default(), Untouchable).unwrap_err();
    assert!(matches!(err, LoaderError::UnknownType { .. }));

    let err = read_rows_from_path(&doc, &TypeRegistry::default(), "tests/fixtures/does_not_exist.csv")
        .unwrap_err();
    assert!(matches!(err, LoaderError::Io(_)));
}

#[test]
fn invalid_utf8_is_a_csv_error_and_ends_the_rows() {
    let doc = Document::load("tests/fixtures/detector_.json").unwrap();
    let input: &[u8] = b"a,1.0\n\xff\xfe,2.0\nc,3.0\n";

    let results: Vec<_> = open_reader(&doc, &TypeRegistry::default(), input)
        .unwrap()
        .collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(LoaderError::Csv(_))));
}
