use datafile_loader::database::{Database, DatabaseSettings};
use datafile_loader::generate::{
    DEFAULT_FAKE_ROWS, describe_table, generate_descriptions, generate_fake_data,
};
use datafile_loader::ingestion::open_reader;
use datafile_loader::schema::Document;
use datafile_loader::types::{ColumnMetadata, TableMetadata};
use datafile_loader::typing::TypeRegistry;
use rusqlite::Connection;

#[test]
fn descriptions_are_written_per_table_and_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("loader.db");
    Connection::open(&db_path)
        .unwrap()
        .execute_batch(
            "CREATE TABLE detector_ (detector_name TEXT, value REAL);
             CREATE TABLE runs (id INTEGER, taken_at DATETIME, ok BOOLEAN, price NUMERIC);",
        )
        .unwrap();
    let db = Database::new(&DatabaseSettings::sqlite(&db_path)).unwrap();
    let out = dir.path().join("descriptions");

    let written = generate_descriptions(&db, &out).unwrap();
    assert_eq!(written, vec![out.join("detector_.json"), out.join("runs.json")]);

    let runs = Document::load(out.join("runs.json")).unwrap();
    let types: Vec<_> = runs.columns().iter().map(|c| c.type_name()).collect();
    assert_eq!(types, vec!["integer", "datetime", "boolean", "numeric"]);

    // Unmapped native types surface as unknown types when validated.
    let findings = db.check_description(&runs).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].column(), Some("price"));

    let detector = Document::load(out.join("detector_.json")).unwrap();
    assert!(db.check_description(&detector).unwrap().is_empty());
}

#[test]
fn fake_data_loads_with_its_document() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("loader.db");
    Connection::open(&db_path)
        .unwrap()
        .execute_batch("CREATE TABLE runs (id INTEGER, taken_at DATETIME, ok BOOLEAN, label TEXT);")
        .unwrap();
    let table = TableMetadata {
        name: "runs".to_string(),
        columns: vec![
            ColumnMetadata::new("id", "INTEGER"),
            ColumnMetadata::new("taken_at", "DATETIME"),
            ColumnMetadata::new("ok", "BOOLEAN"),
            ColumnMetadata::new("label", "TEXT"),
        ],
    };
    let mut doc = describe_table(&table).unwrap();
    doc.parser_settings_mut("CSV").unwrap().set("delimiter", ";").unwrap();

    let mut buf = Vec::new();
    generate_fake_data(&mut buf, &doc, &TypeRegistry::default(), DEFAULT_FAKE_ROWS).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), DEFAULT_FAKE_ROWS);
    assert_eq!(text.lines().next(), Some("0;2000-01-01T00:00:00;false;value 0"));

    let rows = open_reader(&doc, &TypeRegistry::default(), text.as_bytes())
        .unwrap()
        .count();
    assert_eq!(rows, DEFAULT_FAKE_ROWS);

    let source = dir.path().join("runs.csv");
    std::fs::write(&source, &text).unwrap();
    let db = Database::new(&DatabaseSettings::sqlite(&db_path)).unwrap();
    let result = db.load_data(&doc, &source);
    assert!(result.is_success(), "{}", result.report(&source));
}

#[test]
fn fake_data_needs_resolvable_types() {
    let mut doc = Document::load("tests/fixtures/detector_.json").unwrap();
    doc.add_column("id", "uuid").unwrap();

    let err = generate_fake_data(Vec::new(), &doc, &TypeRegistry::default(), 3).unwrap_err();
    assert_eq!(err.to_string(), "unknown type 'uuid' for column 'id'");
}
