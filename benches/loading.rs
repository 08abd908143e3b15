use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use datafile_loader::database::{Database, DatabaseSettings, LoadOptions};
use datafile_loader::ingestion::open_reader;
use datafile_loader::schema::Document;
use datafile_loader::typing::TypeRegistry;
use rusqlite::Connection;

const DOC: &str = r#"{
    "table": "samples",
    "columns": [
        {"name": "id", "type": "integer"},
        {"name": "taken_at", "type": "datetime"},
        {"name": "value", "type": "float"},
        {"name": "label", "type": "string"}
    ]
}"#;

fn csv_input(rows: usize) -> String {
    (0..rows)
        .map(|i| format!("{i},2021-03-04T10:{:02}:00,{i}.5,sample {i}\n", i % 60))
        .collect()
}

fn bench_read(c: &mut Criterion) {
    let doc = Document::from_json_str(DOC).unwrap();
    let registry = TypeRegistry::default();
    let input = csv_input(10_000);

    let mut group = c.benchmark_group("read_csv");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("10k_rows", |b| {
        b.iter(|| {
            let rows = open_reader(&doc, &registry, input.as_bytes()).unwrap().count();
            black_box(rows)
        })
    });
    group.finish();
}

fn bench_load(c: &mut Criterion) {
    let doc = Document::from_json_str(DOC).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("bench.db");
    Connection::open(&db_path)
        .unwrap()
        .execute_batch("CREATE TABLE samples (id INTEGER, taken_at DATETIME, value REAL, label TEXT);")
        .unwrap();
    let source = dir.path().join("samples.csv");
    std::fs::write(&source, csv_input(5_000)).unwrap();

    let mut group = c.benchmark_group("load_sqlite");
    group.sample_size(20);
    for chunk_size in [1, 100, 500] {
        let db = Database::new(&DatabaseSettings::sqlite(&db_path))
            .unwrap()
            .with_options(LoadOptions { chunk_size });
        group.bench_with_input(BenchmarkId::new("5k_rows", chunk_size), &chunk_size, |b, _| {
            b.iter(|| {
                let result = db.load_data(&doc, &source);
                assert!(result.is_success());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_read, bench_load);
criterion_main!(benches);
