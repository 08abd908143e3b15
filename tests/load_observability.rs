use std::fs;
use std::sync::{Arc, Mutex};

use datafile_loader::database::{Database, DatabaseSettings, LoadResult, LoadStatus, SqliteEngine};
use datafile_loader::ingestion::{
    CompositeObserver, FileObserver, LoadContext, LoadObserver, LoadSeverity, LoadStats, SourceFormat,
    TracingObserver,
};
use datafile_loader::schema::Document;
use rusqlite::Connection;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<usize>>,
    rejections: Mutex<Vec<LoadSeverity>>,
    alerts: Mutex<Vec<LoadSeverity>>,
    deleted: Mutex<Vec<String>>,
    formats: Mutex<Vec<Option<SourceFormat>>>,
}

impl LoadObserver for RecordingObserver {
    fn on_success(&self, ctx: &LoadContext, stats: LoadStats) {
        self.formats.lock().unwrap().push(ctx.format);
        self.successes.lock().unwrap().push(stats.rows);
    }

    fn on_rejected(&self, _ctx: &LoadContext, severity: LoadSeverity, result: &LoadResult) {
        assert_eq!(result.status, LoadStatus::Rejected);
        self.rejections.lock().unwrap().push(severity);
    }

    fn on_deleted(&self, ctx: &LoadContext) {
        self.deleted.lock().unwrap().push(ctx.table.clone());
    }

    fn on_alert(&self, _ctx: &LoadContext, severity: LoadSeverity, _result: &LoadResult) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn detector_db(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("loader.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE detector_ (detector_name TEXT, value REAL);")
        .unwrap();
    path
}

#[test]
fn observer_sees_success_with_row_count() {
    let dir = tempfile::tempdir().unwrap();
    let obs = Arc::new(RecordingObserver::default());
    let db = Database::new(&DatabaseSettings::sqlite(detector_db(&dir)))
        .unwrap()
        .with_observer(obs.clone());
    let doc = Document::load("tests/fixtures/detector_.json").unwrap();

    assert!(db.load_data(&doc, "tests/fixtures/detector_.csv").is_success());

    assert_eq!(*obs.successes.lock().unwrap(), vec![2]);
    assert_eq!(*obs.formats.lock().unwrap(), vec![Some(SourceFormat::Csv)]);
    assert!(obs.rejections.lock().unwrap().is_empty());
}

#[test]
fn validation_rejection_is_error_without_alert() {
    let dir = tempfile::tempdir().unwrap();
    let obs = Arc::new(RecordingObserver::default());
    let db = Database::new(&DatabaseSettings::sqlite(detector_db(&dir)))
        .unwrap()
        .with_observer(obs.clone());
    let mut doc = Document::load("tests/fixtures/detector_.json").unwrap();
    doc.set_table("missing");

    let _ = db.load_data(&doc, "tests/fixtures/detector_.csv");

    assert_eq!(*obs.rejections.lock().unwrap(), vec![LoadSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn no_engine_is_critical_and_alerts() {
    let obs = Arc::new(RecordingObserver::default());
    let db = Database::<SqliteEngine>::unconfigured().with_observer(obs.clone());
    let doc = Document::load("tests/fixtures/detector_.json").unwrap();

    let _ = db.load_data(&doc, "tests/fixtures/detector_.csv");

    assert_eq!(*obs.rejections.lock().unwrap(), vec![LoadSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![LoadSeverity::Critical]);
}

#[test]
fn lowered_threshold_alerts_on_decode_errors() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("bad.csv");
    fs::write(&source, "a,oops\n").unwrap();
    let obs = Arc::new(RecordingObserver::default());
    let db = Database::new(&DatabaseSettings::sqlite(detector_db(&dir)))
        .unwrap()
        .with_observer(obs.clone())
        .with_alert_threshold(LoadSeverity::Error);
    let doc = Document::load("tests/fixtures/detector_.json").unwrap();

    let _ = db.load_data(&doc, &source);

    assert_eq!(*obs.alerts.lock().unwrap(), vec![LoadSeverity::Error]);
}

#[test]
fn deleted_source_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let obs = Arc::new(RecordingObserver::default());
    let db = Database::new(&DatabaseSettings::sqlite(detector_db(&dir)))
        .unwrap()
        .with_observer(obs.clone());
    let doc = Document::load("tests/fixtures/detector_.json").unwrap();

    let _ = db.load_data(&doc, dir.path().join("gone.csv"));

    assert_eq!(*obs.deleted.lock().unwrap(), vec!["detector_".to_string()]);
}

#[test]
fn composite_fans_out_and_file_observer_appends_lines() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("loads.log");
    let recording = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn LoadObserver>> =
        vec![recording.clone(), Arc::new(FileObserver::new(&log))];
    let composite = CompositeObserver::new(observers);
    let db = Database::new(&DatabaseSettings::sqlite(detector_db(&dir)))
        .unwrap()
        .with_observer(Arc::new(composite));
    let doc = Document::load("tests/fixtures/detector_.json").unwrap();

    let _ = db.load_data(&doc, "tests/fixtures/detector_.csv");
    let _ = db.load_data(&doc, dir.path().join("gone.csv"));

    assert_eq!(recording.successes.lock().unwrap().len(), 1);
    let text = fs::read_to_string(&log).unwrap();
    assert_eq!(text.lines().count(), 2, "{text}");
    assert!(text.contains(" ok table=detector_ "), "{text}");
    assert!(text.contains(" deleted table=detector_ "), "{text}");
}

#[test]
fn bundled_logging_observers_handle_every_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let observers: Vec<Arc<dyn LoadObserver>> = vec![Arc::new(TracingObserver)];
    let composite = CompositeObserver::new(observers);
    let db = Database::new(&DatabaseSettings::sqlite(detector_db(&dir)))
        .unwrap()
        .with_observer(Arc::new(composite))
        .with_alert_threshold(LoadSeverity::Info);
    let mut doc = Document::load("tests/fixtures/detector_.json").unwrap();

    assert!(db.load_data(&doc, "tests/fixtures/detector_.csv").is_success());
    assert_eq!(db.load_data(&doc, dir.path().join("gone.csv")).status, LoadStatus::Deleted);
    doc.set_table("missing");
    assert_eq!(db.load_data(&doc, "tests/fixtures/detector_.csv").status, LoadStatus::Rejected);
}
