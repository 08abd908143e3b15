//! The database loader: validates documents against live metadata and loads files.
//!
//! One [`Database::load_data`] call runs `connect → reflect → validate → load` to completion on
//! the calling thread and returns a [`LoadResult`]:
//!
//! - every column is checked before anything is decided, so all findings are reported together
//! - a source file that no longer exists yields [`LoadStatus::Deleted`]
//! - all rows of a file are inserted in one transaction; any decode or storage error rolls it
//!   back and yields [`LoadStatus::Rejected`]
//!
//! ```no_run
//! use datafile_loader::database::Database;
//! use datafile_loader::schema::Document;
//!
//! # fn main() -> Result<(), datafile_loader::LoaderError> {
//! let database = Database::connect_from_file("config.json")?;
//! let document = Document::load("detector_.json")?;
//! let result = database.load_data(&document, "detector_.csv");
//! println!("{}", result.report("detector_.csv"));
//! # Ok(())
//! # }
//! ```

mod config;
mod sqlite;
mod status;
mod storage;

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::error::{LoaderError, LoaderResult};
use crate::ingestion::{
    open_reader, resolve_columns, LoadContext, LoadObserver, LoadSeverity, LoadStats, SourceFormat, TypedColumn,
};
use crate::schema::Document;
use crate::types::{RowRecord, TableMetadata, Value};
use crate::typing::{Resolution, TypeRegistry};

pub use config::{ConnectionTest, DatabaseSettings, Driver, LoadOptions, LoaderConfig};
pub use sqlite::{SqliteConnection, SqliteEngine, DEFAULT_BUSY_TIMEOUT_MS};
pub use status::{LoadResult, LoadStatus, ValidationFinding};
pub use storage::{StorageConnection, StorageEngine};

/// Main entry point for interaction with the target database.
pub struct Database<E: StorageEngine = SqliteEngine> {
    engine: Option<E>,
    registry: TypeRegistry,
    options: LoadOptions,
    observer: Option<Arc<dyn LoadObserver>>,
    alert_at_or_above: LoadSeverity,
}

impl<E: StorageEngine + fmt::Debug> fmt::Debug for Database<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("engine", &self.engine)
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Database<SqliteEngine> {
    /// Build a loader from connection settings.
    ///
    /// Engine construction failures surface here, not at load time.
    pub fn new(settings: &DatabaseSettings) -> LoaderResult<Self> {
        Ok(Self::with_engine(SqliteEngine::from_settings(settings)?))
    }

    /// Replace the engine with one built from `settings`.
    pub fn update_engine(&mut self, settings: &DatabaseSettings) -> LoaderResult<()> {
        self.engine = Some(SqliteEngine::from_settings(settings)?);
        Ok(())
    }

    /// Build a loader from a configuration file and check that it can connect.
    pub fn connect_from_file(path: impl AsRef<Path>) -> LoaderResult<Self> {
        let config = LoaderConfig::from_path(path)?;
        let database = Self::new(&config.database)?;
        let test = database.test_connect();
        if !test.success {
            return Err(LoaderError::Configuration { message: test.error });
        }
        Ok(database)
    }
}

impl<E: StorageEngine> Database<E> {
    /// A loader over an already constructed engine.
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine: Some(engine),
            ..Self::unconfigured()
        }
    }

    /// A loader without an engine. Every load is rejected with [`ValidationFinding::NoEngine`].
    pub fn unconfigured() -> Self {
        Self {
            engine: None,
            registry: TypeRegistry::default(),
            options: LoadOptions::default(),
            observer: None,
            alert_at_or_above: LoadSeverity::Critical,
        }
    }

    /// Use a custom type registry.
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach an observer for load outcomes.
    pub fn with_observer(mut self, observer: Arc<dyn LoadObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Severity at which rejections are also reported through `on_alert`.
    pub fn with_alert_threshold(mut self, severity: LoadSeverity) -> Self {
        self.alert_at_or_above = severity;
        self
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn connect(&self) -> LoaderResult<E::Connection> {
        match &self.engine {
            Some(engine) => engine.connect(),
            None => Err(LoaderError::Configuration {
                message: ValidationFinding::NoEngine.to_string(),
            }),
        }
    }

    /// Try to open (and immediately close) a connection.
    pub fn test_connect(&self) -> ConnectionTest {
        match self.connect() {
            Ok(_conn) => ConnectionTest::ok(),
            Err(LoaderError::Storage(e)) => ConnectionTest::failed(e.to_string()),
            Err(LoaderError::Configuration { message }) => ConnectionTest::failed(message),
            Err(_) => ConnectionTest::failed("Unknown error"),
        }
    }

    /// Names of all tables in the database.
    pub fn table_names(&self) -> LoaderResult<Vec<String>> {
        self.connect()?.table_names()
    }

    /// Column names of `table`; empty if the table is missing or reflection fails.
    pub fn table_columns(&self, table: &str) -> Vec<String> {
        let reflected = self.connect().and_then(|mut conn| conn.reflect_table(table));
        match reflected {
            Ok(Some(meta)) => meta.column_names().map(str::to_string).collect(),
            _ => Vec::new(),
        }
    }

    /// Live metadata of every table.
    pub fn reflect_all(&self) -> LoaderResult<Vec<TableMetadata>> {
        let mut conn = self.connect()?;
        let mut tables = Vec::new();
        for name in conn.table_names()? {
            if let Some(meta) = conn.reflect_table(&name)? {
                tables.push(meta);
            }
        }
        Ok(tables)
    }

    /// Validate `document` against live metadata without loading anything.
    pub fn check_description(&self, document: &Document) -> LoaderResult<Vec<ValidationFinding>> {
        let mut conn = self.connect()?;
        Ok(self.check_with(&mut conn, document)?.0)
    }

    fn database_name(&self) -> String {
        self.engine
            .as_ref()
            .map(|engine| engine.describe())
            .unwrap_or_default()
    }

    /// Findings for every declared column, plus the live table when it exists.
    fn check_with(
        &self,
        conn: &mut E::Connection,
        document: &Document,
    ) -> LoaderResult<(Vec<ValidationFinding>, Option<TableMetadata>)> {
        let Some(table) = conn.reflect_table(document.table())? else {
            let finding = ValidationFinding::MissingTable {
                table: document.table().to_string(),
                database: self.database_name(),
            };
            return Ok((vec![finding], None));
        };

        let mut findings = Vec::new();
        for column in document.columns() {
            let Some(live) = table.column(column.name()) else {
                findings.push(ValidationFinding::MissingColumn {
                    column: column.name().to_string(),
                    table: table.name.clone(),
                });
                continue;
            };
            match self.registry.resolve_column(column) {
                Resolution::NotFound => findings.push(ValidationFinding::UnknownType {
                    column: column.name().to_string(),
                    type_name: column.type_name().to_string(),
                }),
                Resolution::Found(ty) if !ty.is_target(&live.kind) => {
                    findings.push(ValidationFinding::TypeMismatch {
                        column: column.name().to_string(),
                        declared: column.type_name().to_string(),
                        native: live.declared_type.clone(),
                    });
                }
                Resolution::Found(_) => {}
            }
        }
        Ok((findings, Some(table)))
    }

    /// Validate `document` and load the file at `source` into its table.
    ///
    /// Never panics and never returns an error: every outcome is a [`LoadResult`].
    pub fn load_data(&self, document: &Document, source: impl AsRef<Path>) -> LoadResult {
        let path = source.as_ref();
        let (result, rows) = self.run_load(document, path);

        if let Some(obs) = self.observer.as_ref() {
            let ctx = LoadContext {
                path: path.to_path_buf(),
                table: document.table().to_string(),
                format: document.source_format().ok(),
            };
            match result.status {
                LoadStatus::Success => obs.on_success(&ctx, LoadStats { rows }),
                LoadStatus::Deleted => obs.on_deleted(&ctx),
                LoadStatus::Rejected => {
                    let sev = severity_for_result(&result);
                    obs.on_rejected(&ctx, sev, &result);
                    if sev >= self.alert_at_or_above {
                        obs.on_alert(&ctx, sev, &result);
                    }
                }
                LoadStatus::New => {}
            }
        }

        result
    }

    fn run_load(&self, document: &Document, path: &Path) -> (LoadResult, usize) {
        if self.engine.is_none() {
            return (LoadResult::rejected(vec![ValidationFinding::NoEngine]), 0);
        }
        let mut conn = match self.connect() {
            Ok(conn) => conn,
            Err(e) => return (LoadResult::failed(e), 0),
        };

        let table = match self.check_with(&mut conn, document) {
            Ok((findings, Some(table))) if findings.is_empty() => table,
            Ok((findings, _)) => return (LoadResult::rejected(findings), 0),
            Err(e) => return (LoadResult::failed(e), 0),
        };

        if !path.exists() {
            return (LoadResult::deleted(), 0);
        }

        match self.stream_into(&mut conn, document, &table, path) {
            Ok(rows) => (LoadResult::success(), rows),
            Err(e) => (LoadResult::failed(e), 0),
        }
    }

    fn stream_into(
        &self,
        conn: &mut E::Connection,
        document: &Document,
        table: &TableMetadata,
        path: &Path,
    ) -> LoaderResult<usize> {
        let late_bind = document.source_format()? == SourceFormat::Csv;
        let columns = resolve_columns(document, &self.registry)?;
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

        let file = BufReader::new(File::open(path)?);
        let reader = open_reader(document, &self.registry, file)?;

        let mut bound = reader
            .enumerate()
            .map(|(idx0, row)| bind_row(row?, &columns, late_bind, idx0 + 1));
        conn.insert_rows(&table.name, &names, &mut bound, self.options.chunk_size)
    }
}

/// Values for `columns` in order; raw CSV text is coerced through each column's type here.
fn bind_row(
    record: RowRecord,
    columns: &[TypedColumn],
    late_bind: bool,
    row: usize,
) -> LoaderResult<Vec<Value>> {
    columns
        .iter()
        .map(|column| match record.get(&column.name) {
            None => Ok(Value::Null),
            Some(Value::Utf8(raw)) if late_bind => {
                column
                    .logical_type
                    .parse(raw)
                    .map_err(|message| LoaderError::Decode {
                        row,
                        column: column.name.clone(),
                        raw: raw.clone(),
                        message,
                    })
            }
            Some(value) => Ok(value.clone()),
        })
        .collect()
}

fn severity_for_result(result: &LoadResult) -> LoadSeverity {
    let infrastructure = result.errors.contains(&ValidationFinding::NoEngine)
        || result.exceptions.iter().any(|e| {
            matches!(e, LoaderError::Io(_) | LoaderError::Storage(_))
                || matches!(e, LoaderError::Csv(err) if matches!(err.kind(), ::csv::ErrorKind::Io(_)))
        });
    if infrastructure {
        LoadSeverity::Critical
    } else {
        LoadSeverity::Error
    }
}
