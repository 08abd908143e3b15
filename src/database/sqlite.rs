//! SQLite storage engine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};

use super::config::{DatabaseSettings, Driver};
use super::storage::{StorageConnection, StorageEngine};
use crate::error::{LoaderError, LoaderResult};
use crate::types::{ColumnMetadata, TableMetadata, Value};

/// Default busy_timeout (milliseconds).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Upper bound on bound parameters per statement (`SQLITE_MAX_VARIABLE_NUMBER`).
const MAX_BOUND_PARAMETERS: usize = 32_766;

/// Engine over an existing SQLite database file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteEngine {
    path: PathBuf,
}

impl SqliteEngine {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Build from connection settings; only the `sqlite` driver is available.
    pub fn from_settings(settings: &DatabaseSettings) -> LoaderResult<Self> {
        if settings.driver != Driver::Sqlite {
            return Err(LoaderError::Configuration {
                message: format!(
                    "driver '{}' is not available; only sqlite engines can be constructed",
                    settings.driver.scheme()
                ),
            });
        }
        if settings.database.trim().is_empty() {
            return Err(LoaderError::Configuration {
                message: "sqlite settings need a database file path".to_string(),
            });
        }
        Ok(Self::new(&settings.database))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageEngine for SqliteEngine {
    type Connection = SqliteConnection;

    /// Opens read-write without creating the file, so a wrong path fails here.
    fn connect(&self) -> LoaderResult<SqliteConnection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
        Ok(SqliteConnection { conn })
    }

    fn describe(&self) -> String {
        format!("sqlite:///{}", self.path.display())
    }
}

/// An open SQLite connection; closed on drop.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: Connection,
}

impl StorageConnection for SqliteConnection {
    fn table_names(&mut self) -> LoaderResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn reflect_table(&mut self, table: &str) -> LoaderResult<Option<TableMetadata>> {
        if !self.table_names()?.iter().any(|name| name == table) {
            return Ok(None);
        }
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([table], |row| {
                Ok(ColumnMetadata::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(TableMetadata {
            name: table.to_string(),
            columns,
        }))
    }

    fn insert_rows(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &mut dyn Iterator<Item = LoaderResult<Vec<Value>>>,
        chunk_size: usize,
    ) -> LoaderResult<usize> {
        if columns.is_empty() {
            return Ok(0);
        }
        let rows_per_statement = chunk_size
            .min(MAX_BOUND_PARAMETERS / columns.len())
            .max(1);

        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        let mut chunk: Vec<Vec<Value>> = Vec::with_capacity(rows_per_statement);
        loop {
            let row = rows.next().transpose()?;
            let exhausted = row.is_none();
            if let Some(row) = row {
                chunk.push(row);
            }
            if chunk.len() == rows_per_statement || (exhausted && !chunk.is_empty()) {
                let sql = insert_sql(table, columns, chunk.len());
                let mut stmt = tx.prepare_cached(&sql)?;
                stmt.execute(params_from_iter(chunk.iter().flatten()))?;
                inserted += chunk.len();
                chunk.clear();
            }
            if exhausted {
                break;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Multi-row `INSERT` with `rows` value groups of numbered placeholders.
fn insert_sql(table: &str, columns: &[String], rows: usize) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let groups = (0..rows)
        .map(|r| {
            let placeholders = (1..=columns.len())
                .map(|c| format!("?{}", r * columns.len() + c))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({placeholders})")
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({column_list}) VALUES {groups}",
        quote_ident(table)
    )
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::Int64(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Value::Float64(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Value::Utf8(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Binary(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
            Value::DateTime(v) => {
                ToSqlOutput::Owned(SqlValue::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()))
            }
        })
    }
}
