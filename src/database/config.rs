//! Connection settings and load options.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LoaderError, LoaderResult};

/// Database driver named in the connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Driver {
    #[default]
    #[serde(
        rename = "postgresql",
        alias = "postgresql+psycopg2",
        alias = "postgresql+pg8000"
    )]
    Postgresql,
    #[serde(rename = "mysql")]
    Mysql,
    #[serde(rename = "oracle")]
    Oracle,
    #[serde(rename = "mssql", alias = "mssql+pyodbc", alias = "mssql+pymssql")]
    Mssql,
    #[serde(rename = "sqlite")]
    Sqlite,
}

impl Driver {
    /// URL scheme of the driver.
    pub fn scheme(self) -> &'static str {
        match self {
            Driver::Postgresql => "postgresql",
            Driver::Mysql => "mysql",
            Driver::Oracle => "oracle",
            Driver::Mssql => "mssql",
            Driver::Sqlite => "sqlite",
        }
    }
}

/// Connection descriptor. For SQLite, `database` is the database file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSettings {
    #[serde(alias = "drivername")]
    pub driver: Driver,
    pub host: String,
    pub port: Option<u16>,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            driver: Driver::default(),
            host: "localhost".to_string(),
            port: None,
            database: "postgres".to_string(),
            username: "postgres".to_string(),
            password: String::new(),
        }
    }
}

impl DatabaseSettings {
    /// SQLite settings for a database file.
    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        Self {
            driver: Driver::Sqlite,
            database: path.as_ref().display().to_string(),
            ..Self::default()
        }
    }

    /// Connection URL with the password masked.
    pub fn to_url(&self) -> String {
        if self.driver == Driver::Sqlite {
            return format!("sqlite:///{}", self.database);
        }
        let mut url = format!("{}://{}", self.driver.scheme(), self.username);
        if !self.password.is_empty() {
            url.push_str(":***");
        }
        url.push('@');
        url.push_str(&self.host);
        if let Some(port) = self.port {
            url.push_str(&format!(":{port}"));
        }
        url.push('/');
        url.push_str(&self.database);
        url
    }
}

impl fmt::Display for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

/// Contents of a connection configuration file: `{"database": {...}}`.
///
/// Other top-level sections are ignored so the file can be shared with other tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl LoaderConfig {
    /// Read a configuration file. Every failure is a [`LoaderError::Configuration`].
    pub fn from_path(path: impl AsRef<Path>) -> LoaderResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoaderError::Configuration {
                message: format!("file {} doesn't exist", path.display()),
            });
        }
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| LoaderError::Configuration {
            message: format!("not a valid configuration file ({}): {e}", path.display()),
        })
    }
}

/// Options controlling how rows are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Rows per insert statement. All statements of a file share one transaction.
    pub chunk_size: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { chunk_size: 500 }
    }
}

/// Result of [`super::Database::test_connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTest {
    pub success: bool,
    pub error: String,
}

impl ConnectionTest {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: String::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_aliases_parse() {
        let settings: DatabaseSettings =
            serde_json::from_str(r#"{"drivername": "postgresql+psycopg2", "port": 5432}"#).unwrap();
        assert_eq!(settings.driver, Driver::Postgresql);
        assert_eq!(settings.to_url(), "postgresql://postgres@localhost:5432/postgres");
    }

    #[test]
    fn unknown_settings_key_is_rejected() {
        let err = serde_json::from_str::<DatabaseSettings>(r#"{"hostname": "db"}"#).unwrap_err();
        assert!(err.to_string().contains("hostname"));
    }

    #[test]
    fn password_is_masked() {
        let settings = DatabaseSettings {
            password: "secret".to_string(),
            ..DatabaseSettings::default()
        };
        assert!(!settings.to_url().contains("secret"));
    }
}
