//! Database connection settings.
//!
//! # Example YAML
//!
//! ```yaml
//! engine: postgres
//! name: media
//! host: 10.0.0.5
//! port: 5432
//! user: bot
//! password: hunter2
//! table: files
//! connect_timeout_secs: 5
//! ```
//!
//! Every key except `name` is optional. The same settings can come from the
//! environment: `DB_ENGINE`, `DB_NAME`, `DB_HOST`, `DB_PORT`, `DB_USER`,
//! `DB_PASSWORD`, `DB_TABLE`.

use std::fmt;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use mediadex_core::{Engine, validate_table_name};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Media table name used when none is configured.
pub const DEFAULT_TABLE: &str = "files";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

/// Source of environment-style `KEY=value` settings.
///
/// Implemented for any `Fn(&str) -> Option<String>`, so tests can pass a
/// closure over a map instead of touching the process environment.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

impl<F> EnvSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Connection settings for one store.
///
/// For [`Engine::Sqlite`] `name` is the database file path and the network
/// settings are ignored. For [`Engine::Postgres`] `name` is the database
/// name on the server.
///
/// # Examples
///
/// ```
/// use mediadex_config::DatabaseConfig;
/// use mediadex_core::Engine;
///
/// let config = DatabaseConfig::sqlite("data.db");
/// assert_eq!(config.engine, Engine::Sqlite);
/// assert_eq!(config.table, "files");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Which backend to connect to.
    #[serde(default)]
    pub engine: Engine,
    /// File path (SQLite) or database name (PostgreSQL).
    pub name: String,
    /// Server host (PostgreSQL only).
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port (PostgreSQL only).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login role (PostgreSQL only).
    #[serde(default)]
    pub user: Option<String>,
    /// Login password (PostgreSQL only).
    #[serde(default)]
    pub password: Option<String>,
    /// Name of the media table.
    #[serde(default = "default_table")]
    pub table: String,
    /// Upper bound on establishing one connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            name: "data.db".to_string(),
            host: default_host(),
            port: default_port(),
            user: None,
            password: None,
            table: default_table(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("engine", &self.engine)
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("table", &self.table)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl DatabaseConfig {
    /// Settings for an embedded SQLite file.
    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        Self {
            engine: Engine::Sqlite,
            name: path.as_ref().to_string_lossy().into_owned(),
            ..Self::default()
        }
    }

    /// Settings for a PostgreSQL server.
    pub fn postgres(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: Option<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            engine: Engine::Postgres,
            name: database.into(),
            host: host.into(),
            port,
            user,
            password,
            ..Self::default()
        }
    }

    /// Overrides the media table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Path of the SQLite database file.
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.name)
    }

    /// Loads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be read,
    /// or [`YamlError`](ConfigError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        debug!(path = %path.display(), engine = %config.engine, "loaded database config");
        Ok(config)
    }

    /// Saves the settings as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be
    /// written, or [`YamlError`](ConfigError::YamlError) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Builds settings from the process environment.
    ///
    /// A `.env` file in the working directory (or a parent) is loaded first
    /// when present; a missing file is not an error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlays `DB_*` variables from the process environment (and `.env`)
    /// on top of the current settings.
    pub fn apply_env(&mut self) -> Result<()> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err.into()),
        }
        self.apply_vars(|key: &str| std::env::var(key).ok())
    }

    /// Overlays `DB_*` settings from an arbitrary source.
    ///
    /// Unset keys leave the current value untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] for an unknown engine or a
    /// non-numeric port.
    pub fn apply_vars(&mut self, env: impl EnvSource) -> Result<()> {
        if let Some(engine) = env.var("DB_ENGINE") {
            self.engine = engine
                .parse()
                .map_err(|reason| ConfigError::InvalidSetting {
                    key: "DB_ENGINE",
                    reason,
                })?;
        }
        if let Some(name) = env.var("DB_NAME") {
            self.name = name;
        }
        if let Some(host) = env.var("DB_HOST") {
            self.host = host;
        }
        if let Some(port) = env.var("DB_PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| ConfigError::InvalidSetting {
                    key: "DB_PORT",
                    reason: format!("'{port}': {e}"),
                })?;
        }
        if let Some(user) = env.var("DB_USER") {
            self.user = Some(user);
        }
        if let Some(password) = env.var("DB_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(table) = env.var("DB_TABLE") {
            self.table = table;
        }
        Ok(())
    }

    /// Checks that the settings can be used to open a store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] for an empty database name or
    /// a table name that is not a valid identifier.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "name",
                reason: "database name must not be empty".to_string(),
            });
        }
        validate_table_name(&self.table).map_err(|e| ConfigError::InvalidSetting {
            key: "table",
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
engine: psql
name: media
host: 10.0.0.5
port: 6543
user: bot
password: hunter2
table: Files
connect_timeout_secs: 2
"#
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_deserialize_complete() {
        let config: DatabaseConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.engine, Engine::Postgres);
        assert_eq!(config.name, "media");
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 6543);
        assert_eq!(config.user.as_deref(), Some("bot"));
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.table, "Files");
        assert_eq!(config.connect_timeout_secs, 2);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: DatabaseConfig = serde_yaml::from_str("name: data.db\n").unwrap();
        assert_eq!(config.engine, Engine::Sqlite);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5432);
        assert_eq!(config.table, DEFAULT_TABLE);
        assert!(config.user.is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config: DatabaseConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_apply_vars_overrides() {
        let mut config = DatabaseConfig::sqlite("local.db");
        config
            .apply_vars(vars(&[
                ("DB_ENGINE", "postgresql"),
                ("DB_NAME", "media"),
                ("DB_PORT", "15432"),
                ("DB_USER", "bot"),
            ]))
            .unwrap();
        assert_eq!(config.engine, Engine::Postgres);
        assert_eq!(config.name, "media");
        assert_eq!(config.port, 15432);
        assert_eq!(config.user.as_deref(), Some("bot"));
        // Untouched keys keep their values.
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.table, "files");
    }

    #[test]
    fn test_apply_vars_rejects_bad_values() {
        let mut config = DatabaseConfig::default();
        let err = config
            .apply_vars(vars(&[("DB_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { key: "DB_PORT", .. }));

        let err = config
            .apply_vars(vars(&[("DB_ENGINE", "oracle")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { key: "DB_ENGINE", .. }));
    }

    #[test]
    fn test_validate() {
        assert!(DatabaseConfig::sqlite("x.db").validate().is_ok());
        assert!(DatabaseConfig::sqlite("").validate().is_err());
        assert!(
            DatabaseConfig::sqlite("x.db")
                .with_table("my files")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mediadex.yml");

        let original: DatabaseConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = DatabaseConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file() {
        let err = DatabaseConfig::load("/definitely/not/here.yml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
