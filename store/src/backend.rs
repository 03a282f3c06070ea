//! Backend connection provider.
//!
//! A [`Backend`] exposes exactly two primitives, [`read`](Backend::read) and
//! [`write`](Backend::write). Each call acquires its own connection, runs one
//! statement with positional parameters bound by the driver, and releases
//! the connection before returning, on success and on failure alike. Writes
//! commit before release; reads are rejected if the statement would mutate.
//!
//! No pooling is done: every logical operation pays for one connection.

use std::sync::Arc;

use mediadex_config::DatabaseConfig;
use mediadex_core::{Engine, Value};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::sqlite::SqliteBackend;

/// Result of a read: column names as reported by the driver, in projection
/// order, plus positional rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Uniform read/write primitive over one SQL engine.
pub trait Backend: Send + Sync {
    /// Dialect statements for this backend must be rendered in.
    fn engine(&self) -> Engine;

    /// Runs a non-mutating statement and returns every row.
    fn read(&self, sql: &str, params: &[Value]) -> Result<RowSet>;

    /// Runs a mutating statement inside a transaction, commits, and returns
    /// the number of affected rows.
    fn write(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Whether a table with this name exists.
    fn table_exists(&self, table: &str) -> Result<bool>;

    /// Live column names of `table`, read from a zero-row probe query.
    ///
    /// The caller is responsible for `table` being a valid identifier.
    fn probe_columns(&self, table: &str) -> Result<Vec<String>> {
        let probe = format!("SELECT * FROM {table} LIMIT 0");
        let columns = self.read(&probe, &[])?.columns;
        debug!(table, columns = columns.len(), "probed live schema");
        Ok(columns)
    }
}

/// Builds the backend selected by `config`.
///
/// Nothing is opened here; connections are made per operation.
///
/// # Errors
///
/// Returns a configuration error wrapped as
/// [`StoreError::BackendUnavailable`] if the settings are unusable, or
/// [`StoreError::Unsupported`] for PostgreSQL when the crate was built
/// without the `postgres` feature.
pub fn connect(config: &DatabaseConfig) -> Result<Arc<dyn Backend>> {
    config
        .validate()
        .map_err(|e| StoreError::BackendUnavailable {
            engine: config.engine,
            reason: e.to_string(),
        })?;

    match config.engine {
        Engine::Sqlite => Ok(Arc::new(SqliteBackend::new(config.path()))),
        #[cfg(feature = "postgres")]
        Engine::Postgres => Ok(Arc::new(crate::postgres::PostgresBackend::new(config)?)),
        #[cfg(not(feature = "postgres"))]
        Engine::Postgres => Err(StoreError::Unsupported {
            engine: Engine::Postgres,
            operation: "connecting without the `postgres` feature",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_invalid_config() {
        let config = DatabaseConfig::sqlite("x.db").with_table("bad table");
        let err = connect(&config).err().unwrap();
        assert!(matches!(err, StoreError::BackendUnavailable { .. }));
    }

    #[test]
    fn test_connect_sqlite_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lazy.db");
        let backend = connect(&DatabaseConfig::sqlite(&path)).unwrap();
        assert_eq!(backend.engine(), Engine::Sqlite);
        assert!(!path.exists());
    }
}
