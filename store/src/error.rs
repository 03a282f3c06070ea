//! Error types for store operations.
//!
//! Driver errors are classified on conversion: a uniqueness failure reported
//! by either engine becomes [`StoreError::UniqueConstraintViolation`], so
//! callers can match on it without knowing which backend is configured.

use mediadex_core::{Engine, SchemaError};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Field or table declaration rejected before reaching the backend.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A referenced column is not present in the live table.
    #[error("column not found: '{column}' in '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// A lookup that expects a match found none.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// The backend rejected a write because it would duplicate a unique key.
    #[error("unique constraint violated: {0}")]
    UniqueConstraintViolation(String),

    /// A connection could not be established.
    #[error("{engine} backend unavailable: {reason}")]
    BackendUnavailable { engine: Engine, reason: String },

    /// The engine has no way to express the requested operation.
    #[error("{operation} is not supported by {engine}")]
    Unsupported {
        engine: Engine,
        operation: &'static str,
    },

    /// A statement was rejected before execution (empty insert, missing
    /// filter, or a mutating statement sent to the read primitive).
    #[error("invalid statement: {0}")]
    InvalidStatement(String),

    /// A row value could not be converted to the requested type.
    #[error("conversion error: {0}")]
    ConversionError(String),

    /// SQLite operation failure.
    #[error("database error: {0}")]
    DatabaseError(rusqlite::Error),

    /// PostgreSQL operation failure.
    #[cfg(feature = "postgres")]
    #[error("postgres error: {0}")]
    PostgresError(sqlx::Error),
}

impl StoreError {
    /// `true` only for failures that may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueConstraintViolation(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ffi::{SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_UNIQUE};

        if let rusqlite::Error::SqliteFailure(code, message) = &err {
            if code.extended_code == SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == SQLITE_CONSTRAINT_PRIMARYKEY
            {
                let detail = message.clone().unwrap_or_else(|| code.to_string());
                return Self::UniqueConstraintViolation(detail);
            }
        }
        Self::DatabaseError(err)
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::UniqueConstraintViolation(db_err.message().to_string());
            }
        }
        Self::PostgresError(err)
    }
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_failure_is_classified() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: StoreError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_other_failures_pass_through() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err: StoreError = conn.execute("SELECT * FROM missing", []).unwrap_err().into();
        assert!(matches!(err, StoreError::DatabaseError(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_only_unavailable_is_transient() {
        let err = StoreError::BackendUnavailable {
            engine: Engine::Postgres,
            reason: "connection refused".into(),
        };
        assert!(err.is_transient());
        assert!(!StoreError::RecordNotFound("x".into()).is_transient());
    }
}
