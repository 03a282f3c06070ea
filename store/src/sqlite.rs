//! Embedded file store backed by `rusqlite`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mediadex_core::{Engine, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, OpenFlags, params_from_iter};
use tracing::debug;

use crate::backend::{Backend, RowSet};
use crate::error::{Result, StoreError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database file, opened afresh for every primitive.
///
/// Reads open the file read-only, so only writes can create it.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    path: PathBuf,
}

impl SqliteBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self, flags: OpenFlags) -> Result<Connection> {
        let unavailable = |e: rusqlite::Error| StoreError::BackendUnavailable {
            engine: Engine::Sqlite,
            reason: format!("{}: {e}", self.path.display()),
        };
        let conn = Connection::open_with_flags(&self.path, flags).map_err(unavailable)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(unavailable)?;
        Ok(conn)
    }

    fn open_read(&self) -> Result<Connection> {
        self.open(OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)
    }

    fn open_write(&self) -> Result<Connection> {
        self.open(OpenFlags::default())
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Result<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::Integer(i)),
        ValueRef::Real(r) => Ok(Value::Real(r)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Value::Text(s.to_string()))
            .map_err(|e| StoreError::ConversionError(format!("non UTF-8 text: {e}"))),
        ValueRef::Blob(_) => Err(StoreError::ConversionError(
            "blob columns are not supported".to_string(),
        )),
    }
}

impl Backend for SqliteBackend {
    fn engine(&self) -> Engine {
        Engine::Sqlite
    }

    fn read(&self, sql: &str, params: &[Value]) -> Result<RowSet> {
        let conn = self.open_read()?;
        let mut stmt = conn.prepare(sql)?;
        if !stmt.readonly() {
            return Err(StoreError::InvalidStatement(
                "read primitive received a mutating statement".to_string(),
            ));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut rows = Vec::new();
        let mut cursor = stmt.query(params_from_iter(params.iter().map(to_sql)))?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(from_sql(row.get_ref(idx)?)?);
            }
            rows.push(values);
        }

        debug!(rows = rows.len(), params = params.len(), "sqlite read");
        Ok(RowSet { columns, rows })
    }

    fn write(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let mut conn = self.open_write()?;
        let tx = conn.transaction()?;
        let affected = tx.execute(sql, params_from_iter(params.iter().map(to_sql)))?;
        tx.commit()?;
        debug!(affected, params = params.len(), "sqlite write");
        Ok(affected as u64)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        // A file that was never written holds no tables.
        if !self.path.exists() {
            return Ok(false);
        }
        let result = self.read(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1 COLLATE NOCASE",
            &[Value::from(table)],
        )?;
        let count = result
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Ok(count > 0)
    }
}
