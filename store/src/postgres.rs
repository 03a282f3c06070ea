//! Client/server store backed by `sqlx`.
//!
//! The store API is synchronous, so the backend owns a current-thread tokio
//! runtime and blocks on each primitive. Every call connects, runs one
//! statement and closes the connection; a dropped connection is released by
//! the driver even when the statement fails.
//!
//! Parameters are bound with the types the server infers for their
//! placeholders, so a value reaches a column in that column's type: `12345`
//! compares against a `VARCHAR` as text and `NULL` fits any column.

use std::future::Future;
use std::time::Duration;

use mediadex_config::DatabaseConfig;
use mediadex_core::{Engine, Value};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Column as _, Connection as _, Executor as _, Postgres, Row as _, Statement as _, TypeInfo as _};
use tokio::runtime::Runtime;
use tracing::debug;

use crate::backend::{Backend, RowSet};
use crate::error::{Result, StoreError};

/// PostgreSQL server reached over TCP.
///
/// Every primitive blocks the calling thread until the statement is done.
/// Called from inside another tokio runtime, the work is moved to a scoped
/// thread instead of nesting runtimes, so async callers still block their
/// worker for the duration of the call.
pub struct PostgresBackend {
    runtime: Runtime,
    options: PgConnectOptions,
    connect_timeout: Duration,
}

impl std::fmt::Debug for PostgresBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresBackend")
            .field("host", &self.options.get_host())
            .field("port", &self.options.get_port())
            .field("database", &self.options.get_database())
            .finish()
    }
}

impl PostgresBackend {
    /// Prepares connection options and the runtime. No connection is made.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BackendUnavailable`] if the runtime cannot be
    /// started.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| unavailable(format!("failed to start runtime: {e}")))?;

        // Connections live for one statement; a cached statement would also
        // pin the parameter types of its first preparation.
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .statement_cache_capacity(0);
        if let Some(user) = &config.user {
            options = options.username(user);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        Ok(Self {
            runtime,
            options,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs.max(1)),
        })
    }

    async fn connect(&self) -> Result<PgConnection> {
        match tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&self.options)).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(unavailable(e.to_string())),
            Err(_) => Err(unavailable(format!(
                "no connection within {}s",
                self.connect_timeout.as_secs()
            ))),
        }
    }

    fn run<T, F>(&self, task: F) -> Result<T>
    where
        T: Send,
        F: Future<Output = Result<T>> + Send,
    {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.runtime.block_on(task);
        }
        // `block_on` panics on a thread that already drives a runtime.
        std::thread::scope(|scope| match scope.spawn(move || self.runtime.block_on(task)).join() {
            Ok(result) => result,
            Err(_) => Err(unavailable("postgres worker thread panicked".to_string())),
        })
    }
}

fn unavailable(reason: String) -> StoreError {
    StoreError::BackendUnavailable {
        engine: Engine::Postgres,
        reason,
    }
}

/// How a placeholder is bound, from the type the server inferred for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamKind {
    Int,
    Float,
    Bool,
    Text,
}

impl ParamKind {
    fn of(type_name: &str) -> Self {
        match type_name {
            "INT2" | "INT4" | "INT8" => Self::Int,
            "FLOAT4" | "FLOAT8" => Self::Float,
            "BOOL" => Self::Bool,
            _ => Self::Text,
        }
    }

    /// Used when the server reported no type for a placeholder.
    fn natural(value: &Value) -> Self {
        match value {
            Value::Integer(_) => Self::Int,
            Value::Real(_) => Self::Float,
            Value::Null | Value::Text(_) => Self::Text,
        }
    }
}

/// Converts `value` to the representation bound for `kind`, or `None` if it
/// has no sensible reading as that kind. `NULL` fits every kind.
fn coerce(value: &Value, kind: ParamKind) -> Option<Value> {
    let coerced = match (kind, value) {
        (_, Value::Null) => Value::Null,
        (ParamKind::Text, Value::Text(_)) => value.clone(),
        (ParamKind::Text, other) => Value::Text(other.to_string()),
        (ParamKind::Int | ParamKind::Bool, Value::Integer(_)) => value.clone(),
        (ParamKind::Int, Value::Real(r)) if r.fract() == 0.0 && r.abs() < i64::MAX as f64 => {
            Value::Integer(*r as i64)
        }
        (ParamKind::Int, Value::Text(s)) => Value::Integer(s.trim().parse().ok()?),
        (ParamKind::Float, Value::Real(_)) => value.clone(),
        (ParamKind::Float, Value::Integer(i)) => Value::Real(*i as f64),
        (ParamKind::Float, Value::Text(s)) => Value::Real(s.trim().parse().ok()?),
        (ParamKind::Bool, Value::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Value::Integer(1),
            "false" | "f" | "0" => Value::Integer(0),
            _ => return None,
        },
        _ => return None,
    };
    Some(coerced)
}

/// Placeholder kinds of `sql`, as inferred by the server.
async fn param_kinds(conn: &mut PgConnection, sql: &str) -> Result<(Vec<String>, Vec<ParamKind>)> {
    let statement = conn.prepare(sql).await?;
    let columns = statement
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let kinds = match statement.parameters() {
        Some(sqlx::Either::Left(types)) => types.iter().map(|t| ParamKind::of(t.name())).collect(),
        _ => Vec::new(),
    };
    Ok((columns, kinds))
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[Value],
    kinds: &[ParamKind],
) -> Result<Query<'q, Postgres, PgArguments>> {
    for (idx, param) in params.iter().enumerate() {
        let kind = kinds.get(idx).copied().unwrap_or_else(|| ParamKind::natural(param));
        let value = coerce(param, kind).ok_or_else(|| {
            StoreError::ConversionError(format!("parameter ${} cannot be read as {kind:?}", idx + 1))
        })?;
        // `coerce` leaves only NULL outside the kind's own variant.
        query = match (kind, value) {
            (ParamKind::Int, Value::Integer(i)) => query.bind(i),
            (ParamKind::Int, _) => query.bind(None::<i64>),
            (ParamKind::Float, Value::Real(r)) => query.bind(r),
            (ParamKind::Float, _) => query.bind(None::<f64>),
            (ParamKind::Bool, Value::Integer(i)) => query.bind(i != 0),
            (ParamKind::Bool, _) => query.bind(None::<bool>),
            (ParamKind::Text, Value::Text(s)) => query.bind(s),
            (ParamKind::Text, _) => query.bind(None::<String>),
        };
    }
    Ok(query)
}

fn decode(row: &PgRow, idx: usize) -> Result<Value> {
    let type_name = row.columns()[idx].type_info().name().to_string();
    let convert = |e: sqlx::Error| {
        StoreError::ConversionError(format!("column {idx} ({type_name}): {e}"))
    };

    let value: Value = match type_name.as_str() {
        "INT2" => row.try_get::<Option<i16>, _>(idx).map_err(convert)?.map(i64::from).into(),
        "INT4" => row.try_get::<Option<i32>, _>(idx).map_err(convert)?.map(i64::from).into(),
        "INT8" => row.try_get::<Option<i64>, _>(idx).map_err(convert)?.into(),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx).map_err(convert)?.map(f64::from).into(),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx).map_err(convert)?.into(),
        "BOOL" => row
            .try_get::<Option<bool>, _>(idx)
            .map_err(convert)?
            .map(i64::from)
            .into(),
        _ => row.try_get::<Option<String>, _>(idx).map_err(convert)?.into(),
    };
    Ok(value)
}

impl Backend for PostgresBackend {
    fn engine(&self) -> Engine {
        Engine::Postgres
    }

    fn read(&self, sql: &str, params: &[Value]) -> Result<RowSet> {
        self.run(async {
            let mut conn = self.connect().await?;
            let result = async {
                // Column descriptors come from the prepared statement so that
                // zero-row results still report their columns.
                let (columns, kinds) = param_kinds(&mut conn, sql).await?;

                let mut tx = conn.begin().await?;
                (&mut *tx).execute("SET TRANSACTION READ ONLY").await?;
                let pg_rows = bind_all(sqlx::query(sql), params, &kinds)?
                    .fetch_all(&mut *tx)
                    .await?;
                tx.rollback().await?;

                let mut rows = Vec::with_capacity(pg_rows.len());
                for row in &pg_rows {
                    let values = (0..columns.len())
                        .map(|idx| decode(row, idx))
                        .collect::<Result<Vec<_>>>()?;
                    rows.push(values);
                }
                Ok::<_, StoreError>(RowSet { columns, rows })
            }
            .await;
            // Close regardless of the statement's outcome.
            let _ = conn.close().await;
            if let Ok(set) = &result {
                debug!(rows = set.rows.len(), params = params.len(), "postgres read");
            }
            result
        })
    }

    fn write(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.run(async {
            let mut conn = self.connect().await?;
            let result = async {
                let kinds = if params.is_empty() {
                    Vec::new()
                } else {
                    param_kinds(&mut conn, sql).await?.1
                };
                let mut tx = conn.begin().await?;
                let done = bind_all(sqlx::query(sql), params, &kinds)?
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                Ok::<_, StoreError>(done.rows_affected())
            }
            .await;
            let _ = conn.close().await;
            if let Ok(affected) = &result {
                debug!(affected, params = params.len(), "postgres write");
            }
            result
        })
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        // Unquoted identifiers are stored folded to lowercase.
        let result = self.read(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1",
            &[Value::from(table.to_ascii_lowercase())],
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
