//! Table-level data access.
//!
//! [`Database`] holds the configured backend and hands out [`Table`]
//! handles. Every `Table` operation probes the live column list first, builds
//! its statement with [`QueryBuilder`], and runs it through exactly one
//! backend primitive.

use std::sync::Arc;

use mediadex_config::DatabaseConfig;
use mediadex_core::{Engine, TableSchema, Value, same_identifier, validate_table_name};
use tracing::{debug, info};

use crate::backend::{self, Backend};
use crate::convert::{Row, map_rows};
use crate::error::{Result, StoreError};
use crate::query::{QueryBuilder, Select, Statement};
use crate::schema::create_table_sql;

/// Entry point for one configured database.
#[derive(Clone)]
pub struct Database {
    backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("engine", &self.backend.engine())
            .finish()
    }
}

impl Database {
    /// Selects the backend named by `config`. No connection is opened yet.
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self::with_backend(backend::connect(config)?))
    }

    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn engine(&self) -> Engine {
        self.backend.engine()
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Handle for an existing (or not yet created) table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Schema`] if `name` is not a valid identifier.
    pub fn table(&self, name: &str) -> Result<Table> {
        validate_table_name(name)?;
        Ok(Table {
            backend: Arc::clone(&self.backend),
            name: name.to_string(),
        })
    }

    /// Creates the table unless it already exists.
    ///
    /// Creating an existing table is a no-op, whatever its current columns.
    ///
    /// # Errors
    ///
    /// Invalid or duplicate column names fail before anything is sent to the
    /// backend.
    pub fn create_table(&self, schema: &TableSchema, with_primary_key: bool) -> Result<Table> {
        let sql = create_table_sql(schema, with_primary_key, self.engine())?;
        debug!(%sql, "create table");
        self.backend.write(&sql, &[])?;
        info!(table = schema.name(), columns = schema.columns().len(), "table ensured");
        self.table(schema.name())
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        validate_table_name(name)?;
        self.backend.table_exists(name)
    }
}

/// One table of a [`Database`].
#[derive(Clone)]
pub struct Table {
    backend: Arc<dyn Backend>,
    name: String,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("engine", &self.backend.engine())
            .finish()
    }
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine(&self) -> Engine {
        self.backend.engine()
    }

    pub(crate) fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    pub fn exists(&self) -> Result<bool> {
        self.backend.table_exists(&self.name)
    }

    /// Live column names, in table order.
    pub fn columns(&self) -> Result<Vec<String>> {
        self.backend.probe_columns(&self.name)
    }

    fn read(&self, live: &[String], stmt: Statement) -> Result<Vec<Row>> {
        debug!(sql = %stmt.sql, params = stmt.params.len(), "read");
        let set = self.backend.read(&stmt.sql, &stmt.params)?;
        Ok(map_rows(live, set))
    }

    fn write(&self, stmt: Statement) -> Result<u64> {
        debug!(sql = %stmt.sql, params = stmt.params.len(), "write");
        self.backend.write(&stmt.sql, &stmt.params)
    }

    pub(crate) fn execute_ddl(&self, sql: &str) -> Result<()> {
        debug!(%sql, "ddl");
        self.backend.write(sql, &[])?;
        Ok(())
    }

    /// Runs an arbitrary [`Select`] and maps the rows by name.
    pub fn select(&self, select: &Select) -> Result<Vec<Row>> {
        let live = self.columns()?;
        let stmt = QueryBuilder::new(&self.name, self.engine(), &live).select(select)?;
        self.read(&live, stmt)
    }

    /// Every row, optionally ordered.
    pub fn fetch_all(&self, order_by: &[&str], descending: bool) -> Result<Vec<Row>> {
        let mut select = Select::all().descending(descending);
        select.order_by = order_by.iter().map(|c| c.to_string()).collect();
        self.select(&select)
    }

    /// Values of the first of `columns` across all rows.
    ///
    /// Every listed column is projected and checked, but only the first one's
    /// values are returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidStatement`] for an empty column list and
    /// [`StoreError::ColumnNotFound`] if a listed or ordering column is absent.
    pub fn fetch_col(&self, columns: &[&str], order_by: &[&str], descending: bool) -> Result<Vec<Value>> {
        let Some(first) = columns.first() else {
            return Err(StoreError::InvalidStatement(
                "fetch_col requires at least one column".to_string(),
            ));
        };
        let mut select = Select::columns(columns.iter().copied()).descending(descending);
        select.order_by = order_by.iter().map(|c| c.to_string()).collect();
        let rows = self.select(&select)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                row.fields()
                    .iter()
                    .find(|(name, _)| same_identifier(name, first))
                    .map(|(_, value)| value.clone())
                    .unwrap_or_default()
            })
            .collect())
    }

    /// Rows matching every condition.
    ///
    /// The result is always a sequence, even when exactly one row matches.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RecordNotFound`] when nothing matches.
    pub fn fetch_row(&self, conditions: &[(String, Value)]) -> Result<Vec<Row>> {
        let select = Select {
            conditions: conditions.to_vec(),
            ..Select::all()
        };
        let rows = self.select(&select)?;
        if rows.is_empty() {
            let filter: Vec<&str> = conditions.iter().map(|(c, _)| c.as_str()).collect();
            return Err(StoreError::RecordNotFound(format!(
                "no row in '{}' matches [{}]",
                self.name,
                filter.join(", ")
            )));
        }
        Ok(rows)
    }

    /// Inserts one row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ColumnNotFound`] for unknown columns and
    /// [`StoreError::UniqueConstraintViolation`] when a unique column would
    /// be duplicated.
    pub fn insert(&self, record: &[(String, Value)]) -> Result<()> {
        let live = self.columns()?;
        let stmt = QueryBuilder::new(&self.name, self.engine(), &live).insert(record)?;
        self.write(stmt)?;
        Ok(())
    }

    /// Returns the number of rows changed.
    pub fn update(&self, changes: &[(String, Value)], conditions: &[(String, Value)]) -> Result<u64> {
        let live = self.columns()?;
        let stmt = QueryBuilder::new(&self.name, self.engine(), &live).update(changes, conditions)?;
        let affected = self.write(stmt)?;
        info!(table = %self.name, affected, "rows updated");
        Ok(affected)
    }

    /// Returns the number of rows removed.
    pub fn delete(&self, conditions: &[(String, Value)]) -> Result<u64> {
        let live = self.columns()?;
        let stmt = QueryBuilder::new(&self.name, self.engine(), &live).delete(conditions)?;
        let affected = self.write(stmt)?;
        info!(table = %self.name, affected, "rows deleted");
        Ok(affected)
    }

    pub fn count(&self) -> Result<u64> {
        let stmt = QueryBuilder::new(&self.name, self.engine(), &[]).count();
        let set = self.backend.read(&stmt.sql, &stmt.params)?;
        let count = set
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(Value::as_i64)
            .unwrap_or(0);
        u64::try_from(count).map_err(|e| StoreError::ConversionError(e.to_string()))
    }
}
