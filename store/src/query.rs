//! Statement assembly.
//!
//! [`QueryBuilder`] turns a small vocabulary of logical operations into SQL
//! text plus positional parameters. Identifiers are checked against the live
//! column list before they are placed in the text; values never are, they
//! are numbered placeholders in the engine's dialect (`?N` or `$N`) and
//! travel separately in [`Statement::params`].
//!
//! # Examples
//!
//! ```
//! use mediadex_core::{Engine, Value};
//! use mediadex_store::{QueryBuilder, Select};
//!
//! let live = vec!["id".to_string(), "media_name".to_string()];
//! let builder = QueryBuilder::new("files", Engine::Postgres, &live);
//! let stmt = builder
//!     .select(&Select::all().filter("media_name", "Dune").order_by("id"))
//!     .unwrap();
//! assert_eq!(stmt.sql, "SELECT * FROM files WHERE media_name = $1 ORDER BY id ASC");
//! assert_eq!(stmt.params, vec![Value::from("Dune")]);
//! ```

use mediadex_core::{Engine, Value, same_identifier};

use crate::error::{Result, StoreError};

/// SQL text and the values bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Column/value pairs used for filters and assignments.
pub type Assignments = Vec<(String, Value)>;

/// A `SELECT` request. An empty column list selects `*`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
    pub columns: Vec<String>,
    pub conditions: Assignments,
    pub order_by: Vec<String>,
    pub descending: bool,
}

impl Select {
    /// Every column, no filter, unordered.
    pub fn all() -> Self {
        Self::default()
    }

    /// Projects the given columns.
    pub fn columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Adds an equality condition. Conditions are joined with `AND`.
    pub fn filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by.push(column.into());
        self
    }

    /// Sorts every `ORDER BY` column descending.
    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }
}

/// Builds statements for one table against its live column list.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    table: &'a str,
    engine: Engine,
    columns: &'a [String],
}

impl<'a> QueryBuilder<'a> {
    /// `columns` must be the table's live columns as reported by a probe.
    pub fn new(table: &'a str, engine: Engine, columns: &'a [String]) -> Self {
        Self {
            table,
            engine,
            columns,
        }
    }

    fn check(&self, column: &str) -> Result<()> {
        if self.columns.iter().any(|c| same_identifier(c, column)) {
            Ok(())
        } else {
            Err(StoreError::ColumnNotFound {
                table: self.table.to_string(),
                column: column.to_string(),
            })
        }
    }

    /// Renders `a = ?1 AND b = ?2`, pushing the values onto `params`.
    fn equalities(
        &self,
        pairs: &[(String, Value)],
        separator: &str,
        params: &mut Vec<Value>,
    ) -> Result<String> {
        let mut parts = Vec::with_capacity(pairs.len());
        for (column, value) in pairs {
            self.check(column)?;
            params.push(value.clone());
            parts.push(format!("{column} = {}", self.engine.placeholder(params.len())));
        }
        Ok(parts.join(separator))
    }

    /// # Errors
    ///
    /// Returns [`StoreError::ColumnNotFound`] for any projected, filtered or
    /// ordering column missing from the table. `*` is always accepted as a
    /// projection.
    pub fn select(&self, select: &Select) -> Result<Statement> {
        let projection = if select.columns.is_empty() {
            "*".to_string()
        } else {
            for column in &select.columns {
                if column != "*" {
                    self.check(column)?;
                }
            }
            select.columns.join(", ")
        };

        let mut sql = format!("SELECT {projection} FROM {}", self.table);
        let mut params = Vec::new();
        if !select.conditions.is_empty() {
            let conditions = self.equalities(&select.conditions, " AND ", &mut params)?;
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
        }
        if !select.order_by.is_empty() {
            let direction = if select.descending { "DESC" } else { "ASC" };
            let mut keys = Vec::with_capacity(select.order_by.len());
            for column in &select.order_by {
                self.check(column)?;
                keys.push(format!("{column} {direction}"));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }
        Ok(Statement { sql, params })
    }

    /// `SELECT COUNT(*)`, unfiltered.
    pub fn count(&self) -> Statement {
        Statement {
            sql: format!("SELECT COUNT(*) FROM {}", self.table),
            params: Vec::new(),
        }
    }

    /// # Errors
    ///
    /// Returns [`StoreError::InvalidStatement`] for an empty record and
    /// [`StoreError::ColumnNotFound`] for an unknown column.
    pub fn insert(&self, record: &[(String, Value)]) -> Result<Statement> {
        if record.is_empty() {
            return Err(StoreError::InvalidStatement(
                "insert requires at least one column".to_string(),
            ));
        }
        let mut columns = Vec::with_capacity(record.len());
        let mut placeholders = Vec::with_capacity(record.len());
        let mut params = Vec::with_capacity(record.len());
        for (column, value) in record {
            self.check(column)?;
            params.push(value.clone());
            columns.push(column.as_str());
            placeholders.push(self.engine.placeholder(params.len()));
        }
        Ok(Statement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                columns.join(", "),
                placeholders.join(", ")
            ),
            params,
        })
    }

    /// # Errors
    ///
    /// Both `changes` and `conditions` must be non-empty; an unconditional
    /// update is rejected with [`StoreError::InvalidStatement`].
    pub fn update(
        &self,
        changes: &[(String, Value)],
        conditions: &[(String, Value)],
    ) -> Result<Statement> {
        if changes.is_empty() {
            return Err(StoreError::InvalidStatement(
                "update requires at least one change".to_string(),
            ));
        }
        if conditions.is_empty() {
            return Err(StoreError::InvalidStatement(
                "update requires at least one condition".to_string(),
            ));
        }
        let mut params = Vec::with_capacity(changes.len() + conditions.len());
        let set = self.equalities(changes, ", ", &mut params)?;
        let filter = self.equalities(conditions, " AND ", &mut params)?;
        Ok(Statement {
            sql: format!("UPDATE {} SET {set} WHERE {filter}", self.table),
            params,
        })
    }

    /// # Errors
    ///
    /// An unconditional delete is rejected with
    /// [`StoreError::InvalidStatement`].
    pub fn delete(&self, conditions: &[(String, Value)]) -> Result<Statement> {
        if conditions.is_empty() {
            return Err(StoreError::InvalidStatement(
                "delete requires at least one condition".to_string(),
            ));
        }
        let mut params = Vec::with_capacity(conditions.len());
        let filter = self.equalities(conditions, " AND ", &mut params)?;
        Ok(Statement {
            sql: format!("DELETE FROM {} WHERE {filter}", self.table),
            params,
        })
    }
}
