//! DDL generation and schema mutations.
//!
//! Statement text is produced by pure functions so each dialect can be
//! tested without a server. The mutating operations on [`Table`] re-read the
//! live column list before every change; nothing about a table's shape is
//! cached between calls.

use mediadex_core::{
    Engine, FieldDescriptor, FieldKind, TableSchema, same_identifier, validate_identifier,
};
use tracing::info;

use crate::database::Table;
use crate::error::{Result, StoreError};

/// Renders `CREATE TABLE IF NOT EXISTS` for `schema`.
///
/// The schema is validated first; the first invalid or repeated column name
/// aborts before any fragment is rendered.
///
/// # Examples
///
/// ```
/// use mediadex_core::{Engine, FieldDescriptor, TableSchema};
/// use mediadex_store::create_table_sql;
///
/// let schema = TableSchema::new("t").column("name", FieldDescriptor::text(0).unwrap());
/// assert_eq!(
///     create_table_sql(&schema, true, Engine::Sqlite).unwrap(),
///     "CREATE TABLE IF NOT EXISTS t (id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, name TEXT)"
/// );
/// ```
pub fn create_table_sql(
    schema: &TableSchema,
    with_primary_key: bool,
    engine: Engine,
) -> Result<String> {
    schema.validate(with_primary_key)?;

    let mut definitions = Vec::with_capacity(schema.columns().len() + 1);
    if with_primary_key {
        definitions.push(format!(
            "{} {}",
            schema.primary_key(),
            FieldDescriptor::primary_key().render(engine)
        ));
    }
    for (name, field) in schema.columns() {
        definitions.push(format!("{name} {}", field.render(engine)));
    }
    if definitions.is_empty() {
        return Err(StoreError::InvalidStatement(format!(
            "table '{}' has no columns",
            schema.name()
        )));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        schema.name(),
        definitions.join(", ")
    ))
}

pub fn add_column_sql(table: &str, column: &str, field: &FieldDescriptor, engine: Engine) -> String {
    format!("ALTER TABLE {table} ADD COLUMN {column} {}", field.render(engine))
}

pub fn drop_column_sql(table: &str, column: &str) -> String {
    format!("ALTER TABLE {table} DROP COLUMN {column}")
}

pub fn rename_column_sql(table: &str, old: &str, new: &str) -> String {
    format!("ALTER TABLE {table} RENAME COLUMN {old} TO {new}")
}

/// Renders a column type change.
///
/// # Errors
///
/// SQLite has no statement for this and yields [`StoreError::Unsupported`].
pub fn alter_column_type_sql(
    table: &str,
    column: &str,
    field: &FieldDescriptor,
    engine: Engine,
) -> Result<String> {
    match engine {
        Engine::Sqlite => Err(StoreError::Unsupported {
            engine,
            operation: "changing a column type",
        }),
        Engine::Postgres => {
            let nullability = if field.is_nullable() { "DROP NOT NULL" } else { "SET NOT NULL" };
            Ok(format!(
                "ALTER TABLE {table} ALTER COLUMN {column} TYPE {}, \
                 ALTER COLUMN {column} {nullability}",
                field.render_type(engine)
            ))
        }
    }
}

impl Table {
    fn require_column(&self, live: &[String], column: &str) -> Result<()> {
        if live.iter().any(|c| same_identifier(c, column)) {
            Ok(())
        } else {
            Err(StoreError::ColumnNotFound {
                table: self.name().to_string(),
                column: column.to_string(),
            })
        }
    }

    fn require_absent(&self, live: &[String], column: &str) -> Result<()> {
        if live.iter().any(|c| same_identifier(c, column)) {
            Err(mediadex_core::SchemaError::ColumnAlreadyExists {
                table: self.name().to_string(),
                name: column.to_string(),
            }
            .into())
        } else {
            Ok(())
        }
    }

    /// Adds a column to the live table.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::Schema`] for an invalid or existing name and
    /// [`StoreError::Unsupported`] for a second primary key.
    pub fn add_column(&self, column: &str, field: FieldDescriptor) -> Result<()> {
        validate_identifier(column)?;
        let live = self.columns()?;
        self.require_absent(&live, column)?;
        if field.kind() == FieldKind::PrimaryKey {
            return Err(StoreError::Unsupported {
                engine: self.engine(),
                operation: "adding a primary key to an existing table",
            });
        }
        self.execute_ddl(&add_column_sql(self.name(), column, &field, self.engine()))?;
        info!(table = self.name(), column, kind = %field.kind(), "column added");
        Ok(())
    }

    /// # Errors
    ///
    /// Fails with [`StoreError::ColumnNotFound`] if `column` is absent.
    pub fn drop_column(&self, column: &str) -> Result<()> {
        let live = self.columns()?;
        self.require_column(&live, column)?;
        self.execute_ddl(&drop_column_sql(self.name(), column))?;
        info!(table = self.name(), column, "column dropped");
        Ok(())
    }

    /// # Errors
    ///
    /// Fails with [`StoreError::ColumnNotFound`] if `old` is absent, and with
    /// [`StoreError::Schema`] if `new` is invalid or already taken.
    pub fn rename_column(&self, old: &str, new: &str) -> Result<()> {
        validate_identifier(new)?;
        let live = self.columns()?;
        self.require_column(&live, old)?;
        self.require_absent(&live, new)?;
        self.execute_ddl(&rename_column_sql(self.name(), old, new))?;
        info!(table = self.name(), old, new, "column renamed");
        Ok(())
    }

    /// Changes a column's type and nullability. Uniqueness is left as is.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::ColumnNotFound`] if `column` is absent, then
    /// with [`StoreError::Unsupported`] on engines that cannot alter types.
    pub fn alter_column_type(&self, column: &str, field: FieldDescriptor) -> Result<()> {
        let live = self.columns()?;
        self.require_column(&live, column)?;
        let sql = alter_column_type_sql(self.name(), column, &field, self.engine())?;
        self.execute_ddl(&sql)?;
        info!(table = self.name(), column, kind = %field.kind(), "column type changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> TableSchema {
        TableSchema::media("files")
    }

    #[test]
    fn test_media_table_sqlite() {
        let sql = create_table_sql(&media(), true, Engine::Sqlite).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS files (\
             id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
             media_name VARCHAR(255) NOT NULL, \
             file_reference VARCHAR(255) NOT NULL, \
             unique_id VARCHAR(255) NOT NULL UNIQUE, \
             content_kind CHAR(8) NOT NULL)"
        );
    }

    #[test]
    fn test_media_table_postgres() {
        let sql = create_table_sql(&media(), true, Engine::Postgres).unwrap();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS files (id SERIAL PRIMARY KEY NOT NULL, "));
        assert!(sql.contains("unique_id VARCHAR(255) NOT NULL UNIQUE"));
    }

    #[test]
    fn test_without_primary_key() {
        let schema = TableSchema::new("t").column("x", FieldDescriptor::int(0).unwrap());
        let sql = create_table_sql(&schema, false, Engine::Postgres).unwrap();
        assert_eq!(sql, "CREATE TABLE IF NOT EXISTS t (x INTEGER)");
    }

    #[test]
    fn test_invalid_schema_renders_nothing() {
        let schema = TableSchema::new("t").column("bad name", FieldDescriptor::int(0).unwrap());
        assert!(matches!(
            create_table_sql(&schema, true, Engine::Sqlite),
            Err(StoreError::Schema(_))
        ));
    }

    #[test]
    fn test_empty_table_rejected() {
        let schema = TableSchema::new("t");
        assert!(matches!(
            create_table_sql(&schema, false, Engine::Sqlite),
            Err(StoreError::InvalidStatement(_))
        ));
    }

    #[test]
    fn test_alter_dialects() {
        let field = FieldDescriptor::var_char(64).unwrap().not_null();
        assert!(matches!(
            alter_column_type_sql("t", "c", &field, Engine::Sqlite),
            Err(StoreError::Unsupported { .. })
        ));
        assert_eq!(
            alter_column_type_sql("t", "c", &field, Engine::Postgres).unwrap(),
            "ALTER TABLE t ALTER COLUMN c TYPE VARCHAR(64), ALTER COLUMN c SET NOT NULL"
        );
    }

    #[test]
    fn test_column_statements() {
        let field = FieldDescriptor::float(0).unwrap();
        assert_eq!(
            add_column_sql("t", "score", &field, Engine::Postgres),
            "ALTER TABLE t ADD COLUMN score DOUBLE PRECISION"
        );
        assert_eq!(drop_column_sql("t", "c"), "ALTER TABLE t DROP COLUMN c");
        assert_eq!(
            rename_column_sql("t", "a", "b"),
            "ALTER TABLE t RENAME COLUMN a TO b"
        );
    }
}
