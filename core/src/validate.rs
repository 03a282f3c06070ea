//! Identifier and table-schema validation.
//!
//! Table and column names are interpolated into SQL text (they cannot be
//! bound as parameters), so every identifier is checked here before any
//! statement is generated. A valid identifier is non-empty, contains only
//! ASCII alphanumerics and underscores, and does not start with a digit.
//!
//! # Examples
//!
//! ```
//! use mediadex_core::*;
//!
//! let bad = TableSchema::new("files").column("bad name", FieldDescriptor::text(0).unwrap());
//! assert!(matches!(bad.validate(true), Err(SchemaError::ColumnNameInvalid { .. })));
//!
//! let dup = TableSchema::new("files")
//!     .column("x", FieldDescriptor::text(0).unwrap())
//!     .column("x", FieldDescriptor::int(0).unwrap());
//! assert!(matches!(dup.validate(true), Err(SchemaError::ColumnAlreadyExists { .. })));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::{FieldDescriptor, FieldKind, PRIMARY_KEY_COLUMN};
use crate::types::{ContentKind, MediaRecord};

/// Errors raised while declaring fields and table schemas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Column name contains whitespace or other characters not allowed in
    /// an identifier.
    #[error("invalid column name '{name}': {reason}")]
    ColumnNameInvalid { name: String, reason: &'static str },

    /// Column name declared twice, or already present in the live table.
    #[error("column '{name}' already exists in '{table}'")]
    ColumnAlreadyExists { table: String, name: String },

    /// Field size is negative or above the kind's ceiling.
    #[error("size {size} not permitted for {kind} (allowed 0..={ceiling})")]
    SizeExceeded {
        kind: FieldKind,
        size: i64,
        ceiling: u32,
    },

    /// Table name is not a valid identifier.
    #[error("invalid table name '{name}': {reason}")]
    TableNameInvalid { name: String, reason: &'static str },

    /// More than one primary key column was declared.
    #[error("table '{0}' declares more than one primary key")]
    MultiplePrimaryKeys(String),
}

/// Convenience alias for results with [`SchemaError`].
pub type Result<T> = std::result::Result<T, SchemaError>;

fn identifier_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("must not be empty");
    }
    if name.chars().any(char::is_whitespace) {
        return Some("must not contain whitespace");
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Some("only ASCII letters, digits and underscores are allowed");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Some("must not start with a digit");
    }
    None
}

/// Validates a column name.
///
/// # Errors
///
/// Returns [`SchemaError::ColumnNameInvalid`] describing the first problem.
pub fn validate_identifier(name: &str) -> Result<()> {
    match identifier_problem(name) {
        Some(reason) => Err(SchemaError::ColumnNameInvalid {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Whether two identifiers name the same object.
///
/// Unquoted SQL identifiers are case-insensitive on both engines, and
/// PostgreSQL reports them folded to lowercase.
pub fn same_identifier(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Validates a table name.
///
/// # Errors
///
/// Returns [`SchemaError::TableNameInvalid`] describing the first problem.
pub fn validate_table_name(name: &str) -> Result<()> {
    match identifier_problem(name) {
        Some(reason) => Err(SchemaError::TableNameInvalid {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// A table name plus its ordered column declarations.
///
/// Column order is significant: it is the order the columns are created in,
/// and therefore the order rows are mapped back in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    primary_key: String,
    columns: Vec<(String, FieldDescriptor)>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: PRIMARY_KEY_COLUMN.to_string(),
            columns: Vec::new(),
        }
    }

    /// Schema of the media table: `(media_name, file_reference, unique_id
    /// UNIQUE, content_kind)`, plus the auto-assigned `id` when created with
    /// a primary key.
    pub fn media(name: impl Into<String>) -> Self {
        let kind_width = ContentKind::Document
            .as_str()
            .len()
            .max(ContentKind::Video.as_str().len());
        Self::new(name)
            .column(
                MediaRecord::NAME_COLUMN,
                FieldDescriptor::clamped(FieldKind::VarChar, 255).not_null(),
            )
            .column(
                MediaRecord::FILE_REFERENCE_COLUMN,
                FieldDescriptor::clamped(FieldKind::VarChar, 255).not_null(),
            )
            .column(
                MediaRecord::UNIQUE_ID_COLUMN,
                FieldDescriptor::clamped(FieldKind::VarChar, 255)
                    .not_null()
                    .unique(),
            )
            .column(
                MediaRecord::CONTENT_KIND_COLUMN,
                FieldDescriptor::clamped(FieldKind::Char, kind_width as u32).not_null(),
            )
    }

    /// Appends a column. Validation is deferred to [`validate`](Self::validate).
    pub fn column(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.columns.push((name.into(), field));
        self
    }

    /// Overrides the name of the auto-assigned primary key (default `id`).
    pub fn primary_key_name(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn columns(&self) -> &[(String, FieldDescriptor)] {
        &self.columns
    }

    /// Column names in declaration order, including the auto-assigned
    /// primary key first when `with_primary_key` is set.
    pub fn column_names(&self, with_primary_key: bool) -> Vec<&str> {
        let pk = with_primary_key.then_some(self.primary_key.as_str());
        pk.into_iter()
            .chain(self.columns.iter().map(|(name, _)| name.as_str()))
            .collect()
    }

    /// Checks the table name and every column before anything is rendered.
    ///
    /// Columns are checked in order and the first violation aborts:
    /// invalid names fail with [`SchemaError::ColumnNameInvalid`], repeated
    /// names (including a clash with the auto-assigned primary key) with
    /// [`SchemaError::ColumnAlreadyExists`], and a second primary key with
    /// [`SchemaError::MultiplePrimaryKeys`].
    pub fn validate(&self, with_primary_key: bool) -> Result<()> {
        validate_table_name(&self.name)?;

        let mut seen = HashSet::new();
        let mut primary_keys = 0usize;
        if with_primary_key {
            validate_identifier(&self.primary_key)?;
            seen.insert(self.primary_key.to_ascii_lowercase());
            primary_keys += 1;
        }

        for (name, field) in &self.columns {
            validate_identifier(name)?;
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(SchemaError::ColumnAlreadyExists {
                    table: self.name.clone(),
                    name: name.clone(),
                });
            }
            if field.is_primary_key() {
                primary_keys += 1;
                if primary_keys > 1 {
                    return Err(SchemaError::MultiplePrimaryKeys(self.name.clone()));
                }
            }
        }
        Ok(())
    }
}
