//! Core types shared by every mediadex crate.
//!
//! This crate defines the engine-independent building blocks of the data
//! access layer:
//!
//! - [`FieldDescriptor`]: a typed column declaration (kind, size,
//!   nullability, uniqueness) that renders itself into an engine-specific
//!   column fragment.
//! - [`TableSchema`]: an ordered list of named columns, validated before any
//!   SQL is generated.
//! - [`Value`]: a scalar bound to or read from a statement.
//! - [`MediaRecord`] and [`ContentKind`]: the single persisted entity.
//! - [`Engine`]: which SQL dialect a statement is rendered for.
//!
//! # Example
//!
//! ```
//! use mediadex_core::*;
//!
//! let schema = TableSchema::new("files")
//!     .column("media_name", FieldDescriptor::var_char(255).unwrap().not_null())
//!     .column("unique_id", FieldDescriptor::var_char(255).unwrap().not_null().unique());
//!
//! assert!(schema.validate(true).is_ok());
//! assert_eq!(
//!     schema.columns()[1].1.render(Engine::Sqlite),
//!     "VARCHAR(255) NOT NULL UNIQUE"
//! );
//! ```

mod field;
mod types;
mod validate;

pub use field::{FieldDescriptor, FieldKind, PRIMARY_KEY_COLUMN};
pub use types::*;
pub use validate::{
    Result, SchemaError, TableSchema, same_identifier, validate_identifier, validate_table_name,
};
