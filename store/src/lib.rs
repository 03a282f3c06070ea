//! Parameterised data access over SQLite and PostgreSQL.
//!
//! # Architecture
//!
//! - **`backend`**: one read/write primitive per engine; every call opens
//!   and releases its own connection
//! - **`schema`**: `CREATE TABLE`/`ALTER TABLE` generation and the column
//!   mutations, each checked against the live table first
//! - **`query`**: `SELECT`/`INSERT`/`UPDATE`/`DELETE` assembly with bound
//!   parameters
//! - **`convert`**: positional rows to name-keyed [`Row`]s and
//!   [`MediaRecord`](mediadex_core::MediaRecord)s
//! - **`media`**: the media table used by the search layer
//!
//! # Quick start
//!
//! ```no_run
//! use mediadex_config::DatabaseConfig;
//! use mediadex_core::{ContentKind, MediaRecord};
//! use mediadex_store::{MediaStore, SaveOutcome};
//!
//! let store = MediaStore::open(&DatabaseConfig::sqlite("media.db")).unwrap();
//! store.ensure_schema().unwrap();
//!
//! let record = MediaRecord::new("Dune.2021.mkv", "file-1", "uid-1", ContentKind::Video);
//! assert_eq!(store.save(&record).unwrap(), SaveOutcome::Stored);
//! assert_eq!(store.find("uid-1").unwrap(), record);
//! ```
//!
//! # Engines
//!
//! SQLite is always available. PostgreSQL is behind the default `postgres`
//! feature; without it, connecting to a PostgreSQL configuration fails with
//! [`StoreError::Unsupported`].

mod backend;
mod convert;
mod database;
mod error;
mod media;
#[cfg(feature = "postgres")]
mod postgres;
mod query;
mod schema;
mod sqlite;

pub use backend::{Backend, RowSet, connect};
pub use convert::{Row, map_rows, row_to_media};
pub use database::{Database, Table};
pub use error::{Result, StoreError};
pub use media::{MediaStore, SaveOutcome, StoreStatus};
#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;
pub use query::{Assignments, QueryBuilder, Select, Statement};
pub use schema::{
    add_column_sql, alter_column_type_sql, create_table_sql, drop_column_sql, rename_column_sql,
};
pub use sqlite::SqliteBackend;
