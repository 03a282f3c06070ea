//! The media table.

use mediadex_config::DatabaseConfig;
use mediadex_core::{MediaRecord, PRIMARY_KEY_COLUMN, TableSchema, Value};
use serde::Serialize;
use tracing::{info, warn};

use crate::convert::row_to_media;
use crate::database::{Database, Table};
use crate::error::{Result, StoreError};
use crate::query::Select;

/// What [`MediaStore::save`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Stored,
    /// A record with the same `unique_id` was already present.
    AlreadyKnown,
}

/// Health summary of the media table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub table_exists: bool,
    pub record_count: u64,
}

/// Persisted media records, keyed by `unique_id`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    table: Table,
}

impl MediaStore {
    /// Binds to the table named in `config`. The table is not created.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let database = Database::connect(config)?;
        Self::with_database(&database, &config.table)
    }

    pub fn with_database(database: &Database, table: &str) -> Result<Self> {
        Ok(Self {
            table: database.table(table)?,
        })
    }

    /// Underlying table, for generic queries and schema changes.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Creates the media table if it does not exist yet.
    pub fn ensure_schema(&self) -> Result<()> {
        let database = Database::with_backend(self.table.backend());
        database.create_table(&TableSchema::media(self.table.name()), true)?;
        Ok(())
    }

    /// Stores `record` unless its `unique_id` is already known.
    ///
    /// The read-then-insert is not atomic; a concurrent writer that wins the
    /// race is reported as [`SaveOutcome::AlreadyKnown`] through the
    /// backend's uniqueness constraint.
    pub fn save(&self, record: &MediaRecord) -> Result<SaveOutcome> {
        if self.contains(&record.unique_id)? {
            info!(unique_id = %record.unique_id, "media already known");
            return Ok(SaveOutcome::AlreadyKnown);
        }

        let values: Vec<(String, Value)> = record
            .to_values()
            .into_iter()
            .map(|(column, value)| (column.to_string(), value))
            .collect();
        match self.table.insert(&values) {
            Ok(()) => {
                info!(unique_id = %record.unique_id, kind = %record.content_kind, "media stored");
                Ok(SaveOutcome::Stored)
            }
            Err(StoreError::UniqueConstraintViolation(detail)) => {
                warn!(unique_id = %record.unique_id, %detail, "duplicate insert rejected");
                Ok(SaveOutcome::AlreadyKnown)
            }
            Err(e) => Err(e),
        }
    }

    pub fn contains(&self, unique_id: &str) -> Result<bool> {
        match self.table.fetch_row(&[by_unique_id(unique_id)]) {
            Ok(_) => Ok(true),
            Err(StoreError::RecordNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    ///
    /// Returns [`StoreError::RecordNotFound`] if no record has `unique_id`.
    pub fn find(&self, unique_id: &str) -> Result<MediaRecord> {
        let rows = self.table.fetch_row(&[by_unique_id(unique_id)])?;
        match rows.first() {
            Some(row) => row_to_media(row),
            None => Err(StoreError::RecordNotFound(unique_id.to_string())),
        }
    }

    /// Every record, in insertion (primary key) order.
    pub fn all(&self) -> Result<Vec<MediaRecord>> {
        let select = Select::all().order_by(PRIMARY_KEY_COLUMN);
        self.table.select(&select)?.iter().map(row_to_media).collect()
    }

    pub fn status(&self) -> Result<StoreStatus> {
        let table_exists = self.table.exists()?;
        let record_count = if table_exists { self.table.count()? } else { 0 };
        Ok(StoreStatus {
            table_exists,
            record_count,
        })
    }
}

fn by_unique_id(unique_id: &str) -> (String, Value) {
    (MediaRecord::UNIQUE_ID_COLUMN.to_string(), Value::from(unique_id))
}
