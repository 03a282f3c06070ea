//! Conversion from positional rows to name-keyed records.
//!
//! The driver reports a name for every projected column, and that name is
//! what a value is keyed by. Ordering is taken from the live table schema,
//! not from the projection list, so `SELECT b, a` and `SELECT a, b` map to
//! identical records. Computed columns that are not part of the table keep
//! their projection order after the table's own columns.

use std::collections::HashMap;

use mediadex_core::{ContentKind, MediaRecord, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::backend::RowSet;
use crate::error::{Result, StoreError};

/// One result row keyed by column name.
///
/// Serializes as a map in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Row {
    /// Value of `column`, if the row carries it.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Text value of `column`, if present and textual.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.fields.into_iter().map(|(_, value)| value).collect()
    }
}

/// Maps every row of `set` to a [`Row`] ordered by `live_columns`.
pub fn map_rows(live_columns: &[String], set: RowSet) -> Vec<Row> {
    let RowSet { columns, rows } = set;

    // Output slot order: live columns that were projected, then the rest.
    let mut order: Vec<usize> = Vec::with_capacity(columns.len());
    let position: HashMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();
    for live in live_columns {
        if let Some(&idx) = position.get(live.as_str()) {
            order.push(idx);
        }
    }
    for idx in 0..columns.len() {
        if !order.contains(&idx) {
            order.push(idx);
        }
    }

    rows.into_iter()
        .map(|mut values| {
            let fields = order
                .iter()
                .map(|&idx| {
                    let value = values.get_mut(idx).map(std::mem::take).unwrap_or_default();
                    (columns[idx].clone(), value)
                })
                .collect();
            Row { fields }
        })
        .collect()
}

/// Converts a mapped row into a [`MediaRecord`].
///
/// # Errors
///
/// Returns [`StoreError::ConversionError`] if a media column is missing,
/// not text, or holds an unknown content kind.
pub fn row_to_media(row: &Row) -> Result<MediaRecord> {
    let text = |column: &str| {
        row.text(column)
            .map(str::to_string)
            .ok_or_else(|| StoreError::ConversionError(format!("missing text column '{column}'")))
    };

    let content_kind = text(MediaRecord::CONTENT_KIND_COLUMN)?
        .parse::<ContentKind>()
        .map_err(|e| StoreError::ConversionError(e.to_string()))?;

    Ok(MediaRecord {
        media_name: text(MediaRecord::NAME_COLUMN)?,
        file_reference: text(MediaRecord::FILE_REFERENCE_COLUMN)?,
        unique_id: text(MediaRecord::UNIQUE_ID_COLUMN)?,
        content_kind,
    })
}
