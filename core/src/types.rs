//! Shared value and record types.
//!
//! The types here cross every crate boundary: statements are parameterised
//! with [`Value`]s, rows come back as [`Value`]s, and the one persisted
//! entity is a [`MediaRecord`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// SQL dialect a statement is rendered for.
///
/// # Examples
///
/// ```
/// use mediadex_core::Engine;
///
/// assert_eq!("psql".parse::<Engine>().unwrap(), Engine::Postgres);
/// assert_eq!(Engine::Sqlite.placeholder(2), "?2");
/// assert_eq!(Engine::Postgres.placeholder(2), "$2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Embedded file store.
    #[default]
    #[serde(alias = "sqlite3", alias = "embedded-file")]
    Sqlite,
    /// Client/server store.
    #[serde(alias = "psql", alias = "postgresql", alias = "client-server")]
    Postgres,
}

impl Engine {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    /// Positional placeholder for the 1-based parameter `index`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Self::Sqlite => format!("?{index}"),
            Self::Postgres => format!("${index}"),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" | "embedded-file" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "psql" | "client-server" => Ok(Self::Postgres),
            other => Err(format!("unknown database engine '{other}'")),
        }
    }
}

/// A scalar bound to a statement or read back from a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Consumes the value, returning the owned string if it is text.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// How a stored media item is replayed to a requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Document,
    Video,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized content kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown content kind '{0}': expected 'document' or 'video'")]
pub struct UnknownContentKind(pub String);

impl FromStr for ContentKind {
    type Err = UnknownContentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "document" => Ok(Self::Document),
            "video" => Ok(Self::Video),
            other => Err(UnknownContentKind(other.to_string())),
        }
    }
}

/// One persisted media item.
///
/// `unique_id` is the natural key: it is stable across re-sends of the same
/// file, while `file_reference` is whatever handle the messaging service
/// needs to replay the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub media_name: String,
    pub file_reference: String,
    pub unique_id: String,
    pub content_kind: ContentKind,
}

impl MediaRecord {
    /// Column holding [`media_name`](Self::media_name).
    pub const NAME_COLUMN: &'static str = "media_name";
    /// Column holding [`file_reference`](Self::file_reference).
    pub const FILE_REFERENCE_COLUMN: &'static str = "file_reference";
    /// Column holding [`unique_id`](Self::unique_id).
    pub const UNIQUE_ID_COLUMN: &'static str = "unique_id";
    /// Column holding [`content_kind`](Self::content_kind).
    pub const CONTENT_KIND_COLUMN: &'static str = "content_kind";

    pub fn new(
        media_name: impl Into<String>,
        file_reference: impl Into<String>,
        unique_id: impl Into<String>,
        content_kind: ContentKind,
    ) -> Self {
        Self {
            media_name: media_name.into(),
            file_reference: file_reference.into(),
            unique_id: unique_id.into(),
            content_kind,
        }
    }

    /// Column/value pairs in table order, ready for an insert.
    pub fn to_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            (Self::NAME_COLUMN, Value::from(&self.media_name)),
            (Self::FILE_REFERENCE_COLUMN, Value::from(&self.file_reference)),
            (Self::UNIQUE_ID_COLUMN, Value::from(&self.unique_id)),
            (Self::CONTENT_KIND_COLUMN, Value::from(self.content_kind.as_str())),
        ]
    }
}
