//! Column type descriptors.
//!
//! A [`FieldDescriptor`] is the engine-independent declaration of one column.
//! It is validated when it is constructed (the size ceiling check) and
//! rendered lazily into a column-definition fragment for a concrete
//! [`Engine`], so the same schema can be created on either backend.
//!
//! # Examples
//!
//! ```
//! use mediadex_core::{Engine, FieldDescriptor, SchemaError};
//!
//! let name = FieldDescriptor::char(64).unwrap().not_null();
//! assert_eq!(name.render(Engine::Sqlite), "CHAR(64) NOT NULL");
//!
//! // Sizes above the kind's ceiling are rejected up front.
//! assert!(matches!(
//!     FieldDescriptor::char(256),
//!     Err(SchemaError::SizeExceeded { .. })
//! ));
//! ```

use serde::{Deserialize, Serialize};

use crate::types::Engine;
use crate::validate::{Result, SchemaError};

/// Conventional name of the auto-assigned primary key column.
pub const PRIMARY_KEY_COLUMN: &str = "id";

/// Kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Fixed-width character column.
    Char,
    /// Variable-width character column.
    VarChar,
    /// Unbounded text column.
    Text,
    /// Integer column.
    Int,
    /// Floating point column.
    Float,
    /// Auto-incrementing integer primary key.
    PrimaryKey,
}

impl FieldKind {
    /// Largest size accepted for this kind.
    ///
    /// Returns `None` for [`FieldKind::PrimaryKey`], whose size is ignored.
    pub fn ceiling(self) -> Option<u32> {
        match self {
            Self::Char | Self::Int | Self::Float => Some(255),
            Self::VarChar | Self::Text => Some(65535),
            Self::PrimaryKey => None,
        }
    }

    /// SQL keyword used for this kind in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Char => "CHAR",
            Self::VarChar => "VARCHAR",
            Self::Text => "TEXT",
            Self::Int => "INT",
            Self::Float => "FLOAT",
            Self::PrimaryKey => "PRIMARY KEY",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "char" => Ok(Self::Char),
            "varchar" | "var_char" => Ok(Self::VarChar),
            "text" => Ok(Self::Text),
            "int" | "integer" => Ok(Self::Int),
            "float" | "real" => Ok(Self::Float),
            "pk" | "primary_key" | "primarykey" => Ok(Self::PrimaryKey),
            other => Err(format!("unknown field kind '{other}'")),
        }
    }
}

/// Declaration of one column: kind, size, nullability and uniqueness.
///
/// A size of `0` means "unbounded" and renders no size suffix. Constructors
/// default to a nullable, non-unique column; chain [`not_null`](Self::not_null)
/// and [`unique`](Self::unique) to tighten it.
///
/// # Examples
///
/// ```
/// use mediadex_core::{Engine, FieldDescriptor};
///
/// let uid = FieldDescriptor::var_char(255).unwrap().not_null().unique();
/// assert_eq!(uid.render(Engine::Postgres), "VARCHAR(255) NOT NULL UNIQUE");
///
/// let pk = FieldDescriptor::primary_key();
/// assert_eq!(pk.render(Engine::Sqlite), "INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    kind: FieldKind,
    size: u32,
    nullable: bool,
    unique: bool,
}

impl FieldDescriptor {
    /// Creates a descriptor of the given kind, enforcing the size ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::SizeExceeded`] if `size` is negative or larger
    /// than [`FieldKind::ceiling`].
    pub fn new(kind: FieldKind, size: i64) -> Result<Self> {
        if kind == FieldKind::PrimaryKey {
            return Ok(Self::primary_key());
        }
        let ceiling = kind.ceiling().unwrap_or(0);
        let size = u32::try_from(size)
            .ok()
            .filter(|s| *s <= ceiling)
            .ok_or(SchemaError::SizeExceeded {
                kind,
                size,
                ceiling,
            })?;
        Ok(Self {
            kind,
            size,
            nullable: true,
            unique: false,
        })
    }

    /// Infallible constructor for built-in schemas: `size` is clamped to the
    /// kind's ceiling instead of rejected.
    pub(crate) fn clamped(kind: FieldKind, size: u32) -> Self {
        match kind.ceiling() {
            Some(ceiling) => Self {
                kind,
                size: size.min(ceiling),
                nullable: true,
                unique: false,
            },
            None => Self::primary_key(),
        }
    }

    /// Auto-incrementing, non-null, unique integer primary key.
    ///
    /// Size, nullability and uniqueness do not apply.
    pub fn primary_key() -> Self {
        Self {
            kind: FieldKind::PrimaryKey,
            size: 0,
            nullable: false,
            unique: true,
        }
    }

    /// `CHAR(size)`, ceiling 255.
    pub fn char(size: i64) -> Result<Self> {
        Self::new(FieldKind::Char, size)
    }

    /// `VARCHAR(size)`, ceiling 65535.
    pub fn var_char(size: i64) -> Result<Self> {
        Self::new(FieldKind::VarChar, size)
    }

    /// `TEXT(size)`, ceiling 65535.
    pub fn text(size: i64) -> Result<Self> {
        Self::new(FieldKind::Text, size)
    }

    /// `INT(size)`, ceiling 255.
    pub fn int(size: i64) -> Result<Self> {
        Self::new(FieldKind::Int, size)
    }

    /// `FLOAT(size)`, ceiling 255.
    pub fn float(size: i64) -> Result<Self> {
        Self::new(FieldKind::Float, size)
    }

    /// Marks the column `NOT NULL`.
    pub fn not_null(self) -> Self {
        self.nullable(false)
    }

    /// Sets nullability explicitly. Ignored for primary keys.
    pub fn nullable(mut self, nullable: bool) -> Self {
        if self.kind != FieldKind::PrimaryKey {
            self.nullable = nullable;
        }
        self
    }

    /// Marks the column `UNIQUE`.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_primary_key(&self) -> bool {
        self.kind == FieldKind::PrimaryKey
    }

    /// Renders the type part only (no constraints), e.g. `VARCHAR(255)`.
    ///
    /// Used on its own by `ALTER COLUMN ... TYPE`.
    pub fn render_type(&self, engine: Engine) -> String {
        let sized = |name: &str| {
            if self.size == 0 {
                name.to_string()
            } else {
                format!("{name}({})", self.size)
            }
        };

        match (engine, self.kind) {
            (Engine::Sqlite, FieldKind::PrimaryKey) => "INTEGER".to_string(),
            (Engine::Postgres, FieldKind::PrimaryKey) => "SERIAL".to_string(),
            (_, FieldKind::Char) => sized("CHAR"),
            (_, FieldKind::VarChar) => sized("VARCHAR"),
            (Engine::Sqlite, FieldKind::Text) => sized("TEXT"),
            (Engine::Sqlite, FieldKind::Int) => sized("INT"),
            (Engine::Sqlite, FieldKind::Float) => sized("FLOAT"),
            // PostgreSQL has no display width for these types.
            (Engine::Postgres, FieldKind::Text) => "TEXT".to_string(),
            (Engine::Postgres, FieldKind::Int) => "INTEGER".to_string(),
            (Engine::Postgres, FieldKind::Float) => "DOUBLE PRECISION".to_string(),
        }
    }

    /// Renders the full column-definition fragment (without the column name).
    pub fn render(&self, engine: Engine) -> String {
        if self.kind == FieldKind::PrimaryKey {
            return match engine {
                Engine::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL".to_string(),
                Engine::Postgres => "SERIAL PRIMARY KEY NOT NULL".to_string(),
            };
        }

        let mut fragment = self.render_type(engine);
        if !self.nullable {
            fragment.push_str(" NOT NULL");
        }
        if self.unique {
            fragment.push_str(" UNIQUE");
        }
        fragment
    }
}
