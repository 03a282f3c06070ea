//! Connection settings for the mediadex store.
//!
//! [`DatabaseConfig`] selects the engine (embedded SQLite file or a
//! PostgreSQL server), carries the connection parameters, and names the
//! media table. It can be loaded from a YAML file, from environment
//! variables (with optional `.env` support), or built in code.
//!
//! # Quick start
//!
//! ```no_run
//! use mediadex_config::DatabaseConfig;
//!
//! // From a YAML file, with DB_* environment variables layered on top
//! let mut config = DatabaseConfig::load("mediadex.yml").unwrap();
//! config.apply_env().unwrap();
//!
//! // Or entirely from the environment
//! let config = DatabaseConfig::from_env().unwrap();
//! println!("using {} database '{}'", config.engine, config.name);
//! ```

mod config;
mod error;

pub use config::{DEFAULT_TABLE, DatabaseConfig, EnvSource};
pub use error::{ConfigError, Result};
