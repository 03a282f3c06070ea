use std::collections::HashMap;
use std::io::Write;

use mediadex_config::{ConfigError, DEFAULT_TABLE, DatabaseConfig};
use mediadex_core::Engine;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_yaml(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("mediadex.yml");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f.flush().unwrap();
    path
}

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn test_file_then_environment_overlay() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_yaml(
        dir.path(),
        "engine: psql\nname: media\nhost: db.internal\nuser: bot\n",
    );

    let mut config = DatabaseConfig::load(&path).unwrap();
    assert_eq!(config.engine, Engine::Postgres);
    assert_eq!(config.port, 5432);
    assert_eq!(config.table, DEFAULT_TABLE);

    config
        .apply_vars(vars(&[("DB_PORT", "6543"), ("DB_TABLE", "Files")]))
        .unwrap();
    assert_eq!(config.host, "db.internal");
    assert_eq!(config.port, 6543);
    assert_eq!(config.table, "Files");
    assert!(config.validate().is_ok());
}

#[test]
fn test_saved_file_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.yml");
    let config = DatabaseConfig::postgres("h", 1234, "db", Some("u".into()), Some("p".into()))
        .with_table("media");
    config.save(&path).unwrap();

    let loaded = DatabaseConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_malformed_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_yaml(dir.path(), "engine: [not, a, scalar\n");
    assert!(matches!(
        DatabaseConfig::load(&path),
        Err(ConfigError::YamlError(_))
    ));
}

#[test]
fn test_invalid_table_from_environment() {
    let mut config = DatabaseConfig::sqlite("media.db");
    config.apply_vars(vars(&[("DB_TABLE", "my files")])).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidSetting { key: "table", .. })
    ));
}
