//! Integration tests for configuration loading from disk

use std::io::Write;
use sumi_scout::config::{compute_config_hash, load_config, load_config_with_hash};
use sumi_scout::ConfigError;
use tempfile::NamedTempFile;

const VALID_CONFIG: &str = r#"
[run]
max-pages = 25
max-depth = 2

[user-agent]
crawler-name = "TestScout"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
database-path = "./scout.db"
summary-path = "./scout-summary.md"

[[seed]]
url = "https://example.gov/registry"
anchor = "Business Registry"
task = "registry"

[[exclude]]
domain = "*.facebook.com"
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_load_config_from_file() {
    let file = write_config(VALID_CONFIG);

    let config = load_config(file.path()).expect("Config should load");
    assert_eq!(config.run.max_pages, 25);
    assert_eq!(config.run.max_depth, 2);
    assert_eq!(config.seeds.len(), 1);
    assert_eq!(config.seeds[0].task, "registry");
    assert_eq!(config.exclude[0].domain, "*.facebook.com");

    // Unspecified sections fall back to defaults
    assert_eq!(config.scheduler.max_concurrent_crawls, 8);
    assert_eq!(config.graph.optimization_interval, 20);
}

#[test]
fn test_config_hash_tracks_content() {
    let first = write_config(VALID_CONFIG);
    let same = write_config(VALID_CONFIG);
    let changed = write_config(&VALID_CONFIG.replace("max-pages = 25", "max-pages = 26"));

    let (_, hash) = load_config_with_hash(first.path()).expect("Config should load");
    assert_eq!(hash.len(), 64);
    assert_eq!(hash, compute_config_hash(same.path()).unwrap());
    assert_ne!(hash, compute_config_hash(changed.path()).unwrap());
}

#[test]
fn test_invalid_config_is_rejected() {
    let file = write_config(&VALID_CONFIG.replace("max-pages = 25", "max-pages = 0"));

    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    assert!(matches!(load_config(&missing), Err(ConfigError::Io(_))));
}
