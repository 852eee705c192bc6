use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_scout::config::load_config;
///
/// let config = load_config(Path::new("scout.toml")).unwrap();
/// println!("Workers: {}", config.scheduler.max_concurrent_crawls);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is recorded with each run so that results can be tied back to
/// the configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const MINIMAL: &str = r#"
[user-agent]
crawler-name = "TestScout"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
database-path = "./test.db"
summary-path = "./summary.md"
"#;

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let file = create_temp_config(MINIMAL);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scheduler.max_concurrent_crawls, 8);
        assert_eq!(config.scheduler.max_retries, 3);
        assert!((config.schema.min_schema_confidence - 0.6).abs() < 1e-9);
        assert!((config.graph.weights.centrality_rank - 0.4).abs() < 1e-9);
        assert!(config.seeds.is_empty());
    }

    #[test]
    fn test_load_full_config() {
        let content = format!(
            r#"
[scheduler]
max-concurrent-crawls = 4
max-queue-size = 100
enable-learned-scoring = false
model-update-interval = 10
max-retries = 2

[classifier]
confidence-threshold = 0.6

[run]
max-pages = 25
time-limit = 60

[[seed]]
url = "https://example.gov/registry"
anchor = "Business Registry"
task = "registry"

[[exclude]]
domain = "*.facebook.com"
{}"#,
            MINIMAL
        );

        let file = create_temp_config(&content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scheduler.max_concurrent_crawls, 4);
        assert_eq!(config.scheduler.max_queue_size, 100);
        assert!(!config.scheduler.enable_learned_scoring);
        assert_eq!(config.run.max_pages, 25);
        assert_eq!(config.seeds.len(), 1);
        assert_eq!(config.seeds[0].task, "registry");
        assert_eq!(config.exclude[0].domain, "*.facebook.com");
    }

    #[test]
    fn test_seed_task_defaults() {
        let content = format!("{}\n[[seed]]\nurl = \"https://example.com/\"\n", MINIMAL);
        let config = parse_config(&content).unwrap();
        assert_eq!(config.seeds[0].task, "default");
        assert_eq!(config.seeds[0].anchor, "");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/scout.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = format!("[scheduler]\nmax-concurrent-crawls = 0\n{}", MINIMAL);
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }
}
