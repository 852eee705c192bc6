use crate::config::types::{
    ClassifierConfig, Config, DomainEntry, RunConfig, SchedulerConfig, SchemaConfig, SeedEntry,
    UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scheduler_config(&config.scheduler)?;
    validate_classifier_config(&config.classifier)?;
    validate_schema_config(&config.schema)?;
    validate_run_config(&config.run)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_seeds(&config.seeds)?;
    validate_exclusions(&config.exclude)?;
    Ok(())
}

/// Validates scheduler configuration
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_crawls < 1 || config.max_concurrent_crawls > 256 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_crawls must be between 1 and 256, got {}",
            config.max_concurrent_crawls
        )));
    }

    if config.max_queue_size < 1 {
        return Err(ConfigError::Validation(format!(
            "max_queue_size must be >= 1, got {}",
            config.max_queue_size
        )));
    }

    if config.model_update_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "model_update_interval must be >= 1, got {}",
            config.model_update_interval
        )));
    }

    if config.max_training_samples < 1 {
        return Err(ConfigError::Validation(
            "max_training_samples must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates classifier configuration
fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    validate_unit_interval("confidence_threshold", config.confidence_threshold)?;

    if config.retrain_threshold < 1 {
        return Err(ConfigError::Validation(
            "retrain_threshold must be >= 1".to_string(),
        ));
    }

    if config.feedback_threshold < 1 {
        return Err(ConfigError::Validation(
            "feedback_threshold must be >= 1".to_string(),
        ));
    }

    if config.max_training_samples < 1 {
        return Err(ConfigError::Validation(
            "max_training_samples must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates schema detector configuration
fn validate_schema_config(config: &SchemaConfig) -> Result<(), ConfigError> {
    validate_unit_interval("min_schema_confidence", config.min_schema_confidence)?;

    if config.max_examples < 1 {
        return Err(ConfigError::Validation(
            "max_examples must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates run budget configuration
fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.time_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "time_limit must be >= 1s, got {}s",
            config.time_limit
        )));
    }

    Ok(())
}

fn validate_unit_interval(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates seed entries: absolute http(s) URLs only
fn validate_seeds(seeds: &[SeedEntry]) -> Result<(), ConfigError> {
    for seed in seeds {
        let url = Url::parse(&seed.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed.url, e))
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use http or https",
                seed.url
            )));
        }

        if seed.task.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' has an empty task name",
                seed.url
            )));
        }
    }

    Ok(())
}

/// Validates exclusion domain entries
fn validate_exclusions(domains: &[DomainEntry]) -> Result<(), ConfigError> {
    for entry in domains {
        validate_domain_pattern(&entry.domain)?;
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    match pattern.strip_prefix("*.") {
        Some(domain) => validate_domain_string(domain),
        None => validate_domain_string(pattern),
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with(&['.', '-'][..]) || domain.ends_with(&['.', '-'][..]) {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
