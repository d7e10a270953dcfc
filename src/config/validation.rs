use crate::config::types::{ApiConfig, CategoryEntry, Config, CrawlerConfig, OutputConfig};
use crate::ConfigError;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_api_config(&config.api)?;
    validate_output_config(&config.output)?;
    validate_categories(&config.categories)?;
    Ok(())
}

/// Validates crawl policy configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !(0.0..1.0).contains(&config.quality_threshold) {
        return Err(ConfigError::Validation(format!(
            "quality_threshold must be in [0, 1), got {}",
            config.quality_threshold
        )));
    }

    for (name, value) in [
        ("target_per_category", config.target_per_category),
        ("target_popular", config.target_popular),
        ("max_pages", config.max_pages as usize),
        ("max_empty_pages", config.max_empty_pages as usize),
        ("page_size", config.page_size as usize),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    validate_seconds("delay_min", config.delay_min)?;
    validate_seconds("delay_max", config.delay_max)?;
    validate_seconds("retry_backoff", config.retry_backoff)?;

    if config.delay_min > config.delay_max {
        return Err(ConfigError::Validation(format!(
            "delay_min ({}s) must not exceed delay_max ({}s)",
            config.delay_min, config.delay_max
        )));
    }

    Ok(())
}

fn validate_seconds(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, value
        )));
    }
    if Duration::try_from_secs_f64(value).is_err() {
        return Err(ConfigError::Validation(format!(
            "{} is too large, got {}s",
            name, value
        )));
    }
    Ok(())
}

/// Validates remote API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    for (name, path) in [
        ("ranking_path", &config.ranking_path),
        ("popular_path", &config.popular_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "{} must start with '/', got '{}'",
                name, path
            )));
        }
    }

    Url::parse(&config.content_url_base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid content_url_base: {}", e)))?;

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.ranking_dir.is_empty() {
        return Err(ConfigError::Validation(
            "ranking_dir cannot be empty".to_string(),
        ));
    }

    if config.popular_dir.is_empty() {
        return Err(ConfigError::Validation(
            "popular_dir cannot be empty".to_string(),
        ));
    }

    if config.csv_prefix.contains(['/', '\\']) {
        return Err(ConfigError::Validation(format!(
            "csv_prefix must not contain path separators, got '{}'",
            config.csv_prefix
        )));
    }

    Ok(())
}

/// Validates the category registry
fn validate_categories(categories: &[CategoryEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in categories {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category name cannot be empty".to_string(),
            ));
        }

        // names end up in file names
        if entry.name.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "category name '{}' must not contain path separators",
                entry.name
            )));
        }

        if !seen.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category name '{}'",
                entry.name
            )));
        }
    }

    Ok(())
}
