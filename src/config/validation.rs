use crate::config::parser::TOKENS_ENV;
use crate::config::types::{Config, CrawlerConfig, GithubConfig, OutputConfig, PoolConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_github_config(&config.github)?;
    validate_crawler_config(&config.crawler)?;
    validate_pool_config(&config.pool)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates API access configuration
fn validate_github_config(config: &GithubConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.api_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api-url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "api-url must use http or https, got '{}'",
            config.api_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.tokens.is_empty() {
        return Err(ConfigError::MissingTokens(TOKENS_ENV));
    }

    if config.tokens.iter().any(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "tokens cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl behavior configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_page < 1 {
        return Err(ConfigError::Validation(format!(
            "max-page must be >= 1, got {}",
            config.max_page
        )));
    }

    if config.min_batch < 1 || config.min_batch > 100 {
        return Err(ConfigError::Validation(format!(
            "min-batch must be between 1 and 100, got {}",
            config.min_batch
        )));
    }

    if config.repository_concurrency == Some(0) {
        return Err(ConfigError::Validation(
            "repository-concurrency must be >= 1".to_string(),
        ));
    }

    if let Some(location) = config.locations.iter().find(|l| l.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "locations cannot contain empty entries, got '{}'",
            location
        )));
    }

    Ok(())
}

/// Validates token pool configuration
fn validate_pool_config(config: &PoolConfig) -> Result<(), ConfigError> {
    if config.cooldown_ms < 2 {
        return Err(ConfigError::Validation(format!(
            "cooldown-ms must be >= 2ms, got {}ms",
            config.cooldown_ms
        )));
    }

    if config.usage_ceiling < 1 {
        return Err(ConfigError::Validation(format!(
            "usage-ceiling must be >= 1, got {}",
            config.usage_ceiling
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data-dir cannot be empty".to_string(),
        ));
    }

    if config.docs_dir.is_empty() {
        return Err(ConfigError::Validation(
            "docs-dir cannot be empty".to_string(),
        ));
    }

    if config.readme_path.is_empty() {
        return Err(ConfigError::Validation(
            "readme-path cannot be empty".to_string(),
        ));
    }

    if config.top_limit > config.rank_limit {
        return Err(ConfigError::Validation(format!(
            "top-limit ({}) cannot exceed rank-limit ({})",
            config.top_limit, config.rank_limit
        )));
    }

    Ok(())
}
