use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable consulted when the config file lists no tokens
pub const TOKENS_ENV: &str = "MADE_IN_TOKENS";

/// Loads and parses a configuration file from the given path
///
/// Tokens missing from the file are taken from the `MADE_IN_TOKENS`
/// environment variable (comma separated).
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
/// use made_in::config::load_config;
///
/// let config = load_config(Path::new("made-in.toml")).unwrap();
/// println!("Tokens: {}", config.github.tokens.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    resolve_tokens(&mut config, std::env::var(TOKENS_ENV).ok());

    validate(&config)?;

    Ok(config)
}

/// Fills in tokens from an environment value when the file lists none
fn resolve_tokens(config: &mut Config, env_value: Option<String>) {
    if !config.github.tokens.is_empty() {
        return;
    }

    if let Some(value) = env_value {
        config.github.tokens = value
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is used to tell crawl runs with different settings apart in the logs.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
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
    use crate::config::RankStyle;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[github]
api-url = "https://api.example.com"
user-agent = "TestCrawler"
tokens = ["token-a", "token-b"]

[crawler]
max-page = 10
min-batch = 30
lowest-star = 5
repository-concurrency = 4
locations = ["tokyo", "paris"]

[pool]
cooldown-ms = 2000
usage-ceiling = 20

[output]
data-dir = "./data"
docs-dir = "./docs"
rank-style = "standard"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.github.api_url, "https://api.example.com");
        assert_eq!(config.github.tokens.len(), 2);
        assert_eq!(config.crawler.max_page, 10);
        assert_eq!(config.crawler.lowest_star, 5);
        assert_eq!(config.crawler.repository_concurrency, Some(4));
        assert_eq!(config.crawler.locations, vec!["tokyo", "paris"]);
        assert_eq!(config.pool.cooldown_ms, 2000);
        assert_eq!(config.output.rank_style, RankStyle::Standard);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let file = create_temp_config("[github]\ntokens = [\"only\"]\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.user_agent, "made-in-generator");
        assert_eq!(config.crawler.max_page, 34);
        assert_eq!(config.crawler.min_batch, 30);
        assert_eq!(config.crawler.lowest_star, 3);
        assert_eq!(config.pool.cooldown_ms, 60_000);
        assert_eq!(config.pool.usage_ceiling, 30);
        assert_eq!(config.output.top_limit, 10);
        assert_eq!(config.output.rank_limit, 1000);
        assert_eq!(config.output.rank_style, RankStyle::Dense);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/made-in.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[github]
tokens = ["token-a"]

[crawler]
min-batch = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_resolve_tokens_from_env_value() {
        let file = create_temp_config("[github]\n");
        let content = std::fs::read_to_string(file.path()).unwrap();
        let mut config: Config = toml::from_str(&content).unwrap();

        resolve_tokens(&mut config, Some(" a, b ,,c".to_string()));

        assert_eq!(config.github.tokens, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_resolve_tokens_keeps_file_tokens() {
        let mut config: Config = toml::from_str("[github]\ntokens = [\"file\"]\n").unwrap();

        resolve_tokens(&mut config, Some("env".to_string()));

        assert_eq!(config.github.tokens, vec!["file"]);
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

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
