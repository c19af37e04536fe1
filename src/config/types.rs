use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Made-In
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub github: GithubConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Search API access configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    /// Base URL of the API (without trailing slash)
    #[serde(rename = "api-url", default = "default_api_url")]
    pub api_url: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// API tokens, one credential each
    #[serde(default)]
    pub tokens: Vec<String>,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Last page requested per sort mode before moving on
    #[serde(rename = "max-page", default = "default_max_page")]
    pub max_page: u32,

    /// A batch smaller than this means the subject is exhausted
    #[serde(rename = "min-batch", default = "default_min_batch")]
    pub min_batch: usize,

    /// Repositories below this star count are not searched for
    #[serde(rename = "lowest-star", default = "default_lowest_star")]
    pub lowest_star: u32,

    /// Concurrent developers in the repository phase (defaults to the token count)
    #[serde(rename = "repository-concurrency", default)]
    pub repository_concurrency: Option<usize>,

    /// Default locations for the developer phase
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Token pool and backoff configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Full cooldown window in milliseconds
    #[serde(rename = "cooldown-ms", default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Requests a token may serve before it is rested
    #[serde(rename = "usage-ceiling", default = "default_usage_ceiling")]
    pub usage_ceiling: u32,
}

impl PoolConfig {
    /// The full cooldown window
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Rank numbering used by the ranking tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankStyle {
    /// Ties share a rank and the next score takes the next number: 1, 1, 2
    #[default]
    Dense,

    /// Ties share a rank and the next score skips past them: 1, 1, 3
    Standard,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding the JSON documents
    #[serde(rename = "data-dir", default = "default_data_dir")]
    pub data_dir: String,

    /// Directory receiving the ranking and language documents
    #[serde(rename = "docs-dir", default = "default_docs_dir")]
    pub docs_dir: String,

    /// Path of the generated summary document
    #[serde(rename = "readme-path", default = "default_readme_path")]
    pub readme_path: String,

    /// Optional text placed above the generated summary
    #[serde(rename = "template-path", default)]
    pub template_path: Option<String>,

    /// Project homepage used for links between documents
    #[serde(default = "default_homepage")]
    pub homepage: String,

    /// Rows in the summary ranking table
    #[serde(rename = "top-limit", default = "default_top_limit")]
    pub top_limit: usize,

    /// Rows in the full ranking document
    #[serde(rename = "rank-limit", default = "default_rank_limit")]
    pub rank_limit: usize,

    #[serde(rename = "rank-style", default)]
    pub rank_style: RankStyle,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
    "made-in-generator".to_string()
}

fn default_max_page() -> u32 {
    34
}

fn default_min_batch() -> usize {
    30
}

fn default_lowest_star() -> u32 {
    3
}

fn default_cooldown_ms() -> u64 {
    60_000
}

fn default_usage_ceiling() -> u32 {
    30
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_docs_dir() -> String {
    "docs".to_string()
}

fn default_readme_path() -> String {
    "README.md".to_string()
}

fn default_homepage() -> String {
    "https://github.com/suguru03/made-in".to_string()
}

fn default_top_limit() -> usize {
    10
}

fn default_rank_limit() -> usize {
    1000
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_page: default_max_page(),
            min_batch: default_min_batch(),
            lowest_star: default_lowest_star(),
            repository_concurrency: None,
            locations: Vec::new(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            usage_ceiling: default_usage_ceiling(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            docs_dir: default_docs_dir(),
            readme_path: default_readme_path(),
            template_path: None,
            homepage: default_homepage(),
            top_limit: default_top_limit(),
            rank_limit: default_rank_limit(),
            rank_style: RankStyle::default(),
        }
    }
}
