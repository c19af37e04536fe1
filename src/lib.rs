//! Made-In: a location-based developer and repository crawler
//!
//! This crate searches the GitHub search API for developers living in a set of
//! locations, then searches each developer's notable repositories. Queries are
//! spread across a pool of API tokens that are rotated out while rate limited,
//! and every crawl can be interrupted and resumed without losing results.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Made-In operations
#[derive(Debug, Error)]
pub enum MadeInError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A token hit its rate limit. Handled inside the search client and never
    /// returned from a crawl.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The search API rejected the query (e.g. a restricted username)
    #[error("Query rejected by validation: {0}")]
    ValidationRejected(String),

    /// The crawl was cancelled by an interrupt or by a fault elsewhere
    #[error("Crawl cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to decode search item: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MadeInError {
    /// Returns true if this error is a cancellation outcome rather than a fault
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<crawler::TransportError> for MadeInError {
    fn from(err: crawler::TransportError) -> Self {
        use crawler::TransportError;

        match err {
            TransportError::RateLimited(message) => Self::RateLimited(message),
            TransportError::ValidationFailed(message) => Self::ValidationRejected(message),
            TransportError::Http(e) => Self::Reqwest(e),
            TransportError::Other(message) => Self::Transport(message),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("No API tokens configured (set github.tokens or {0})")]
    MissingTokens(&'static str),
}

/// Result type alias for Made-In operations
pub type Result<T> = std::result::Result<T, MadeInError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlOutcome};
pub use state::{Credential, SortMode, SubjectCursor};
pub use storage::{Owner, Repository};
