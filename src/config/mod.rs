//! Configuration module for Made-In
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use made_in::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("made-in.toml")).unwrap();
//! println!("Crawling {} pages per sort mode", config.crawler.max_page);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, GithubConfig, OutputConfig, PoolConfig, RankStyle};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, TOKENS_ENV};
