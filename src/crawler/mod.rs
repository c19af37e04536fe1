//! Crawler module for rate-limited search crawling
//!
//! This module contains the core crawling logic, including:
//! - The token pool and its backoff delays
//! - HTTP transport and the rate-limit aware search client
//! - Per-subject pagination
//! - Result accumulation and deduplication
//! - Overall crawl coordination

mod accumulator;
mod backoff;
mod client;
mod coordinator;
mod driver;
mod fetcher;
mod registry;
mod token_pool;

#[cfg(test)]
pub(crate) mod testing;

pub use accumulator::{normalize_developers, normalize_repositories, Accumulator};
pub use backoff::BackoffController;
pub use client::SearchClient;
pub use coordinator::{Coordinator, CrawlOutcome};
pub use driver::{build_query, DriverSettings, QueryDriver};
pub use fetcher::{build_http_client, GithubTransport, QueryOptions, Transport, TransportError};
pub use registry::ActiveSubjects;
pub use token_pool::TokenPool;

use crate::config::Config;
use crate::storage::Storage;
use crate::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builds a coordinator that talks to the configured API
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `storage` - Backend holding the dataset
/// * `cancel` - Cancellation signal for the crawl
///
/// # Returns
///
/// * `Ok(Coordinator)` - Ready to crawl
/// * `Err(MadeInError)` - HTTP client or persisted dataset failed to load
pub async fn connect(
    config: Config,
    storage: Arc<dyn Storage>,
    cancel: &CancellationToken,
) -> Result<Coordinator> {
    let transport = GithubTransport::from_config(&config.github)?;
    Coordinator::new(config, Arc::new(transport), storage, cancel).await
}
