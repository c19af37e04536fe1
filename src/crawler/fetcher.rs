//! HTTP transport for the search API
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent
//! - Token authentication via the `Authorization` header
//! - Decoding search responses into raw items
//! - Classifying API errors (rate limit, validation, other)

use crate::config::GithubConfig;
use crate::state::Endpoint;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Message prefix the API uses for exhausted rate limits
const RATE_LIMIT_PREFIX: &str = "API rate limit";

/// Message the API uses for rejected queries (e.g. unknown or restricted users)
const VALIDATION_FAILED: &str = "Validation Failed";

/// Errors reported by a transport call
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    ValidationFailed(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Classifies an API error message
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();

        if message.starts_with(RATE_LIMIT_PREFIX) {
            Self::RateLimited(message)
        } else if message.contains(VALIDATION_FAILED) {
            Self::ValidationFailed(message)
        } else {
            Self::Other(message)
        }
    }

    /// Classifies an error response, also treating secondary rate limits as rate limits
    fn from_response(status: StatusCode, message: String) -> Self {
        match Self::classify(message) {
            Self::Other(message)
                if status == StatusCode::TOO_MANY_REQUESTS
                    || (status == StatusCode::FORBIDDEN
                        && message.to_ascii_lowercase().contains("rate limit")) =>
            {
                Self::RateLimited(message)
            }
            err => err,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Options for one search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Search query, e.g. `location:tokyo`
    pub q: String,

    /// Page number, 1-based (default 1)
    pub page: u32,

    /// Sort parameter; None means best match (default None)
    pub sort: Option<&'static str>,

    /// Sort order (default `desc`)
    pub order: &'static str,
}

impl QueryOptions {
    /// Creates options for page 1, best match, descending
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            page: 1,
            sort: None,
            order: "desc",
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_sort(mut self, sort: Option<&'static str>) -> Self {
        self.sort = sort;
        self
    }

    /// Query-string pairs in request order
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("q", self.q.clone()), ("page", self.page.to_string())];
        if let Some(sort) = self.sort {
            query.push(("sort", sort.to_string()));
        }
        query.push(("order", self.order.to_string()));
        query
    }
}

/// One page request against a search endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches one page of raw result items
    async fn fetch_page(
        &self,
        endpoint: Endpoint,
        token: &str,
        options: &QueryOptions,
    ) -> Result<Vec<serde_json::Value>, TransportError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The API configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &GithubConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Transport backed by the real search API
#[derive(Debug, Clone)]
pub struct GithubTransport {
    client: Client,
    api_url: String,
}

impl GithubTransport {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Builds the client from configuration
    pub fn from_config(config: &GithubConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?, config.api_url.clone()))
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.api_url, endpoint.path())
    }
}

#[async_trait]
impl Transport for GithubTransport {
    async fn fetch_page(
        &self,
        endpoint: Endpoint,
        token: &str,
        options: &QueryOptions,
    ) -> Result<Vec<serde_json::Value>, TransportError> {
        let mut auth = HeaderValue::from_str(&format!("token {}", token))
            .map_err(|_| TransportError::Other("Token is not a valid header value".to_string()))?;
        auth.set_sensitive(true);

        let response = self
            .client
            .get(self.endpoint_url(endpoint))
            .header(AUTHORIZATION, auth)
            .header(ACCEPT, "application/vnd.github+json")
            .query(&options.to_query())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let search: SearchResponse = serde_json::from_str(&body).map_err(|e| {
                TransportError::Other(format!("Malformed {} response: {}", endpoint, e))
            })?;
            tracing::debug!(
                "{} page {} returned {} items",
                endpoint,
                options.page,
                search.items.len()
            );
            return Ok(search.items);
        }

        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.message)
            .unwrap_or_else(|_| format!("HTTP {}", status));

        Err(TransportError::from_response(status, message))
    }
}
