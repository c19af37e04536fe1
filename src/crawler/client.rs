//! Search client: one logical request with token rotation
//!
//! A `get` acquires a token, issues the request and, when the token reports a
//! rate limit, disables it and retries the same request with the next token.
//! Rate limits never escape this module.

use crate::crawler::fetcher::{QueryOptions, Transport, TransportError};
use crate::crawler::token_pool::TokenPool;
use crate::state::Endpoint;
use crate::{MadeInError, Result};
use std::sync::Arc;

/// Issues search requests through the token pool
#[derive(Clone)]
pub struct SearchClient {
    transport: Arc<dyn Transport>,
    pool: Arc<TokenPool>,
}

impl SearchClient {
    pub fn new(transport: Arc<dyn Transport>, pool: Arc<TokenPool>) -> Self {
        Self { transport, pool }
    }

    pub fn pool(&self) -> &Arc<TokenPool> {
        &self.pool
    }

    /// Fetches one page, retrying on rate limits
    ///
    /// # Returns
    ///
    /// * `Ok(items)` - Raw items of the requested page
    /// * `Err(MadeInError::Cancelled)` - The pool closed; a response that
    ///   arrived after closing is discarded
    /// * `Err(MadeInError::ValidationRejected)` - The API rejected the query
    /// * `Err(_)` - Any other transport failure
    pub async fn get(
        &self,
        endpoint: Endpoint,
        options: &QueryOptions,
    ) -> Result<Vec<serde_json::Value>> {
        loop {
            let token = self.pool.acquire().await?;
            let result = self.transport.fetch_page(endpoint, &token, options).await;

            if self.pool.is_closed() {
                return Err(MadeInError::Cancelled);
            }

            match result {
                Ok(items) => return Ok(items),
                Err(TransportError::RateLimited(message)) => {
                    tracing::warn!(
                        "Rate limited on {} '{}' page {}: {}",
                        endpoint,
                        options.q,
                        options.page,
                        message
                    );
                    self.pool.disable(&token).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
