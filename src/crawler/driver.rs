//! Paginated query driver
//!
//! A driver pages through one subject's search results. Each call to
//! `next_batch` requests the cursor's current page with the cursor's current
//! sort mode, then advances the cursor. The driver is finished once a page
//! comes back smaller than the minimum batch size or every sort mode has been
//! paged up to the page ceiling.

use crate::config::CrawlerConfig;
use crate::crawler::client::SearchClient;
use crate::crawler::fetcher::QueryOptions;
use crate::state::{Endpoint, SubjectCursor};
use crate::{MadeInError, Result};
use futures::Stream;

/// Paging limits applied to every subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    /// Last page requested per sort mode
    pub max_page: u32,

    /// A batch smaller than this ends the subject
    pub min_batch: usize,

    /// Minimum stars for repository searches
    pub lowest_star: u32,
}

impl From<&CrawlerConfig> for DriverSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_page: config.max_page,
            min_batch: config.min_batch,
            lowest_star: config.lowest_star,
        }
    }
}

/// Search query for a subject on an endpoint
pub fn build_query(endpoint: Endpoint, subject: &str, lowest_star: u32) -> String {
    match endpoint {
        Endpoint::Users => format!("location:{}", subject),
        Endpoint::Repositories => {
            format!("user:{} fork:false stars:>={}", subject, lowest_star)
        }
    }
}

/// Fetch loop for a single subject
pub struct QueryDriver {
    client: SearchClient,
    cursor: SubjectCursor,
    settings: DriverSettings,
    query: String,
    done: bool,
}

impl QueryDriver {
    pub fn new(client: SearchClient, cursor: SubjectCursor, settings: DriverSettings) -> Self {
        let query = build_query(cursor.endpoint, &cursor.subject, settings.lowest_star);
        Self {
            client,
            cursor,
            settings,
            query,
            done: false,
        }
    }

    /// Position the next request will use
    pub fn cursor(&self) -> &SubjectCursor {
        &self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetches the next batch of raw items
    ///
    /// # Returns
    ///
    /// * `Ok(Some(batch))` - Items of the page just fetched; the cursor has advanced
    /// * `Ok(None)` - The subject is finished (or was skipped by a validation error)
    /// * `Err(_)` - Cancellation or a fatal error; the cursor still points at
    ///   the page that was not collected
    pub async fn next_batch(&mut self) -> Result<Option<Vec<serde_json::Value>>> {
        if self.done {
            return Ok(None);
        }

        let Some(sort) = self.cursor.sort_mode() else {
            self.done = true;
            return Ok(None);
        };

        let endpoint = self.cursor.endpoint;
        let options = QueryOptions::new(self.query.clone())
            .with_page(self.cursor.page)
            .with_sort(sort.as_param());

        let batch = match self.client.get(endpoint, &options).await {
            Ok(batch) => batch,
            Err(MadeInError::ValidationRejected(message)) if endpoint == Endpoint::Repositories => {
                tracing::warn!("Skipping {}: {}", self.cursor.subject, message);
                self.done = true;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        tracing::debug!(
            "{} '{}' page {} ({:?}): {} items",
            endpoint,
            self.cursor.subject,
            self.cursor.page,
            sort,
            batch.len()
        );

        let more = self.cursor.advance(batch.len(), self.settings.max_page);
        if !more || batch.len() < self.settings.min_batch {
            self.done = true;
        }

        Ok(Some(batch))
    }

    /// Turns the driver into a stream of batches
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<serde_json::Value>>> {
        futures::stream::try_unfold(self, |mut driver| async move {
            Ok(driver.next_batch().await?.map(|batch| (batch, driver)))
        })
    }
}
