//! Crawler coordinator - main crawl orchestration logic
//!
//! This module runs one query driver per subject, concurrently, and owns
//! everything that has to happen around them:
//! - Seeding the accumulator from the persisted dataset
//! - Tracking in-flight subjects so an interrupted crawl reports where it stopped
//! - Flushing collected results on every exit path
//! - Writing or clearing the resume checkpoint

use crate::config::Config;
use crate::crawler::accumulator::Accumulator;
use crate::crawler::client::SearchClient;
use crate::crawler::driver::{DriverSettings, QueryDriver};
use crate::crawler::fetcher::Transport;
use crate::crawler::registry::ActiveSubjects;
use crate::crawler::token_pool::TokenPool;
use crate::state::{Endpoint, StartPoint, SubjectCursor};
use crate::storage::{login_from_search_item, Checkpoint, Repository, Storage};
use crate::{MadeInError, Result};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Summary of one crawl attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// Phase that was crawled
    pub endpoint: Endpoint,

    /// Subjects whose fetch loop finished, in completion order
    pub completed: Vec<String>,

    /// Subjects that were being paged when the crawl stopped, in start order
    pub in_flight: Vec<SubjectCursor>,

    /// Subjects that were never started, in input order
    pub unstarted: Vec<String>,

    /// Size of the persisted collection after the flush
    pub saved: usize,

    /// Whether the crawl stopped because of a cancellation
    pub cancelled: bool,
}

impl CrawlOutcome {
    pub fn is_complete(&self) -> bool {
        self.in_flight.is_empty() && self.unstarted.is_empty()
    }

    /// Where to resume: the earliest-started subject still in flight
    pub fn resume_point(&self) -> Option<&SubjectCursor> {
        self.in_flight.first()
    }

    /// Every subject with remaining work, in-flight first
    pub fn incomplete(&self) -> Vec<String> {
        self.in_flight
            .iter()
            .map(|cursor| cursor.subject.clone())
            .chain(self.unstarted.iter().cloned())
            .collect()
    }

    /// Checkpoint for this outcome, or None when the crawl completed
    pub fn checkpoint(&self) -> Option<Checkpoint> {
        if self.is_complete() {
            return None;
        }

        Some(Checkpoint {
            endpoint: self.endpoint,
            in_flight: self.in_flight.clone(),
            unstarted: self.unstarted.clone(),
        })
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    client: SearchClient,
    pool: Arc<TokenPool>,
    storage: Arc<dyn Storage>,
    accumulator: Accumulator,
    settings: DriverSettings,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// The token pool observes a child of `cancel`: cancelling the parent
    /// stops the crawl, and a fatal error inside the crawl closes only the
    /// pool.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `transport` - Transport used for search requests
    /// * `storage` - Backend holding the dataset and checkpoints
    /// * `cancel` - Cancellation signal (e.g. fired on Ctrl-C)
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl, with the persisted dataset loaded
    /// * `Err(MadeInError)` - The persisted dataset could not be read
    pub async fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn Storage>,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let pool = TokenPool::new(
            config.github.tokens.iter().cloned(),
            &config.pool,
            cancel.child_token(),
        );
        let client = SearchClient::new(transport, Arc::clone(&pool));

        let accumulator = Accumulator::new(Arc::clone(&storage));
        accumulator.seed_from_storage().await?;

        Ok(Self {
            settings: DriverSettings::from(&config.crawler),
            config: Arc::new(config),
            client,
            pool,
            storage,
            accumulator,
        })
    }

    pub fn pool(&self) -> &Arc<TokenPool> {
        &self.pool
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Discovers developers in the given locations
    ///
    /// `start_page` applies to the first location only.
    pub async fn crawl_developers(
        &self,
        locations: &[String],
        start_page: u32,
    ) -> Result<CrawlOutcome> {
        self.crawl_developers_from(locations, StartPoint::page(start_page))
            .await
    }

    /// Discovers developers, starting the first location at an explicit position
    pub async fn crawl_developers_from(
        &self,
        locations: &[String],
        start: StartPoint,
    ) -> Result<CrawlOutcome> {
        self.run(Endpoint::Users, build_cursors(Endpoint::Users, locations, start))
            .await
    }

    /// Discovers repositories of the given developers
    ///
    /// `start_page` applies to the first developer only.
    pub async fn crawl_repositories(
        &self,
        developers: &[String],
        start_page: u32,
    ) -> Result<CrawlOutcome> {
        self.crawl_repositories_from(developers, StartPoint::page(start_page))
            .await
    }

    /// Discovers repositories, starting the first developer at an explicit position
    pub async fn crawl_repositories_from(
        &self,
        developers: &[String],
        start: StartPoint,
    ) -> Result<CrawlOutcome> {
        self.run(
            Endpoint::Repositories,
            build_cursors(Endpoint::Repositories, developers, start),
        )
        .await
    }

    /// Continues a crawl from a checkpoint
    ///
    /// In-flight subjects resume at their recorded cursor; unstarted subjects
    /// start at page 1.
    pub async fn resume(&self, checkpoint: Checkpoint) -> Result<CrawlOutcome> {
        tracing::info!(
            "Resuming {} crawl: {} in flight, {} unstarted",
            checkpoint.endpoint,
            checkpoint.in_flight.len(),
            checkpoint.unstarted.len()
        );

        let endpoint = checkpoint.endpoint;
        let mut cursors = checkpoint.in_flight;
        for subject in checkpoint.unstarted {
            if !cursors.iter().any(|c| c.subject == subject) {
                cursors.push(SubjectCursor::new(endpoint, subject));
            }
        }

        self.run(endpoint, cursors).await
    }

    /// Maximum number of drivers running at once
    async fn concurrency_limit(&self, endpoint: Endpoint) -> usize {
        let pool_size = self.pool.len().await;
        let limit = match endpoint {
            Endpoint::Users => pool_size,
            Endpoint::Repositories => self
                .config
                .crawler
                .repository_concurrency
                .unwrap_or(pool_size),
        };
        limit.max(1)
    }

    /// Runs every cursor to completion, cancellation or the first fatal error
    ///
    /// The accumulator flush and the checkpoint update run on every exit path.
    async fn run(&self, endpoint: Endpoint, cursors: Vec<SubjectCursor>) -> Result<CrawlOutcome> {
        let subjects: Vec<String> = cursors.iter().map(|c| c.subject.clone()).collect();
        let limit = self.concurrency_limit(endpoint).await;
        let registry = ActiveSubjects::new();

        tracing::info!(
            "Crawling {} for {} subjects ({} at a time)",
            endpoint,
            subjects.len(),
            limit
        );
        let start_time = std::time::Instant::now();

        let registry_ref = &registry;
        let drive = futures::stream::iter(cursors.into_iter().map(Ok::<_, MadeInError>))
            .try_for_each_concurrent(limit, move |cursor| {
                self.drive_subject(endpoint, cursor, registry_ref)
            });
        let result = drive.await;

        let flushed = self.flush(endpoint).await;

        let outcome = CrawlOutcome {
            endpoint,
            completed: registry.completed(),
            in_flight: registry.snapshot(),
            unstarted: subjects
                .into_iter()
                .filter(|s| !registry.was_started(s))
                .collect(),
            saved: *flushed.as_ref().unwrap_or(&0),
            cancelled: self.pool.is_closed(),
        };
        let checkpointed = self.update_checkpoint(&outcome);

        if let Err(e) = result {
            if let Err(flush_err) = flushed {
                tracing::error!("Failed to save results: {}", flush_err);
            }
            if let Err(checkpoint_err) = checkpointed {
                tracing::error!("Failed to write checkpoint: {}", checkpoint_err);
            }
            return Err(e);
        }

        flushed?;
        checkpointed?;

        if outcome.cancelled && !outcome.is_complete() {
            tracing::warn!(
                "{} crawl cancelled after {:.1}s, {} subjects remaining",
                endpoint,
                start_time.elapsed().as_secs_f64(),
                outcome.incomplete().len()
            );
        } else {
            tracing::info!(
                "{} crawl finished in {:.1}s: {} subjects, {} saved",
                endpoint,
                start_time.elapsed().as_secs_f64(),
                outcome.completed.len(),
                outcome.saved
            );
        }

        Ok(outcome)
    }

    /// Pages through one subject, feeding the accumulator
    ///
    /// A cancelled subject ends quietly and stays registered as in flight.
    /// A fatal error closes the pool so the other drivers stop too.
    async fn drive_subject(
        &self,
        endpoint: Endpoint,
        cursor: SubjectCursor,
        registry: &ActiveSubjects,
    ) -> Result<()> {
        if self.pool.is_closed() {
            return Ok(());
        }

        let subject = cursor.subject.clone();
        registry.register(cursor.clone());
        tracing::info!("Started {} '{}' at page {}", endpoint, subject, cursor.page);

        let mut driver = QueryDriver::new(self.client.clone(), cursor, self.settings);

        loop {
            // A batch that cannot be collected is as fatal as a failed request
            let fetched = match driver.next_batch().await {
                Ok(Some(batch)) => self.collect(endpoint, batch).await.map(|()| true),
                Ok(None) => Ok(false),
                Err(e) => Err(e),
            };

            match fetched {
                Ok(true) => registry.update(driver.cursor()),
                Ok(false) => {
                    registry.complete(&subject);
                    tracing::info!(
                        "Finished {} '{}' with {} results",
                        endpoint,
                        subject,
                        driver.cursor().results_so_far
                    );
                    return Ok(());
                }
                Err(MadeInError::Cancelled) => {
                    tracing::debug!("Stopped {} '{}' on cancellation", endpoint, subject);
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!("{} '{}' failed: {}", endpoint, subject, e);
                    self.pool.close();
                    return Err(e);
                }
            }
        }
    }

    /// Converts a batch of raw items and hands it to the accumulator
    async fn collect(&self, endpoint: Endpoint, batch: Vec<serde_json::Value>) -> Result<()> {
        match endpoint {
            Endpoint::Users => {
                let logins: Vec<String> = batch
                    .iter()
                    .filter_map(|item| {
                        let login = login_from_search_item(item);
                        if login.is_none() {
                            tracing::warn!("Ignoring user item without a login");
                        }
                        login
                    })
                    .collect();
                self.accumulator.add_developers(logins).await;
            }
            Endpoint::Repositories => {
                let repositories = batch
                    .into_iter()
                    .map(Repository::from_search_item)
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                self.accumulator.add_repositories(repositories).await;
            }
        }
        Ok(())
    }

    async fn flush(&self, endpoint: Endpoint) -> Result<usize> {
        match endpoint {
            Endpoint::Users => self.accumulator.flush_developers().await,
            Endpoint::Repositories => self.accumulator.flush_repositories().await,
        }
    }

    fn update_checkpoint(&self, outcome: &CrawlOutcome) -> Result<()> {
        match outcome.checkpoint() {
            Some(checkpoint) => {
                self.storage.write_checkpoint(&checkpoint)?;
                tracing::info!(
                    "Checkpoint saved, resume with --resume ({} subjects left)",
                    outcome.incomplete().len()
                );
            }
            None => self.storage.clear_checkpoint(outcome.endpoint)?,
        }
        Ok(())
    }
}

/// Cursors for a subject list: duplicates dropped, `start` applied to the first
fn build_cursors(endpoint: Endpoint, subjects: &[String], start: StartPoint) -> Vec<SubjectCursor> {
    let mut cursors: Vec<SubjectCursor> = Vec::with_capacity(subjects.len());

    for subject in subjects {
        if cursors.iter().any(|c| &c.subject == subject) {
            continue;
        }
        let cursor = if cursors.is_empty() {
            SubjectCursor::starting_at(endpoint, subject.clone(), start)
        } else {
            SubjectCursor::new(endpoint, subject.clone())
        };
        cursors.push(cursor);
    }

    cursors
}
