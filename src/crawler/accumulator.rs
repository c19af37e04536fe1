//! Result accumulator
//!
//! Collects developers and repositories from every driver and writes the
//! normalized collections through the storage backend.
//!
//! - Developers are sorted and deduplicated.
//! - Repositories are deduplicated on (owner login, name) keeping the most
//!   recently added copy, then sorted by owner login and name.

use crate::storage::{Repository, Storage};
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory collections in front of the storage backend
pub struct Accumulator {
    storage: Arc<dyn Storage>,
    developers: Mutex<Vec<String>>,
    repositories: Mutex<Vec<Repository>>,
}

impl Accumulator {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            developers: Mutex::new(Vec::new()),
            repositories: Mutex::new(Vec::new()),
        }
    }

    /// Loads the persisted collections so new results extend them
    pub async fn seed_from_storage(&self) -> Result<()> {
        let developers = self.storage.read_developers()?;
        let repositories = self.storage.read_repositories()?;
        tracing::info!(
            "Loaded {} developers and {} repositories",
            developers.len(),
            repositories.len()
        );

        self.seed_developers(developers).await;
        self.seed_repositories(repositories).await;
        Ok(())
    }

    /// Places existing developers ahead of anything collected
    pub async fn seed_developers(&self, seed: Vec<String>) {
        let mut developers = self.developers.lock().await;
        let collected = std::mem::replace(&mut *developers, seed);
        developers.extend(collected);
    }

    /// Places existing repositories ahead of anything collected, so fresh copies win
    pub async fn seed_repositories(&self, seed: Vec<Repository>) {
        let mut repositories = self.repositories.lock().await;
        let collected = std::mem::replace(&mut *repositories, seed);
        repositories.extend(collected);
    }

    pub async fn add_developers(&self, names: impl IntoIterator<Item = String>) {
        self.developers.lock().await.extend(names);
    }

    pub async fn add_repositories(&self, records: impl IntoIterator<Item = Repository>) {
        self.repositories.lock().await.extend(records);
    }

    pub async fn developer_count(&self) -> usize {
        self.developers.lock().await.len()
    }

    pub async fn repository_count(&self) -> usize {
        self.repositories.lock().await.len()
    }

    pub async fn developers(&self) -> Vec<String> {
        self.developers.lock().await.clone()
    }

    pub async fn repositories(&self) -> Vec<Repository> {
        self.repositories.lock().await.clone()
    }

    /// Normalizes and writes the developer list
    ///
    /// # Returns
    ///
    /// Number of developers written
    pub async fn flush_developers(&self) -> Result<usize> {
        let mut developers = self.developers.lock().await;
        normalize_developers(&mut developers);
        self.storage.write_developers(&developers)?;

        tracing::info!("Saved {} developers", developers.len());
        Ok(developers.len())
    }

    /// Normalizes and writes the repository list
    ///
    /// # Returns
    ///
    /// Number of repositories written
    pub async fn flush_repositories(&self) -> Result<usize> {
        let mut repositories = self.repositories.lock().await;
        normalize_repositories(&mut repositories);
        self.storage.write_repositories(&repositories)?;

        tracing::info!("Saved {} repositories", repositories.len());
        Ok(repositories.len())
    }
}

/// Sorts ascending and removes duplicates
pub fn normalize_developers(developers: &mut Vec<String>) {
    developers.sort();
    developers.dedup();
}

/// Keeps the last copy of each (owner login, name) and sorts by that key
pub fn normalize_repositories(repositories: &mut Vec<Repository>) {
    let mut seen = HashSet::new();
    let mut unique: Vec<Repository> = repositories
        .drain(..)
        .rev()
        .filter(|repo| seen.insert((repo.owner.login.clone(), repo.name.clone())))
        .collect();

    unique.sort_by(|a, b| a.key().cmp(&b.key()));
    *repositories = unique;
}
