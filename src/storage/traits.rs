//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::Endpoint;
use crate::storage::{Checkpoint, Repository};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed JSON document {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Three named documents hold the dataset: the developer list, the repository
/// list and the ranked developer list. Each endpoint also has its own
/// checkpoint recording where an incomplete crawl of that phase stopped, so a
/// crawl of one phase never disturbs the other's. Reading a document that was
/// never written yields an empty collection.
pub trait Storage: Send + Sync {
    // ===== Dataset =====

    /// Reads the persisted developer logins
    fn read_developers(&self) -> StorageResult<Vec<String>>;

    /// Replaces the persisted developer logins
    fn write_developers(&self, developers: &[String]) -> StorageResult<()>;

    /// Reads the persisted repositories
    fn read_repositories(&self) -> StorageResult<Vec<Repository>>;

    /// Replaces the persisted repositories
    fn write_repositories(&self, repositories: &[Repository]) -> StorageResult<()>;

    /// Reads the ranked developer logins (best first)
    fn read_rankers(&self) -> StorageResult<Vec<String>>;

    /// Replaces the ranked developer logins
    fn write_rankers(&self, rankers: &[String]) -> StorageResult<()>;

    // ===== Resumption =====

    /// Reads the checkpoint left by an incomplete crawl of `endpoint`, if any
    fn read_checkpoint(&self, endpoint: Endpoint) -> StorageResult<Option<Checkpoint>>;

    /// Records where an incomplete crawl stopped, under the checkpoint's own endpoint
    fn write_checkpoint(&self, checkpoint: &Checkpoint) -> StorageResult<()>;

    /// Removes the checkpoint of `endpoint` after a crawl of it completes
    fn clear_checkpoint(&self, endpoint: Endpoint) -> StorageResult<()>;
}
