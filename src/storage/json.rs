//! JSON document storage implementation
//!
//! This module provides a directory-of-JSON-files implementation of the Storage trait.

use crate::state::Endpoint;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{Checkpoint, Repository};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

const DEVELOPERS_FILE: &str = "developers.json";
const REPOSITORIES_FILE: &str = "repositories.json";
const RANKERS_FILE: &str = "rankers.json";

/// Storage backend writing pretty-printed JSON documents into one directory
#[derive(Debug, Clone)]
pub struct JsonStorage {
    dir: PathBuf,
}

impl JsonStorage {
    /// Opens (and creates if needed) a data directory
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory holding the JSON documents
    ///
    /// # Returns
    ///
    /// * `Ok(JsonStorage)` - Directory is ready
    /// * `Err(StorageError)` - Directory could not be created
    pub fn new(dir: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Directory holding the documents
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn checkpoint_file(endpoint: Endpoint) -> String {
        format!("checkpoint-{}.json", endpoint.as_str())
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read_document<T: DeserializeOwned>(&self, file: &str) -> StorageResult<Option<T>> {
        let path = self.path(file);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StorageError::Json {
                path: path.display().to_string(),
                source,
            })
    }

    /// Writes to a temporary sibling first so a crash never leaves a torn document
    fn write_document<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> StorageResult<()> {
        let path = self.path(file);
        let json = serde_json::to_string_pretty(value).map_err(|source| StorageError::Json {
            path: path.display().to_string(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        let io_err = |source: std::io::Error| StorageError::Io {
            path: path.display().to_string(),
            source,
        };
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;

        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl Storage for JsonStorage {
    fn read_developers(&self) -> StorageResult<Vec<String>> {
        Ok(self.read_document(DEVELOPERS_FILE)?.unwrap_or_default())
    }

    fn write_developers(&self, developers: &[String]) -> StorageResult<()> {
        self.write_document(DEVELOPERS_FILE, developers)
    }

    fn read_repositories(&self) -> StorageResult<Vec<Repository>> {
        Ok(self.read_document(REPOSITORIES_FILE)?.unwrap_or_default())
    }

    fn write_repositories(&self, repositories: &[Repository]) -> StorageResult<()> {
        self.write_document(REPOSITORIES_FILE, repositories)
    }

    fn read_rankers(&self) -> StorageResult<Vec<String>> {
        Ok(self.read_document(RANKERS_FILE)?.unwrap_or_default())
    }

    fn write_rankers(&self, rankers: &[String]) -> StorageResult<()> {
        self.write_document(RANKERS_FILE, rankers)
    }

    fn read_checkpoint(&self, endpoint: Endpoint) -> StorageResult<Option<Checkpoint>> {
        self.read_document(&Self::checkpoint_file(endpoint))
    }

    fn write_checkpoint(&self, checkpoint: &Checkpoint) -> StorageResult<()> {
        self.write_document(&Self::checkpoint_file(checkpoint.endpoint), checkpoint)
    }

    fn clear_checkpoint(&self, endpoint: Endpoint) -> StorageResult<()> {
        let path = self.path(&Self::checkpoint_file(endpoint));
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}
