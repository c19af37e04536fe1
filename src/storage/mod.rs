//! Storage module for persisting crawl data
//!
//! This module handles the documents the crawler reads and writes, including:
//! - The developer login list and the repository list
//! - The ranked developer list used by the repository phase
//! - Checkpoints for resuming an interrupted crawl

mod json;
mod traits;

pub use json::JsonStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::{Endpoint, SubjectCursor};
use serde::{Deserialize, Serialize};

/// Language recorded for repositories the API reports without one
pub const DEFAULT_LANGUAGE: &str = "Documents";

/// Owner of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,

    #[serde(default)]
    pub html_url: String,
}

impl Owner {
    /// Creates an owner with the canonical profile URL
    pub fn new(login: impl Into<String>) -> Self {
        let login = login.into();
        let html_url = format!("https://github.com/{}", login);
        Self { login, html_url }
    }
}

/// A repository as persisted in `repositories.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Owner,
    pub language: String,
    pub full_name: String,
    pub desc: Option<String>,
    pub html_url: String,
    pub stars: u64,
    pub homepage: Option<String>,
}

/// Shape of one item returned by `search/repositories`
#[derive(Debug, Deserialize)]
struct SearchRepositoryItem {
    name: Option<String>,
    owner: Owner,
    language: Option<String>,
    full_name: String,
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    stargazers_count: u64,
    homepage: Option<String>,
}

impl Repository {
    /// Converts a raw search result item into the persisted shape
    ///
    /// A missing name becomes the empty string and a missing language becomes
    /// [`DEFAULT_LANGUAGE`].
    pub fn from_search_item(item: serde_json::Value) -> Result<Self, serde_json::Error> {
        let item: SearchRepositoryItem = serde_json::from_value(item)?;

        Ok(Self {
            name: item.name.unwrap_or_default(),
            owner: item.owner,
            language: item
                .language
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            full_name: item.full_name,
            desc: item.description,
            html_url: item.html_url,
            stars: item.stargazers_count,
            homepage: item.homepage,
        })
    }

    /// Dedup key: owner login and repository name
    pub fn key(&self) -> (&str, &str) {
        (&self.owner.login, &self.name)
    }
}

/// Extracts the developer login from a raw `search/users` item
pub fn login_from_search_item(item: &serde_json::Value) -> Option<String> {
    item.get("login")
        .and_then(|login| login.as_str())
        .map(str::to_string)
}

/// Where an incomplete crawl stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Phase the checkpoint belongs to
    pub endpoint: Endpoint,

    /// Subjects that were being paged, in the order they started
    pub in_flight: Vec<SubjectCursor>,

    /// Subjects that were never started, in input order
    pub unstarted: Vec<String>,
}

impl Checkpoint {
    /// First subject to resume, if any
    pub fn resume_point(&self) -> Option<&SubjectCursor> {
        self.in_flight.first()
    }

    /// Every subject that still has work, in-flight first
    pub fn subjects(&self) -> Vec<String> {
        self.in_flight
            .iter()
            .map(|cursor| cursor.subject.clone())
            .chain(self.unstarted.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repository_from_search_item() {
        let item = json!({
            "id": 1,
            "name": "tool",
            "full_name": "alice/tool",
            "owner": {"login": "alice", "html_url": "https://github.com/alice", "id": 7},
            "language": "Rust",
            "description": "Does things",
            "html_url": "https://github.com/alice/tool",
            "stargazers_count": 12,
            "homepage": "https://tool.dev"
        });

        let repo = Repository::from_search_item(item).unwrap();
        assert_eq!(repo.name, "tool");
        assert_eq!(repo.owner, Owner::new("alice"));
        assert_eq!(repo.language, "Rust");
        assert_eq!(repo.desc.as_deref(), Some("Does things"));
        assert_eq!(repo.stars, 12);
        assert_eq!(repo.homepage.as_deref(), Some("https://tool.dev"));
        assert_eq!(repo.key(), ("alice", "tool"));
    }

    #[test]
    fn test_repository_defaults() {
        let item = json!({
            "name": null,
            "full_name": "alice/notes",
            "owner": {"login": "alice", "html_url": "https://github.com/alice"},
            "language": null,
            "description": null,
            "html_url": "https://github.com/alice/notes",
            "stargazers_count": 3,
            "homepage": null
        });

        let repo = Repository::from_search_item(item).unwrap();
        assert_eq!(repo.name, "");
        assert_eq!(repo.language, DEFAULT_LANGUAGE);
        assert!(repo.desc.is_none());
        assert!(repo.homepage.is_none());
    }

    #[test]
    fn test_repository_missing_owner_is_error() {
        let item = json!({"name": "x", "full_name": "x", "html_url": "u"});
        assert!(Repository::from_search_item(item).is_err());
    }

    #[test]
    fn test_login_from_search_item() {
        assert_eq!(
            login_from_search_item(&json!({"login": "bob", "id": 2})),
            Some("bob".to_string())
        );
        assert_eq!(login_from_search_item(&json!({"id": 2})), None);
    }

    #[test]
    fn test_checkpoint_subjects_order() {
        let mut paris = SubjectCursor::new(Endpoint::Users, "paris");
        paris.page = 4;
        let checkpoint = Checkpoint {
            endpoint: Endpoint::Users,
            in_flight: vec![paris.clone(), SubjectCursor::new(Endpoint::Users, "lyon")],
            unstarted: vec!["berlin".to_string()],
        };

        assert_eq!(checkpoint.resume_point(), Some(&paris));
        assert_eq!(checkpoint.subjects(), vec!["paris", "lyon", "berlin"]);
    }
}
