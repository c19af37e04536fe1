//! Registry of subjects being crawled
//!
//! Subjects are kept in the order their drivers started, so after a
//! cancellation the first entry is the natural resume point.

use crate::state::SubjectCursor;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Entries {
    active: Vec<SubjectCursor>,
    completed: Vec<String>,
}

/// In-flight and completed subjects of one crawl
#[derive(Debug, Default)]
pub struct ActiveSubjects {
    entries: Mutex<Entries>,
}

impl ActiveSubjects {
    pub fn new() -> Self {
        Self::default()
    }

    // The lock is never held across an await, so a poisoned guard still holds consistent data
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks a subject as started
    pub fn register(&self, cursor: SubjectCursor) {
        let mut entries = self.lock();
        entries.active.retain(|c| c.subject != cursor.subject);
        entries.active.push(cursor);
    }

    /// Records the latest collected position of a subject
    pub fn update(&self, cursor: &SubjectCursor) {
        let mut entries = self.lock();
        if let Some(entry) = entries
            .active
            .iter_mut()
            .find(|c| c.subject == cursor.subject)
        {
            *entry = cursor.clone();
        }
    }

    /// Moves a subject from the active set to the completed list
    ///
    /// Returns false if the subject was not active.
    pub fn complete(&self, subject: &str) -> bool {
        let mut entries = self.lock();
        let before = entries.active.len();
        entries.active.retain(|c| c.subject != subject);
        let removed = entries.active.len() != before;
        if removed {
            entries.completed.push(subject.to_string());
        }
        removed
    }

    /// Earliest-started subject still in flight
    pub fn first(&self) -> Option<SubjectCursor> {
        self.lock().active.first().cloned()
    }

    /// In-flight subjects in start order
    pub fn snapshot(&self) -> Vec<SubjectCursor> {
        self.lock().active.clone()
    }

    /// Completed subjects in completion order
    pub fn completed(&self) -> Vec<String> {
        self.lock().completed.clone()
    }

    /// Returns true if the subject was ever registered
    pub fn was_started(&self, subject: &str) -> bool {
        let entries = self.lock();
        entries.active.iter().any(|c| c.subject == subject)
            || entries.completed.iter().any(|s| s == subject)
    }

    pub fn len(&self) -> usize {
        self.lock().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
