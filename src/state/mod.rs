//! State module for tracking crawl progress
//!
//! This module provides the mutable state the crawler works with.
//!
//! # Components
//!
//! - `Credential`: One API token with its availability and usage count
//! - `SubjectCursor`: The page and sort mode a subject's search continues from
//! - `Endpoint` / `SortMode`: The searches performed and their sort strategies

mod credential;
mod cursor;

// Re-export main types
pub use credential::Credential;
pub use cursor::{Endpoint, SortMode, StartPoint, SubjectCursor};
