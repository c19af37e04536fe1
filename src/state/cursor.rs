/// Crawl position tracking for search subjects
///
/// A subject is one location (developer search) or one developer login
/// (repository search). Its cursor records which page and sort mode comes next,
/// so a crawl can continue exactly where an interrupted one stopped.
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two search endpoints crawled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// `search/users`, subjects are locations
    Users,

    /// `search/repositories`, subjects are developer logins
    Repositories,
}

impl Endpoint {
    /// API path relative to the base URL
    pub fn path(&self) -> &'static str {
        match self {
            Self::Users => "search/users",
            Self::Repositories => "search/repositories",
        }
    }

    /// Sort strategies cycled through, in order, once a sort mode runs out of pages
    pub fn sort_modes(&self) -> &'static [SortMode] {
        match self {
            Self::Users => &[
                SortMode::BestMatch,
                SortMode::Followers,
                SortMode::Repositories,
                SortMode::Joined,
            ],
            Self::Repositories => &[SortMode::Stars],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Repositories => "repositories",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort strategy sent with a search query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortMode {
    /// No sort parameter, the API's best-match order
    BestMatch,
    Followers,
    Repositories,
    Joined,
    Stars,
}

impl SortMode {
    /// Value of the `sort` query parameter, if any
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            Self::BestMatch => None,
            Self::Followers => Some("followers"),
            Self::Repositories => Some("repositories"),
            Self::Joined => Some("joined"),
            Self::Stars => Some("stars"),
        }
    }
}

/// Where a subject's crawl begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartPoint {
    pub page: u32,
    pub sort_index: usize,
}

impl StartPoint {
    /// Starts at `page` of the first sort mode
    pub fn page(page: u32) -> Self {
        Self {
            page: page.max(1),
            sort_index: 0,
        }
    }
}

impl Default for StartPoint {
    fn default() -> Self {
        Self::page(1)
    }
}

/// Mutable crawl position of one subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCursor {
    /// Location or developer login
    pub subject: String,

    /// Endpoint the subject is searched on
    pub endpoint: Endpoint,

    /// Next page to request (>= 1)
    pub page: u32,

    /// Index into the endpoint's sort modes
    pub sort_index: usize,

    /// Items collected for this subject so far
    pub results_so_far: usize,
}

impl SubjectCursor {
    /// Creates a cursor at page 1 of the first sort mode
    pub fn new(endpoint: Endpoint, subject: impl Into<String>) -> Self {
        Self::starting_at(endpoint, subject, StartPoint::default())
    }

    /// Creates a cursor at an explicit start point
    pub fn starting_at(endpoint: Endpoint, subject: impl Into<String>, start: StartPoint) -> Self {
        Self {
            subject: subject.into(),
            endpoint,
            page: start.page.max(1),
            sort_index: start.sort_index,
            results_so_far: 0,
        }
    }

    /// The sort mode for the next request, or None once every mode is used up
    pub fn sort_mode(&self) -> Option<SortMode> {
        self.endpoint.sort_modes().get(self.sort_index).copied()
    }

    /// Returns true once every sort mode has been paged through
    pub fn is_exhausted(&self) -> bool {
        self.sort_mode().is_none()
    }

    /// Start point equivalent to this cursor's position
    pub fn start_point(&self) -> StartPoint {
        StartPoint {
            page: self.page,
            sort_index: self.sort_index,
        }
    }

    /// Records a processed batch and moves to the next page
    ///
    /// Past `max_page` the cursor wraps to page 1 of the next sort mode.
    ///
    /// # Returns
    ///
    /// * `true` - There is a next page to request
    /// * `false` - All sort modes are used up
    pub fn advance(&mut self, batch_len: usize, max_page: u32) -> bool {
        self.results_so_far += batch_len;
        self.page += 1;

        if self.page > max_page {
            self.page = 1;
            self.sort_index += 1;
        }

        !self.is_exhausted()
    }
}
