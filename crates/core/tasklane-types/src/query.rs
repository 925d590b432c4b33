use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-side ordering for `GET /tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Title,
    Status,
    CreatedAt,
    Priority,
}

impl SortBy {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Status => "status",
            Self::CreatedAt => "created_at",
            Self::Priority => "priority",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "title" => Ok(Self::Title),
            "status" => Ok(Self::Status),
            "created_at" => Ok(Self::CreatedAt),
            "priority" => Ok(Self::Priority),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

/// Parameters selecting which task collection to fetch.
///
/// Also the cache key for the synchronization layer. A `top` of zero is
/// stored as unset, so two queries that differ only in `top = 0` versus no
/// limit compare and hash equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TaskQuery {
    sort_by: Option<SortBy>,
    search: String,
    top: Option<u32>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_by(mut self, sort_by: Option<SortBy>) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn top(mut self, top: Option<u32>) -> Self {
        self.top = top.filter(|n| *n > 0);
        self
    }

    pub fn sort(&self) -> Option<SortBy> {
        self.sort_by
    }

    pub fn search_text(&self) -> &str {
        &self.search
    }

    pub fn limit(&self) -> Option<u32> {
        self.top
    }

    /// Request parameters, omitting every unset filter.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(sort_by) = self.sort_by {
            params.push(("sort_by", sort_by.as_param().to_string()));
        }
        if !self.search.is_empty() {
            params.push(("search", self.search.clone()));
        }
        if let Some(top) = self.top {
            params.push(("top", top.to_string()));
        }
        params
    }
}
