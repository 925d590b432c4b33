use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type TaskId = i64;

/// Lifecycle of a task. Serialized as the server's own labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "в ожидании")]
    Waiting,
    #[serde(rename = "в работе")]
    InProgress,
    #[serde(rename = "завершено")]
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [Self::Waiting, Self::InProgress, Self::Completed];

    /// Label the server stores and returns.
    pub fn wire_label(self) -> &'static str {
        match self {
            Self::Waiting => "в ожидании",
            Self::InProgress => "в работе",
            Self::Completed => "завершено",
        }
    }

    pub fn alias(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

#[derive(Debug, Error)]
#[error("unknown task status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.wire_label() == needle || status.alias() == needle)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("priority must be between 0 and 10, got {value}")]
pub struct PriorityError {
    pub value: i64,
}

/// Task priority in `0..=10`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 10;

    pub fn new(value: i64) -> Result<Self, PriorityError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(PriorityError { value })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn level(self) -> PriorityLevel {
        match self.0 {
            8.. => PriorityLevel::Critical,
            5..=7 => PriorityLevel::High,
            3..=4 => PriorityLevel::Medium,
            _ => PriorityLevel::Low,
        }
    }
}

impl TryFrom<i64> for Priority {
    type Error = PriorityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// A task as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    pub priority: Priority,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("task title is required")]
    TitleRequired,
}

/// Mutable fields of a task, submitted on create and as a full replacement
/// on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::TitleRequired);
        }
        Ok(())
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
        }
    }
}
