//! Task model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{GroupId, TaskId, UserRef};

/// Board column / lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[serde(alias = "todo", alias = "not-started", alias = "notStarted")]
    NotStarted,
    #[serde(alias = "inProgress", alias = "in-progress")]
    InProgress,
    #[serde(alias = "done", alias = "completed")]
    Completed,
}

impl TaskStatus {
    /// Columns in board order.
    pub const ALL: [Self; 3] = [Self::NotStarted, Self::InProgress, Self::Completed];

    /// Value sent to and received from the backend.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    /// Identifier of the board column holding tasks in this state.
    #[must_use]
    pub const fn column_id(self) -> &'static str {
        match self {
            Self::NotStarted => "todo",
            Self::InProgress => "inProgress",
            Self::Completed => "done",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown task status: {0}")]
pub struct UnknownTaskStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownTaskStatus;

    /// Accepts wire values, board column ids, and kebab-case names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-', ' '], "");
        match normalized.as_str() {
            "notstarted" | "todo" => Ok(Self::NotStarted),
            "inprogress" => Ok(Self::InProgress),
            "completed" | "done" => Ok(Self::Completed),
            _ => Err(UnknownTaskStatus(s.to_string())),
        }
    }
}

/// A task on a group's board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub assignee: Option<UserRef>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Back-reference to the authoritative server record, when the backend
    /// exposes its storage id separately from the public id.
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}

impl Task {
    /// Whether the task is past its due date and not completed.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Request body for creating a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub group_id: GroupId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    #[must_use]
    pub fn new(group_id: GroupId, title: impl Into<String>) -> Self {
        Self {
            group_id,
            title: title.into(),
            description: String::new(),
            status: TaskStatus::NotStarted,
            assignee_id: None,
            due_date: None,
        }
    }
}
