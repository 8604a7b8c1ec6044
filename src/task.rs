//! Task data structures as exchanged with the backend.
//!
//! `Task` is what list and search endpoints return (with author and assignee
//! denormalised into embedded users); `NewTask` is the partial payload the
//! create endpoint accepts.

use serde::{Deserialize, Serialize};

use crate::fields::{lenient, Priority, Status};
use crate::user::User;

/// A work item belonging to exactly one project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `None` when absent or not one of the four known labels.
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "lenient")]
    pub priority: Option<Priority>,
    /// Comma-joined tag string, e.g. `"backend,api"`.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
    pub project_id: u64,
    #[serde(default)]
    pub author_user_id: Option<u64>,
    #[serde(default)]
    pub assigned_user_id: Option<u64>,
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub comments: Option<Vec<Comment>>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

impl Task {
    /// Number of comments; derived, never stored.
    pub fn comment_count(&self) -> usize {
        self.comments.as_ref().map_or(0, Vec::len)
    }
}

/// Text comment on a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u64,
    pub text: String,
    pub task_id: u64,
    pub user_id: u64,
}

/// File attached to a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: u64,
    #[serde(rename = "fileURL")]
    pub file_url: String,
    #[serde(default)]
    pub file_name: Option<String>,
    pub task_id: u64,
    pub uploaded_by_id: u64,
}

/// Payload for the create-task endpoint. Unset fields are left out of the
/// JSON body so the backend applies its own defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// Complete ISO-8601 timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    pub project_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<u64>,
}
