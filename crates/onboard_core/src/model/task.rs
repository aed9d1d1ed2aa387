//! Onboarding task view model.

use serde::{Deserialize, Serialize};

/// Task progress state as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[serde(alias = "todo")]
    Pending,
    #[serde(alias = "in_progress")]
    InProgress,
    #[serde(alias = "done")]
    Completed,
    /// Any status string this client does not know.
    #[serde(other)]
    Other,
}

impl TaskStatus {
    pub fn is_done(self) -> bool {
        self == Self::Completed
    }
}

/// Task record as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// User id of the assignee.
    #[serde(default)]
    pub assigned_to: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Payload for assigning a new task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub assigned_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}
