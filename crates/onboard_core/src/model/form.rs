//! Feedback form view model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackForm {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    /// Recipients; empty means the form is open to every employee.
    #[serde(default)]
    pub assigned_to: Vec<String>,
}

impl FeedbackForm {
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.assigned_to.is_empty() || self.assigned_to.iter().any(|id| id == user_id)
    }
}
