//! Task assignment use-cases.
//!
//! # Invariants
//! - Blank titles, assignees or task ids never reach the API.
//! - A server refusal surfaces as `Rejected` with the server's message.

use crate::api::{ApiError, OnboardingApi};
use crate::model::task::{NewTask, TaskRecord, TaskStatus};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskServiceError {
    Validation(&'static str),
    Rejected(String),
    Api(ApiError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "invalid task input: {message}"),
            Self::Rejected(message) => write!(f, "task request rejected: {message}"),
            Self::Api(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Api(err) => Some(err),
            Self::Validation(_) | Self::Rejected(_) => None,
        }
    }
}

impl From<ApiError> for TaskServiceError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

pub struct TaskService<A: OnboardingApi> {
    api: A,
}

impl<A: OnboardingApi> TaskService<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Assigns a new task to an employee.
    ///
    /// Title and assignee are trimmed; optional fields that are blank after
    /// trimming are dropped.
    pub fn assign_task(&self, token: &str, task: NewTask) -> TaskServiceResult<TaskRecord> {
        let task = normalize_new_task(task)?;
        let created = self
            .api
            .create_task(token, &task)?
            .into_data()
            .map_err(TaskServiceError::Rejected)?;
        info!(
            "event=task_assign module=task status=ok task_id={} assignee={}",
            created.id, task.assigned_to
        );
        Ok(created)
    }

    pub fn update_status(
        &self,
        token: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> TaskServiceResult<TaskRecord> {
        let task_id = require_task_id(task_id)?;
        if status == TaskStatus::Other {
            return Err(TaskServiceError::Validation("status must be a known value"));
        }
        let updated = self
            .api
            .update_task_status(token, task_id, status)?
            .into_data()
            .map_err(TaskServiceError::Rejected)?;
        Ok(updated)
    }

    pub fn delete_task(&self, token: &str, task_id: &str) -> TaskServiceResult<()> {
        let task_id = require_task_id(task_id)?;
        let response = self.api.delete_task(token, task_id)?;
        if !response.success {
            return Err(TaskServiceError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "request was rejected".to_string()),
            ));
        }
        info!("event=task_delete module=task status=ok task_id={task_id}");
        Ok(())
    }
}

fn normalize_new_task(task: NewTask) -> TaskServiceResult<NewTask> {
    let title = task.title.trim().to_string();
    if title.is_empty() {
        return Err(TaskServiceError::Validation("title must not be blank"));
    }
    let assigned_to = task.assigned_to.trim().to_string();
    if assigned_to.is_empty() {
        return Err(TaskServiceError::Validation("assignee must not be blank"));
    }
    let non_blank = |value: Option<String>| {
        value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    Ok(NewTask {
        title,
        description: non_blank(task.description),
        assigned_to,
        due_date: non_blank(task.due_date),
    })
}

fn require_task_id(task_id: &str) -> TaskServiceResult<&str> {
    let trimmed = task_id.trim();
    if trimmed.is_empty() {
        return Err(TaskServiceError::Validation("task id must not be blank"));
    }
    Ok(trimmed)
}
