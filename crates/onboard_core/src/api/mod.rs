//! Contract with the remote onboarding API.
//!
//! # Responsibility
//! - Define the `{success, data?, error?}` envelope and payload shapes.
//! - Split authentication (`AuthApi`) from data access (`OnboardingApi`).
//!
//! # Invariants
//! - Implementations return `Err` only for transport/decoding failures; a
//!   server-side refusal is an envelope with `success == false`.

use crate::model::form::FeedbackForm;
use crate::model::identity::{Identity, UserRecord};
use crate::model::task::{NewTask, TaskRecord, TaskStatus};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod http;

pub use http::{decode_envelope, HttpApiClient};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection, TLS or timeout failure.
    Transport(String),
    /// Non-success HTTP status whose body was not an envelope.
    Status { code: u16, body: String },
    /// Body could not be decoded into the expected envelope.
    Decode(String),
    /// The request could not be addressed; nothing was sent.
    InvalidRequest(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "transport error: {message}"),
            Self::Status { code, body } => write!(f, "http status {code}: {body}"),
            Self::Decode(message) => write!(f, "response decode error: {message}"),
            Self::InvalidRequest(message) => write!(f, "invalid request: {message}"),
        }
    }
}

impl Error for ApiError {}

/// Response envelope used by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Returns the payload only when the server reported success with data.
    pub fn into_data(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("response reported success without data".to_string()),
            (false, _) => Err(self
                .error
                .unwrap_or_else(|| "request was rejected".to_string())),
        }
    }
}

/// Login request body.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Payload of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub access_token: String,
    pub user: Identity,
}

/// Body for a task status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskStatusUpdate {
    pub status: TaskStatus,
}

/// Authentication endpoint used by the session store.
pub trait AuthApi: Send + Sync {
    fn login(&self, credentials: &Credentials) -> ApiResult<ApiResponse<LoginPayload>>;
}

/// Authenticated data endpoints used by dashboards and task management.
pub trait OnboardingApi: Send + Sync {
    fn list_users(&self, token: &str) -> ApiResult<ApiResponse<Vec<UserRecord>>>;
    fn list_tasks(&self, token: &str) -> ApiResult<ApiResponse<Vec<TaskRecord>>>;
    fn list_forms(&self, token: &str) -> ApiResult<ApiResponse<Vec<FeedbackForm>>>;
    fn create_task(&self, token: &str, task: &NewTask) -> ApiResult<ApiResponse<TaskRecord>>;
    fn update_task_status(
        &self,
        token: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> ApiResult<ApiResponse<TaskRecord>>;
    fn delete_task(
        &self,
        token: &str,
        task_id: &str,
    ) -> ApiResult<ApiResponse<serde_json::Value>>;
}

impl<A: AuthApi + ?Sized> AuthApi for std::sync::Arc<A> {
    fn login(&self, credentials: &Credentials) -> ApiResult<ApiResponse<LoginPayload>> {
        (**self).login(credentials)
    }
}

impl<A: OnboardingApi + ?Sized> OnboardingApi for std::sync::Arc<A> {
    fn list_users(&self, token: &str) -> ApiResult<ApiResponse<Vec<UserRecord>>> {
        (**self).list_users(token)
    }

    fn list_tasks(&self, token: &str) -> ApiResult<ApiResponse<Vec<TaskRecord>>> {
        (**self).list_tasks(token)
    }

    fn list_forms(&self, token: &str) -> ApiResult<ApiResponse<Vec<FeedbackForm>>> {
        (**self).list_forms(token)
    }

    fn create_task(&self, token: &str, task: &NewTask) -> ApiResult<ApiResponse<TaskRecord>> {
        (**self).create_task(token, task)
    }

    fn update_task_status(
        &self,
        token: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> ApiResult<ApiResponse<TaskRecord>> {
        (**self).update_task_status(token, task_id, status)
    }

    fn delete_task(
        &self,
        token: &str,
        task_id: &str,
    ) -> ApiResult<ApiResponse<serde_json::Value>> {
        (**self).delete_task(token, task_id)
    }
}
