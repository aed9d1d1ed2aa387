//! Client core for the onboarding application.
//! Session lifecycle, durable client storage and dashboard data live here;
//! the UI shell only renders what this crate hands it.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;
pub mod storage;

pub use api::{
    ApiError, ApiResponse, ApiResult, AuthApi, Credentials, HttpApiClient, LoginPayload,
    OnboardingApi,
};
pub use config::{ClientConfig, ConfigError};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::form::FeedbackForm;
pub use model::identity::{Identity, IdentityValidationError, Role, UserRecord};
pub use model::task::{NewTask, TaskRecord, TaskStatus};
pub use service::dashboard::{
    AdminDashboard, CancelToken, DashboardLoader, DashboardStats, EmployeeDashboard, LoadOutcome,
};
pub use service::stats::{progress_percent, tally_statuses, StatusTally};
pub use service::task_service::{TaskService, TaskServiceError, TaskServiceResult};
pub use session::diagnostics::{DiagnosticEvent, DiagnosticSink, LogDiagnosticSink, StorageOp};
pub use session::navigation::{enter_route, guard_route, resolve_home_route, Navigator, Route};
pub use session::{
    AccessToken, LoginOutcome, Session, SessionPhase, SessionSnapshot, SessionStore,
    SubscriptionId,
};
pub use storage::{
    MemorySessionStorage, SessionStorage, SqliteSessionStorage, StorageError, StorageResult,
    TOKEN_KEY, USER_KEY,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
