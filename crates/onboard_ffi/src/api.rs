//! FFI use-case API for the UI shell.
//!
//! # Responsibility
//! - Expose session, dashboard and task use-cases to Dart via FRB.
//! - Translate core outcomes into flat, display-ready envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - The bearer token never crosses the boundary.
//! - Navigation requested by the core is queued until the shell takes it.

use log::{info, warn};
use onboard_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    resolve_home_route, AdminDashboard, CancelToken, ClientConfig, ConfigError, Credentials,
    DashboardLoader, EmployeeDashboard, HttpApiClient, LoadOutcome, LogDiagnosticSink,
    LoginOutcome, Navigator, NewTask, Route, SessionSnapshot, SessionStore,
    SqliteSessionStorage, StatusTally, TaskService, TaskStatus,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

type HttpApi = Arc<HttpApiClient>;

/// Queues routes until the shell polls them.
#[derive(Default)]
struct PendingNavigator {
    routes: Mutex<VecDeque<Route>>,
}

impl PendingNavigator {
    fn take(&self) -> Option<Route> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

impl Navigator for PendingNavigator {
    fn navigate(&self, route: Route) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(route);
    }
}

/// Everything one signed-in client needs, owned by the shell.
#[flutter_rust_bridge::frb(opaque)]
pub struct SessionHandle {
    store: SessionStore<SqliteSessionStorage, HttpApi>,
    dashboards: DashboardLoader<HttpApi>,
    tasks: TaskService<HttpApi>,
    navigator: Arc<PendingNavigator>,
    active_load: Mutex<CancelToken>,
}

/// Session state for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// `uninitialized|initializing|authenticated|anonymous`.
    pub phase: String,
    pub is_initializing: bool,
    pub is_busy: bool,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
    /// `admin|user` when signed in.
    pub role: Option<String>,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Optional affected record ID.
    pub record_id: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, record_id: Option<String>) -> Self {
        Self {
            ok: true,
            record_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            record_id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub task_id: String,
    pub title: String,
    pub assignee_id: Option<String>,
    /// `pending|in-progress|completed|other`.
    pub status: String,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormItem {
    pub form_id: String,
    pub title: String,
    pub question_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeItem {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub start_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u32,
    pub in_progress: u32,
    pub completed: u32,
    pub other: u32,
}

/// Dashboard payload; `status` is `ready|cancelled|unauthenticated|forbidden`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardResponse {
    pub status: String,
    pub employees: Vec<EmployeeItem>,
    pub tasks: Vec<TaskItem>,
    pub forms: Vec<FormItem>,
    pub progress_percent: u32,
    pub counts: StatusCounts,
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Idempotent for the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Opens durable storage at `db_path` and binds the API at `api_base_url`.
///
/// Blank arguments fall back to the `ONBOARD_*` environment and its
/// defaults; timeouts always come from there. The returned handle is not
/// initialized; call `session_initialize` next.
pub fn session_open(db_path: String, api_base_url: String) -> Result<SessionHandle, String> {
    let config = resolve_config(&db_path, &api_base_url).map_err(|err| {
        warn!("event=session_open module=ffi status=error error_code=config_invalid error={err}");
        format!("session config invalid: {err}")
    })?;
    let storage = SqliteSessionStorage::open(&config.db_path).map_err(|err| {
        warn!("event=session_open module=ffi status=error error_code=storage_open_failed error={err}");
        format!("session storage open failed: {err}")
    })?;
    let api = Arc::new(HttpApiClient::from_config(&config).map_err(|err| {
        warn!("event=session_open module=ffi status=error error_code=api_init_failed error={err}");
        format!("api client init failed: {err}")
    })?);
    info!("event=session_open module=ffi status=ok");
    let navigator = Arc::new(PendingNavigator::default());
    let diagnostics = Arc::new(LogDiagnosticSink);

    Ok(SessionHandle {
        store: SessionStore::new(
            storage,
            Arc::clone(&api),
            navigator.clone(),
            diagnostics.clone(),
        ),
        dashboards: DashboardLoader::new(Arc::clone(&api), diagnostics),
        tasks: TaskService::new(api),
        navigator,
        active_load: Mutex::new(CancelToken::new()),
    })
}

/// Restores the persisted session. Safe to call more than once.
#[flutter_rust_bridge::frb(sync)]
pub fn session_initialize(handle: &SessionHandle) -> SessionView {
    to_session_view(&handle.store.initialize())
}

#[flutter_rust_bridge::frb(sync)]
pub fn session_state(handle: &SessionHandle) -> SessionView {
    to_session_view(&handle.store.snapshot())
}

/// Logs in; blocking network call.
pub fn session_login(handle: &SessionHandle, email: String, password: String) -> ActionResponse {
    match handle.store.try_login(&Credentials::new(email, password)) {
        LoginOutcome::SignedIn => {
            let user_id = handle
                .store
                .snapshot()
                .identity()
                .map(|identity| identity.id.clone());
            ActionResponse::success("Signed in.", user_id)
        }
        LoginOutcome::MissingCredentials => {
            ActionResponse::failure("Email and password are required.")
        }
        LoginOutcome::AlreadyInProgress => {
            ActionResponse::failure("A sign-in is already in progress.")
        }
        LoginOutcome::Rejected(reason) => {
            ActionResponse::failure(format!("Sign-in rejected: {reason}"))
        }
        LoginOutcome::Failed(error) => {
            ActionResponse::failure(format!("Sign-in failed: {error}"))
        }
    }
}

/// Logs out and cancels any dashboard load in flight.
#[flutter_rust_bridge::frb(sync)]
pub fn session_logout(handle: &SessionHandle) -> SessionView {
    dashboard_cancel(handle);
    handle.store.logout();
    to_session_view(&handle.store.snapshot())
}

/// Pops the next route the core asked the shell to show.
#[flutter_rust_bridge::frb(sync)]
pub fn session_take_navigation(handle: &SessionHandle) -> Option<String> {
    handle.navigator.take().map(|route| route.path().to_string())
}

/// Landing route for the home view; `None` while initializing.
#[flutter_rust_bridge::frb(sync)]
pub fn home_route(handle: &SessionHandle) -> Option<String> {
    resolve_home_route(&handle.store.snapshot()).map(|route| route.path().to_string())
}

/// Loads the administrator dashboard; blocking network calls.
pub fn dashboard_admin(handle: &SessionHandle) -> DashboardResponse {
    let cancel = begin_load(handle);
    match handle.dashboards.load_admin(&handle.store.snapshot(), &cancel) {
        LoadOutcome::Ready(dashboard) => admin_response(dashboard),
        LoadOutcome::Cancelled => empty_dashboard("cancelled"),
        LoadOutcome::Unauthenticated => empty_dashboard("unauthenticated"),
        LoadOutcome::Forbidden => empty_dashboard("forbidden"),
    }
}

/// Loads the signed-in employee's dashboard; blocking network calls.
pub fn dashboard_employee(handle: &SessionHandle) -> DashboardResponse {
    let cancel = begin_load(handle);
    match handle
        .dashboards
        .load_employee(&handle.store.snapshot(), &cancel)
    {
        LoadOutcome::Ready(dashboard) => employee_response(dashboard),
        LoadOutcome::Cancelled => empty_dashboard("cancelled"),
        LoadOutcome::Unauthenticated => empty_dashboard("unauthenticated"),
        LoadOutcome::Forbidden => empty_dashboard("forbidden"),
    }
}

/// Cancels the dashboard load in flight, if any. Called on view teardown.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_cancel(handle: &SessionHandle) {
    handle
        .active_load
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .cancel();
}

pub fn task_assign(
    handle: &SessionHandle,
    title: String,
    assignee_id: String,
    description: Option<String>,
    due_date: Option<String>,
) -> ActionResponse {
    let Some(token) = handle.store.token() else {
        return ActionResponse::failure("Not signed in.");
    };
    let task = NewTask {
        title,
        description,
        assigned_to: assignee_id,
        due_date,
    };
    match handle.tasks.assign_task(&token, task) {
        Ok(created) => ActionResponse::success("Task assigned.", Some(created.id)),
        Err(err) => ActionResponse::failure(format!("task_assign failed: {err}")),
    }
}

/// `status` is one of `pending|in-progress|completed`.
pub fn task_update_status(
    handle: &SessionHandle,
    task_id: String,
    status: String,
) -> ActionResponse {
    let Some(token) = handle.store.token() else {
        return ActionResponse::failure("Not signed in.");
    };
    let Some(status) = parse_task_status(&status) else {
        return ActionResponse::failure(format!("unsupported task status `{status}`"));
    };
    match handle.tasks.update_status(&token, &task_id, status) {
        Ok(updated) => ActionResponse::success("Task updated.", Some(updated.id)),
        Err(err) => ActionResponse::failure(format!("task_update_status failed: {err}")),
    }
}

pub fn task_delete(handle: &SessionHandle, task_id: String) -> ActionResponse {
    let Some(token) = handle.store.token() else {
        return ActionResponse::failure("Not signed in.");
    };
    match handle.tasks.delete_task(&token, &task_id) {
        Ok(()) => ActionResponse::success("Task deleted.", Some(task_id.trim().to_string())),
        Err(err) => ActionResponse::failure(format!("task_delete failed: {err}")),
    }
}

fn resolve_config(db_path: &str, api_base_url: &str) -> Result<ClientConfig, ConfigError> {
    ClientConfig::from_env()?
        .with_db_path(db_path)
        .with_api_base_url(api_base_url)
}

fn begin_load(handle: &SessionHandle) -> CancelToken {
    let mut active = handle
        .active_load
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    active.cancel();
    *active = CancelToken::new();
    active.clone()
}

fn parse_task_status(value: &str) -> Option<TaskStatus> {
    match value.trim() {
        "pending" => Some(TaskStatus::Pending),
        "in-progress" => Some(TaskStatus::InProgress),
        "completed" => Some(TaskStatus::Completed),
        _ => None,
    }
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::InProgress => "in-progress",
        TaskStatus::Completed => "completed",
        TaskStatus::Other => "other",
    }
}

fn to_session_view(snapshot: &SessionSnapshot) -> SessionView {
    let identity = snapshot.identity();
    SessionView {
        phase: snapshot.phase.as_str().to_string(),
        is_initializing: snapshot.is_initializing,
        is_busy: snapshot.is_busy,
        user_id: identity.map(|identity| identity.id.clone()),
        user_name: identity.map(|identity| identity.name.clone()),
        email: identity.map(|identity| identity.email.clone()),
        role: identity.map(|identity| identity.role.as_str().to_string()),
    }
}

fn to_counts(tally: StatusTally) -> StatusCounts {
    let clamp = |count: usize| u32::try_from(count).unwrap_or(u32::MAX);
    StatusCounts {
        pending: clamp(tally.pending),
        in_progress: clamp(tally.in_progress),
        completed: clamp(tally.completed),
        other: clamp(tally.other),
    }
}

fn to_task_items(tasks: Vec<onboard_core::TaskRecord>) -> Vec<TaskItem> {
    tasks
        .into_iter()
        .map(|task| TaskItem {
            task_id: task.id,
            title: task.title,
            assignee_id: task.assigned_to,
            status: status_label(task.status).to_string(),
            due_date: task.due_date,
        })
        .collect()
}

fn to_form_items(forms: Vec<onboard_core::FeedbackForm>) -> Vec<FormItem> {
    forms
        .into_iter()
        .map(|form| FormItem {
            question_count: u32::try_from(form.questions.len()).unwrap_or(u32::MAX),
            form_id: form.id,
            title: form.title,
        })
        .collect()
}

fn admin_response(dashboard: AdminDashboard) -> DashboardResponse {
    DashboardResponse {
        status: "ready".to_string(),
        employees: dashboard
            .employees
            .into_iter()
            .map(|user| EmployeeItem {
                user_id: user.id,
                name: user.name,
                email: user.email,
                start_date: user.start_date,
            })
            .collect(),
        tasks: to_task_items(dashboard.tasks),
        forms: to_form_items(dashboard.forms),
        progress_percent: dashboard.stats.progress_percent,
        counts: to_counts(dashboard.stats.tally),
    }
}

fn employee_response(dashboard: EmployeeDashboard) -> DashboardResponse {
    DashboardResponse {
        status: "ready".to_string(),
        employees: Vec::new(),
        tasks: to_task_items(dashboard.tasks),
        forms: to_form_items(dashboard.forms),
        progress_percent: dashboard.progress_percent,
        counts: to_counts(dashboard.tally),
    }
}

fn empty_dashboard(status: &str) -> DashboardResponse {
    DashboardResponse {
        status: status.to_string(),
        employees: Vec::new(),
        tasks: Vec::new(),
        forms: Vec::new(),
        progress_percent: 0,
        counts: to_counts(StatusTally::default()),
    }
}
