use onboard_core::{
    AccessToken, ApiError, ApiResponse, ApiResult, CancelToken, DashboardLoader, DiagnosticEvent,
    DiagnosticSink, FeedbackForm, Identity, LoadOutcome, NewTask, OnboardingApi, Role, Session,
    SessionPhase, SessionSnapshot, TaskRecord, TaskStatus, UserRecord,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeApi {
    fail_users: bool,
    reject_forms: bool,
    cancel_during_tasks: Option<CancelToken>,
    calls: AtomicUsize,
    seen_tokens: Mutex<Vec<String>>,
}

impl FakeApi {
    fn record(&self, token: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens.lock().unwrap().push(token.to_string());
    }
}

impl OnboardingApi for FakeApi {
    fn list_users(&self, token: &str) -> ApiResult<ApiResponse<Vec<UserRecord>>> {
        self.record(token);
        if self.fail_users {
            return Err(ApiError::Transport("timed out".to_string()));
        }
        Ok(ApiResponse::ok(vec![
            identity("1", "Ada", Role::Admin),
            identity("2", "Ben", Role::User),
            identity("3", "Cy", Role::User),
        ]))
    }

    fn list_tasks(&self, token: &str) -> ApiResult<ApiResponse<Vec<TaskRecord>>> {
        self.record(token);
        if let Some(cancel) = &self.cancel_during_tasks {
            cancel.cancel();
        }
        Ok(ApiResponse::ok(vec![
            task("t1", "2", TaskStatus::Completed),
            task("t2", "2", TaskStatus::Pending),
            task("t3", "3", TaskStatus::InProgress),
            task("t4", "3", TaskStatus::Completed),
        ]))
    }

    fn list_forms(&self, token: &str) -> ApiResult<ApiResponse<Vec<FeedbackForm>>> {
        self.record(token);
        if self.reject_forms {
            return Ok(ApiResponse::failure("forms unavailable"));
        }
        Ok(ApiResponse::ok(vec![
            form("f1", &[]),
            form("f2", &["2"]),
            form("f3", &["3"]),
        ]))
    }

    fn create_task(&self, _token: &str, _task: &NewTask) -> ApiResult<ApiResponse<TaskRecord>> {
        unreachable!("dashboards never create tasks")
    }

    fn update_task_status(
        &self,
        _token: &str,
        _task_id: &str,
        _status: TaskStatus,
    ) -> ApiResult<ApiResponse<TaskRecord>> {
        unreachable!("dashboards never update tasks")
    }

    fn delete_task(
        &self,
        _token: &str,
        _task_id: &str,
    ) -> ApiResult<ApiResponse<serde_json::Value>> {
        unreachable!("dashboards never delete tasks")
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, event: DiagnosticEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn identity(id: &str, name: &str, role: Role) -> Identity {
    Identity {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@corp.io", name.to_lowercase()),
        phone: None,
        role,
        start_date: None,
    }
}

fn task(id: &str, assignee: &str, status: TaskStatus) -> TaskRecord {
    TaskRecord {
        id: id.to_string(),
        title: format!("task {id}"),
        description: None,
        assigned_to: Some(assignee.to_string()),
        status,
        due_date: None,
    }
}

fn form(id: &str, assigned_to: &[&str]) -> FeedbackForm {
    FeedbackForm {
        id: id.to_string(),
        title: format!("form {id}"),
        description: None,
        questions: vec!["How was week one?".to_string()],
        assigned_to: assigned_to.iter().map(|id| id.to_string()).collect(),
    }
}

fn signed_in(user: Identity) -> SessionSnapshot {
    SessionSnapshot {
        phase: SessionPhase::Authenticated,
        session: Some(Session {
            identity: user,
            token: AccessToken::new("bearer-1").unwrap(),
        }),
        is_initializing: false,
        is_busy: false,
    }
}

fn anonymous() -> SessionSnapshot {
    SessionSnapshot {
        phase: SessionPhase::Anonymous,
        session: None,
        is_initializing: false,
        is_busy: false,
    }
}

fn build_loader(api: FakeApi) -> (DashboardLoader<FakeApi>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (DashboardLoader::new(api, sink.clone()), sink)
}

#[test]
fn admin_dashboard_joins_all_resources_and_derives_stats() {
    let (loader, sink) = build_loader(FakeApi::default());
    let admin = signed_in(identity("1", "Ada", Role::Admin));

    let LoadOutcome::Ready(dashboard) = loader.load_admin(&admin, &CancelToken::new()) else {
        panic!("admin dashboard should load");
    };
    assert_eq!(dashboard.employees.len(), 2);
    assert!(dashboard.employees.iter().all(|user| user.role == Role::User));
    assert_eq!(dashboard.stats.total_tasks, 4);
    assert_eq!(dashboard.stats.completed_tasks, 2);
    assert_eq!(dashboard.stats.progress_percent, 50);
    assert_eq!(dashboard.stats.tally.pending, 1);
    assert_eq!(dashboard.stats.tally.in_progress, 1);
    assert_eq!(dashboard.stats.total_forms, 3);
    assert!(sink.events.lock().unwrap().is_empty());

    let tokens = loader.api().seen_tokens.lock().unwrap().clone();
    assert_eq!(tokens, vec!["bearer-1"; 3]);
}

#[test]
fn failed_fetches_degrade_to_empty_without_affecting_others() {
    let (loader, sink) = build_loader(FakeApi {
        fail_users: true,
        reject_forms: true,
        ..FakeApi::default()
    });
    let admin = signed_in(identity("1", "Ada", Role::Admin));

    let LoadOutcome::Ready(dashboard) = loader.load_admin(&admin, &CancelToken::new()) else {
        panic!("partial failure still loads");
    };
    assert!(dashboard.employees.is_empty());
    assert!(dashboard.forms.is_empty());
    assert_eq!(dashboard.tasks.len(), 4);

    let events = sink.events.lock().unwrap().clone();
    let failed: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            DiagnosticEvent::FetchFailed { resource, .. } => Some(*resource),
            _ => None,
        })
        .collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.contains(&"users"));
    assert!(failed.contains(&"forms"));
    assert!(events.contains(&DiagnosticEvent::FetchFailed {
        resource: "forms",
        error: "forms unavailable".to_string(),
    }));
}

#[test]
fn employee_dashboard_filters_to_own_tasks_and_forms() {
    let (loader, _sink) = build_loader(FakeApi::default());
    let employee = signed_in(identity("2", "Ben", Role::User));

    let LoadOutcome::Ready(dashboard) = loader.load_employee(&employee, &CancelToken::new())
    else {
        panic!("employee dashboard should load");
    };
    let task_ids: Vec<&str> = dashboard.tasks.iter().map(|task| task.id.as_str()).collect();
    assert_eq!(task_ids, vec!["t1", "t2"]);
    let form_ids: Vec<&str> = dashboard.forms.iter().map(|form| form.id.as_str()).collect();
    assert_eq!(form_ids, vec!["f1", "f2"]);
    assert_eq!(dashboard.progress_percent, 50);
    assert_eq!(dashboard.identity.id, "2");
    assert_eq!(loader.api().calls.load(Ordering::SeqCst), 2);
}

#[test]
fn anonymous_and_non_admin_callers_issue_no_requests() {
    let (loader, _sink) = build_loader(FakeApi::default());

    assert_eq!(
        loader.load_admin(&anonymous(), &CancelToken::new()),
        LoadOutcome::Unauthenticated
    );
    assert_eq!(
        loader.load_employee(&anonymous(), &CancelToken::new()),
        LoadOutcome::Unauthenticated
    );
    let employee = signed_in(identity("2", "Ben", Role::User));
    assert_eq!(loader.load_admin(&employee, &CancelToken::new()), LoadOutcome::Forbidden);
    assert_eq!(loader.api().calls.load(Ordering::SeqCst), 0);
}

#[test]
fn cancelled_before_start_skips_every_request() {
    let (loader, sink) = build_loader(FakeApi::default());
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = loader.load_admin(&signed_in(identity("1", "Ada", Role::Admin)), &cancel);
    assert_eq!(outcome, LoadOutcome::Cancelled);
    assert_eq!(loader.api().calls.load(Ordering::SeqCst), 0);
    assert!(sink
        .events
        .lock()
        .unwrap()
        .contains(&DiagnosticEvent::FetchCancelled {
            view: "admin_dashboard"
        }));
}

#[test]
fn cancellation_during_fetch_discards_arrived_results() {
    let cancel = CancelToken::new();
    let (loader, _sink) = build_loader(FakeApi {
        cancel_during_tasks: Some(cancel.clone()),
        ..FakeApi::default()
    });

    let outcome = loader.load_employee(&signed_in(identity("2", "Ben", Role::User)), &cancel);
    assert_eq!(outcome, LoadOutcome::Cancelled);
    assert!(cancel.is_cancelled());
}
