//! Dashboard loading: parallel fetch, join, derive.
//!
//! # Responsibility
//! - Issue the independent list requests of a dashboard concurrently.
//! - Replace a failed request's result with an empty collection.
//! - Honor cancellation requested by a view that is being torn down.
//!
//! # Invariants
//! - No request is issued for an anonymous or forbidden caller.
//! - A failed fetch never affects the others.
//! - A cancelled load never returns data, even data that arrived.

use crate::api::{ApiResponse, ApiResult, OnboardingApi};
use crate::model::form::FeedbackForm;
use crate::model::identity::{Identity, Role, UserRecord};
use crate::model::task::TaskRecord;
use crate::service::stats::{progress_percent, tally_statuses, StatusTally};
use crate::session::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::session::SessionSnapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};

/// Shared cancellation flag; clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome<T> {
    Ready(T),
    Cancelled,
    /// No session; nothing was requested.
    Unauthenticated,
    /// Signed in, but the role may not see this dashboard.
    Forbidden,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_employees: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub progress_percent: u32,
    pub tally: StatusTally,
    pub total_forms: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminDashboard {
    pub employees: Vec<UserRecord>,
    pub tasks: Vec<TaskRecord>,
    pub forms: Vec<FeedbackForm>,
    pub stats: DashboardStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeDashboard {
    pub identity: Identity,
    pub tasks: Vec<TaskRecord>,
    pub forms: Vec<FeedbackForm>,
    pub progress_percent: u32,
    pub tally: StatusTally,
}

pub struct DashboardLoader<A: OnboardingApi> {
    api: A,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl<A: OnboardingApi> DashboardLoader<A> {
    pub fn new(api: A, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self { api, diagnostics }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Loads users, tasks and forms for an administrator.
    pub fn load_admin(
        &self,
        snapshot: &SessionSnapshot,
        cancel: &CancelToken,
    ) -> LoadOutcome<AdminDashboard> {
        let Some(session) = snapshot.session.as_ref() else {
            return LoadOutcome::Unauthenticated;
        };
        if !session.identity.is_admin() {
            return LoadOutcome::Forbidden;
        }
        let token = session.token.as_str();

        let (users, tasks, forms) = thread::scope(|scope| {
            let users = scope.spawn(|| self.fetch("users", cancel, || self.api.list_users(token)));
            let tasks = scope.spawn(|| self.fetch("tasks", cancel, || self.api.list_tasks(token)));
            let forms = scope.spawn(|| self.fetch("forms", cancel, || self.api.list_forms(token)));
            (
                self.join("users", users),
                self.join("tasks", tasks),
                self.join("forms", forms),
            )
        });

        if cancel.is_cancelled() {
            self.diagnostics.emit(DiagnosticEvent::FetchCancelled {
                view: "admin_dashboard",
            });
            return LoadOutcome::Cancelled;
        }

        let employees: Vec<UserRecord> = users
            .into_iter()
            .filter(|user| user.role == Role::User)
            .collect();
        let tally = tally_statuses(&tasks);
        let stats = DashboardStats {
            total_employees: employees.len(),
            total_tasks: tasks.len(),
            completed_tasks: tally.completed,
            progress_percent: progress_percent(&tasks),
            tally,
            total_forms: forms.len(),
        };

        LoadOutcome::Ready(AdminDashboard {
            employees,
            tasks,
            forms,
            stats,
        })
    }

    /// Loads the signed-in employee's tasks and the forms addressed to them.
    pub fn load_employee(
        &self,
        snapshot: &SessionSnapshot,
        cancel: &CancelToken,
    ) -> LoadOutcome<EmployeeDashboard> {
        let Some(session) = snapshot.session.as_ref() else {
            return LoadOutcome::Unauthenticated;
        };
        let token = session.token.as_str();
        let user_id = session.identity.id.as_str();

        let (tasks, forms) = thread::scope(|scope| {
            let tasks = scope.spawn(|| self.fetch("tasks", cancel, || self.api.list_tasks(token)));
            let forms = scope.spawn(|| self.fetch("forms", cancel, || self.api.list_forms(token)));
            (self.join("tasks", tasks), self.join("forms", forms))
        });

        if cancel.is_cancelled() {
            self.diagnostics.emit(DiagnosticEvent::FetchCancelled {
                view: "employee_dashboard",
            });
            return LoadOutcome::Cancelled;
        }

        let tasks: Vec<TaskRecord> = tasks
            .into_iter()
            .filter(|task| task.assigned_to.as_deref() == Some(user_id))
            .collect();
        let forms: Vec<FeedbackForm> = forms
            .into_iter()
            .filter(|form| form.is_visible_to(user_id))
            .collect();

        LoadOutcome::Ready(EmployeeDashboard {
            identity: session.identity.clone(),
            progress_percent: progress_percent(&tasks),
            tally: tally_statuses(&tasks),
            tasks,
            forms,
        })
    }

    fn fetch<T>(
        &self,
        resource: &'static str,
        cancel: &CancelToken,
        call: impl FnOnce() -> ApiResult<ApiResponse<Vec<T>>>,
    ) -> Vec<T> {
        if cancel.is_cancelled() {
            return Vec::new();
        }
        match call()
            .map_err(|err| err.to_string())
            .and_then(ApiResponse::into_data)
        {
            Ok(items) => items,
            Err(error) => {
                self.diagnostics
                    .emit(DiagnosticEvent::FetchFailed { resource, error });
                Vec::new()
            }
        }
    }

    fn join<T>(&self, resource: &'static str, handle: ScopedJoinHandle<'_, Vec<T>>) -> Vec<T> {
        handle.join().unwrap_or_else(|_| {
            self.diagnostics.emit(DiagnosticEvent::FetchFailed {
                resource,
                error: "fetch worker panicked".to_string(),
            });
            Vec::new()
        })
    }
}
