//! Structured diagnostic events for failures that are never shown to users.
//!
//! # Invariants
//! - Events carry metadata only; tokens and passwords never appear.
//! - Emitting an event cannot fail.

use crate::logging::sanitize_log_value;
use log::{log, Level};

/// Durable storage operation named in [`DiagnosticEvent::StorageFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Read,
    Write,
    Remove,
}

impl StorageOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// A persisted session was restored on startup.
    SessionRestored { user_id: String },
    /// Nothing was persisted; startup continues anonymous.
    NoStoredSession,
    /// Persisted session data was corrupt and has been discarded.
    StoredSessionDiscarded { reason: String },
    StorageFailed {
        op: StorageOp,
        key: &'static str,
        error: String,
    },
    LoginSucceeded { user_id: String },
    /// The server answered but refused or sent an unusable payload.
    LoginRejected { reason: String },
    /// The login call itself failed (transport, decode).
    LoginFailed { error: String },
    LoggedOut,
    FetchFailed {
        resource: &'static str,
        error: String,
    },
    FetchCancelled { view: &'static str },
}

/// Observability collaborator injected into the session store and loaders.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: DiagnosticEvent);
}

/// Writes events as `event=... module=... status=...` log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnosticSink;

impl DiagnosticSink for LogDiagnosticSink {
    fn emit(&self, event: DiagnosticEvent) {
        let (level, line) = render(&event);
        log!(level, "{line}");
    }
}

/// Every free-form value passes through `sanitize_log_value`, server-issued
/// ids included.
fn render(event: &DiagnosticEvent) -> (Level, String) {
    match event {
        DiagnosticEvent::SessionRestored { user_id } => (
            Level::Info,
            format!(
                "event=session_restore module=session status=ok user_id={}",
                sanitize_log_value(user_id)
            ),
        ),
        DiagnosticEvent::NoStoredSession => (
            Level::Info,
            "event=session_restore module=session status=empty".to_string(),
        ),
        DiagnosticEvent::StoredSessionDiscarded { reason } => (
            Level::Warn,
            format!(
                "event=session_restore module=session status=discarded reason={}",
                sanitize_log_value(reason)
            ),
        ),
        DiagnosticEvent::StorageFailed { op, key, error } => (
            Level::Warn,
            format!(
                "event=storage_{} module=storage status=error key={key} error={}",
                op.as_str(),
                sanitize_log_value(error)
            ),
        ),
        DiagnosticEvent::LoginSucceeded { user_id } => (
            Level::Info,
            format!(
                "event=login module=session status=ok user_id={}",
                sanitize_log_value(user_id)
            ),
        ),
        DiagnosticEvent::LoginRejected { reason } => (
            Level::Warn,
            format!(
                "event=login module=session status=rejected reason={}",
                sanitize_log_value(reason)
            ),
        ),
        DiagnosticEvent::LoginFailed { error } => (
            Level::Warn,
            format!(
                "event=login module=session status=error error={}",
                sanitize_log_value(error)
            ),
        ),
        DiagnosticEvent::LoggedOut => (
            Level::Info,
            "event=logout module=session status=ok".to_string(),
        ),
        DiagnosticEvent::FetchFailed { resource, error } => (
            Level::Warn,
            format!(
                "event=fetch module=dashboard status=error resource={resource} error={}",
                sanitize_log_value(error)
            ),
        ),
        DiagnosticEvent::FetchCancelled { view } => (
            Level::Info,
            format!("event=fetch module=dashboard status=cancelled view={view}"),
        ),
    }
}
