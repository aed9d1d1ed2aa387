//! The session store and its login/logout/initialize commands.

use super::diagnostics::{DiagnosticEvent, DiagnosticSink, StorageOp};
use super::navigation::{Navigator, Route};
use super::state::{AccessToken, Session, SessionPhase, SessionSnapshot};
use crate::api::{AuthApi, Credentials, LoginPayload};
use crate::model::identity::Identity;
use crate::storage::{SessionStorage, StorageError, TOKEN_KEY, USER_KEY};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Result of [`SessionStore::try_login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    SignedIn,
    /// Blank email or password; the API was not called.
    MissingCredentials,
    /// Another login holds the busy flag; the API was not called.
    AlreadyInProgress,
    /// The server refused, or answered with an unusable payload.
    Rejected(String),
    /// Transport or decode failure, or a panicking client.
    Failed(String),
}

impl LoginOutcome {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn)
    }
}

type Subscriber = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

struct StoreState {
    phase: SessionPhase,
    session: Option<Session>,
    initialized: bool,
}

/// Single source of truth for the logged-in identity.
///
/// Constructed empty; callers run [`SessionStore::initialize`] once at
/// startup. Views read through [`SessionStore::snapshot`] or a subscription
/// and change state only through `login`/`logout`.
pub struct SessionStore<S: SessionStorage, A: AuthApi> {
    storage: S,
    api: A,
    navigator: Arc<dyn Navigator>,
    diagnostics: Arc<dyn DiagnosticSink>,
    state: Mutex<StoreState>,
    busy: AtomicBool,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

/// Clears the busy flag on every exit path, unwinding included.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: SessionStorage, A: AuthApi> SessionStore<S, A> {
    pub fn new(
        storage: S,
        api: A,
        navigator: Arc<dyn Navigator>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            storage,
            api,
            navigator,
            diagnostics,
            state: Mutex::new(StoreState {
                phase: SessionPhase::Uninitialized,
                session: None,
                initialized: false,
            }),
            busy: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Current state as an owned value.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock_state();
        SessionSnapshot {
            phase: state.phase,
            session: state.session.clone(),
            is_initializing: !state.initialized,
            is_busy: self.busy.load(Ordering::Acquire),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn is_initializing(&self) -> bool {
        !self.lock_state().initialized
    }

    /// Bearer token of the current session, if any.
    pub fn token(&self) -> Option<String> {
        self.lock_state()
            .session
            .as_ref()
            .map(|session| session.token.as_str().to_string())
    }

    /// Restores a persisted session, once.
    ///
    /// Corrupt or half-present data is removed from storage and reported to
    /// the diagnostic sink; the session is then anonymous. Calls after the
    /// first are no-ops. A session established by `login` before this runs
    /// is kept and storage is not read.
    pub fn initialize(&self) -> SessionSnapshot {
        let should_restore = {
            let mut state = self.lock_state();
            if state.initialized || state.phase == SessionPhase::Initializing {
                drop(state);
                return self.snapshot();
            }
            if state.session.is_none() {
                state.phase = SessionPhase::Initializing;
            }
            state.session.is_none()
        };

        let restored = if should_restore {
            self.restore_from_storage()
        } else {
            None
        };

        {
            let mut state = self.lock_state();
            if state.session.is_none() {
                state.session = restored;
            }
            state.phase = if state.session.is_some() {
                SessionPhase::Authenticated
            } else {
                SessionPhase::Anonymous
            };
            state.initialized = true;
        }
        self.publish()
    }

    /// Authenticates through the API and persists the resulting session.
    ///
    /// Returns `false` for blank credentials, a login already in flight, a
    /// refusal, an unusable payload, or a failed call. Never panics; the
    /// busy flag is released on every path.
    pub fn login(&self, credentials: &Credentials) -> bool {
        self.try_login(credentials).is_signed_in()
    }

    /// Same as [`SessionStore::login`], keeping the failure reason.
    pub fn try_login(&self, credentials: &Credentials) -> LoginOutcome {
        if !credentials.is_complete() {
            self.emit(DiagnosticEvent::LoginRejected {
                reason: "email and password are required".to_string(),
            });
            return LoginOutcome::MissingCredentials;
        }

        let outcome = {
            let Some(_busy) = BusyGuard::acquire(&self.busy) else {
                self.emit(DiagnosticEvent::LoginRejected {
                    reason: "login already in progress".to_string(),
                });
                return LoginOutcome::AlreadyInProgress;
            };
            self.publish();
            self.attempt_login(credentials)
        };

        self.publish();
        outcome
    }

    /// Drops the session everywhere and routes to the login view.
    pub fn logout(&self) {
        {
            let mut state = self.lock_state();
            state.session = None;
            state.phase = SessionPhase::Anonymous;
        }
        self.clear_persisted();
        self.emit(DiagnosticEvent::LoggedOut);
        self.publish();
        self.navigator.navigate(Route::Login);
    }

    /// Registers `callback` to receive a snapshot after each state change.
    pub fn subscribe(
        &self,
        callback: impl Fn(&SessionSnapshot) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    fn attempt_login(&self, credentials: &Credentials) -> LoginOutcome {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.api.login(credentials)));
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return self.login_failed(err.to_string()),
            Err(_) => return self.login_failed("api client panicked".to_string()),
        };

        let session = match response.into_data().and_then(session_from_payload) {
            Ok(session) => session,
            Err(reason) => {
                self.emit(DiagnosticEvent::LoginRejected {
                    reason: reason.clone(),
                });
                return LoginOutcome::Rejected(reason);
            }
        };

        let user_id = session.identity.id.clone();
        {
            let mut state = self.lock_state();
            state.session = Some(session.clone());
            state.phase = SessionPhase::Authenticated;
        }
        self.persist(&session);
        self.emit(DiagnosticEvent::LoginSucceeded { user_id });
        LoginOutcome::SignedIn
    }

    fn login_failed(&self, error: String) -> LoginOutcome {
        self.emit(DiagnosticEvent::LoginFailed {
            error: error.clone(),
        });
        LoginOutcome::Failed(error)
    }

    fn restore_from_storage(&self) -> Option<Session> {
        let token = self.read_key(TOKEN_KEY).ok()?;
        let user = self.read_key(USER_KEY).ok()?;

        let parsed = match (token, user) {
            (None, None) => {
                self.emit(DiagnosticEvent::NoStoredSession);
                return None;
            }
            (Some(_), None) => Err("token stored without identity".to_string()),
            (None, Some(_)) => Err("identity stored without token".to_string()),
            (Some(token), Some(user)) => parse_stored_session(token, &user),
        };

        match parsed {
            Ok(session) => {
                self.emit(DiagnosticEvent::SessionRestored {
                    user_id: session.identity.id.clone(),
                });
                Some(session)
            }
            Err(reason) => {
                self.emit(DiagnosticEvent::StoredSessionDiscarded { reason });
                self.clear_persisted();
                None
            }
        }
    }

    fn read_key(&self, key: &'static str) -> Result<Option<String>, StorageError> {
        self.storage.read(key).inspect_err(|err| {
            self.report_storage(StorageOp::Read, key, err);
        })
    }

    fn persist(&self, session: &Session) {
        if let Err(err) = self.storage.write(TOKEN_KEY, session.token.as_str()) {
            self.report_storage(StorageOp::Write, TOKEN_KEY, &err);
        }
        if let Err(err) = self.storage.write(USER_KEY, &session.identity.to_json()) {
            self.report_storage(StorageOp::Write, USER_KEY, &err);
        }
    }

    fn clear_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key) {
                self.report_storage(StorageOp::Remove, key, &err);
            }
        }
    }

    fn report_storage(&self, op: StorageOp, key: &'static str, err: &StorageError) {
        self.emit(DiagnosticEvent::StorageFailed {
            op,
            key,
            error: err.to_string(),
        });
    }

    fn emit(&self, event: DiagnosticEvent) {
        self.diagnostics.emit(event);
    }

    fn publish(&self) -> SessionSnapshot {
        let snapshot = self.snapshot();
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in subscribers {
            callback(&snapshot);
        }
        snapshot
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_stored_session(token: String, user: &str) -> Result<Session, String> {
    let token = AccessToken::new(token).ok_or_else(|| "stored token is blank".to_string())?;
    let identity = Identity::from_json(user).map_err(|err| err.to_string())?;
    Ok(Session { identity, token })
}

fn session_from_payload(payload: LoginPayload) -> Result<Session, String> {
    let token = AccessToken::new(payload.access_token)
        .ok_or_else(|| "login response carried a blank access token".to_string())?;
    payload.user.validate().map_err(|err| err.to_string())?;
    Ok(Session {
        identity: payload.user,
        token,
    })
}
