//! Route targets and the guards that pick them.

use super::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    AdminDashboard,
    EmployeeDashboard,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::AdminDashboard => "/admin/dashboard",
            Self::EmployeeDashboard => "/employee/dashboard",
        }
    }
}

/// Imperative "go to this view" capability supplied by the UI shell.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Landing route for the home view.
///
/// `None` while the session is still being restored.
pub fn resolve_home_route(snapshot: &SessionSnapshot) -> Option<Route> {
    if snapshot.is_initializing {
        return None;
    }
    Some(match snapshot.identity() {
        None => Route::Login,
        Some(identity) if identity.is_admin() => Route::AdminDashboard,
        Some(_) => Route::EmployeeDashboard,
    })
}

/// Route actually allowed for a request to `requested`.
pub fn guard_route(snapshot: &SessionSnapshot, requested: Route) -> Route {
    match (requested, snapshot.identity()) {
        (Route::Login, _) => Route::Login,
        (_, None) => Route::Login,
        (Route::AdminDashboard, Some(identity)) if !identity.is_admin() => {
            Route::EmployeeDashboard
        }
        (route, Some(_)) => route,
    }
}

/// Navigates to the guarded route; returns where the caller ended up.
pub fn enter_route(
    snapshot: &SessionSnapshot,
    requested: Route,
    navigator: &dyn Navigator,
) -> Route {
    let allowed = guard_route(snapshot, requested);
    if allowed != requested {
        navigator.navigate(allowed);
    }
    allowed
}

#[cfg(test)]
mod tests {
    use super::{enter_route, guard_route, resolve_home_route, Navigator, Route};
    use crate::model::identity::{Identity, Role};
    use crate::session::{AccessToken, Session, SessionPhase, SessionSnapshot};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNavigator {
        routes: Mutex<Vec<Route>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, route: Route) {
            self.routes.lock().expect("navigator lock").push(route);
        }
    }

    fn snapshot(role: Option<Role>, is_initializing: bool) -> SessionSnapshot {
        let session = role.map(|role| Session {
            identity: Identity {
                id: "7".to_string(),
                name: "Dana".to_string(),
                email: "dana@corp.io".to_string(),
                phone: None,
                role,
                start_date: None,
            },
            token: AccessToken::new("tok").expect("non-blank token"),
        });
        let phase = match (&session, is_initializing) {
            (_, true) => SessionPhase::Initializing,
            (Some(_), false) => SessionPhase::Authenticated,
            (None, false) => SessionPhase::Anonymous,
        };
        SessionSnapshot {
            phase,
            session,
            is_initializing,
            is_busy: false,
        }
    }

    #[test]
    fn home_route_waits_for_initialization_then_routes_by_role() {
        assert_eq!(resolve_home_route(&snapshot(None, true)), None);
        assert_eq!(resolve_home_route(&snapshot(None, false)), Some(Route::Login));
        assert_eq!(
            resolve_home_route(&snapshot(Some(Role::Admin), false)),
            Some(Route::AdminDashboard)
        );
        assert_eq!(
            resolve_home_route(&snapshot(Some(Role::User), false)),
            Some(Route::EmployeeDashboard)
        );
    }

    #[test]
    fn guard_route_blocks_anonymous_and_non_admin_access() {
        let anonymous = snapshot(None, false);
        assert_eq!(guard_route(&anonymous, Route::EmployeeDashboard), Route::Login);
        let employee = snapshot(Some(Role::User), false);
        assert_eq!(
            guard_route(&employee, Route::AdminDashboard),
            Route::EmployeeDashboard
        );
        let admin = snapshot(Some(Role::Admin), false);
        assert_eq!(guard_route(&admin, Route::EmployeeDashboard), Route::EmployeeDashboard);
    }

    #[test]
    fn enter_route_only_navigates_on_redirect() {
        let navigator = RecordingNavigator::default();
        let admin = snapshot(Some(Role::Admin), false);
        assert_eq!(
            enter_route(&admin, Route::AdminDashboard, &navigator),
            Route::AdminDashboard
        );
        assert!(navigator.routes.lock().expect("lock").is_empty());

        let anonymous = snapshot(None, false);
        assert_eq!(
            enter_route(&anonymous, Route::AdminDashboard, &navigator),
            Route::Login
        );
        assert_eq!(*navigator.routes.lock().expect("lock"), vec![Route::Login]);
    }
}
