//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `onboard_core` linkage independently from the UI shell.
//! - Report the session a UI shell would restore from the configured storage.

use onboard_core::{
    init_logging_from_config, resolve_home_route, ClientConfig, HttpApiClient,
    LogDiagnosticSink, Navigator, Route, SessionStore, SqliteSessionStorage,
};
use std::process::ExitCode;
use std::sync::Arc;

/// The probe never navigates; it only prints where a shell would go.
struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, route: Route) {
        println!("navigate={}", route.path());
    }
}

fn main() -> ExitCode {
    println!("onboard_core ping={}", onboard_core::ping());
    println!("onboard_core version={}", onboard_core::core_version());

    match probe_session() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error={message}");
            ExitCode::FAILURE
        }
    }
}

fn probe_session() -> Result<(), String> {
    let config = ClientConfig::from_env().map_err(|err| err.to_string())?;
    println!("api_base_url={}", config.api_base_url);
    println!("db_path={}", config.db_path.display());
    match init_logging_from_config(&config) {
        Ok(()) => println!("log_dir={}", config.log_dir.display()),
        Err(err) => eprintln!("logging=disabled error={err}"),
    }

    let storage = SqliteSessionStorage::open(&config.db_path).map_err(|err| err.to_string())?;
    let api = HttpApiClient::from_config(&config).map_err(|err| err.to_string())?;
    let store = SessionStore::new(
        storage,
        api,
        Arc::new(PrintNavigator),
        Arc::new(LogDiagnosticSink),
    );

    let snapshot = store.initialize();
    println!("session_phase={}", snapshot.phase.as_str());
    if let Some(identity) = snapshot.identity() {
        println!("session_user={} role={}", identity.id, identity.role.as_str());
    }
    if let Some(route) = resolve_home_route(&snapshot) {
        println!("home_route={}", route.path());
    }
    Ok(())
}
