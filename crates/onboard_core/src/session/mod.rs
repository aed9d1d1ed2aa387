//! Session store: who is logged in, and how that survives restarts.
//!
//! # Responsibility
//! - Own the identity + bearer token pair and its lifecycle.
//! - Persist the pair to durable client storage and restore it on startup.
//! - Publish snapshots to subscribers and route on logout.
//!
//! # Invariants
//! - A token is held if and only if an identity is held.
//! - `is_initializing` turns false exactly once.
//! - No failure escapes as a panic or error; everything degrades to
//!   an anonymous session.

pub mod diagnostics;
pub mod navigation;
mod state;
mod store;

pub use state::{AccessToken, Session, SessionPhase, SessionSnapshot};
pub use store::{LoginOutcome, SessionStore, SubscriptionId};
