//! Records exchanged with the onboarding API and held by the client.
//!
//! # Responsibility
//! - Define the session identity and the transient view models.
//! - Own wire naming (camelCase keys, lowercase enum values).
//!
//! # Invariants
//! - An `Identity` used for a session has passed `Identity::validate()`.
//! - View models are shape-mapped server data; the client never owns them.

pub mod form;
pub mod identity;
pub mod task;
