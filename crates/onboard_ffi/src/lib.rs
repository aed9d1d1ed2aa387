//! Flutter-facing bindings for the onboarding client core.

pub mod api;
