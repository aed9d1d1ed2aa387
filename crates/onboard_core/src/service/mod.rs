//! Use-case services consumed by the dashboard and task views.
//!
//! # Responsibility
//! - Load dashboard data concurrently with partial-failure tolerance.
//! - Derive progress and status statistics.
//! - Validate and forward task assignment commands.

pub mod dashboard;
pub mod stats;
pub mod task_service;
