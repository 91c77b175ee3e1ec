//! MR Status - live merge request status across watched GitLab projects.
//!
//! A background [`Poller`](services::Poller) periodically lists the merge
//! requests of every watched project, enriches each one with approvals,
//! discussion and pipeline details, and publishes an ordered
//! [`Snapshot`](models::Snapshot). Consecutive snapshots are diffed into
//! [`Transition`](models::Transition)s for notifications.

pub mod error;
pub mod models;
pub mod services;
pub mod settings;
