//! Data models for the application.
//!
//! Records decoded from the GitLab API, plus the values derived from them
//! each refresh cycle. Every externally defined closed set decodes with an
//! explicit `Unknown` fallback so new server-side values never fail a cycle.

pub mod approval;
pub mod discussion;
pub mod enriched;
pub mod filters;
pub mod merge_request;
pub mod pipeline;
pub mod repository;
pub mod snapshot;
pub mod transition;

// Re-exports for convenient access
pub use approval::{ApprovalRule, ApprovalState, Approver};
pub use discussion::{Discussion, DiscussionStats, Note};
pub use enriched::EnrichedMergeRequest;
pub use filters::{MergeRequestFilters, ScopeFilter, StateFilter};
pub use merge_request::{DetailedMergeStatus, GitLabUser, MergeRequestState, MergeRequestSummary};
pub use pipeline::{PipelineRef, PipelineStatus};
pub use repository::WatchedRepository;
pub use snapshot::{Snapshot, SnapshotHealth};
pub use transition::Transition;
