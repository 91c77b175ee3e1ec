//! Read interface to the code-hosting service.
//!
//! The refresh pipeline only ever talks to GitLab through this trait, so
//! tests and alternative transports can stand in for `GitLabClient`.
//! Implementations are shared by every concurrent detail request of a cycle
//! and must be safe to call from many tasks at once.

use crate::error::AppError;
use crate::models::{
    ApprovalState, Discussion, MergeRequestFilters, MergeRequestSummary, PipelineRef,
    ScopeFilter, StateFilter,
};
use async_trait::async_trait;
use serde::Serialize;

/// Default page size when listing merge requests.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// GitLab's maximum page size.
pub const MAX_PER_PAGE: u32 = 100;

/// Query parameters for listing a project's merge requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeRequestsQuery {
    pub state: StateFilter,

    pub scope: ScopeFilter,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_username: Option<String>,

    /// Number of items per page (max 100). Only the first page is read.
    pub per_page: u32,

    pub order_by: &'static str,

    pub sort: &'static str,
}

impl MergeRequestsQuery {
    /// Build the list query for a filter set, most recently updated first.
    pub fn from_filters(filters: &MergeRequestFilters, per_page: u32) -> Self {
        Self {
            state: filters.state,
            scope: filters.scope,
            author_username: filters.author().map(str::to_string),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            order_by: "updated_at",
            sort: "desc",
        }
    }
}

/// The four reads a refresh cycle needs.
#[async_trait]
pub trait MergeRequestGateway: Send + Sync {
    /// List one page of a project's merge requests.
    async fn list_merge_requests(
        &self,
        project_id: i64,
        query: &MergeRequestsQuery,
    ) -> Result<Vec<MergeRequestSummary>, AppError>;

    /// Approval rules and who approved under each.
    async fn get_approval_state(
        &self,
        project_id: i64,
        mr_iid: i64,
    ) -> Result<ApprovalState, AppError>;

    /// Discussion threads on a merge request.
    async fn list_discussions(
        &self,
        project_id: i64,
        mr_iid: i64,
    ) -> Result<Vec<Discussion>, AppError>;

    /// Pipelines for a merge request, newest first.
    async fn list_pipelines(
        &self,
        project_id: i64,
        mr_iid: i64,
    ) -> Result<Vec<PipelineRef>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_from_filters() {
        let filters = MergeRequestFilters {
            state: StateFilter::All,
            scope: ScopeFilter::CreatedByMe,
            author_username: Some(String::new()),
            hide_drafts: true,
        };
        let query = MergeRequestsQuery::from_filters(&filters, 500);
        assert_eq!(query.per_page, MAX_PER_PAGE);
        assert!(query.author_username.is_none());

        let json = serde_json::to_string(&query).unwrap();
        assert!(json.contains("\"state\":\"all\""));
        assert!(json.contains("\"scope\":\"created_by_me\""));
        assert!(json.contains("\"order_by\":\"updated_at\""));
        assert!(!json.contains("author_username"));
    }
}
