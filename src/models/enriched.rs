//! Enriched merge request: a summary plus its detail lookups.

use crate::models::approval::ApprovalState;
use crate::models::discussion::DiscussionStats;
use crate::models::merge_request::MergeRequestSummary;
use crate::models::pipeline::{PipelineRef, PipelineStatus};
use serde::Serialize;

/// One merge request as shown to the user.
///
/// Each optional field is present iff its detail request succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMergeRequest {
    pub summary: MergeRequestSummary,
    pub approval_state: Option<ApprovalState>,
    pub discussion_stats: Option<DiscussionStats>,
    pub latest_pipeline: Option<PipelineRef>,
    pub repository_display_name: String,
}

impl EnrichedMergeRequest {
    /// Global merge request ID; the identity used for diffing.
    pub fn id(&self) -> i64 {
        self.summary.id
    }

    /// Approvals received across all rules.
    pub fn total_approvals_received(&self) -> usize {
        self.approval_state
            .as_ref()
            .map_or(0, |state| state.approvers().count())
    }

    /// Largest approval count any single rule requires.
    pub fn total_approvals_required(&self) -> i64 {
        self.approval_state
            .as_ref()
            .and_then(|state| state.rules.iter().map(|r| r.approvals_required).max())
            .unwrap_or(0)
    }

    /// True when there is at least one rule and every rule is satisfied.
    pub fn is_fully_approved(&self) -> bool {
        match &self.approval_state {
            Some(state) if !state.rules.is_empty() => state.rules.iter().all(|r| r.approved),
            _ => false,
        }
    }

    /// Status of the latest pipeline, falling back to the head pipeline.
    pub fn pipeline_status(&self) -> Option<PipelineStatus> {
        self.latest_pipeline
            .as_ref()
            .or(self.summary.head_pipeline.as_ref())
            .map(|p| p.status)
    }

    /// Link to the pipeline shown for this merge request.
    pub fn pipeline_url(&self) -> Option<String> {
        match &self.latest_pipeline {
            Some(pipeline) => self
                .summary
                .project_web_url()
                .map(|project| format!("{}/-/pipelines/{}", project, pipeline.id)),
            None => self
                .summary
                .head_pipeline
                .as_ref()
                .and_then(|p| p.web_url.clone()),
        }
    }
}
