//! Per-merge-request enrichment.
//!
//! Issues the approval, discussion and pipeline reads for one merge request
//! concurrently. Failures are logged and leave the corresponding field
//! empty; enrichment itself never fails.

use crate::error::AppError;
use crate::models::{DiscussionStats, EnrichedMergeRequest, MergeRequestSummary};
use crate::services::gateway::MergeRequestGateway;

/// Enrich one merge request.
pub async fn enrich<G>(
    gateway: &G,
    summary: MergeRequestSummary,
    repository_display_name: &str,
) -> EnrichedMergeRequest
where
    G: MergeRequestGateway + ?Sized,
{
    let (project_id, iid) = (summary.project_id, summary.iid);

    let (approval, discussions, pipelines) = tokio::join!(
        gateway.get_approval_state(project_id, iid),
        gateway.list_discussions(project_id, iid),
        gateway.list_pipelines(project_id, iid),
    );

    let approval_state = non_critical(approval, "approval state", &summary);

    let discussion_stats = non_critical(discussions, "discussions", &summary)
        .map(|discussions| DiscussionStats::from_discussions(&discussions));

    // Pipelines come back newest first. An empty list falls back to the
    // head pipeline; a failed request leaves the field empty.
    let latest_pipeline = non_critical(pipelines, "pipelines", &summary).and_then(|pipelines| {
        pipelines
            .into_iter()
            .next()
            .or_else(|| summary.head_pipeline.clone())
    });

    EnrichedMergeRequest {
        summary,
        approval_state,
        discussion_stats,
        latest_pipeline,
        repository_display_name: repository_display_name.to_string(),
    }
}

/// Non-critical - log and continue.
fn non_critical<T>(
    result: Result<T, AppError>,
    what: &str,
    summary: &MergeRequestSummary,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!(
                "[enricher] Failed to fetch {} for MR !{} (project {}): {}",
                what,
                summary.iid,
                summary.project_id,
                e
            );
            None
        }
    }
}
