//! Fetch and enrich the merge requests of one watched repository.

use crate::error::AppError;
use crate::models::{EnrichedMergeRequest, MergeRequestFilters, WatchedRepository};
use crate::services::enricher::enrich;
use crate::services::gateway::{MergeRequestGateway, MergeRequestsQuery};
use futures::future::join_all;

/// List a repository's merge requests and enrich each of them concurrently.
///
/// Drafts are dropped before enrichment when `filters.hide_drafts` is set.
/// A failure listing the merge requests is returned as-is; failures while
/// enriching are absorbed by the enricher.
pub async fn fetch_repository<G>(
    gateway: &G,
    repository: &WatchedRepository,
    filters: &MergeRequestFilters,
    per_page: u32,
) -> Result<Vec<EnrichedMergeRequest>, AppError>
where
    G: MergeRequestGateway + ?Sized,
{
    let query = MergeRequestsQuery::from_filters(filters, per_page);
    let mut mrs = gateway
        .list_merge_requests(repository.project_id, &query)
        .await?;

    let listed = mrs.len();
    if filters.hide_drafts {
        mrs.retain(|mr| !mr.draft);
    }

    log::debug!(
        "[fetcher] {}: {} MRs listed, {} to enrich",
        repository,
        listed,
        mrs.len()
    );

    let enriched = join_all(
        mrs.into_iter()
            .map(|mr| enrich(gateway, mr, &repository.display_name)),
    )
    .await;

    Ok(enriched)
}
