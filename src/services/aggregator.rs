//! Combine every watched repository into one snapshot.

use crate::error::AppError;
use crate::models::{EnrichedMergeRequest, MergeRequestFilters, Snapshot, WatchedRepository};
use crate::services::gateway::{MergeRequestGateway, DEFAULT_PER_PAGE};
use crate::services::repository_fetcher::fetch_repository;
use futures::future::{join_all, try_join_all};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Ordering of the combined merge request list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Most recently updated first; ties by local ID descending.
    #[default]
    RecentlyUpdated,

    /// `(iid, project_id)` descending, regardless of recency.
    LocalIdDescending,
}

/// What a cycle does when some repository cannot be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep results from healthy repositories and report the failures.
    /// The cycle only fails when every repository failed.
    #[default]
    Partial,

    /// Any failed repository fails the whole cycle.
    FailFast,
}

/// Tuning for one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateOptions {
    pub per_page: u32,
    pub sort_order: SortOrder,
    pub failure_policy: FailurePolicy,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            sort_order: SortOrder::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// A repository whose merge request list could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFailure {
    pub repository: WatchedRepository,
    pub error: AppError,
}

impl std::fmt::Display for RepositoryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.repository.display_name, self.error)
    }
}

/// Result of a successful aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub snapshot: Snapshot,

    /// Repositories skipped under `FailurePolicy::Partial`.
    pub failures: Vec<RepositoryFailure>,
}

/// Fetch every repository concurrently and build one ordered snapshot.
pub async fn aggregate<G>(
    gateway: &G,
    repositories: &[WatchedRepository],
    filters: &MergeRequestFilters,
    options: &AggregateOptions,
) -> Result<Aggregate, AppError>
where
    G: MergeRequestGateway + ?Sized,
{
    let fetches: Vec<_> = repositories
        .iter()
        .map(|repository| async move {
            fetch_repository(gateway, repository, filters, options.per_page)
                .await
                .map_err(|error| RepositoryFailure {
                    repository: repository.clone(),
                    error,
                })
        })
        .collect();

    let (lists, failures) = match options.failure_policy {
        FailurePolicy::FailFast => {
            let lists = try_join_all(fetches).await.map_err(|failure| {
                log::warn!("[aggregator] Aborting cycle, {}", failure);
                AppError::refresh(failure.repository.display_name, failure.error)
            })?;
            (lists, Vec::new())
        }
        FailurePolicy::Partial => {
            let mut lists = Vec::with_capacity(repositories.len());
            let mut failures = Vec::new();
            for result in join_all(fetches).await {
                match result {
                    Ok(list) => lists.push(list),
                    Err(failure) => {
                        log::warn!("[aggregator] Skipping repository, {}", failure);
                        failures.push(failure);
                    }
                }
            }

            if lists.is_empty() && !failures.is_empty() {
                let first = failures.remove(0);
                return Err(AppError::refresh(
                    first.repository.display_name,
                    first.error,
                ));
            }
            (lists, failures)
        }
    };

    let mut merge_requests = dedup_by_id(lists.into_iter().flatten());
    sort_merge_requests(&mut merge_requests, options.sort_order);

    log::info!(
        "[aggregator] {} MRs from {} repositories ({} failed)",
        merge_requests.len(),
        repositories.len(),
        failures.len()
    );

    Ok(Aggregate {
        snapshot: Snapshot::new(merge_requests),
        failures,
    })
}

/// Keep the first occurrence of each global ID (a project watched twice).
fn dedup_by_id(
    merge_requests: impl Iterator<Item = EnrichedMergeRequest>,
) -> Vec<EnrichedMergeRequest> {
    let mut seen = HashSet::new();
    merge_requests.filter(|mr| seen.insert(mr.id())).collect()
}

/// Sort into a total order, independent of fetch completion order.
pub fn sort_merge_requests(merge_requests: &mut [EnrichedMergeRequest], order: SortOrder) {
    match order {
        SortOrder::RecentlyUpdated => merge_requests.sort_by(|a, b| {
            b.summary
                .updated_at
                .cmp(&a.summary.updated_at)
                .then_with(|| local_id_descending(a, b))
        }),
        SortOrder::LocalIdDescending => merge_requests.sort_by(local_id_descending),
    }
}

fn local_id_descending(a: &EnrichedMergeRequest, b: &EnrichedMergeRequest) -> Ordering {
    (b.summary.iid, b.summary.project_id, b.id()).cmp(&(a.summary.iid, a.summary.project_id, a.id()))
}
