//! Snapshot: the ordered result of one refresh cycle.

use crate::models::enriched::EnrichedMergeRequest;
use crate::models::pipeline::PipelineStatus;
use serde::Serialize;

/// Overall pipeline health of a snapshot, for a status icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotHealth {
    /// No merge requests.
    Empty,
    /// At least one head pipeline failed.
    Failing,
    /// No failures, at least one head pipeline running or pending.
    Running,
    Passing,
}

/// Immutable, ordered list of enriched merge requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    merge_requests: Vec<EnrichedMergeRequest>,
}

impl Snapshot {
    /// Wrap an already ordered list.
    pub fn new(merge_requests: Vec<EnrichedMergeRequest>) -> Self {
        Self { merge_requests }
    }

    pub fn len(&self) -> usize {
        self.merge_requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merge_requests.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnrichedMergeRequest> {
        self.merge_requests.iter()
    }

    pub fn as_slice(&self) -> &[EnrichedMergeRequest] {
        &self.merge_requests
    }

    /// Look up a merge request by global ID.
    pub fn get(&self, id: i64) -> Option<&EnrichedMergeRequest> {
        self.merge_requests.iter().find(|mr| mr.id() == id)
    }

    /// Merge requests whose title contains `query`, ignoring case.
    ///
    /// An empty query matches everything.
    pub fn filter_by_title(&self, query: &str) -> Vec<&EnrichedMergeRequest> {
        let needle = query.to_lowercase();
        self.merge_requests
            .iter()
            .filter(|mr| needle.is_empty() || mr.summary.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Summarize head pipeline statuses.
    pub fn health(&self) -> SnapshotHealth {
        if self.is_empty() {
            return SnapshotHealth::Empty;
        }

        let statuses: Vec<PipelineStatus> = self
            .merge_requests
            .iter()
            .filter_map(|mr| mr.summary.head_pipeline.as_ref().map(|p| p.status))
            .collect();

        if statuses.contains(&PipelineStatus::Failed) {
            SnapshotHealth::Failing
        } else if statuses
            .iter()
            .any(|s| matches!(s, PipelineStatus::Running | PipelineStatus::Pending))
        {
            SnapshotHealth::Running
        } else {
            SnapshotHealth::Passing
        }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a EnrichedMergeRequest;
    type IntoIter = std::slice::Iter<'a, EnrichedMergeRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.merge_requests.iter()
    }
}
