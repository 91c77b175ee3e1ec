//! Change detection between consecutive snapshots.

use crate::models::{EnrichedMergeRequest, Snapshot, Transition};
use std::collections::{HashMap, HashSet};

/// Transitions from `previous` to `current`.
///
/// Only merge requests present in both snapshots are compared; the result
/// follows `current`'s order, pipeline change before approvals.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> Vec<Transition> {
    let previous_by_id: HashMap<i64, &EnrichedMergeRequest> =
        previous.iter().map(|mr| (mr.id(), mr)).collect();

    current
        .iter()
        .filter_map(|new| previous_by_id.get(&new.id()).map(|old| (*old, new)))
        .flat_map(|(old, new)| diff_merge_request(old, new))
        .collect()
}

fn diff_merge_request(old: &EnrichedMergeRequest, new: &EnrichedMergeRequest) -> Vec<Transition> {
    let mut transitions = Vec::new();

    let old_status = old.summary.head_pipeline.as_ref().map(|p| p.status);
    let new_status = new.summary.head_pipeline.as_ref().map(|p| p.status);
    if let (Some(old_status), Some(new_status)) = (old_status, new_status) {
        if old_status != new_status {
            transitions.push(Transition::PipelineChanged {
                mr_id: new.id(),
                title: new.summary.title.clone(),
                old_status,
                new_status,
            });
        }
    }

    // Missing previous approvals count as none
    if let Some(new_state) = &new.approval_state {
        let mut seen: HashSet<i64> = old
            .approval_state
            .iter()
            .flat_map(|state| state.approvers())
            .map(|a| a.id)
            .collect();
        for approver in new_state.approvers() {
            if seen.insert(approver.id) {
                transitions.push(Transition::NewApproval {
                    mr_id: new.id(),
                    title: new.summary.title.clone(),
                    approver_name: approver.name.clone(),
                });
            }
        }
    }

    transitions
}
