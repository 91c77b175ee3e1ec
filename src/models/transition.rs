//! Transitions detected between two snapshots.

use crate::models::pipeline::PipelineStatus;
use serde::Serialize;

/// A notable change to a merge request seen in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// Head pipeline status changed.
    PipelineChanged {
        mr_id: i64,
        title: String,
        old_status: PipelineStatus,
        new_status: PipelineStatus,
    },

    /// Someone approved who had not approved before.
    NewApproval {
        mr_id: i64,
        title: String,
        approver_name: String,
    },
}

impl Transition {
    /// Global ID of the merge request this transition belongs to.
    pub fn mr_id(&self) -> i64 {
        match self {
            Self::PipelineChanged { mr_id, .. } | Self::NewApproval { mr_id, .. } => *mr_id,
        }
    }

    /// Title of the merge request this transition belongs to.
    pub fn title(&self) -> &str {
        match self {
            Self::PipelineChanged { title, .. } | Self::NewApproval { title, .. } => title,
        }
    }
}
