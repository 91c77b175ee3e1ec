//! Pipeline model.

use serde::{Deserialize, Serialize};

/// Status of a GitLab pipeline.
///
/// Statuses added by newer GitLab versions decode as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Created,
    WaitingForResource,
    Waiting,
    Preparing,
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
    #[serde(other)]
    Unknown,
}

impl PipelineStatus {
    /// Human-readable label, as shown in notifications.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Success => "Passed",
            Self::Failed => "Failed",
            Self::Running => "Running",
            Self::Pending => "Pending",
            Self::Canceled => "Canceled",
            Self::Manual => "Manual",
            Self::Created => "Created",
            Self::WaitingForResource | Self::Waiting => "Waiting",
            Self::Preparing => "Preparing",
            Self::Skipped => "Skipped",
            Self::Scheduled => "Scheduled",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the pipeline has not finished yet.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            Self::Created
                | Self::WaitingForResource
                | Self::Waiting
                | Self::Preparing
                | Self::Pending
                | Self::Running
        )
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Reference to a pipeline.
///
/// Used both for the `head_pipeline` embedded in a merge request and for
/// entries of `GET /projects/:id/merge_requests/:iid/pipelines`, which
/// share these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRef {
    pub id: i64,
    pub status: PipelineStatus,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default, rename = "ref")]
    pub ref_name: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}
