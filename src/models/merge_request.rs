//! Merge request model, as decoded from the GitLab API.

use crate::models::pipeline::PipelineRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a merge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeRequestState {
    Opened,
    Closed,
    Merged,
    Locked,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for MergeRequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opened => write!(f, "opened"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
            Self::Locked => write!(f, "locked"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Fine-grained merge readiness reported by GitLab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailedMergeStatus {
    Mergeable,
    Checking,
    Unchecked,
    CiMustPass,
    CiStillRunning,
    CommitsStatus,
    Conflict,
    DiscussionsNotResolved,
    DraftStatus,
    MergeRequestBlocked,
    ApprovalsSyncing,
    #[serde(rename = "blocked_status")]
    Blocked,
    JiraAssociationMissing,
    NeedRebase,
    NotOpen,
    NotApproved,
    #[serde(other)]
    Unknown,
}

impl DetailedMergeStatus {
    /// Short label for compact list rows.
    pub fn short_label(&self) -> &'static str {
        match self {
            Self::Conflict => "Conflict",
            Self::CiMustPass => "CI Required",
            Self::CiStillRunning => "CI Running",
            Self::DiscussionsNotResolved => "Discussions",
            Self::DraftStatus => "Draft",
            Self::MergeRequestBlocked | Self::Blocked => "Blocked",
            Self::Mergeable => "Ready",
            Self::Checking | Self::Unchecked => "Checking",
            Self::ApprovalsSyncing => "Syncing",
            Self::NotApproved => "Not Approved",
            Self::NotOpen => "Not Open",
            Self::CommitsStatus => "Commits",
            Self::JiraAssociationMissing => "Jira Missing",
            Self::NeedRebase => "Rebase",
            Self::Unknown => "Unknown",
        }
    }
}

/// GitLab user as embedded in merge request payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabUser {
    pub id: i64,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// One merge request from `GET /projects/:id/merge_requests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRequestSummary {
    /// Global ID, unique across projects.
    pub id: i64,

    /// Project-scoped MR number.
    pub iid: i64,

    /// GitLab project (repository) ID.
    pub project_id: i64,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    pub state: MergeRequestState,

    #[serde(default)]
    pub detailed_merge_status: Option<DetailedMergeStatus>,

    #[serde(default)]
    pub draft: bool,

    pub web_url: String,

    #[serde(default)]
    pub source_branch: String,

    #[serde(default)]
    pub target_branch: String,

    pub author: GitLabUser,

    #[serde(default)]
    pub assignees: Option<Vec<GitLabUser>>,

    #[serde(default)]
    pub reviewers: Option<Vec<GitLabUser>>,

    #[serde(default)]
    pub has_conflicts: Option<bool>,

    #[serde(default)]
    pub user_notes_count: i64,

    #[serde(default)]
    pub upvotes: i64,

    #[serde(default)]
    pub downvotes: i64,

    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub merge_when_pipeline_succeeds: bool,

    #[serde(default)]
    pub head_pipeline: Option<PipelineRef>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MergeRequestSummary {
    /// Project URL derived from the MR web URL.
    ///
    /// e.g. "https://gitlab.com/group/project/-/merge_requests/1" -> "https://gitlab.com/group/project"
    pub fn project_web_url(&self) -> Option<&str> {
        self.web_url
            .find("/-/merge_requests")
            .map(|idx| &self.web_url[..idx])
    }

    /// Check if the MR is open.
    pub fn is_open(&self) -> bool {
        self.state == MergeRequestState::Opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pipeline::PipelineStatus;

    const FULL_MR: &str = r#"{
        "id": 1,
        "iid": 42,
        "project_id": 100,
        "title": "Fix login bug",
        "description": "Fixes the login timeout issue",
        "state": "opened",
        "detailed_merge_status": "ci_still_running",
        "draft": false,
        "web_url": "https://gitlab.com/group/project/-/merge_requests/42",
        "source_branch": "fix/login-bug",
        "target_branch": "main",
        "author": {
            "id": 10,
            "name": "John Doe",
            "username": "johndoe",
            "avatar_url": null,
            "web_url": "https://gitlab.com/johndoe"
        },
        "assignees": [],
        "reviewers": [],
        "has_conflicts": false,
        "user_notes_count": 3,
        "upvotes": 1,
        "downvotes": 0,
        "labels": ["bug", "urgent"],
        "merge_when_pipeline_succeeds": false,
        "head_pipeline": {
            "id": 500,
            "status": "running",
            "web_url": "https://gitlab.com/group/project/-/pipelines/500"
        },
        "updated_at": "2024-01-15T10:30:00.000Z"
    }"#;

    #[test]
    fn test_merge_request_decoding() {
        let mr: MergeRequestSummary = serde_json::from_str(FULL_MR).unwrap();
        assert_eq!(mr.id, 1);
        assert_eq!(mr.iid, 42);
        assert_eq!(mr.project_id, 100);
        assert_eq!(mr.state, MergeRequestState::Opened);
        assert_eq!(
            mr.detailed_merge_status,
            Some(DetailedMergeStatus::CiStillRunning)
        );
        assert!(!mr.draft);
        assert_eq!(mr.source_branch, "fix/login-bug");
        assert_eq!(
            mr.head_pipeline.as_ref().map(|p| p.status),
            Some(PipelineStatus::Running)
        );
        assert_eq!(mr.labels, vec!["bug", "urgent"]);
        assert!(mr.updated_at.is_some());
    }

    #[test]
    fn test_unknown_enums_degrade() {
        let json = r#"{
            "id": 1, "iid": 1, "project_id": 1, "title": "test",
            "state": "archived", "detailed_merge_status": "future_status",
            "draft": false, "web_url": "https://example.com",
            "author": {"id": 1, "name": "test", "username": "test"}
        }"#;
        let mr: MergeRequestSummary = serde_json::from_str(json).unwrap();
        assert_eq!(mr.state, MergeRequestState::Unknown);
        assert_eq!(mr.detailed_merge_status, Some(DetailedMergeStatus::Unknown));
        assert!(mr.head_pipeline.is_none());
    }

    #[test]
    fn test_null_detailed_merge_status() {
        let json = r#"{
            "id": 1, "iid": 1, "project_id": 1, "title": "test",
            "state": "locked", "detailed_merge_status": null,
            "web_url": "https://example.com",
            "author": {"id": 1, "name": "test", "username": "test"}
        }"#;
        let mr: MergeRequestSummary = serde_json::from_str(json).unwrap();
        assert_eq!(mr.state, MergeRequestState::Locked);
        assert!(mr.detailed_merge_status.is_none());
    }

    #[test]
    fn test_project_web_url() {
        let mr: MergeRequestSummary = serde_json::from_str(FULL_MR).unwrap();
        assert_eq!(mr.project_web_url(), Some("https://gitlab.com/group/project"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(MergeRequestState::Opened.to_string(), "opened");
        assert_eq!(MergeRequestState::Merged.to_string(), "merged");
        assert_eq!(MergeRequestState::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_short_label() {
        assert_eq!(DetailedMergeStatus::Blocked.short_label(), "Blocked");
        assert_eq!(DetailedMergeStatus::Mergeable.short_label(), "Ready");
    }
}
