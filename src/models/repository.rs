//! Watched repository model.

use serde::{Deserialize, Serialize};

/// A GitLab project whose merge requests are polled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedRepository {
    /// GitLab project ID.
    pub project_id: i64,

    /// Name shown next to each merge request.
    pub display_name: String,
}

impl WatchedRepository {
    pub fn new(project_id: i64, display_name: impl Into<String>) -> Self {
        Self {
            project_id,
            display_name: display_name.into(),
        }
    }
}

impl std::fmt::Display for WatchedRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (#{})", self.display_name, self.project_id)
    }
}
