//! Merge request list filters.

use serde::{Deserialize, Serialize};

/// Which merge request states to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateFilter {
    #[default]
    Opened,
    Merged,
    Closed,
    All,
}

impl StateFilter {
    /// Value of the `state` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Merged => "merged",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// Whose merge requests to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeFilter {
    #[default]
    All,
    AssignedToMe,
    CreatedByMe,
}

impl ScopeFilter {
    /// Value of the `scope` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::AssignedToMe => "assigned_to_me",
            Self::CreatedByMe => "created_by_me",
        }
    }
}

/// Filters applied to every watched repository in a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequestFilters {
    #[serde(default)]
    pub state: StateFilter,

    #[serde(default)]
    pub scope: ScopeFilter,

    /// Only MRs by this author. Empty strings are treated as unset.
    #[serde(default)]
    pub author_username: Option<String>,

    /// Drop draft MRs before they are enriched.
    #[serde(default)]
    pub hide_drafts: bool,
}

impl MergeRequestFilters {
    /// The author filter, if set to something non-blank.
    pub fn author(&self) -> Option<&str> {
        self.author_username
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_author_is_unset() {
        let filters = MergeRequestFilters {
            author_username: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(filters.author(), None);

        let filters = MergeRequestFilters {
            author_username: Some("jane".to_string()),
            ..Default::default()
        };
        assert_eq!(filters.author(), Some("jane"));
    }

    #[test]
    fn test_filter_serialization() {
        let filters = MergeRequestFilters {
            state: StateFilter::Merged,
            scope: ScopeFilter::AssignedToMe,
            author_username: None,
            hide_drafts: true,
        };
        let json = serde_json::to_string(&filters).unwrap();
        assert!(json.contains("\"state\":\"merged\""));
        assert!(json.contains("\"scope\":\"assigned_to_me\""));
        assert!(json.contains("\"hideDrafts\":true"));
    }
}
