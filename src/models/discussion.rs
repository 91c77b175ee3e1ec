//! Discussion threads and their resolution counts.

use serde::{Deserialize, Serialize};

/// A note inside a discussion thread. Only resolution fields are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    #[serde(default)]
    pub resolvable: bool,
    #[serde(default)]
    pub resolved: Option<bool>,
}

/// A discussion thread on a merge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Discussion {
    /// A thread is resolvable if any of its notes is.
    pub fn is_resolvable(&self) -> bool {
        self.notes.iter().any(|n| n.resolvable)
    }

    /// Resolved only if every resolvable note is resolved.
    ///
    /// Vacuously true for threads without resolvable notes; callers
    /// filter on `is_resolvable` first.
    pub fn is_resolved(&self) -> bool {
        self.notes
            .iter()
            .filter(|n| n.resolvable)
            .all(|n| n.resolved == Some(true))
    }
}

/// Resolved vs. total resolvable thread counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionStats {
    pub resolved_thread_count: usize,
    pub total_resolvable_thread_count: usize,
}

impl DiscussionStats {
    /// Reduce a discussion list to counts.
    pub fn from_discussions(discussions: &[Discussion]) -> Self {
        let (resolved, total) = discussions
            .iter()
            .filter(|d| d.is_resolvable())
            .fold((0, 0), |(resolved, total), d| {
                (resolved + usize::from(d.is_resolved()), total + 1)
            });

        Self {
            resolved_thread_count: resolved,
            total_resolvable_thread_count: total,
        }
    }

    /// Whether every resolvable thread is resolved.
    pub fn all_resolved(&self) -> bool {
        self.resolved_thread_count == self.total_resolvable_thread_count
    }
}
