//! Approval state model (`GET /projects/:id/merge_requests/:iid/approval_state`).

use serde::{Deserialize, Serialize};

/// User who approved under a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approver {
    pub id: i64,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A named approval requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    pub id: i64,
    pub name: String,
    pub approvals_required: i64,
    /// Whether this rule is satisfied.
    pub approved: bool,
    #[serde(default)]
    pub approved_by: Vec<Approver>,
}

/// Approval rules of a merge request, in GitLab's order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApprovalState {
    #[serde(default)]
    pub approval_rules_overwritten: Option<bool>,
    #[serde(default)]
    pub rules: Vec<ApprovalRule>,
}

impl ApprovalState {
    /// All approvers across every rule, in rule order.
    ///
    /// An approver satisfying several rules appears once per rule.
    pub fn approvers(&self) -> impl Iterator<Item = &Approver> {
        self.rules.iter().flat_map(|rule| rule.approved_by.iter())
    }

    /// Whether the user with the given ID approved under any rule.
    pub fn is_approved_by(&self, user_id: i64) -> bool {
        self.approvers().any(|a| a.id == user_id)
    }
}
