//! Groups, members, and the backend's contribution analytics.

use serde::{Deserialize, Serialize};

use super::{GroupId, UserId};

/// Lightweight reference to a platform user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserRef {
    /// Name for display, falling back to email and then id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or_else(|| self.id.as_str())
    }
}

/// A student project group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub members: Vec<UserRef>,
}

/// Per-member contribution analytics computed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberContribution {
    pub user: UserRef,
    pub score: f64,
    #[serde(default)]
    pub tasks_assigned: u32,
    #[serde(default)]
    pub tasks_completed: u32,
    #[serde(default, alias = "isFreeRider")]
    pub free_rider: bool,
}

/// Contribution report for one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionReport {
    pub group_id: GroupId,
    #[serde(default)]
    pub members: Vec<MemberContribution>,
}

impl ContributionReport {
    /// Members the backend flagged as free riders.
    pub fn free_riders(&self) -> impl Iterator<Item = &MemberContribution> {
        self.members.iter().filter(|member| member.free_rider)
    }
}
