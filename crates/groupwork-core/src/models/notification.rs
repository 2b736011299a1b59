//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NotificationId, UserId};

/// A notification addressed to the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(alias = "recipientId")]
    pub user_id: UserId,
    #[serde(alias = "isRead")]
    pub read: bool,
    pub created_at: DateTime<Utc>,
    /// Classification tag, e.g. `TASK_ASSIGNED` or `PEER_REVIEW_DUE`
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(default, alias = "data")]
    pub payload: Option<serde_json::Value>,
    #[serde(default)]
    pub link: Option<String>,
}

/// One fetch of the current user's notifications
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub unread_count: usize,
}

/// Sort unread before read, then newest first.
pub fn sort_notifications(notifications: &mut [Notification]) {
    notifications.sort_by(|a, b| {
        a.read
            .cmp(&b.read)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
