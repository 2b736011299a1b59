//! Notification feed for the signed-in user.
//!
//! The feed keeps the unread-first ordering on every fetch, derives the
//! unread count from its contents, and guards fetches with a generation
//! counter so a superseded response never overwrites fresher state.

mod poller;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

pub use poller::NotificationPoller;

use crate::api::{ApiResult, NotificationResource};
use crate::models::{sort_notifications, Notification, NotificationId};
use crate::sync::{Entity, Field, MutationOutcome, OptimisticCollection};

impl Entity for Notification {
    type Id = NotificationId;

    fn id(&self) -> &NotificationId {
        &self.id
    }
}

fn read_field() -> Field<Notification, bool> {
    Field::new(
        "read",
        |notification: &Notification| notification.read,
        |notification: &mut Notification, read| notification.read = read,
    )
}

/// Result of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { total: usize, unread: usize },
    /// A later fetch or local mutation superseded this response.
    Stale,
}

pub struct NotificationFeed<R> {
    resource: Arc<R>,
    items: OptimisticCollection<Notification>,
    generation: Arc<AtomicU64>,
}

impl<R> Clone for NotificationFeed<R> {
    fn clone(&self) -> Self {
        Self {
            resource: Arc::clone(&self.resource),
            items: self.items.clone(),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<R: NotificationResource> NotificationFeed<R> {
    pub fn new(resource: Arc<R>) -> Self {
        Self {
            resource,
            items: OptimisticCollection::default(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.items.snapshot()
    }

    pub fn unread_count(&self) -> usize {
        self.items.count_where(|notification| !notification.read)
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.items.subscribe()
    }

    /// Fetch and install the current page unless superseded meanwhile.
    pub async fn refresh(&self) -> ApiResult<RefreshOutcome> {
        let ticket = self.advance_generation();
        let page = self.resource.list_notifications().await?;

        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!("Discarding superseded notification fetch #{ticket}");
            return Ok(RefreshOutcome::Stale);
        }

        let mut notifications = page.notifications;
        sort_notifications(&mut notifications);
        let total = notifications.len();
        self.items.replace_all(notifications);
        let unread = self.unread_count();
        if unread != page.unread_count {
            tracing::debug!(
                "Server unread count {} differs from fetched page ({unread})",
                page.unread_count
            );
        }
        Ok(RefreshOutcome::Applied { total, unread })
    }

    pub async fn mark_read(&self, id: &NotificationId) -> MutationOutcome<Notification> {
        if self.items.get(id).is_some_and(|notification| notification.read) {
            return MutationOutcome::Skipped;
        }
        self.advance_generation();
        let resource = Arc::clone(&self.resource);
        let notification_id = id.clone();
        self.items
            .mutate_one(id, read_field(), true, || async move {
                resource.mark_read(&notification_id).await.map(|()| None)
            })
            .await
    }

    pub async fn mark_all_read(&self) -> MutationOutcome<Vec<Notification>> {
        self.advance_generation();
        let resource = Arc::clone(&self.resource);
        self.items
            .mutate_all(
                |notification| !notification.read,
                read_field(),
                true,
                || async move { resource.mark_all_read().await.map(|()| None) },
            )
            .await
    }

    pub async fn delete(&self, id: &NotificationId) -> MutationOutcome<Notification> {
        self.advance_generation();
        let resource = Arc::clone(&self.resource);
        let notification_id = id.clone();
        self.items
            .remove_one(id, || async move {
                resource.delete_notification(&notification_id).await
            })
            .await
    }

    /// Drop everything, e.g. after sign-out. In-flight fetches are discarded.
    pub fn clear(&self) {
        self.advance_generation();
        self.items.replace_all(Vec::new());
    }

    fn advance_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}
