//! Periodic notification refresh tied to the session identity.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::NotificationFeed;
use crate::api::NotificationResource;
use crate::auth::AuthSession;
use crate::models::UserId;
use crate::session::SessionContext;

/// Shortest interval accepted; `tokio::time::interval` panics on zero.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that keeps a [`NotificationFeed`] fresh.
///
/// Polling runs only while a user is signed in: it fetches immediately when
/// an identity appears, then on every interval tick. Sign-out stops the
/// interval and clears the feed. Dropping the poller aborts the task.
#[derive(Debug)]
pub struct NotificationPoller {
    handle: JoinHandle<()>,
}

impl NotificationPoller {
    pub fn spawn<R: NotificationResource>(
        feed: NotificationFeed<R>,
        session: &SessionContext,
        every: Duration,
    ) -> Self {
        if every < MIN_POLL_INTERVAL {
            tracing::warn!("Poll interval {every:?} is too short; using {MIN_POLL_INTERVAL:?}");
        }
        let every = every.max(MIN_POLL_INTERVAL);
        let handle = tokio::spawn(poll_loop(feed, session.subscribe(), every));
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn signed_in_user(session: &mut watch::Receiver<Option<AuthSession>>) -> Option<UserId> {
    session
        .borrow_and_update()
        .as_ref()
        .map(|session| session.user.id.clone())
}

async fn poll_loop<R: NotificationResource>(
    feed: NotificationFeed<R>,
    mut session: watch::Receiver<Option<AuthSession>>,
    every: Duration,
) {
    loop {
        let Some(user_id) = signed_in_user(&mut session) else {
            if session.changed().await.is_err() {
                return;
            }
            continue;
        };

        tracing::info!("Polling notifications for user {user_id} every {every:?}");
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(error) = feed.refresh().await {
                        tracing::warn!("Notification refresh failed: {error}");
                    }
                }
                changed = session.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let current = signed_in_user(&mut session);
                    if current.as_ref() == Some(&user_id) {
                        continue;
                    }
                    tracing::info!("Stopping notification polling for user {user_id}");
                    feed.clear();
                    break;
                }
            }
        }
    }
}
