use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use groupwork_core::api::NotificationResource;
use groupwork_core::models::{Notification, NotificationId};
use groupwork_core::notifications::{NotificationFeed, NotificationPoller};
use groupwork_core::SessionContext;

use crate::cli::NotificationCommands;
use crate::commands::common::{
    format_notification_line, format_notification_lines, normalize_identifier,
    open_signed_in_workspace, print_json, settle, NotificationListItem,
};
use crate::error::CliError;

pub async fn run_notifications(
    command: NotificationCommands,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let workspace = open_signed_in_workspace(global_profile)?;
    let feed = NotificationFeed::new(Arc::clone(&workspace.api));

    match command {
        NotificationCommands::List {
            unread,
            limit,
            json,
        } => {
            feed.refresh().await?;
            let notifications = select_notifications(feed.notifications(), unread, limit);
            let now = Utc::now();

            if json {
                let items: Vec<_> = notifications
                    .iter()
                    .map(|notification| NotificationListItem::from_notification(notification, now))
                    .collect();
                return print_json(&items);
            }

            println!("{} unread", feed.unread_count());
            for line in format_notification_lines(&notifications, now) {
                println!("{line}");
            }
            Ok(())
        }
        NotificationCommands::Read { id } => {
            let id = load_and_find(&feed, &id).await?;
            let changed = settle(feed.mark_read(&id).await, "mark notification as read")?;
            if changed {
                println!("Marked notification {id} as read ({} unread)", feed.unread_count());
            } else {
                println!("Notification {id} was already read");
            }
            Ok(())
        }
        NotificationCommands::ReadAll => {
            feed.refresh().await?;
            let pending = feed.unread_count();
            settle(feed.mark_all_read().await, "mark notifications as read")?;
            println!("Marked {pending} notification(s) as read");
            Ok(())
        }
        NotificationCommands::Delete { id } => {
            let id = load_and_find(&feed, &id).await?;
            settle(feed.delete(&id).await, "delete notification")?;
            println!("Deleted notification {id}");
            Ok(())
        }
        NotificationCommands::Watch { interval } => {
            let every = interval.map_or_else(|| workspace.config.poll_interval(), Duration::from_secs);
            if every.is_zero() {
                return Err(CliError::InvalidInput(
                    "Poll interval must be at least one second".to_string(),
                ));
            }
            watch(feed, &workspace.session, every).await
        }
    }
}

/// Fetch the feed and check the notification exists before mutating it.
async fn load_and_find<R: NotificationResource>(
    feed: &NotificationFeed<R>,
    raw_id: &str,
) -> Result<NotificationId, CliError> {
    let id = NotificationId::new(normalize_identifier(raw_id, "Notification ID")?);
    feed.refresh().await?;
    if feed
        .notifications()
        .iter()
        .any(|notification| notification.id == id)
    {
        Ok(id)
    } else {
        Err(CliError::NotFound(format!("notification {id}")))
    }
}

pub fn select_notifications(
    notifications: Vec<Notification>,
    unread_only: bool,
    limit: usize,
) -> Vec<Notification> {
    notifications
        .into_iter()
        .filter(|notification| !unread_only || !notification.read)
        .take(limit)
        .collect()
}

/// Notifications in `current` whose ids are not in `seen`; marks them seen.
pub fn take_new_notifications(
    seen: &mut HashSet<NotificationId>,
    current: &[Notification],
) -> Vec<Notification> {
    current
        .iter()
        .filter(|notification| seen.insert(notification.id.clone()))
        .cloned()
        .collect()
}

async fn watch<R: NotificationResource>(
    feed: NotificationFeed<R>,
    session: &SessionContext,
    every: Duration,
) -> Result<(), CliError> {
    let mut updates = feed.subscribe();
    let poller = NotificationPoller::spawn(feed.clone(), session, every);
    let mut seen = HashSet::new();
    let mut primed = false;
    println!("Watching notifications every {}s (Ctrl+C to stop)", every.as_secs());

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = updates.borrow_and_update().clone();
                let fresh = take_new_notifications(&mut seen, &current);
                if !primed {
                    primed = true;
                    println!("{} unread", feed.unread_count());
                    continue;
                }
                let now = Utc::now();
                for notification in fresh {
                    println!("{}", format_notification_line(&notification, now));
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    poller.stop();
    Ok(())
}
