use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use groupwork_core::api::ApiClient;
use groupwork_core::config::ClientConfig;
use groupwork_core::models::{Notification, Task, TaskStatus};
use groupwork_core::sync::MutationOutcome;
use groupwork_core::SessionContext;
use serde::Serialize;

use crate::auth::{CliAuthClient, SessionStore};
use crate::config_profiles::ProfileFile;
use crate::error::CliError;

const PREVIEW_CHARS: usize = 60;

/// Everything a command needs to talk to the backend for one profile.
pub struct Workspace {
    pub profile_name: String,
    pub config: ClientConfig,
    pub session: SessionContext,
    pub api: Arc<ApiClient>,
    pub auth: CliAuthClient,
}

impl Workspace {
    pub fn require_session(&self) -> Result<(), CliError> {
        if self.session.is_signed_in() {
            Ok(())
        } else {
            Err(CliError::NotSignedIn)
        }
    }
}

/// Resolve the profile, build the clients, and restore any stored session.
pub fn open_workspace(global_profile: Option<&str>) -> Result<Workspace, CliError> {
    let profiles = ProfileFile::load()?;
    let profile_name = profiles.resolve_profile_name(global_profile);
    let config = profiles.client_config(&profile_name)?;

    let session = SessionContext::new();
    let auth = CliAuthClient::new(
        &config.api_base_url,
        SessionStore::new(&profile_name),
        session.clone(),
    )?;
    if auth.restore_session()?.is_some() {
        tracing::debug!("Restored session for profile '{profile_name}'");
    }
    let api = Arc::new(ApiClient::new(&config, session.clone())?);

    Ok(Workspace {
        profile_name,
        config,
        session,
        api,
        auth,
    })
}

/// Like [`open_workspace`], but fails unless a session was restored.
pub fn open_signed_in_workspace(global_profile: Option<&str>) -> Result<Workspace, CliError> {
    let workspace = open_workspace(global_profile)?;
    workspace.require_session()?;
    Ok(workspace)
}

#[derive(Debug, Serialize)]
pub struct TaskListItem {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub column: &'static str,
    pub assignee: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub overdue: bool,
}

impl TaskListItem {
    pub fn from_task(task: &Task, now: DateTime<Utc>) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title.clone(),
            status: task.status,
            column: task.status.column_id(),
            assignee: task
                .assignee
                .as_ref()
                .map(|assignee| assignee.display_name().to_string()),
            due_date: task.due_date,
            overdue: task.is_overdue(now),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationListItem {
    pub id: String,
    pub kind: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub relative_time: String,
    pub link: Option<String>,
    pub payload: Option<serde_json::Value>,
}

impl NotificationListItem {
    pub fn from_notification(notification: &Notification, now: DateTime<Utc>) -> Self {
        Self {
            id: notification.id.to_string(),
            kind: notification.kind.clone(),
            read: notification.read,
            created_at: notification.created_at,
            relative_time: format_relative_time(notification.created_at, now),
            link: notification.link.clone(),
            payload: notification.payload.clone(),
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn format_task_lines(tasks: &[Task], now: DateTime<Utc>) -> Vec<String> {
    tasks.iter().map(|task| format_task_line(task, now)).collect()
}

pub fn format_task_line(task: &Task, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "{:<8} [{}] {}",
        task.id,
        task.status.column_id(),
        preview(&task.title, PREVIEW_CHARS)
    );
    if let Some(assignee) = &task.assignee {
        line.push_str(&format!("  @{}", assignee.display_name()));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {}", due.format("%Y-%m-%d")));
        if task.is_overdue(now) {
            line.push_str(" (overdue)");
        }
    }
    line
}

pub fn format_notification_lines(
    notifications: &[Notification],
    now: DateTime<Utc>,
) -> Vec<String> {
    notifications
        .iter()
        .map(|notification| format_notification_line(notification, now))
        .collect()
}

pub fn format_notification_line(notification: &Notification, now: DateTime<Utc>) -> String {
    let marker = if notification.read { ' ' } else { '*' };
    let mut line = format!(
        "{marker} {:<8} {:<20} {}",
        notification.id,
        notification.kind,
        format_relative_time(notification.created_at, now)
    );
    if let Some(summary) = notification_summary(notification) {
        line.push_str("  ");
        line.push_str(&preview(&summary, PREVIEW_CHARS));
    }
    line
}

/// Human-readable text carried in the payload, if any.
pub fn notification_summary(notification: &Notification) -> Option<String> {
    let payload = notification.payload.as_ref()?;
    if let Some(text) = payload.as_str() {
        return Some(text.to_string());
    }
    ["message", "title", "taskTitle"]
        .iter()
        .find_map(|key| payload.get(key).and_then(serde_json::Value::as_str))
        .map(str::to_string)
}

pub fn preview(text: &str, max_chars: usize) -> String {
    let compact = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() <= max_chars {
        return compact;
    }
    let truncated: String = compact.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{truncated}...")
}

pub fn format_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 1 {
        "just now".to_string()
    } else if hours < 1 {
        format!("{minutes}m ago")
    } else if days < 1 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else if days < 30 {
        format!("{}w ago", days / 7)
    } else if days < 365 {
        format!("{}mo ago", days / 30)
    } else {
        format!("{}y ago", days / 365)
    }
}

pub fn normalize_identifier(raw: &str, label: &'static str) -> Result<String, CliError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyIdentifier(label));
    }
    Ok(trimmed.to_string())
}

pub fn parse_status(raw: &str) -> Result<TaskStatus, CliError> {
    raw.parse::<TaskStatus>()
        .map_err(|error| CliError::InvalidInput(format!("{error} (expected todo, in-progress, or done)")))
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, CliError> {
    let trimmed = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| {
            CliError::InvalidInput(format!(
                "Invalid due date '{trimmed}' (expected YYYY-MM-DD or RFC 3339)"
            ))
        })
}

/// Map a mutation outcome to whether anything changed, surfacing rollbacks as errors.
pub fn settle<T>(outcome: MutationOutcome<T>, action: &str) -> Result<bool, CliError> {
    match outcome {
        MutationOutcome::Skipped => Ok(false),
        MutationOutcome::Confirmed | MutationOutcome::Reconciled(_) => Ok(true),
        MutationOutcome::RolledBack(error) => Err(CliError::MutationFailed(format!(
            "Could not {action}: {}",
            error.user_message()
        ))),
    }
}
