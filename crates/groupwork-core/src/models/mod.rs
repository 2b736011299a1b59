//! Data models for Groupwork

mod group;
mod id;
mod notification;
mod task;

pub use group::{ContributionReport, Group, MemberContribution, UserRef};
pub use id::{GroupId, NotificationId, TaskId, UserId};
pub use notification::{sort_notifications, Notification, NotificationPage};
pub use task::{NewTask, Task, TaskStatus, UnknownTaskStatus};
