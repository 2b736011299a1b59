//! groupwork-core - Core library for Groupwork
//!
//! Shared models, the REST resource client, and the optimistic sync stores
//! (task boards and notification feeds) used by the Groupwork interfaces.

pub mod api;
pub mod auth;
pub mod board;
pub mod config;
pub mod error;
pub mod models;
pub mod notifications;
pub mod session;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Notification, NotificationId, Task, TaskId, TaskStatus};
pub use session::SessionContext;
