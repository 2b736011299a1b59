//! Process-wide session context.
//!
//! Every store and client reads the signed-in identity through one
//! [`SessionContext`]; clones share the same channel, so all readers see the
//! same value at the same time.

use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::AuthSession;
use crate::models::UserId;

#[derive(Debug, Clone)]
pub struct SessionContext {
    state: Arc<watch::Sender<Option<AuthSession>>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    #[must_use]
    pub fn with_session(session: AuthSession) -> Self {
        let context = Self::new();
        context.set(session);
        context
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.state.borrow().clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.state
            .borrow()
            .as_ref()
            .map(|session| session.user.id.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.state
            .borrow()
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Receiver notified on every sign-in, switch, or sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.state.subscribe()
    }

    pub fn set(&self, session: AuthSession) {
        tracing::debug!("Session set for user {}", session.user.id);
        self.state.send_replace(Some(session));
    }

    pub fn clear(&self) {
        if self.state.send_replace(None).is_some() {
            tracing::debug!("Session cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;

    fn session(user: &str) -> AuthSession {
        AuthSession {
            access_token: format!("token-{user}"),
            expires_at: None,
            user: AuthUser {
                id: UserId::new(user),
                name: None,
                email: None,
                role: None,
            },
        }
    }

    #[test]
    fn clones_observe_the_same_identity() {
        let context = SessionContext::new();
        let reader = context.clone();
        assert!(!reader.is_signed_in());

        context.set(session("u-1"));
        assert_eq!(reader.user_id(), Some(UserId::new("u-1")));
        assert_eq!(reader.access_token().as_deref(), Some("token-u-1"));

        reader.clear();
        assert!(context.current().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_sign_out() {
        let context = SessionContext::with_session(session("u-1"));
        let mut receiver = context.subscribe();
        context.clear();
        receiver.changed().await.unwrap();
        assert!(receiver.borrow().is_none());
    }
}
