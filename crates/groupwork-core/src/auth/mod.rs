//! Backend sign-in and session persistence.
//!
//! The client only obtains and stores a bearer token; access control is
//! enforced by the backend.

use std::fmt;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{normalize, ApiError};
use crate::models::UserId;
use crate::session::SessionContext;
use crate::util::{normalize_base_url, unix_timestamp_now};

const EXPIRY_SKEW_SECONDS: i64 = 60;
const AUTH_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Platform role, e.g. `student`, `instructor`, `admin`
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    /// Unix seconds; `None` when the backend does not report an expiry
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

impl From<ApiError> for AuthError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Http(error) => Self::Http(error),
            other => Self::Api(other.user_message()),
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Signs in against the backend and keeps the [`SessionContext`] and the
/// persisted session in step.
#[derive(Clone)]
pub struct AuthClient<S: SessionPersistence> {
    base_url: String,
    client: Client,
    store: S,
    context: SessionContext,
}

impl<S: SessionPersistence> AuthClient<S> {
    pub fn new(base_url: &str, store: S, context: SessionContext) -> AuthResult<Self> {
        let base_url = normalize_base_url(base_url).map_err(AuthError::InvalidConfiguration)?;
        Ok(Self {
            base_url,
            client: Client::builder()
                .timeout(Duration::from_secs(AUTH_HTTP_TIMEOUT_SECS))
                .build()?,
            store,
            context,
        })
    }

    /// Load the persisted session into the context, dropping it if expired.
    pub fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored_session) = self.store.load_session()? else {
            return Ok(None);
        };

        if stored_session.is_expired() {
            tracing::warn!("Persisted session expired; sign in again");
            self.store.clear_session()?;
            self.context.clear();
            return Ok(None);
        }

        self.context.set(stored_session.clone());
        Ok(Some(stored_session))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
        });
        let request = self
            .client
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&payload);
        let response = send_auth_request(request).await?;
        let session = response.into_session()?;

        self.store.save_session(&session)?;
        self.context.set(session.clone());
        Ok(session)
    }

    /// Fetch the profile of the signed-in user.
    pub async fn current_user(&self) -> AuthResult<AuthUser> {
        let token = self
            .context
            .access_token()
            .ok_or_else(|| AuthError::Api("Not signed in".to_string()))?;
        let request = self
            .client
            .get(format!("{}/api/auth/me", self.base_url))
            .bearer_auth(token);
        let response = request.header(ACCEPT, "application/json").send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        normalize::<AuthUser>(status, &body, "user")?
            .into_result()?
            .ok_or_else(|| AuthError::Api("Profile response was empty".to_string()))
    }

    /// Forget the session locally. Tokens are stateless on the backend.
    pub fn sign_out(&self) -> AuthResult<()> {
        self.store.clear_session()?;
        self.context.clear();
        Ok(())
    }
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Api("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(AuthError::Api("Password is required".to_string()));
    }
    Ok(())
}

async fn send_auth_request(request: RequestBuilder) -> AuthResult<LoginResponse> {
    let response = request.header(ACCEPT, "application/json").send().await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    normalize::<LoginResponse>(status, &body, "data")?
        .into_result()?
        .ok_or_else(|| AuthError::Api("Sign-in response was empty".to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: Option<String>,
    access_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<AuthUser>,
}

impl LoginResponse {
    fn into_session(self) -> AuthResult<AuthSession> {
        let access_token = self
            .access_token
            .or(self.token)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::Api("Sign-in response did not include a token".to_string()))?;
        let user = self
            .user
            .ok_or_else(|| AuthError::Api("Sign-in response did not include the user".to_string()))?;
        let expires_at = self.expires_at.or_else(|| {
            self.expires_in
                .map(|expires_in| unix_timestamp_now().saturating_add(expires_in))
        });

        Ok(AuthSession {
            access_token,
            expires_at,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct MemoryStore {
        session: Arc<Mutex<Option<AuthSession>>>,
    }

    impl SessionPersistence for MemoryStore {
        fn load_session(&self) -> AuthResult<Option<AuthSession>> {
            Ok(self.session.lock().unwrap().clone())
        }

        fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
            *self.session.lock().unwrap() = Some(session.clone());
            Ok(())
        }

        fn clear_session(&self) -> AuthResult<()> {
            *self.session.lock().unwrap() = None;
            Ok(())
        }
    }

    fn session(expires_at: Option<i64>) -> AuthSession {
        AuthSession {
            access_token: "secret-access-token".to_string(),
            expires_at,
            user: AuthUser {
                id: UserId::new("u-1"),
                name: Some("Sam".to_string()),
                email: None,
                role: Some("student".to_string()),
            },
        }
    }

    #[test]
    fn session_debug_redacts_token() {
        let rendered = format!("{:?}", session(None));
        assert!(!rendered.contains("secret-access-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn session_without_expiry_never_expires() {
        assert!(!session(None).is_expired());
        assert!(session(Some(0)).is_expired());
    }

    #[test]
    fn login_response_accepts_token_aliases() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"token": "abc", "expiresIn": 3600, "user": {"id": 7, "email": "s@uni.example"}}"#,
        )
        .unwrap();
        let session = response.into_session().unwrap();
        assert_eq!(session.access_token, "abc");
        assert_eq!(session.user.id.as_str(), "7");
        assert!(session.expires_at.unwrap() > unix_timestamp_now());
    }

    #[test]
    fn login_response_without_token_is_rejected() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"user": {"id": "u-1"}}"#).unwrap();
        assert!(response.into_session().is_err());
    }

    #[test]
    fn restore_session_publishes_to_context() {
        let store = MemoryStore::default();
        store.save_session(&session(None)).unwrap();
        let context = SessionContext::new();
        let client = AuthClient::new("https://api.example.com", store, context.clone()).unwrap();

        let restored = client.restore_session().unwrap();
        assert!(restored.is_some());
        assert_eq!(context.user_id(), Some(UserId::new("u-1")));
    }

    #[test]
    fn restore_session_drops_expired_session() {
        let store = MemoryStore::default();
        store.save_session(&session(Some(1))).unwrap();
        let context = SessionContext::new();
        let client =
            AuthClient::new("https://api.example.com", store.clone(), context.clone()).unwrap();

        assert!(client.restore_session().unwrap().is_none());
        assert!(store.load_session().unwrap().is_none());
        assert!(!context.is_signed_in());
    }

    #[test]
    fn sign_out_clears_store_and_context() {
        let store = MemoryStore::default();
        let context = SessionContext::with_session(session(None));
        store.save_session(&session(None)).unwrap();
        let client =
            AuthClient::new("https://api.example.com", store.clone(), context.clone()).unwrap();

        client.sign_out().unwrap();
        assert!(store.load_session().unwrap().is_none());
        assert!(!context.is_signed_in());
    }
}
