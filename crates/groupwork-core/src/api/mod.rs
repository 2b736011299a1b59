//! REST resource client for the Groupwork backend.
//!
//! [`ApiClient`] is the only type here that performs I/O. The sync engine and
//! stores depend on the [`TaskResource`] and [`NotificationResource`] traits
//! so they can run against in-memory fakes.

mod envelope;
mod groups;
mod notifications;
mod tasks;

use std::future::Future;

use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use envelope::{normalize, ApiOutcome};

use crate::config::ClientConfig;
use crate::models::{
    GroupId, NewTask, NotificationId, NotificationPage, Task, TaskId, TaskStatus,
};
use crate::session::SessionContext;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Not signed in")]
    Unauthenticated,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {message} ({status})")]
    Status { status: u16, message: String },
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),
}

impl ApiError {
    /// Short message suitable for a transient user-facing notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } | Self::Rejected(message) => message.clone(),
            Self::Http(_) => "Could not reach the server".to_string(),
            other => other.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Remote task operations.
pub trait TaskResource: Send + Sync + 'static {
    fn list_by_group(&self, group_id: &GroupId)
        -> impl Future<Output = ApiResult<Vec<Task>>> + Send;

    fn get_task(&self, id: &TaskId) -> impl Future<Output = ApiResult<Task>> + Send;

    fn create_task(&self, task: &NewTask) -> impl Future<Output = ApiResult<Task>> + Send;

    /// Returns the updated record when the backend sends one, `None` when it
    /// only acknowledges success.
    fn update_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
    ) -> impl Future<Output = ApiResult<Option<Task>>> + Send;
}

/// Remote notification operations for the signed-in user.
pub trait NotificationResource: Send + Sync + 'static {
    fn list_notifications(&self) -> impl Future<Output = ApiResult<NotificationPage>> + Send;

    fn mark_read(&self, id: &NotificationId) -> impl Future<Output = ApiResult<()>> + Send;

    fn mark_all_read(&self) -> impl Future<Output = ApiResult<()>> + Send;

    fn delete_notification(&self, id: &NotificationId)
        -> impl Future<Output = ApiResult<()>> + Send;
}

/// HTTP client for the Groupwork REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: SessionContext) -> ApiResult<Self> {
        let base_url = crate::util::normalize_base_url(&config.api_base_url)
            .map_err(ApiError::InvalidConfiguration)?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            base_url,
            client,
            session,
        })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(ACCEPT, "application/json")
    }

    /// Attach the session token, send, and normalize the response.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        payload_key: &str,
    ) -> ApiResult<Option<T>> {
        let token = self
            .session
            .access_token()
            .ok_or(ApiError::Unauthenticated)?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!("API response: HTTP {status}, {} bytes", body.len());
        normalize::<T>(status, &body, payload_key)?.into_result()
    }

    /// Like [`Self::send`] but a missing payload is an error.
    async fn send_expecting<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        payload_key: &str,
    ) -> ApiResult<T> {
        self.send(request, payload_key).await?.ok_or_else(|| {
            ApiError::InvalidPayload(format!("response did not include `{payload_key}`"))
        })
    }

    /// Send a mutation whose only interesting result is success or failure.
    async fn send_ack(&self, request: RequestBuilder) -> ApiResult<()> {
        self.send::<serde::de::IgnoredAny>(request, "data")
            .await
            .map(|_| ())
    }
}

fn encode_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_rejects_invalid_base_url() {
        let config = ClientConfig {
            api_base_url: "api.example.com".to_string(),
            ..ClientConfig::default()
        };
        let error = ApiClient::new(&config, SessionContext::new()).unwrap_err();
        assert!(matches!(error, ApiError::InvalidConfiguration(_)));
    }

    #[test]
    fn client_trims_base_url() {
        let config = ClientConfig {
            api_base_url: "https://api.example.com/".to_string(),
            ..ClientConfig::default()
        };
        let client = ApiClient::new(&config, SessionContext::new()).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
    }

    #[tokio::test]
    async fn requests_without_session_fail_before_network() {
        let config = ClientConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..ClientConfig::default()
        };
        let client = ApiClient::new(&config, SessionContext::new()).unwrap();
        let error = client.mark_all_read().await.unwrap_err();
        assert!(matches!(error, ApiError::Unauthenticated));
    }

    #[test]
    fn user_message_prefers_backend_text() {
        let error = ApiError::Status {
            status: 409,
            message: "Task already completed".to_string(),
        };
        assert_eq!(error.user_message(), "Task already completed");
    }

    #[test]
    fn path_segments_are_encoded() {
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
    }
}
