use reqwest::Method;

use super::{encode_segment, ApiClient, ApiResult, NotificationResource};
use crate::models::{NotificationId, NotificationPage};

impl NotificationResource for ApiClient {
    async fn list_notifications(&self) -> ApiResult<NotificationPage> {
        Ok(self
            .send(self.request(Method::GET, "/api/notifications"), "data")
            .await?
            .unwrap_or_default())
    }

    async fn mark_read(&self, id: &NotificationId) -> ApiResult<()> {
        let path = format!("/api/notifications/{}/read", encode_segment(id.as_str()));
        self.send_ack(self.request(Method::PATCH, &path)).await
    }

    async fn mark_all_read(&self) -> ApiResult<()> {
        self.send_ack(self.request(Method::PATCH, "/api/notifications/read-all"))
            .await
    }

    async fn delete_notification(&self, id: &NotificationId) -> ApiResult<()> {
        let path = format!("/api/notifications/{}", encode_segment(id.as_str()));
        self.send_ack(self.request(Method::DELETE, &path)).await
    }
}
