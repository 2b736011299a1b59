use reqwest::Method;

use super::{encode_segment, ApiClient, ApiResult, TaskResource};
use crate::models::{GroupId, NewTask, Task, TaskId, TaskStatus};

impl TaskResource for ApiClient {
    async fn list_by_group(&self, group_id: &GroupId) -> ApiResult<Vec<Task>> {
        let path = format!("/api/groups/{}/tasks", encode_segment(group_id.as_str()));
        Ok(self
            .send(self.request(Method::GET, &path), "tasks")
            .await?
            .unwrap_or_default())
    }

    async fn get_task(&self, id: &TaskId) -> ApiResult<Task> {
        let path = format!("/api/tasks/{}", encode_segment(id.as_str()));
        self.send_expecting(self.request(Method::GET, &path), "task")
            .await
    }

    async fn create_task(&self, task: &NewTask) -> ApiResult<Task> {
        let request = self.request(Method::POST, "/api/tasks").json(task);
        self.send_expecting(request, "task").await
    }

    async fn update_status(&self, id: &TaskId, status: TaskStatus) -> ApiResult<Option<Task>> {
        let path = format!("/api/tasks/{}/status", encode_segment(id.as_str()));
        let request = self
            .request(Method::PATCH, &path)
            .json(&serde_json::json!({ "status": status }));
        self.send(request, "task").await
    }
}
