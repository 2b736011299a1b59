use reqwest::Method;

use super::{encode_segment, ApiClient, ApiResult};
use crate::models::{ContributionReport, Group, GroupId};

impl ApiClient {
    /// Groups the signed-in user belongs to.
    pub async fn list_groups(&self) -> ApiResult<Vec<Group>> {
        Ok(self
            .send(self.request(Method::GET, "/api/groups"), "groups")
            .await?
            .unwrap_or_default())
    }

    /// Backend-computed contribution scores and free-rider flags.
    pub async fn contributions(&self, group_id: &GroupId) -> ApiResult<ContributionReport> {
        let path = format!(
            "/api/groups/{}/contributions",
            encode_segment(group_id.as_str())
        );
        self.send_expecting(self.request(Method::GET, &path), "report")
            .await
    }
}
