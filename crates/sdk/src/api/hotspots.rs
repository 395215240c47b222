//! Security hotspot endpoints.

use crate::client::SonarClient;
use crate::error::ApiResult;
use crate::pagination::PageRequest;
use crate::transport::BackendRequest;
use serde_json::Value;

/// Hotspots API.
pub struct HotspotsApi<'a> {
    client: &'a SonarClient,
}

/// Filters for `api/hotspots/search`.
#[derive(Debug, Clone, Default)]
pub struct HotspotSearch {
    pub project_key: String,
    pub file_paths: Option<String>,
    pub only_mine: Option<bool>,
    pub resolution: Option<String>,
    pub status: Option<String>,
}

impl<'a> HotspotsApi<'a> {
    pub(crate) fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    /// Search the hotspots of a project.
    pub async fn search(&self, search: &HotspotSearch, page: PageRequest) -> ApiResult<Value> {
        page.check_cap(self.client.config().max_items)?;

        let request = BackendRequest::get("api/hotspots/search")
            .param("project", &search.project_key)
            .opt_param("files", search.file_paths.as_deref())
            .opt_param("onlyMine", search.only_mine)
            .opt_param("resolution", search.resolution.as_deref())
            .opt_param("status", search.status.as_deref());

        self.client.http.get_json(page.apply(request)).await
    }

    /// Details of a single hotspot.
    pub async fn show(&self, hotspot_key: &str) -> ApiResult<Value> {
        self.client
            .http
            .get_json(BackendRequest::get("api/hotspots/show").param("hotspot", hotspot_key))
            .await
    }
}
