//! Quality gate endpoints.

use crate::client::SonarClient;
use crate::error::ApiResult;
use crate::transport::BackendRequest;
use serde_json::Value;

/// Quality gates API.
pub struct QualityGatesApi<'a> {
    client: &'a SonarClient,
}

/// Target of `api/qualitygates/project_status`. The backend requires exactly
/// one of `project_key` and `analysis_id`.
#[derive(Debug, Clone, Default)]
pub struct GateStatusQuery {
    pub project_key: Option<String>,
    pub analysis_id: Option<String>,
    pub branch: Option<String>,
    pub pull_request: Option<String>,
}

impl<'a> QualityGatesApi<'a> {
    pub(crate) fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Value> {
        self.client
            .http
            .get_json(BackendRequest::get("api/qualitygates/list").organization_scoped())
            .await
    }

    /// Conditions of one gate.
    pub async fn show(&self, name: &str) -> ApiResult<Value> {
        let request = BackendRequest::get("api/qualitygates/show")
            .organization_scoped()
            .param("name", name);
        self.client.http.get_json(request).await
    }

    /// Gate status of a project, branch, pull request or analysis.
    pub async fn project_status(&self, query: &GateStatusQuery) -> ApiResult<Value> {
        let request = BackendRequest::get("api/qualitygates/project_status")
            .organization_scoped()
            .opt_param("projectKey", query.project_key.as_deref())
            .opt_param("analysisId", query.analysis_id.as_deref())
            .opt_param("branch", query.branch.as_deref())
            .opt_param("pullRequest", query.pull_request.as_deref());
        self.client.http.get_json(request).await
    }

    /// Associate a project with a gate.
    pub async fn select(&self, gate_name: &str, project_key: &str) -> ApiResult<Value> {
        let request = BackendRequest::post("api/qualitygates/select")
            .organization_scoped()
            .param("gateName", gate_name)
            .param("projectKey", project_key);
        super::acknowledge(self.client.http.call(request).await?)
    }

    /// Put a project back on the default gate.
    pub async fn deselect(&self, project_key: &str) -> ApiResult<Value> {
        let request = BackendRequest::post("api/qualitygates/deselect")
            .organization_scoped()
            .param("projectKey", project_key);
        super::acknowledge(self.client.http.call(request).await?)
    }
}
