//! Project and analysis endpoints.

use crate::client::SonarClient;
use crate::error::ApiResult;
use crate::pagination::{PageRequest, Pages, AGGREGATION_PAGE_SIZE};
use crate::transport::BackendRequest;
use serde_json::Value;

/// Projects API.
pub struct ProjectsApi<'a> {
    client: &'a SonarClient,
}

/// Parameters of `api/projects/create`.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub key: String,
    pub main_branch: String,
    pub new_code_definition_type: Option<String>,
    pub new_code_definition_value: Option<String>,
}

/// Filters for `api/projects/search`.
#[derive(Debug, Clone, Default)]
pub struct ProjectSearch {
    pub projects: Option<String>,
    pub search: Option<String>,
    pub analyzed_before: Option<String>,
}

impl ProjectSearch {
    fn request(&self) -> BackendRequest {
        BackendRequest::get("api/projects/search")
            .organization_scoped()
            .opt_param("projects", self.projects.as_deref())
            .opt_param("q", self.search.as_deref())
            .opt_param("analyzedBefore", self.analyzed_before.as_deref())
    }
}

impl<'a> ProjectsApi<'a> {
    pub(crate) fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    /// Create a project. Not idempotent.
    pub async fn create(&self, project: &NewProject) -> ApiResult<Value> {
        let request = BackendRequest::post("api/projects/create")
            .organization_scoped()
            .param("name", &project.name)
            .param("project", &project.key)
            .param("mainBranch", &project.main_branch)
            .opt_param("newCodeDefinitionType", project.new_code_definition_type.as_deref())
            .opt_param("newCodeDefinitionValue", project.new_code_definition_value.as_deref());

        let response = self.client.http.call(request).await?;
        super::acknowledge(response)
    }

    /// One page of projects.
    pub async fn search(&self, search: &ProjectSearch, page: PageRequest) -> ApiResult<Value> {
        page.check_cap(self.client.config().max_items)?;
        self.client.http.get_json(page.apply(search.request())).await
    }

    /// Every matching project, up to the configured item cap.
    pub async fn search_all(&self, search: &ProjectSearch) -> ApiResult<Value> {
        Pages::new(
            self.client.http.clone(),
            search.request(),
            "components",
            AGGREGATION_PAGE_SIZE,
        )
        .collect_json(self.client.config().max_items)
        .await
    }

    /// Projects the authenticated user administers.
    pub async fn mine(&self, page: PageRequest) -> ApiResult<Value> {
        page.check_cap(self.client.config().max_items)?;
        self.client
            .http
            .get_json(page.apply(BackendRequest::get("api/projects/search_my_projects")))
            .await
    }

    /// Projects the authenticated user may analyze.
    pub async fn scannable(&self, search: Option<&str>) -> ApiResult<Value> {
        let request =
            BackendRequest::get("api/projects/search_my_scannable_projects").opt_param("q", search);
        self.client.http.get_json(request).await
    }

    /// Analyses of a project, optionally filtered by event category.
    pub async fn analyses(
        &self,
        project_key: &str,
        category: Option<&str>,
        page: PageRequest,
    ) -> ApiResult<Value> {
        page.check_cap(self.client.config().max_items)?;

        let request = BackendRequest::get("api/project_analyses/search")
            .param("project", project_key)
            .opt_param("category", category);

        self.client.http.get_json(page.apply(request)).await
    }
}
