//! Issue endpoints.

use crate::client::SonarClient;
use crate::error::ApiResult;
use crate::pagination::{PageRequest, Pages, AGGREGATION_PAGE_SIZE};
use crate::transport::BackendRequest;
use serde_json::Value;

/// Issues API.
pub struct IssuesApi<'a> {
    client: &'a SonarClient,
}

/// Filters for `api/issues/search`. Multi-valued filters are
/// comma-separated, as the Web API expects them.
#[derive(Debug, Clone, Default)]
pub struct IssueSearch {
    pub additional_fields: Option<String>,
    pub assigned: Option<bool>,
    pub assignees: Option<String>,
    pub authors: Option<String>,
    pub components: Option<String>,
    pub issue_statuses: Option<String>,
    pub issues: Option<String>,
    pub resolutions: Option<String>,
    pub resolved: Option<bool>,
    pub scopes: Option<String>,
    pub severities: Option<String>,
    pub tags: Option<String>,
    pub types: Option<String>,
}

impl IssueSearch {
    fn request(&self) -> BackendRequest {
        BackendRequest::get("api/issues/search")
            .organization_scoped()
            .opt_param("additionalFields", self.additional_fields.as_deref())
            .opt_param("assigned", self.assigned)
            .opt_param("assignees", self.assignees.as_deref())
            .opt_param("author", self.authors.as_deref())
            .opt_param("components", self.components.as_deref())
            .opt_param("issueStatuses", self.issue_statuses.as_deref())
            .opt_param("issues", self.issues.as_deref())
            .opt_param("resolutions", self.resolutions.as_deref())
            .opt_param("resolved", self.resolved)
            .opt_param("scopes", self.scopes.as_deref())
            .opt_param("severities", self.severities.as_deref())
            .opt_param("tags", self.tags.as_deref())
            .opt_param("types", self.types.as_deref())
    }
}

impl<'a> IssuesApi<'a> {
    pub(crate) fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    /// One page of matching issues.
    pub async fn search(&self, search: &IssueSearch, page: PageRequest) -> ApiResult<Value> {
        page.check_cap(self.client.config().max_items)?;
        self.client.http.get_json(page.apply(search.request())).await
    }

    /// Every matching issue, up to the configured item cap.
    pub async fn search_all(&self, search: &IssueSearch) -> ApiResult<Value> {
        Pages::new(
            self.client.http.clone(),
            search.request(),
            "issues",
            AGGREGATION_PAGE_SIZE,
        )
        .collect_json(self.client.config().max_items)
        .await
    }

    /// SCM authors of issues, optionally limited to one project.
    pub async fn authors(&self, project_key: Option<&str>, page: PageRequest) -> ApiResult<Value> {
        page.check_cap(self.client.config().max_items)?;

        let request = BackendRequest::get("api/issues/authors")
            .organization_scoped()
            .opt_param("project", project_key);

        self.client.http.get_json(page.apply(request)).await
    }
}
