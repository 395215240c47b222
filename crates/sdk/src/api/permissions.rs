//! Permission endpoints.

use crate::client::SonarClient;
use crate::error::ApiResult;
use crate::pagination::PageRequest;
use crate::transport::BackendRequest;
use serde_json::Value;

/// Who a permission is granted to or revoked from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionTarget {
    Group(String),
    User(String),
}

impl PermissionTarget {
    fn apply(&self, request: BackendRequest) -> BackendRequest {
        match self {
            Self::Group(name) => request.param("groupName", name),
            Self::User(login) => request.param("login", login),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        match self {
            Self::Group(_) => format!("api/permissions/{}_group", action),
            Self::User(_) => format!("api/permissions/{}_user", action),
        }
    }
}

/// Permissions API. A missing project key means a global permission.
pub struct PermissionsApi<'a> {
    client: &'a SonarClient,
}

impl<'a> PermissionsApi<'a> {
    pub(crate) fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    pub async fn add(
        &self,
        target: &PermissionTarget,
        permission: &str,
        project_key: Option<&str>,
    ) -> ApiResult<Value> {
        self.change("add", target, permission, project_key).await
    }

    pub async fn remove(
        &self,
        target: &PermissionTarget,
        permission: &str,
        project_key: Option<&str>,
    ) -> ApiResult<Value> {
        self.change("remove", target, permission, project_key).await
    }

    async fn change(
        &self,
        action: &str,
        target: &PermissionTarget,
        permission: &str,
        project_key: Option<&str>,
    ) -> ApiResult<Value> {
        let request = BackendRequest::post(target.endpoint(action))
            .organization_scoped()
            .param("permission", permission)
            .opt_param("projectKey", project_key);

        let response = self.client.http.call(target.apply(request)).await?;
        super::acknowledge(response)
    }

    /// Groups and their permissions.
    pub async fn groups(&self, project_key: Option<&str>, page: PageRequest) -> ApiResult<Value> {
        self.list("api/permissions/groups", project_key, page).await
    }

    /// Users and their permissions.
    pub async fn users(&self, project_key: Option<&str>, page: PageRequest) -> ApiResult<Value> {
        self.list("api/permissions/users", project_key, page).await
    }

    async fn list(
        &self,
        path: &str,
        project_key: Option<&str>,
        page: PageRequest,
    ) -> ApiResult<Value> {
        page.check_cap(self.client.config().max_items)?;

        let request = BackendRequest::get(path)
            .organization_scoped()
            .opt_param("projectKey", project_key);

        self.client.http.get_json(page.apply(request)).await
    }
}
