//! Quality profile endpoints.

use crate::client::SonarClient;
use crate::error::ApiResult;
use crate::transport::BackendRequest;
use serde_json::Value;

/// Quality profiles API.
pub struct QualityProfilesApi<'a> {
    client: &'a SonarClient,
}

/// A profile/project pairing for one language.
#[derive(Debug, Clone)]
pub struct ProfileAssociation {
    pub language: String,
    pub project_key: String,
    pub quality_profile: String,
}

impl ProfileAssociation {
    fn request(&self, path: &str) -> BackendRequest {
        BackendRequest::post(path)
            .organization_scoped()
            .param("language", &self.language)
            .param("project", &self.project_key)
            .param("qualityProfile", &self.quality_profile)
    }
}

impl<'a> QualityProfilesApi<'a> {
    pub(crate) fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    pub async fn add_project(&self, association: &ProfileAssociation) -> ApiResult<Value> {
        let request = association.request("api/qualityprofiles/add_project");
        super::acknowledge(self.client.http.call(request).await?)
    }

    pub async fn remove_project(&self, association: &ProfileAssociation) -> ApiResult<Value> {
        let request = association.request("api/qualityprofiles/remove_project");
        super::acknowledge(self.client.http.call(request).await?)
    }

    /// Search profiles by default flag, language or project.
    pub async fn search(
        &self,
        defaults: bool,
        language: Option<&str>,
        project_key: Option<&str>,
    ) -> ApiResult<Value> {
        let request = BackendRequest::get("api/qualityprofiles/search")
            .organization_scoped()
            .param("defaults", defaults)
            .opt_param("language", language)
            .opt_param("project", project_key);
        self.client.http.get_json(request).await
    }
}
