//! Rule endpoints.

use crate::client::SonarClient;
use crate::error::ApiResult;
use crate::pagination::PageRequest;
use crate::transport::BackendRequest;
use serde_json::Value;

/// Rules API.
pub struct RulesApi<'a> {
    client: &'a SonarClient,
}

/// Filters for `api/rules/search`.
#[derive(Debug, Clone, Default)]
pub struct RuleSearch {
    pub severities: Option<String>,
    pub statuses: Option<String>,
    pub languages: Option<String>,
    pub types: Option<String>,
}

impl<'a> RulesApi<'a> {
    pub(crate) fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    pub async fn search(&self, search: &RuleSearch, page: PageRequest) -> ApiResult<Value> {
        page.check_cap(self.client.config().max_items)?;

        let request = BackendRequest::get("api/rules/search")
            .organization_scoped()
            .opt_param("severities", search.severities.as_deref())
            .opt_param("statuses", search.statuses.as_deref())
            .opt_param("languages", search.languages.as_deref())
            .opt_param("types", search.types.as_deref());

        self.client.http.get_json(page.apply(request)).await
    }

    /// Rule details, optionally with the profiles activating it.
    pub async fn show(&self, rule_key: &str, actives: bool) -> ApiResult<Value> {
        let request = BackendRequest::get("api/rules/show")
            .organization_scoped()
            .param("key", rule_key)
            .param("actives", actives);
        self.client.http.get_json(request).await
    }
}
