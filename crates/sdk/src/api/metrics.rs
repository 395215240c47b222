//! Metric endpoints.

use crate::client::SonarClient;
use crate::error::ApiResult;
use crate::pagination::PageRequest;
use crate::transport::BackendRequest;
use serde_json::Value;

/// Metrics API.
pub struct MetricsApi<'a> {
    client: &'a SonarClient,
}

impl<'a> MetricsApi<'a> {
    pub(crate) fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    /// Supported metric value types (INT, FLOAT, ...).
    pub async fn types(&self) -> ApiResult<Value> {
        self.client
            .http
            .get_json(BackendRequest::get("api/metrics/types"))
            .await
    }

    /// One page of metric definitions.
    pub async fn search(&self, page: PageRequest) -> ApiResult<Value> {
        page.check_cap(self.client.config().max_items)?;
        self.client
            .http
            .get_json(page.apply(BackendRequest::get("api/metrics/search")))
            .await
    }
}
