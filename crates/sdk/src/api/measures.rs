//! Measure endpoints.

use crate::client::SonarClient;
use crate::error::ApiResult;
use crate::transport::BackendRequest;
use serde_json::Value;

/// Measures API.
pub struct MeasuresApi<'a> {
    client: &'a SonarClient,
}

impl<'a> MeasuresApi<'a> {
    pub(crate) fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    /// Current values of the given metrics on a component.
    pub async fn component(&self, component: &str, metric_keys: &[String]) -> ApiResult<Value> {
        let request = BackendRequest::get("api/measures/component")
            .param("component", component)
            .param("metricKeys", metric_keys.join(","));

        self.client.http.get_json(request).await
    }
}
