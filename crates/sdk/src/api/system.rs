//! System endpoints and the connectivity probe.

use crate::client::SonarClient;
use crate::error::{ApiErrorKind, ApiResult};
use crate::transport::BackendRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// System API.
pub struct SystemApi<'a> {
    client: &'a SonarClient,
}

impl<'a> SystemApi<'a> {
    pub(crate) fn new(client: &'a SonarClient) -> Self {
        Self { client }
    }

    /// Server state and version. Usually allowed anonymously.
    pub async fn status(&self) -> ApiResult<Value> {
        self.client
            .http
            .get_json(BackendRequest::get("api/system/status"))
            .await
    }

    /// Health of the server nodes. Requires system administration rights.
    pub async fn health(&self) -> ApiResult<Value> {
        self.client
            .http
            .get_json(BackendRequest::get("api/system/health"))
            .await
    }

    /// Plain-text liveness answer ("pong").
    pub async fn ping(&self) -> ApiResult<String> {
        self.client
            .http
            .get_text(BackendRequest::get("api/system/ping"))
            .await
    }

    /// Probe the server once and describe the outcome without exposing
    /// credential values.
    pub async fn probe(&self) -> ConnectivityReport {
        let config = self.client.config();
        let mut report = ConnectivityReport {
            base_url: config.display_url(),
            auth_mode: config.auth.name().to_string(),
            organization: config.organization.clone(),
            reachable: false,
            server_status: None,
            server_version: None,
            error: None,
        };

        match self.status().await {
            Ok(body) => {
                report.reachable = true;
                report.server_status = body.get("status").and_then(Value::as_str).map(str::to_string);
                report.server_version = body.get("version").and_then(Value::as_str).map(str::to_string);
            }
            Err(e) => {
                // A rejected credential still means the server answered
                report.reachable = e.kind() == ApiErrorKind::AuthError;
                report.error = Some(format!("{}: {}", e.kind(), e));
            }
        }

        report
    }
}

/// Outcome of the connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityReport {
    pub base_url: String,
    pub auth_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectivityReport {
    /// Reachable and the credentials were accepted.
    pub fn is_ok(&self) -> bool {
        self.reachable && self.error.is_none()
    }
}
