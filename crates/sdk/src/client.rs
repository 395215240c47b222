//! Main client for the SonarQube SDK.

use crate::api::*;
use crate::config::{
    parse_base_url, AuthMode, ConfigError, SonarConfig, DEFAULT_MAX_ITEMS, DEFAULT_TIMEOUT_SECS,
};
use crate::transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;

/// Client for the SonarQube Web API.
///
/// Cheap to clone; clones share the configuration and the connection pool.
#[derive(Debug, Clone)]
pub struct SonarClient {
    config: Arc<SonarConfig>,
    pub(crate) http: HttpTransport,
}

impl SonarClient {
    /// Create a new client builder.
    pub fn builder() -> SonarClientBuilder {
        SonarClientBuilder::new()
    }

    /// Create a client from a resolved configuration.
    pub fn from_config(config: SonarConfig) -> Result<Self, ConfigError> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &SonarConfig {
        &self.config
    }

    /// Raw transport, for endpoints without a dedicated API.
    pub fn transport(&self) -> &HttpTransport {
        &self.http
    }

    pub fn hotspots(&self) -> HotspotsApi<'_> {
        HotspotsApi::new(self)
    }

    pub fn issues(&self) -> IssuesApi<'_> {
        IssuesApi::new(self)
    }

    pub fn measures(&self) -> MeasuresApi<'_> {
        MeasuresApi::new(self)
    }

    pub fn metrics(&self) -> MetricsApi<'_> {
        MetricsApi::new(self)
    }

    pub fn permissions(&self) -> PermissionsApi<'_> {
        PermissionsApi::new(self)
    }

    pub fn projects(&self) -> ProjectsApi<'_> {
        ProjectsApi::new(self)
    }

    pub fn quality_gates(&self) -> QualityGatesApi<'_> {
        QualityGatesApi::new(self)
    }

    pub fn quality_profiles(&self) -> QualityProfilesApi<'_> {
        QualityProfilesApi::new(self)
    }

    pub fn rules(&self) -> RulesApi<'_> {
        RulesApi::new(self)
    }

    pub fn sources(&self) -> SourcesApi<'_> {
        SourcesApi::new(self)
    }

    pub fn system(&self) -> SystemApi<'_> {
        SystemApi::new(self)
    }

    /// Issue one status request and report reachability.
    pub async fn check_connectivity(&self) -> ConnectivityReport {
        self.system().probe().await
    }
}

/// Builder for creating a SonarClient.
pub struct SonarClientBuilder {
    base_url: Option<String>,
    auth: AuthMode,
    organization: Option<String>,
    timeout: Duration,
    max_items: usize,
}

impl SonarClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            auth: AuthMode::None,
            organization: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    /// Set the base URL of the SonarQube server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Authenticate with a user token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMode::Token(token.into());
        self
    }

    /// Authenticate with login and password.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = AuthMode::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<SonarClient, ConfigError> {
        let base_url_str = self.base_url.ok_or_else(|| ConfigError::InvalidUrl {
            url: String::new(),
            reason: "base_url is required".to_string(),
        })?;

        let base_url = parse_base_url(&base_url_str)?;

        let mut config = SonarConfig::new(base_url);
        config.auth = self.auth;
        config.organization = self.organization;
        config.timeout = self.timeout;
        config.max_items = self.max_items;

        SonarClient::from_config(config)
    }
}

impl Default for SonarClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
