//! HTTP transport layer for the SonarQube SDK.

use crate::config::{AuthMode, ConfigError, SonarConfig};
use crate::error::{ApiError, ApiResult};
use reqwest::{header, Client, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("sonarqube-sdk/", env!("CARGO_PKG_VERSION"));

/// HTTP verb of a backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One request against the Web API. Parameters go to the query string for
/// `GET` and to a form body for `POST`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    /// Whether the endpoint accepts the `organization` parameter.
    pub organization_scoped: bool,
}

impl BackendRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            organization_scoped: false,
        }
    }

    /// Add a parameter.
    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a parameter when a value is present.
    pub fn opt_param<V: ToString>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    /// Mark the endpoint as accepting the configured organization.
    pub fn organization_scoped(mut self) -> Self {
        self.organization_scoped = true;
        self
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|(key, _)| key == name)
    }
}

/// Decoded body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Empty,
}

/// A successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl BackendResponse {
    /// The JSON body; an empty body yields `null`.
    pub fn into_json(self) -> ApiResult<Value> {
        match self.body {
            ResponseBody::Json(value) => Ok(value),
            ResponseBody::Empty => Ok(Value::Null),
            ResponseBody::Text(_) => Err(ApiError::BackendUnavailable {
                status: Some(self.status),
                message: "expected a JSON response".to_string(),
            }),
        }
    }

    /// The body as text, whatever its content type.
    pub fn into_text(self) -> String {
        match self.body {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) => text,
            ResponseBody::Empty => String::new(),
        }
    }
}

/// HTTP transport for making authenticated API requests.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<SonarConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<SonarConfig>) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SonarConfig {
        &self.config
    }

    /// Build a URL for the given path.
    fn build_url(&self, path: &str) -> ApiResult<Url> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidRequest {
                status: 400,
                messages: vec![format!("invalid path '{}': {}", path, e)],
            })
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.auth {
            AuthMode::Token(token) => builder.basic_auth(token, Some("")),
            AuthMode::Basic { username, password } => builder.basic_auth(username, Some(password)),
            AuthMode::None => builder,
        }
    }

    /// Execute one request. No retries: callers decide whether an
    /// operation is safe to repeat.
    pub async fn call(&self, request: BackendRequest) -> ApiResult<BackendResponse> {
        let url = self.build_url(&request.path)?;

        let mut params = request.params;
        if request.organization_scoped && !params.iter().any(|(key, _)| key == "organization") {
            if let Some(ref organization) = self.config.organization {
                params.push(("organization".to_string(), organization.clone()));
            }
        }

        debug!(method = ?request.method, url = %url, params = params.len(), "Backend request");

        let builder = match request.method {
            Method::Get => self.client.get(url.clone()).query(&params),
            Method::Post => self.client.post(url.clone()).form(&params),
        };

        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| {
                let error = ApiError::from_transport(&e, self.config.timeout);
                warn!(url = %url, error = %error, "Backend request failed");
                error
            })?;

        let status = response.status().as_u16();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("json"))
            .unwrap_or(false);

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(&e, self.config.timeout))?;

        if !(200..300).contains(&status) {
            let error = ApiError::from_response(status, &text);
            warn!(url = %url, status = status, kind = %error.kind(), "Backend returned an error");
            return Err(error);
        }

        let body = if text.trim().is_empty() {
            ResponseBody::Empty
        } else if is_json {
            let value = serde_json::from_str(&text).map_err(|e| ApiError::BackendUnavailable {
                status: Some(status),
                message: format!("malformed JSON response: {}", e),
            })?;
            ResponseBody::Json(value)
        } else {
            ResponseBody::Text(text)
        };

        debug!(url = %url, status = status, "Backend response");
        Ok(BackendResponse { status, body })
    }

    /// Execute a request and decode its JSON body.
    pub async fn get_json(&self, request: BackendRequest) -> ApiResult<Value> {
        self.call(request).await?.into_json()
    }

    /// Execute a request and return its body as text.
    pub async fn get_text(&self, request: BackendRequest) -> ApiResult<String> {
        Ok(self.call(request).await?.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorKind;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{basic_auth, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_config(base_url: &str) -> SonarConfig {
        SonarConfig::new(Url::parse(base_url).unwrap())
    }

    fn transport(config: SonarConfig) -> HttpTransport {
        HttpTransport::new(Arc::new(config)).unwrap()
    }

    #[tokio::test]
    async fn test_get_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/system/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "UP"})))
            .mount(&server)
            .await;

        let transport = transport(create_config(&server.uri()));
        let body = transport
            .get_json(BackendRequest::get("/api/system/status"))
            .await
            .unwrap();
        assert_eq!(body["status"], "UP");
    }

    #[tokio::test]
    async fn test_token_is_sent_as_basic_user() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects/search"))
            .and(basic_auth("squ_token", ""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"components": []})))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = create_config(&server.uri());
        config.auth = AuthMode::Token("squ_token".to_string());

        transport(config)
            .get_json(BackendRequest::get("api/projects/search"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_basic_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(basic_auth("admin", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = create_config(&server.uri());
        config.auth = AuthMode::Basic {
            username: "admin".to_string(),
            password: "secret".to_string(),
        };

        transport(config)
            .get_json(BackendRequest::get("/api/rules/search"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_organization_only_on_scoped_requests() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/issues/search"))
            .and(query_param("organization", "acme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"issues": []})))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = create_config(&server.uri());
        config.organization = Some("acme".to_string());
        let transport = transport(config);

        transport
            .get_json(BackendRequest::get("/api/issues/search").organization_scoped())
            .await
            .unwrap();

        // Unscoped endpoint is not matched by the organization mock.
        let err = transport
            .get_json(BackendRequest::get("/api/issues/search"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_post_sends_form_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/permissions/add_user"))
            .and(body_string_contains("login=jdoe"))
            .and(body_string_contains("permission=scan"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport(create_config(&server.uri()))
            .call(
                BackendRequest::post("/api/permissions/add_user")
                    .param("login", "jdoe")
                    .param("permission", "scan"),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 204);
        assert_eq!(response.body, ResponseBody::Empty);
    }

    #[tokio::test]
    async fn test_text_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/sources/raw"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .set_body_string("fn main() {}\n"),
            )
            .mount(&server)
            .await;

        let text = transport(create_config(&server.uri()))
            .get_text(BackendRequest::get("/api/sources/raw").param("key", "demo:src/main.rs"))
            .await
            .unwrap();
        assert_eq!(text, "fn main() {}\n");
    }

    #[tokio::test]
    async fn test_error_classification() {
        let server = MockServer::start().await;

        Mock::given(path("/api/unauthorized"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(path("/api/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"errors": [{"msg": "Project 'nope' not found"}]})),
            )
            .mount(&server)
            .await;
        Mock::given(path("/api/bad"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"errors": [{"msg": "Value of parameter 'ps' (900) must be less than 500"}]})),
            )
            .mount(&server)
            .await;
        Mock::given(path("/api/broken"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = transport(create_config(&server.uri()));

        let err = transport.call(BackendRequest::get("/api/unauthorized")).await.unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::AuthError);

        let err = transport.call(BackendRequest::get("/api/missing")).await.unwrap_err();
        assert_eq!(err, ApiError::NotFound { message: "Project 'nope' not found".to_string() });

        let err = transport.call(BackendRequest::get("/api/bad")).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::InvalidRequest {
                status: 400,
                messages: vec!["Value of parameter 'ps' (900) must be less than 500".to_string()],
            }
        );

        let err = transport.call(BackendRequest::get("/api/broken")).await.unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;

        Mock::given(path("/api/system/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "UP"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let mut config = create_config(&server.uri());
        config.timeout = Duration::from_millis(50);

        let err = transport(config)
            .call(BackendRequest::get("/api/system/status"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let err = transport(create_config("http://127.0.0.1:1"))
            .call(BackendRequest::get("/api/system/status"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::BackendUnavailable);
    }

    #[test]
    fn test_build_url_under_context_path() {
        let transport = transport(create_config("http://localhost:9000/sonar"));

        let url = transport.build_url("/api/rules/show").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/sonar/api/rules/show");
    }
}
