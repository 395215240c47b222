// MCP protocol handler: JSON-RPC methods on top of the dispatcher

use crate::dispatcher::{Dispatcher, ToolInvocation, ToolResult};
use crate::protocol::{
    negotiate_version, CallToolParams, CallToolResult, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities,
    ServerInfo, ToolContent, ToolsCapability, JSONRPC_VERSION,
};
use crate::tools::Payload;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const INSTRUCTIONS: &str = "Tools for a SonarQube server: projects, issues, hotspots, rules, \
quality gates and profiles, metrics, permissions, source code and system status. List \
endpoints are paged with page/page_size (max 20 per page).";

/// Protocol handler shared by every transport binding.
#[derive(Debug)]
pub struct McpServer {
    dispatcher: Dispatcher,
    info: ServerInfo,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            info: ServerInfo::default(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Decode one inbound frame, or produce the error reply for it.
    pub fn parse_frame(text: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e.to_string())))?;

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = serde_json::from_value(value).map_err(|e| {
            JsonRpcResponse::error(id.clone(), JsonRpcError::invalid_request(e.to_string()))
        })?;

        if request.jsonrpc != JSONRPC_VERSION {
            return Err(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(format!("unsupported jsonrpc version '{}'", request.jsonrpc)),
            ));
        }

        Ok(request)
    }

    /// Handle one request. Notifications yield `None`.
    pub async fn handle(
        &self,
        request: JsonRpcRequest,
        cancel: &CancellationToken,
    ) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            self.notification(&request);
            return None;
        };

        debug!(method = %request.method, id = %id, "Request");

        let response = match request.method.as_str() {
            "initialize" => self.initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => {
                let result = ListToolsResult {
                    tools: self.dispatcher.registry().list_schemas(),
                };
                JsonRpcResponse::from_result(id, &result)
            }
            "tools/call" => self.call_tool(id, request.params, cancel).await,
            method => {
                warn!(method = %method, "Unknown method");
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(method))
            }
        };

        Some(response)
    }

    fn notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" | "initialized" => info!("Client initialized"),
            "notifications/cancelled" => debug!("Cancellation outside a session ignored"),
            method => debug!(method = %method, "Ignoring notification"),
        }
    }

    fn initialize(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: Option<InitializeParams> = params.and_then(|p| serde_json::from_value(p).ok());
        let requested = params.as_ref().and_then(|p| p.protocol_version.as_deref());

        if let Some(client) = params.as_ref().and_then(|p| p.client_info.as_ref()) {
            info!(client = %client.name, version = %client.version, "Initialize");
        }

        let result = InitializeResult {
            protocol_version: negotiate_version(requested).to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability { list_changed: false },
            },
            server_info: self.info.clone(),
            instructions: Some(INSTRUCTIONS.to_string()),
        };
        JsonRpcResponse::from_result(id, &result)
    }

    async fn call_tool(
        &self,
        id: Value,
        params: Option<Value>,
        cancel: &CancellationToken,
    ) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params(e.to_string()))
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("tools/call requires a tool name"),
                )
            }
        };

        let invocation = ToolInvocation::new(
            params.name,
            params.arguments.unwrap_or(Value::Null),
            id.clone(),
        );
        let result = self.dispatcher.dispatch_with_cancel(&invocation, cancel).await;

        JsonRpcResponse::from_result(id, &call_result(result))
    }
}

/// Render a tool outcome for the agent. Failures are tool results with
/// `isError`, never protocol errors.
pub fn call_result(result: ToolResult) -> CallToolResult {
    match result {
        ToolResult::Success(Payload::Json(value)) => {
            let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            CallToolResult {
                content: vec![ToolContent::text(text)],
                structured_content: value.is_object().then_some(value),
                is_error: None,
            }
        }
        ToolResult::Success(Payload::Text(text)) => CallToolResult {
            content: vec![ToolContent::text(text)],
            structured_content: None,
            is_error: None,
        },
        ToolResult::Failure(failure) => CallToolResult {
            content: vec![ToolContent::text(format!("{}: {}", failure.kind, failure.message))],
            structured_content: serde_json::to_value(&failure).ok(),
            is_error: Some(true),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::LATEST_PROTOCOL_VERSION;
    use crate::tools::ToolRegistry;
    use sonarqube_sdk::SonarClient;
    use std::sync::Arc;
    use wiremock::matchers::{any, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn server_for(mock: &MockServer) -> McpServer {
        let client = SonarClient::builder()
            .base_url(mock.uri())
            .build()
            .unwrap();
        McpServer::new(Dispatcher::new(
            Arc::new(ToolRegistry::with_catalog().unwrap()),
            client,
        ))
    }

    fn request(id: i64, method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest::new(id, method, params)
    }

    #[tokio::test]
    async fn test_initialize() {
        let mock = MockServer::start().await;
        let response = server_for(&mock)
            .handle(
                request(1, "initialize", json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test", "version": "1.0"}
                })),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], json!("2024-11-05"));
        assert_eq!(result["serverInfo"]["name"], json!("sonarqube-mcp"));
        assert_eq!(result["capabilities"]["tools"]["listChanged"], json!(false));
    }

    #[tokio::test]
    async fn test_initialize_without_params() {
        let mock = MockServer::start().await;
        let response = server_for(&mock)
            .handle(
                JsonRpcRequest {
                    jsonrpc: "2.0".to_string(),
                    id: Some(json!(1)),
                    method: "initialize".to_string(),
                    params: None,
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.result.unwrap()["protocolVersion"],
            json!(LATEST_PROTOCOL_VERSION)
        );
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let mock = MockServer::start().await;
        let server = server_for(&mock);
        let cancel = CancellationToken::new();

        for method in ["notifications/initialized", "notifications/cancelled", "whatever"] {
            let frame = JsonRpcRequest::notification(method, json!({}));
            assert!(server.handle(frame, &cancel).await.is_none());
        }
    }

    #[tokio::test]
    async fn test_tools_list_is_sorted() {
        let mock = MockServer::start().await;
        let response = server_for(&mock)
            .handle(request(2, "tools/list", json!({})), &CancellationToken::new())
            .await
            .unwrap();

        let result: ListToolsResult = serde_json::from_value(response.result.unwrap()).unwrap();
        let names: Vec<_> = result.tools.iter().map(|t| t.name.clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"get_system_status".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mock = MockServer::start().await;
        let response = server_for(&mock)
            .handle(request(3, "resources/list", json!({})), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_a_tool_error() {
        let mock = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock)
            .await;

        let response = server_for(&mock)
            .handle(
                request(4, "tools/call", json!({"name": "drop_database", "arguments": {}})),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(response.id, json!(4));
        let result = response.result.unwrap();
        assert_eq!(result["isError"], json!(true));
        assert_eq!(result["structuredContent"]["kind"], json!("UnknownTool"));
    }

    #[tokio::test]
    async fn test_call_tool_success() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/system/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "UP", "version": "10.6"})))
            .mount(&mock)
            .await;

        let response = server_for(&mock)
            .handle(
                request(5, "tools/call", json!({"name": "get_system_status"})),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let result: CallToolResult = serde_json::from_value(response.result.unwrap()).unwrap();
        assert_eq!(result.is_error, None);
        assert_eq!(result.structured_content, Some(json!({"status": "UP", "version": "10.6"})));
    }

    #[tokio::test]
    async fn test_call_tool_without_params() {
        let mock = MockServer::start().await;
        let response = server_for(&mock)
            .handle(
                JsonRpcRequest {
                    jsonrpc: "2.0".to_string(),
                    id: Some(json!(6)),
                    method: "tools/call".to_string(),
                    params: None,
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[test]
    fn test_parse_frame_errors() {
        let err = McpServer::parse_frame("{not json").unwrap_err();
        assert_eq!(err.id, Value::Null);
        assert_eq!(err.error.unwrap().code, JsonRpcError::PARSE_ERROR);

        let err = McpServer::parse_frame(r#"{"jsonrpc": "2.0", "id": 9}"#).unwrap_err();
        assert_eq!(err.id, json!(9));
        assert_eq!(err.error.unwrap().code, JsonRpcError::INVALID_REQUEST);

        let err = McpServer::parse_frame(r#"{"jsonrpc": "1.0", "id": 9, "method": "ping"}"#)
            .unwrap_err();
        assert_eq!(err.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[test]
    fn test_text_payload_has_no_structured_content() {
        let result = call_result(ToolResult::Success(Payload::Text("pong".to_string())));
        assert_eq!(result.content[0].as_text(), "pong");
        assert!(result.structured_content.is_none());
    }
}
