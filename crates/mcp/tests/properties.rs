//! End-to-end properties of the registry, dispatcher and sessions against a
//! mocked SonarQube server.

use serde_json::{json, Value};
use sonarqube_mcp::tools::{catalog, FieldKind, ParamSchema, SystemTool};
use sonarqube_mcp::{
    Dispatcher, FailureKind, McpServer, Payload, RegistryError, Session, ToolDefinition,
    ToolInvocation, ToolKind, ToolRegistry, ToolResult,
};
use sonarqube_sdk::{ApiErrorKind, AuthMode, ConfigError, SonarClient, SonarConfig};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

fn dispatcher_for(server: &MockServer) -> Dispatcher {
    let client = SonarClient::builder()
        .base_url(server.uri())
        .token("squ_test")
        .build()
        .unwrap();
    Dispatcher::new(Arc::new(ToolRegistry::with_catalog().unwrap()), client)
}

/// Passes only for requests carrying no credential.
struct Anonymous;

impl Match for Anonymous {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

#[test]
fn lookup_returns_the_registered_definition() {
    let mut registry = ToolRegistry::new();
    let definitions = catalog();
    for definition in &definitions {
        registry.register(definition.clone()).unwrap();
    }

    for definition in &definitions {
        let found = registry.lookup(&definition.name).unwrap();
        assert_eq!(found.schema, definition.schema);
        assert_eq!(found, definition);
    }
}

#[test]
fn duplicate_registration_fails_in_either_order() {
    let first = ToolDefinition::new(
        "status",
        "first",
        ParamSchema::new(),
        ToolKind::System(SystemTool::Status),
    );
    let second = ToolDefinition::new(
        "status",
        "second",
        ParamSchema::new().optional("verbose", FieldKind::Boolean, "More output."),
        ToolKind::System(SystemTool::Health),
    );

    for (a, b) in [(&first, &second), (&second, &first)] {
        let mut registry = ToolRegistry::new();
        registry.register(a.clone()).unwrap();
        assert_eq!(
            registry.register(b.clone()),
            Err(RegistryError::DuplicateTool("status".to_string()))
        );
        assert_eq!(registry.lookup("status"), Some(a));
    }
}

#[tokio::test]
async fn missing_required_fields_never_reach_the_backend() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server);
    let mut checked = 0;

    for definition in catalog() {
        if !definition.schema.fields().iter().any(|f| f.required) {
            continue;
        }
        let result = dispatcher
            .dispatch(&ToolInvocation::new(&definition.name, json!({}), checked))
            .await;
        assert_eq!(
            result.failure_kind(),
            Some(FailureKind::InvalidArguments),
            "{} accepted empty arguments",
            definition.name
        );
        checked += 1;
    }

    assert!(checked > 0);
}

#[tokio::test]
async fn unknown_tools_fail_fast_without_backend_contact() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server);
    for name in ["", "get_everything", "GET_ISSUES", "get_issues "] {
        let result = tokio::time::timeout(
            Duration::from_secs(1),
            dispatcher.dispatch(&ToolInvocation::new(name, json!({}), 1)),
        )
        .await
        .unwrap();
        assert_eq!(result.failure_kind(), Some(FailureKind::UnknownTool));
    }
}

#[tokio::test]
async fn status_check_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "20240101",
            "version": "10.6.0",
            "status": "UP"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server);
    let invocation = ToolInvocation::new("get_system_status", json!({}), 1);

    let first = dispatcher.dispatch(&invocation).await;
    let second = dispatcher.dispatch(&invocation).await;

    assert!(first.is_success());
    assert_eq!(first, second);
}

#[test]
fn token_and_username_are_ambiguous() {
    let result = SonarConfig::resolve(env(&[
        ("SONARQUBE_URL", "http://localhost:9000"),
        ("SONARQUBE_TOKEN", "squ_abc"),
        ("SONARQUBE_USERNAME", "admin"),
    ]));
    assert_eq!(result.unwrap_err(), ConfigError::AmbiguousCredentials);
}

#[tokio::test]
async fn url_only_configuration_is_anonymous() {
    let config = SonarConfig::resolve(env(&[("SONARQUBE_URL", "http://localhost:9000")])).unwrap();
    assert_eq!(config.auth, AuthMode::None);
    assert_eq!(config.auth.name(), "none");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/status"))
        .and(Anonymous)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "UP"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = SonarConfig::resolve(env(&[("SONARQUBE_URL", server.uri().as_str())])).unwrap();
    let client = SonarClient::from_config(config).unwrap();
    let dispatcher = Dispatcher::new(Arc::new(ToolRegistry::with_catalog().unwrap()), client);

    let result = dispatcher
        .dispatch(&ToolInvocation::new("get_system_status", Value::Null, 1))
        .await;
    assert_eq!(result, ToolResult::Success(Payload::Json(json!({"status": "UP"}))));
}

#[tokio::test]
async fn issues_of_a_missing_project_are_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/issues/search"))
        .and(query_param("components", "nonexistent"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"msg": "Component key 'nonexistent' not found"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = dispatcher_for(&server)
        .dispatch(&ToolInvocation::new(
            "get_issues",
            json!({"project": "nonexistent"}),
            "c",
        ))
        .await;

    let ToolResult::Failure(failure) = result else {
        panic!("expected a failure");
    };
    assert_eq!(failure.kind, FailureKind::BackendError);
    assert_eq!(failure.backend_kind, Some(ApiErrorKind::NotFound));
    assert!(failure.message.contains("Component key 'nonexistent' not found"));
}

#[tokio::test]
async fn pages_beyond_the_cap_are_rejected_not_truncated() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server);
    for tool in ["get_issues", "get_projects", "get_rules", "get_metrics"] {
        let result = dispatcher
            .dispatch(&ToolInvocation::new(
                tool,
                json!({"page": 26, "page_size": 20}),
                "d",
            ))
            .await;

        let ToolResult::Failure(failure) = result else {
            panic!("{} returned a payload", tool);
        };
        assert_eq!(failure.kind, FailureKind::BackendError);
        assert_eq!(failure.backend_kind, Some(ApiErrorKind::ResultTooLarge));
    }
}

#[tokio::test]
async fn pages_past_u32_are_rejected_not_reset() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server);
    for tool in ["get_issues", "get_project_hotspots", "get_user_projects"] {
        let mut arguments = json!({"page": 5_000_000_000u64});
        if tool == "get_project_hotspots" {
            arguments["project_key"] = json!("demo");
        }
        let result = dispatcher
            .dispatch(&ToolInvocation::new(tool, arguments, "huge"))
            .await;

        let ToolResult::Failure(failure) = result else {
            panic!("{} returned a payload", tool);
        };
        assert_eq!(failure.kind, FailureKind::BackendError);
        assert_eq!(failure.backend_kind, Some(ApiErrorKind::ResultTooLarge));
    }
}

#[tokio::test]
async fn cancelled_invocation_gets_exactly_one_reply() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/qualitygates/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"qualitygates": []}))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let session = Session::new(Arc::new(McpServer::new(dispatcher_for(&server))));

    let call = {
        let session = session.clone();
        tokio::spawn(async move {
            session
                .process_text(
                    r#"{"jsonrpc":"2.0","id":42,"method":"tools/call","params":{"name":"get_quality_gates","arguments":{}}}"#,
                )
                .await
        })
    };

    while session.in_flight().is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let notification = session
        .process_text(r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":42,"reason":"user"}}"#)
        .await;
    assert!(notification.is_none());

    let reply = tokio::time::timeout(Duration::from_secs(5), call)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(reply.id, json!(42));
    let result = reply.result.unwrap();
    assert_eq!(result["isError"], json!(true));
    assert_eq!(result["structuredContent"]["kind"], json!("Cancelled"));

    // Cancelling again finds nothing in flight
    assert!(!session.in_flight().cancel(&json!(42)));
}
