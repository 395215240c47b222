// Request dispatcher: resolve, validate, execute, classify

use crate::tools::{Payload, ToolRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sonarqube_sdk::{ApiError, ApiErrorKind, SonarClient};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One request to run a named tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub arguments: Value,
    /// Opaque correlation id (the JSON-RPC request id).
    pub invocation_id: Value,
}

impl ToolInvocation {
    pub fn new(tool_name: impl Into<String>, arguments: Value, invocation_id: impl Into<Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            invocation_id: invocation_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    UnknownTool,
    InvalidArguments,
    BackendError,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnknownTool => "UnknownTool",
            Self::InvalidArguments => "InvalidArguments",
            Self::BackendError => "BackendError",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// A classified tool failure, as reported to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolFailure {
    pub kind: FailureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_kind: Option<ApiErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl ToolFailure {
    pub fn unknown_tool(name: &str) -> Self {
        Self {
            kind: FailureKind::UnknownTool,
            backend_kind: None,
            status: None,
            message: format!("Unknown tool: {}", name),
        }
    }

    pub fn invalid_arguments(issues: &[String]) -> Self {
        Self {
            kind: FailureKind::InvalidArguments,
            backend_kind: None,
            status: None,
            message: format!("Invalid arguments: {}", issues.join("; ")),
        }
    }

    pub fn backend(error: &ApiError) -> Self {
        Self {
            kind: FailureKind::BackendError,
            backend_kind: Some(error.kind()),
            status: error.status(),
            message: error.to_string(),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            kind: FailureKind::Cancelled,
            backend_kind: None,
            status: None,
            message: "Request cancelled".to_string(),
        }
    }
}

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success(Payload),
    Failure(ToolFailure),
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.kind),
        }
    }
}

/// Routes invocations to tool handlers. Holds no mutable state, so one
/// instance serves every transport and session concurrently.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    client: SonarClient,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, client: SonarClient) -> Self {
        Self { registry, client }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn client(&self) -> &SonarClient {
        &self.client
    }

    pub async fn dispatch(&self, invocation: &ToolInvocation) -> ToolResult {
        let Some(definition) = self.registry.lookup(&invocation.tool_name) else {
            warn!(tool = %invocation.tool_name, id = %invocation.invocation_id, "Unknown tool");
            return ToolResult::Failure(ToolFailure::unknown_tool(&invocation.tool_name));
        };

        let arguments = match definition.validate(&invocation.arguments) {
            Ok(arguments) => arguments,
            Err(issues) => {
                debug!(tool = %definition.name, issues = issues.len(), "Arguments rejected");
                return ToolResult::Failure(ToolFailure::invalid_arguments(&issues));
            }
        };

        let started = Instant::now();
        let result = definition.handler.execute(&self.client, &arguments).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(payload) => {
                info!(tool = %definition.name, id = %invocation.invocation_id, elapsed_ms, "Tool call succeeded");
                ToolResult::Success(payload)
            }
            Err(error) => {
                warn!(
                    tool = %definition.name,
                    id = %invocation.invocation_id,
                    kind = %error.kind(),
                    elapsed_ms,
                    "Tool call failed: {}",
                    error
                );
                ToolResult::Failure(ToolFailure::backend(&error))
            }
        }
    }

    /// Dispatch unless `cancel` fires first. On cancellation the pending
    /// handler, including any in-flight backend request, is dropped.
    pub async fn dispatch_with_cancel(
        &self,
        invocation: &ToolInvocation,
        cancel: &CancellationToken,
    ) -> ToolResult {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(tool = %invocation.tool_name, id = %invocation.invocation_id, "Tool call cancelled");
                ToolResult::Failure(ToolFailure::cancelled())
            }
            result = self.dispatch(invocation) => result,
        }
    }
}
