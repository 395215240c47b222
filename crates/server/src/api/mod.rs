use crate::config::{AppState, Transport};
use crate::websocket;
use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

pub mod sse;
pub mod streamable;

/// Serve one HTTP binding until Ctrl-C.
pub async fn serve(addr: &str, state: AppState, transport: Transport) -> Result<()> {
    let reaper = (transport == Transport::StreamableHttp).then(|| spawn_session_reaper(state.clone()));
    let app = create_router(state, transport);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(transport = transport.name(), "MCP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    if let Some(reaper) = reaper {
        reaper.abort();
    }
    Ok(())
}

/// Periodically close streamable HTTP sessions left idle by their clients.
pub fn spawn_session_reaper(state: AppState) -> tokio::task::JoinHandle<()> {
    let period = (state.session_idle / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let expired = state.reap_idle_http_sessions();
            if expired > 0 {
                tracing::debug!(
                    expired,
                    open = state.http_sessions.len(),
                    "Reclaimed idle HTTP sessions"
                );
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

/// Create the router for an HTTP binding. `Stdio` has no routes beyond
/// the health check.
pub fn create_router(state: AppState, transport: Transport) -> Router {
    let router = Router::new().route("/health", get(health_check));

    let router = match transport {
        Transport::Sse => router
            .route("/sse", get(sse::open_stream))
            .route("/messages", post(sse::post_message)),
        Transport::StreamableHttp => router
            .route(
                "/mcp",
                post(streamable::post_frame).delete(streamable::delete_session),
            )
            .route("/mcp/ws", get(websocket::ws_handler)),
        Transport::Stdio => router,
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_response(DefaultOnResponse::new().include_headers(false)),
        )
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Liveness only; never contacts the backend.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sonarqube-mcp",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Body of non-protocol HTTP errors (unknown session, missing header)
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::AppState;
    use axum::body::Body;
    use axum::http::Response;
    use serde_json::Value;
    use sonarqube_mcp::{Dispatcher, McpServer, ToolRegistry};
    use sonarqube_sdk::SonarClient;
    use std::sync::Arc;
    use wiremock::MockServer;

    pub fn state_for(mock: &MockServer) -> AppState {
        let client = SonarClient::builder()
            .base_url(mock.uri())
            .token("squ_test")
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(Arc::new(ToolRegistry::with_catalog().unwrap()), client);
        AppState::new(Arc::new(McpServer::new(dispatcher)))
    }

    pub async fn json_body(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
