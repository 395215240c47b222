//! Streamable HTTP binding: one POST per frame, replies in the response body.
//!
//! `initialize` opens a session and returns its id in the `Mcp-Session-Id`
//! header. Every later frame must carry that header. Requests of one session
//! may run concurrently; a `notifications/cancelled` frame cancels the
//! matching request, whose POST then completes with a `Cancelled` result.
//! Sessions end on `DELETE /mcp` or once idle past `AppState::session_idle`.

use super::ErrorResponse;
use crate::config::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sonarqube_mcp::{McpServer, Session};
use std::sync::Arc;
use tracing::{debug, info};

pub const SESSION_HEADER: &str = "mcp-session-id";

pub async fn post_frame(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let request = match McpServer::parse_frame(&body) {
        Ok(request) => request,
        Err(reply) => return (StatusCode::BAD_REQUEST, Json(reply)).into_response(),
    };

    let (session_id, session) = if request.method == "initialize" {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = state.open_session();
        state.http_sessions.insert(session_id.clone(), session.clone());
        info!(session_id = %session_id, open = state.http_sessions.len(), "HTTP session opened");
        (session_id, session)
    } else {
        match existing_session(&state, &headers) {
            Ok(found) => found,
            Err(response) => return response,
        }
    };

    let mut response = match session.process(request).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };

    if let Ok(value) = HeaderValue::from_str(&session_id) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

/// End a session, cancelling whatever it still has in flight.
pub async fn delete_session(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (session_id, _) = match existing_session(&state, &headers) {
        Ok(found) => found,
        Err(response) => return response,
    };

    if let Some(session) = state.http_sessions.remove(&session_id) {
        session.close();
        info!(session_id = %session_id, "HTTP session closed");
    }
    StatusCode::NO_CONTENT.into_response()
}

fn existing_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(String, Session), Response> {
    let Some(session_id) = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        return Err(ErrorResponse::with_details(
            "Missing session",
            "send initialize first and echo the Mcp-Session-Id header",
        )
        .into_response_with(StatusCode::BAD_REQUEST));
    };

    match state.http_sessions.get(session_id) {
        Some(session) => Ok((session_id.to_string(), session)),
        None => {
            debug!(session_id = %session_id, "Unknown HTTP session");
            Err(ErrorResponse::new(format!("Unknown session: {}", session_id))
                .into_response_with(StatusCode::NOT_FOUND))
        }
    }
}
