//! Server-sent events binding.
//!
//! `GET /sse` opens a stream whose first event, `endpoint`, names the URL the
//! client posts frames to. Replies arrive later as `message` events on the
//! stream, in completion order; the JSON-RPC id correlates them.

use super::ErrorResponse;
use crate::config::{AppState, SseSession};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::Stream;
use serde::Deserialize;
use sonarqube_mcp::Session;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Replies buffered per stream before senders wait.
const REPLY_BUFFER: usize = 64;

pub async fn open_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let (replies, mut rx) = mpsc::channel(REPLY_BUFFER);
    let session = state.open_session();

    state.sse_sessions.insert(
        session_id.clone(),
        SseSession {
            session: session.clone(),
            replies,
        },
    );
    info!(session_id = %session_id, open = state.sse_sessions.len(), "SSE session opened");

    let guard = StreamGuard {
        state: state.clone(),
        session_id: session_id.clone(),
        session,
    };

    let stream = async_stream::stream! {
        let _guard = guard;
        yield Ok::<_, Infallible>(
            Event::default()
                .event("endpoint")
                .data(format!("/messages?session_id={}", session_id)),
        );

        while let Some(reply) = rx.recv().await {
            match Event::default().event("message").json_data(&reply) {
                Ok(event) => yield Ok(event),
                Err(e) => warn!(session_id = %session_id, "Failed to encode reply: {}", e),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub session_id: String,
}

/// Accept one frame for an open stream. The reply, if any, goes out on
/// the stream.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(entry) = state.sse_sessions.get(&query.session_id) else {
        debug!(session_id = %query.session_id, "Frame for unknown SSE session");
        return ErrorResponse::new(format!("Unknown session: {}", query.session_id))
            .into_response_with(StatusCode::NOT_FOUND);
    };

    tokio::spawn(async move {
        if let Some(reply) = entry.session.process_text(&body).await {
            if entry.replies.send(reply).await.is_err() {
                debug!("Stream closed before the reply was ready");
            }
        }
    });

    StatusCode::ACCEPTED.into_response()
}

/// Forgets the session once its stream is dropped (client disconnect).
struct StreamGuard {
    state: Arc<AppState>,
    session_id: String,
    session: Session,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.state.sse_sessions.remove(&self.session_id);
        self.session.close();
        info!(session_id = %self.session_id, "SSE session closed");
    }
}

#[cfg(test)]
mod tests {
    use crate::api::create_router;
    use crate::api::testing::state_for;
    use crate::config::Transport;
    use axum::body::{Body, BodyDataStream};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use futures::StreamExt;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Read one `event:`/`data:` pair off the stream, skipping keep-alives.
    async fn next_event(body: &mut BodyDataStream) -> (String, String) {
        let mut buffer = String::new();
        loop {
            while let Some(end) = buffer.find("\n\n") {
                let block: String = buffer.drain(..end + 2).collect();
                let mut event = String::new();
                let mut data = String::new();
                for line in block.lines() {
                    if let Some(value) = line.strip_prefix("event:") {
                        event = value.trim().to_string();
                    } else if let Some(value) = line.strip_prefix("data:") {
                        data.push_str(value.trim());
                    }
                }
                if !event.is_empty() {
                    return (event, data);
                }
            }
            let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }

    async fn open(app: &Router) -> (BodyDataStream, String) {
        let response = app
            .clone()
            .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/event-stream");

        let mut body = response.into_body().into_data_stream();
        let (event, data) = next_event(&mut body).await;
        assert_eq!(event, "endpoint");
        assert!(data.starts_with("/messages?session_id="));
        (body, data)
    }

    fn post(endpoint: &str, frame: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(endpoint)
            .header("content-type", "application/json")
            .body(Body::from(frame.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_reply_arrives_as_message_event() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/system/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .mount(&mock)
            .await;

        let state = state_for(&mock);
        let app = create_router(state.clone(), Transport::Sse);
        let (mut body, endpoint) = open(&app).await;
        assert_eq!(state.sse_sessions.len(), 1);

        let response = app
            .oneshot(post(
                &endpoint,
                json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call",
                       "params": {"name": "ping_system"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let (event, data) = next_event(&mut body).await;
        assert_eq!(event, "message");
        let reply: Value = serde_json::from_str(&data).unwrap();
        assert_eq!(reply["id"], json!(5));
        assert_eq!(reply["result"]["content"][0]["text"], json!("pong"));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let mock = MockServer::start().await;
        let app = create_router(state_for(&mock), Transport::Sse);

        let response = app
            .oneshot(post(
                "/messages?session_id=missing",
                json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dropping_stream_forgets_session() {
        let mock = MockServer::start().await;
        let state = state_for(&mock);
        let app = create_router(state.clone(), Transport::Sse);

        let (body, _) = open(&app).await;
        assert_eq!(state.sse_sessions.len(), 1);

        drop(body);
        assert_eq!(state.sse_sessions.len(), 0);
    }

    #[tokio::test]
    async fn test_notification_gets_no_event() {
        let mock = MockServer::start().await;
        let app = create_router(state_for(&mock), Transport::Sse);
        let (mut body, endpoint) = open(&app).await;

        for frame in [
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": "after", "method": "ping"}),
        ] {
            let response = app.clone().oneshot(post(&endpoint, frame)).await.unwrap();
            assert_eq!(response.status(), StatusCode::ACCEPTED);
        }

        let (_, data) = next_event(&mut body).await;
        let reply: Value = serde_json::from_str(&data).unwrap();
        assert_eq!(reply["id"], json!("after"));
        assert_eq!(reply["result"], json!({}));
    }
}
