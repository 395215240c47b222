// Client sessions and their in-flight invocations

use crate::protocol::{CancelledParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::server::McpServer;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Requests of one session that have not been answered yet, keyed by
/// JSON-RPC id.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    calls: Arc<Mutex<HashMap<String, CancellationToken>>>,
    root: CancellationToken,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a request. Returns `None` when the id is already in flight.
    pub fn register(&self, id: &Value) -> Option<InFlightGuard> {
        let key = id_key(id);
        let token = self.root.child_token();

        let mut calls = self.lock();
        if calls.contains_key(&key) {
            return None;
        }
        calls.insert(key.clone(), token.clone());

        Some(InFlightGuard {
            table: self.clone(),
            key,
            token,
        })
    }

    /// Cancel the request with this id. Returns whether one was in flight.
    pub fn cancel(&self, id: &Value) -> bool {
        match self.lock().get(&id_key(id)) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel everything, including requests registered later.
    pub fn cancel_all(&self) {
        self.root.cancel();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes its request from the table when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    table: InFlight,
    key: String,
    token: CancellationToken,
}

impl InFlightGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.table.lock().remove(&self.key);
    }
}

// 1 and "1" are different ids
fn id_key(id: &Value) -> String {
    id.to_string()
}

/// A client's view of the server: frames in, replies out, with
/// cancellation of its own in-flight requests. Cheap to clone; clones
/// share the in-flight table.
#[derive(Debug, Clone)]
pub struct Session {
    server: Arc<McpServer>,
    in_flight: InFlight,
}

impl Session {
    pub fn new(server: Arc<McpServer>) -> Self {
        Self {
            server,
            in_flight: InFlight::new(),
        }
    }

    pub fn server(&self) -> &McpServer {
        &self.server
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Handle one raw frame.
    pub async fn process_text(&self, text: &str) -> Option<JsonRpcResponse> {
        match McpServer::parse_frame(text) {
            Ok(request) => self.process(request).await,
            Err(response) => Some(response),
        }
    }

    /// Handle one decoded frame. Notifications yield `None`.
    pub async fn process(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.method == "notifications/cancelled" {
            self.cancel_from(request.params);
            return None;
        }

        let Some(id) = request.id.clone() else {
            return self.server.handle(request, &CancellationToken::new()).await;
        };

        let Some(guard) = self.in_flight.register(&id) else {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("a request with this id is already in flight"),
            ));
        };

        self.server.handle(request, guard.token()).await
    }

    /// End the session, cancelling whatever is still running.
    pub fn close(&self) {
        let pending = self.in_flight.len();
        if pending > 0 {
            info!(pending, "Closing session with requests in flight");
        }
        self.in_flight.cancel_all();
    }

    fn cancel_from(&self, params: Option<Value>) {
        let Some(params) = params.and_then(|p| serde_json::from_value::<CancelledParams>(p).ok())
        else {
            debug!("Malformed cancellation ignored");
            return;
        };

        if self.in_flight.cancel(&params.request_id) {
            info!(id = %params.request_id, reason = ?params.reason, "Request cancelled by client");
        } else {
            debug!(id = %params.request_id, "Cancellation for a request not in flight");
        }
    }
}
