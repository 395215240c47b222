use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use sonarqube_mcp::Session;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::AppState;

/// Outgoing frames buffered per connection.
const OUTBOX: usize = 64;

/// WebSocket flavour of the streamable binding: both directions over one
/// connection, one session per connection.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.open_session()))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, session: Session) {
    tracing::info!("WebSocket session opened");
    let (mut sink, mut stream) = socket.split();
    let (outbox, mut pending) = mpsc::channel::<Message>(OUTBOX);

    // Single writer; requests complete in any order
    let writer = tokio::spawn(async move {
        while let Some(message) = pending.recv().await {
            if let Err(e) = sink.send(message).await {
                tracing::debug!("WebSocket send failed: {}", e);
                break;
            }
        }
    });

    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                let session = session.clone();
                let outbox = outbox.clone();
                tokio::spawn(async move {
                    let Some(reply) = session.process_text(text.as_str()).await else {
                        return;
                    };
                    match serde_json::to_string(&reply) {
                        Ok(json) => {
                            if outbox.send(Message::Text(json.into())).await.is_err() {
                                tracing::debug!("Connection closed before the reply was ready");
                            }
                        }
                        Err(e) => tracing::warn!("Failed to encode reply: {}", e),
                    }
                });
            }
            Ok(Message::Binary(_)) => {
                tracing::debug!("Ignoring binary WebSocket frame");
            }
            Ok(Message::Close(_)) => {
                tracing::debug!("Client closed WebSocket");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("WebSocket error: {}", e);
                break;
            }
        }
    }

    session.close();
    drop(outbox);
    if writer.await.is_err() {
        tracing::debug!("WebSocket writer ended abnormally");
    }
    tracing::info!("WebSocket session closed");
}
