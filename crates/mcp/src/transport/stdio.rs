//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! Each line is one complete JSON-RPC message; replies are written as
//! compact JSON followed by `\n`. Logs never go to stdout.

use crate::protocol::{JsonRpcError, JsonRpcResponse};
use crate::session::Session;
use anyhow::{Context, Result};
use futures::stream::FuturesOrdered;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::future::Future;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

/// Longest accepted input line, in bytes.
pub const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct StdioOptions {
    /// Invocations allowed in flight at once. Replies are still written
    /// in request order. `1` processes frames strictly one at a time.
    ///
    /// Input is not read while the window is full, so with `1` a
    /// `notifications/cancelled` frame is only seen after the call it names
    /// has already replied, and then has no effect. Cancelling over stdio
    /// needs a window of at least 2.
    pub max_in_flight: usize,
}

impl Default for StdioOptions {
    fn default() -> Self {
        Self { max_in_flight: 1 }
    }
}

/// Serve the process's stdin/stdout until EOF or Ctrl-C.
pub async fn serve_stdio(session: Session, options: StdioOptions) -> Result<()> {
    info!(max_in_flight = options.max_in_flight, "Serving MCP over stdio");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    serve(session, tokio::io::stdin(), tokio::io::stdout(), options, shutdown).await
}

/// Serve one line-oriented stream pair until the input ends or `shutdown`
/// completes.
pub async fn serve<R, W, S>(
    session: Session,
    reader: R,
    writer: W,
    options: StdioOptions,
    shutdown: S,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let max_in_flight = options.max_in_flight.max(1);
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_FRAME_BYTES));
    let mut out = FramedWrite::new(writer, LinesCodec::new());
    let mut pending = FuturesOrdered::new();
    let mut input_open = true;
    tokio::pin!(shutdown);

    loop {
        if !input_open && pending.is_empty() {
            info!("Input closed, stopping");
            break;
        }

        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping");
                session.close();
                break;
            }
            Some(reply) = pending.next(), if !pending.is_empty() => {
                if let Some(response) = reply {
                    write_reply(&mut out, &response).await?;
                }
            }
            frame = lines.next(), if input_open && pending.len() < max_in_flight => {
                match frame {
                    None => input_open = false,
                    Some(Ok(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let session = session.clone();
                        pending.push_back(async move { session.process_text(&line).await });
                    }
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        warn!(limit = MAX_FRAME_BYTES, "Input line too long, discarded");
                        let response = JsonRpcResponse::error(
                            Value::Null,
                            JsonRpcError::parse_error("message exceeds the maximum frame size"),
                        );
                        write_reply(&mut out, &response).await?;
                    }
                    Some(Err(LinesCodecError::Io(e))) => {
                        return Err(e).context("Failed to read from stdin");
                    }
                }
            }
        }
    }

    Ok(())
}

async fn write_reply<W>(out: &mut FramedWrite<W, LinesCodec>, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_string(response).context("Failed to serialize reply")?;
    out.send(body).await.context("Failed to write reply")?;
    debug!(id = %response.id, is_error = response.is_error(), "Sent response");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::server::McpServer;
    use crate::tools::ToolRegistry;
    use serde_json::json;
    use sonarqube_sdk::SonarClient;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_for(mock: &MockServer) -> Session {
        let client = SonarClient::builder().base_url(mock.uri()).build().unwrap();
        let dispatcher = Dispatcher::new(Arc::new(ToolRegistry::with_catalog().unwrap()), client);
        Session::new(Arc::new(McpServer::new(dispatcher)))
    }

    /// Feed `input` to the binding and collect every reply line.
    async fn run(session: Session, input: &str, options: StdioOptions) -> Vec<Value> {
        let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, client_out) = tokio::io::duplex(64 * 1024);

        client_in.write_all(input.as_bytes()).await.unwrap();
        drop(client_in);

        serve(session, server_in, server_out, options, std::future::pending())
            .await
            .unwrap();

        let mut replies = Vec::new();
        let mut lines = BufReader::new(client_out).lines();
        while let Some(line) = lines.next_line().await.unwrap() {
            replies.push(serde_json::from_str(&line).unwrap());
        }
        replies
    }

    #[tokio::test]
    async fn test_one_reply_per_request() {
        let mock = MockServer::start().await;
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#, "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, "\n",
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#, "\n",
            "garbage\n",
        );

        let replies = run(session_for(&mock), input, StdioOptions::default()).await;

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["id"], json!(1));
        assert_eq!(replies[1], json!({"jsonrpc": "2.0", "id": 2, "result": {}}));
        assert_eq!(replies[2]["error"]["code"], json!(-32700));
    }

    #[tokio::test]
    async fn test_pipelined_replies_keep_request_order() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/system/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "UP"}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&mock)
            .await;

        let input = concat!(
            r#"{"jsonrpc":"2.0","id":"slow","method":"tools/call","params":{"name":"get_system_status"}}"#, "\n",
            r#"{"jsonrpc":"2.0","id":"fast","method":"ping"}"#, "\n",
        );

        let replies = run(session_for(&mock), input, StdioOptions { max_in_flight: 4 }).await;

        let ids: Vec<_> = replies.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!("slow"), json!("fast")]);
    }

    /// Send a slow call, then once it is in flight a cancel for it and a
    /// ping. Returns every reply.
    async fn cancel_while_pending(max_in_flight: usize) -> Vec<Value> {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/system/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "UP"}))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&mock)
            .await;

        let session = session_for(&mock);
        let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, client_out) = tokio::io::duplex(64 * 1024);
        let serving = tokio::spawn(serve(
            session.clone(),
            server_in,
            server_out,
            StdioOptions { max_in_flight },
            std::future::pending(),
        ));

        client_in
            .write_all(concat!(
                r#"{"jsonrpc":"2.0","id":"slow","method":"tools/call","params":{"name":"get_system_status"}}"#, "\n",
            ).as_bytes())
            .await
            .unwrap();
        while session.in_flight().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        client_in
            .write_all(concat!(
                r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":"slow"}}"#, "\n",
                r#"{"jsonrpc":"2.0","id":"after","method":"ping"}"#, "\n",
            ).as_bytes())
            .await
            .unwrap();
        drop(client_in);

        tokio::time::timeout(Duration::from_secs(5), serving)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        let mut replies = Vec::new();
        let mut lines = BufReader::new(client_out).lines();
        while let Some(line) = lines.next_line().await.unwrap() {
            replies.push(serde_json::from_str(&line).unwrap());
        }
        replies
    }

    #[tokio::test]
    async fn test_sequential_binding_reads_cancel_after_the_call() {
        let replies = cancel_while_pending(1).await;

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], json!("slow"));
        assert_eq!(replies[0]["result"]["structuredContent"]["status"], json!("UP"));
        assert!(replies[0]["result"].get("isError").is_none());
        assert_eq!(replies[1]["id"], json!("after"));
    }

    #[tokio::test]
    async fn test_pipelined_binding_cancels_pending_call() {
        let replies = cancel_while_pending(4).await;

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], json!("slow"));
        assert_eq!(replies[0]["result"]["isError"], json!(true));
        assert_eq!(replies[0]["result"]["structuredContent"]["kind"], json!("Cancelled"));
        assert_eq!(replies[1]["id"], json!("after"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_waiting_for_input() {
        let mock = MockServer::start().await;
        let (_client_in, server_in) = tokio::io::duplex(1024);
        let (server_out, _client_out) = tokio::io::duplex(1024);

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            serve(
                session_for(&mock),
                server_in,
                server_out,
                StdioOptions::default(),
                tokio::time::sleep(Duration::from_millis(20)),
            ),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
    }
}
