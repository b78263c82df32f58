//! Stdin/stdout JSON-RPC bridge for MCP clients.
//!
//! Reads newline-delimited JSON-RPC messages from stdin, dispatches each
//! through the [`McpHandler`] on its own task, and writes responses as
//! newline-delimited JSON to stdout.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::error::{DocsError, Result};
use crate::host::contract::{Request, Response, RpcError, codes};
use crate::host::handler::McpHandler;

type SharedWriter<W> = Arc<Mutex<BufWriter<W>>>;

/// Run the stdin/stdout bridge until stdin closes.
pub async fn run_stdio_bridge(handler: McpHandler) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    serve(Arc::new(handler), stdin, tokio::io::stdout()).await
}

/// Serve JSON-RPC over any line reader and writer.
///
/// Each request runs on its own task so a slow index load never blocks
/// other requests; replies are written as whole lines in completion
/// order. Returns after the reader reaches EOF and every in-flight request
/// has been answered.
pub async fn serve<R, W>(handler: Arc<McpHandler>, reader: R, writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer: SharedWriter<W> = Arc::new(Mutex::new(BufWriter::new(writer)));
    let mut lines = reader.lines();
    let mut in_flight = JoinSet::new();

    loop {
        let line = lines
            .next_line()
            .await
            .map_err(|e| DocsError::Protocol(format!("failed to read from stdin: {e}")))?;
        let Some(line) = line else {
            tracing::info!("stdin closed (EOF); shutting down stdio bridge");
            break;
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request = match parse_request(trimmed) {
            Ok(request) => request,
            Err(response) => {
                tracing::warn!(raw_line = %trimmed, "rejected malformed message");
                write_response(&writer, &response).await?;
                continue;
            }
        };

        let handler = Arc::clone(&handler);
        let task_writer = Arc::clone(&writer);
        in_flight.spawn(async move {
            match handler.handle(request).await {
                Some(response) => write_response(&task_writer, &response).await,
                None => Ok(()),
            }
        });

        // Reap finished requests so the set does not grow unbounded.
        while let Some(joined) = in_flight.try_join_next() {
            check_task(joined)?;
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        check_task(joined)?;
    }
    Ok(())
}

/// Parse one line, or produce the error reply for it.
fn parse_request(line: &str) -> std::result::Result<Request, Response> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        Response::error(
            Value::Null,
            RpcError::new(codes::PARSE_ERROR, format!("parse error: {e}")),
        )
    })?;
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| {
        Response::error(
            id,
            RpcError::new(codes::INVALID_REQUEST, format!("invalid request: {e}")),
        )
    })
}

fn check_task(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    match joined {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "request task failed");
            Ok(())
        }
    }
}

/// Serialise `response` and write it as a single line.
async fn write_response<W>(writer: &SharedWriter<W>, response: &Response) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(response)
        .map_err(|e| DocsError::Protocol(format!("failed to serialize response: {e}")))?;
    let mut w = writer.lock().await;
    write_line(&mut w, &json).await
}

/// Write a single JSON line to the buffered writer and flush.
async fn write_line<W>(writer: &mut BufWriter<W>, json: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
