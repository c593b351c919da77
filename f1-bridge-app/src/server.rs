use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use f1_bridge_tools::{ToolDispatcher, ToolError};

use crate::protocol::*;

/// Cap individual message size to keep a misbehaving client from buffering
/// unbounded input.
const MAX_LINE_LEN: usize = 10 * 1024 * 1024;

/// Session state: requests other than `initialize`/`ping` are rejected until
/// the client has completed the initialize handshake.
enum SessionState {
    AwaitingInit,
    Initialized,
    Ready,
}

/// Run the MCP server loop.
///
/// Reads JSON-RPC messages from `input` (one per line) and writes responses
/// to `output`. Each `tools/call` runs on its own task so a slow bridge
/// invocation never holds up other calls; all responses funnel through a
/// single writer task. Returns on end of input or an interrupt signal.
pub async fn serve<R, W>(
    dispatcher: Arc<ToolDispatcher>,
    input: R,
    output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<JsonRpcResponse>(32);
    let writer = tokio::spawn(write_responses(output, rx));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut state = SessionState::AwaitingInit;
    let mut lines = input.lines();

    loop {
        let line = tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupt received, shutting down");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            info!("Input closed, shutting down");
            break;
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.len() > MAX_LINE_LEN {
            warn!("Dropping oversized message ({} bytes)", trimmed.len());
            let response = JsonRpcResponse::err(
                Value::Null,
                PARSE_ERROR,
                format!("Message too large: {} bytes", trimmed.len()),
            );
            if tx.send(response).await.is_err() {
                break;
            }
            continue;
        }

        // Raw JSON first: failure here is a true parse error.
        let raw: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(e) => {
                warn!("Parse error: {e}");
                let response =
                    JsonRpcResponse::err(Value::Null, PARSE_ERROR, format!("Parse error: {e}"));
                if tx.send(response).await.is_err() {
                    break;
                }
                continue;
            }
        };

        // JSON-RPC allows string, number, or null ids; anything else makes
        // the request invalid and unanswerable under its own id.
        let id = match raw.get("id") {
            None => None,
            Some(id @ (Value::Null | Value::Number(_) | Value::String(_))) => Some(id.clone()),
            Some(_) => {
                let response = JsonRpcResponse::err(
                    Value::Null,
                    INVALID_REQUEST,
                    "Invalid request: id must be string, number, or null",
                );
                if tx.send(response).await.is_err() {
                    break;
                }
                continue;
            }
        };

        if raw.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            let response = JsonRpcResponse::err(
                id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "Invalid request: jsonrpc must be \"2.0\"",
            );
            if tx.send(response).await.is_err() {
                break;
            }
            continue;
        }

        let method = match raw.get("method").and_then(Value::as_str) {
            Some(method) => method.to_string(),
            None => {
                let response = JsonRpcResponse::err(
                    id.unwrap_or(Value::Null),
                    INVALID_REQUEST,
                    "Invalid request: missing or non-string method",
                );
                if tx.send(response).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let params = raw.get("params").cloned();

        // Notifications (no id field) get no response.
        let Some(id) = id else {
            if method == "notifications/initialized" {
                if matches!(state, SessionState::Initialized) {
                    state = SessionState::Ready;
                    info!("Client initialized");
                }
            }
            continue;
        };

        let response = match state {
            SessionState::AwaitingInit => match method.as_str() {
                "initialize" => {
                    state = SessionState::Initialized;
                    info!("Session initialized");
                    JsonRpcResponse::ok(id, initialize_result(&params))
                }
                "ping" => JsonRpcResponse::ok(id, json!({})),
                _ => JsonRpcResponse::err(id, NOT_INITIALIZED, "Server not initialized"),
            },
            SessionState::Initialized | SessionState::Ready => match method.as_str() {
                "initialize" => JsonRpcResponse::ok(id, initialize_result(&params)),
                "ping" => JsonRpcResponse::ok(id, json!({})),
                "tools/list" => {
                    let tools: Vec<ToolDefinition> = dispatcher
                        .registry()
                        .specs()
                        .map(|spec| ToolDefinition {
                            name: spec.name.to_string(),
                            description: spec.description.to_string(),
                            input_schema: spec.input_schema(),
                        })
                        .collect();
                    JsonRpcResponse::ok(id, json!({ "tools": tools }))
                }
                "tools/call" => {
                    match parse_call_params(&params) {
                        Ok(call) => {
                            // Each call gets its own task: a hanging bridge
                            // process must not stall concurrent calls.
                            let dispatcher = dispatcher.clone();
                            let tx = tx.clone();
                            tokio::spawn(async move {
                                let response = call_tool(dispatcher, id, call).await;
                                let _ = tx.send(response).await;
                            });
                            continue;
                        }
                        Err(message) => {
                            JsonRpcResponse::ok(id, result_value(ToolCallResult::error(message)))
                        }
                    }
                }
                _ => JsonRpcResponse::err(id, METHOD_NOT_FOUND, "Method not found"),
            },
        };

        if tx.send(response).await.is_err() {
            error!("Writer gone, shutting down");
            break;
        }
    }

    // In-flight call tasks hold channel clones; the writer drains them
    // before the server returns.
    drop(tx);
    let _ = writer.await;
    Ok(())
}

fn initialize_result(params: &Option<Value>) -> Value {
    let requested = params
        .as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .unwrap_or(SUPPORTED_VERSIONS[0]);

    let result = InitializeResult {
        protocol_version: negotiate_version(requested),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {},
        },
        server_info: ServerInfo {
            name: "f1-bridge".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        },
    };

    serde_json::to_value(result).unwrap_or_else(|e| {
        error!("initialize serialization failed: {e}");
        json!({})
    })
}

fn parse_call_params(params: &Option<Value>) -> Result<ToolCallParams, String> {
    let params = params.as_ref().ok_or("Error: missing tool call params")?;
    serde_json::from_value(params.clone())
        .map_err(|e| format!("Error: invalid tool call params: {e}"))
}

async fn call_tool(
    dispatcher: Arc<ToolDispatcher>,
    id: Value,
    call: ToolCallParams,
) -> JsonRpcResponse {
    match dispatcher.dispatch(&call.name, &call.arguments).await {
        Ok(text) => JsonRpcResponse::ok(id, result_value(ToolCallResult::text(text))),
        Err(ToolError::UnknownTool(name)) => {
            JsonRpcResponse::err(id, METHOD_NOT_FOUND, format!("Unknown tool: {name}"))
        }
        Err(err) => JsonRpcResponse::ok(id, result_value(ToolCallResult::error(failure_text(&err)))),
    }
}

/// Readable failure text for the response content channel. Upstream
/// tracebacks follow the message as a separate block.
fn failure_text(err: &ToolError) -> String {
    match err {
        ToolError::Upstream {
            message,
            traceback: Some(traceback),
        } => format!("Error: {message}\n\n{traceback}"),
        other => format!("Error: {other}"),
    }
}

fn result_value(result: ToolCallResult) -> Value {
    serde_json::to_value(&result).unwrap_or_else(|e| {
        error!("tools/call serialization failed: {e}");
        json!({})
    })
}

async fn write_responses<W: AsyncWrite + Unpin>(
    mut output: W,
    mut rx: mpsc::Receiver<JsonRpcResponse>,
) {
    while let Some(response) = rx.recv().await {
        let line = match serde_json::to_string(&response) {
            Ok(line) => line,
            Err(e) => {
                error!("Response serialization failed: {e}");
                continue;
            }
        };
        if output.write_all(line.as_bytes()).await.is_err()
            || output.write_all(b"\n").await.is_err()
            || output.flush().await.is_err()
        {
            error!("Protocol output broken, stopping writer");
            break;
        }
    }
}
