//! MCP Server implementation
//!
//! Implements the Model Context Protocol server for stdio transport.
//! Each incoming line is handled on its own task so slow backend calls do not
//! hold up other requests; responses are serialized through a single writer.

use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::error::{McpError, NotionMcpError, Result};
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;

/// MCP Server info
const SERVER_NAME: &str = "notion-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server for Notion
#[derive(Clone)]
pub struct McpServer {
    /// Tool handler
    tool_handler: Arc<ToolHandler>,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tool_handler: ToolHandler) -> Self {
        Self {
            tool_handler: Arc::new(tool_handler),
        }
    }

    /// Run the server on stdio
    pub async fn run_stdio(&self) -> Result<()> {
        tracing::info!("Notion MCP Server running on stdio");
        self.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await?;
        Ok(())
    }

    /// Serve newline-delimited JSON-RPC from `reader` until it is exhausted.
    ///
    /// Returns the writer once every in-flight request has been answered.
    /// Lines that are not UTF-8 get a parse error; only a failed read ends the
    /// loop early.
    pub async fn run<R, W>(&self, mut reader: R, writer: W) -> Result<W>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let writer_task = tokio::spawn(write_lines(rx, writer));

        let mut buf = Vec::new();
        let mut tasks = JoinSet::new();
        let mut read_error = None;

        loop {
            tokio::select! {
                read = reader.read_until(b'\n', &mut buf) => {
                    match read {
                        Ok(0) => break,
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!("Failed to read from input: {}", e);
                            read_error = Some(e);
                            break;
                        }
                    }

                    let line = match String::from_utf8(std::mem::take(&mut buf)) {
                        Ok(line) => line,
                        Err(e) => {
                            tracing::warn!("Rejecting message that is not valid UTF-8");
                            let error = JsonRpcError::parse_error(e.to_string());
                            send_response(&tx, &JsonRpcResponse::error(None, error));
                            continue;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    let server = self.clone();
                    let tx = tx.clone();
                    tasks.spawn(async move {
                        if let Some(response) = server.handle_message(line.trim_end()).await {
                            send_response(&tx, &response);
                        }
                    });
                }
                Some(joined) = tasks.join_next() => log_task_outcome(joined),
            }
        }

        // In-flight requests are answered even when input ended with an error
        while let Some(joined) = tasks.join_next().await {
            log_task_outcome(joined);
        }
        drop(tx);

        let writer = writer_task.await.map_err(|e| {
            NotionMcpError::Mcp(McpError::ProtocolError {
                message: format!("stdout writer stopped: {}", e),
            })
        })??;

        match read_error {
            Some(e) => Err(e.into()),
            None => Ok(writer),
        }
    }

    /// Handle an incoming JSON-RPC message; `None` for notifications
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        tracing::debug!(message, "Received request");

        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        if request.is_notification() {
            match request.method.as_str() {
                methods::INITIALIZED => tracing::info!("Client initialized"),
                other => tracing::debug!("Ignoring notification: {}", other),
            }
            return None;
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            methods::INITIALIZE => {
                tracing::info!("Initialize request received");
                success(id, &self.initialize_result())
            }
            methods::PING => JsonRpcResponse::success(id, serde_json::json!({})),
            methods::LIST_TOOLS => success(
                id,
                &ListToolsResult {
                    tools: self.tool_handler.list_tools(),
                },
            ),
            methods::CALL_TOOL => match self.handle_call_tool(&request).await {
                Ok(result) => success(id, &result),
                Err(error) => JsonRpcResponse::error(id, error),
            },
            _ => JsonRpcResponse::error(id, JsonRpcError::method_not_found(&request.method)),
        };

        Some(response)
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
            },
        }
    }

    /// Handle call tool request. Malformed params are a protocol error and
    /// never reach the tool handler.
    async fn handle_call_tool(
        &self,
        request: &JsonRpcRequest,
    ) -> std::result::Result<CallToolResult, JsonRpcError> {
        let params = request
            .params
            .clone()
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tool parameters"))?;

        let params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tool parameters: {}", e)))?;

        Ok(self
            .tool_handler
            .call_tool(&params.name, params.arguments)
            .await)
    }
}

fn success<T: Serialize>(id: Option<RequestId>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
    }
}

async fn write_lines<W>(mut rx: mpsc::UnboundedReceiver<String>, mut writer: W) -> Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(writer)
}

fn send_response(tx: &mpsc::UnboundedSender<String>, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(text) => {
            // Receiver only closes once the writer has failed
            let _ = tx.send(text);
        }
        Err(e) => tracing::error!("Failed to serialize response: {}", e),
    }
}

fn log_task_outcome(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!("Request handler panicked: {}", e);
        } else {
            tracing::error!("Request handler cancelled: {}", e);
        }
    }
}
