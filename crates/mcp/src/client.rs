//! Client for a single MCP server process.
//!
//! Spawns the server with stdin/stdout piped, performs the initialize
//! handshake, discovers tools, and forwards `tools/call` requests.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use crate::error::{McpError, Result};
use crate::types::*;

/// Default per-call timeout.
pub const CALL_TIMEOUT_SECS: u64 = 60;

/// A connection to one MCP server subprocess.
pub struct McpClient {
    child: Child,
    reader: Mutex<BufReader<ChildStdout>>,
    writer: Mutex<ChildStdin>,
    next_id: Mutex<i64>,
    tools: HashMap<String, ToolDescriptor>,
    call_timeout: Duration,
}

impl McpClient {
    /// Spawn a server process and run the initialize handshake plus tool
    /// discovery. Failure here means the server is unusable.
    pub async fn spawn(program: &str, args: &[String]) -> Result<Self> {
        tracing::info!(program = %program, "spawning MCP server");

        let mut child = Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::ServerUnavailable("failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::ServerUnavailable("failed to capture stdout".to_string()))?;

        let mut client = Self {
            child,
            reader: Mutex::new(BufReader::new(stdout)),
            writer: Mutex::new(stdin),
            next_id: Mutex::new(1),
            tools: HashMap::new(),
            call_timeout: Duration::from_secs(CALL_TIMEOUT_SECS),
        };

        client.initialize().await?;
        client.discover_tools().await?;

        Ok(client)
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Send a request and read the matching response line.
    async fn request(&self, method: &str, params: Option<Value>) -> Result<JsonRpcResponse> {
        let id = {
            let mut next = self.next_id.lock().await;
            let id = *next;
            *next += 1;
            id
        };

        let request = JsonRpcRequest::new(id, method, params);
        let json = serde_json::to_string(&request)?;

        tracing::debug!(method = %method, id, "sending request");

        {
            let mut writer = self.writer.lock().await;
            writer.write_all(json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        let mut line = String::new();
        {
            let mut reader = self.reader.lock().await;
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                return Err(McpError::ServerUnavailable(
                    "server closed its stdout".to_string(),
                ));
            }
        }

        let response: JsonRpcResponse = serde_json::from_str(line.trim())?;
        Ok(response)
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let notif = JsonRpcNotification::new(method, params);
        let json = serde_json::to_string(&notif)?;

        let mut writer = self.writer.lock().await;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    async fn initialize(&mut self) -> Result<()> {
        let params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "quill",
                "version": env!("CARGO_PKG_VERSION")
            }
        });

        let resp = self.request("initialize", Some(params)).await?;
        if let Some(err) = resp.error {
            return Err(McpError::ServerUnavailable(err.message));
        }

        self.notify("notifications/initialized", None).await?;
        tracing::info!("MCP client initialized");
        Ok(())
    }

    async fn discover_tools(&mut self) -> Result<()> {
        let resp = self.request("tools/list", None).await?;
        if let Some(err) = resp.error {
            return Err(McpError::ServerUnavailable(err.message));
        }

        let result: ListToolsResult = serde_json::from_value(
            resp.result
                .ok_or_else(|| McpError::InvalidParams("missing result".to_string()))?,
        )?;

        self.tools.clear();
        for tool in result.tools {
            tracing::debug!(name = %tool.name, "discovered tool");
            self.tools.insert(tool.name.clone(), tool);
        }

        tracing::info!(count = self.tools.len(), "tool discovery complete");
        Ok(())
    }

    /// Tools advertised by this server.
    pub fn tools(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Call a tool, bounded by the per-call timeout. A timeout or an exited
    /// server is an error here; the caller translates it into a failure
    /// tool result rather than propagating.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        if !self.tools.contains_key(name) {
            return Err(McpError::UnknownTool(name.to_string()));
        }

        let params = serde_json::json!({
            "name": name,
            "arguments": arguments,
        });

        let resp = tokio::time::timeout(self.call_timeout, self.request("tools/call", Some(params)))
            .await
            .map_err(|_| McpError::Timeout(self.call_timeout.as_secs()))??;

        if let Some(err) = resp.error {
            return Err(McpError::ServerUnavailable(err.message));
        }

        let result: CallToolResult = serde_json::from_value(
            resp.result
                .ok_or_else(|| McpError::InvalidParams("missing result".to_string()))?,
        )?;

        Ok(result)
    }

    /// Kill the server process.
    pub async fn shutdown(mut self) {
        tracing::info!("shutting down MCP server");
        let _ = self.child.kill().await;
    }
}
