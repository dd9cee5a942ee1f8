//! Multi-server manager.
//!
//! Owns every configured MCP server, spawning each lazily on first use and
//! killing all children at shutdown. Tool names are qualified as
//! `{server}__{tool}` so servers cannot shadow each other or local tools.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::Mutex;

use crate::client::McpClient;
use crate::error::{McpError, Result};
use crate::types::{CallToolResult, ToolDescriptor};

/// Separator between server name and tool name.
pub const NAME_SEPARATOR: &str = "__";

/// One server entry in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// The config file shape: `{"mcpServers": {"name": {"command": ..., "args": [...]}}}`.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    #[serde(rename = "mcpServers", default)]
    mcp_servers: HashMap<String, ServerConfig>,
}

/// A tool qualified with the server that provides it.
#[derive(Debug, Clone)]
pub struct RemoteTool {
    /// `{server}__{tool}` — the name exposed to the model.
    pub qualified_name: String,
    pub server: String,
    pub descriptor: ToolDescriptor,
}

/// Manages the set of configured tool servers.
pub struct McpManager {
    configs: HashMap<String, ServerConfig>,
    clients: Mutex<HashMap<String, McpClient>>,
}

impl McpManager {
    pub fn new(configs: HashMap<String, ServerConfig>) -> Self {
        Self {
            configs,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Load server definitions from a JSON config file.
    pub async fn from_config_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| McpError::Config(path.to_path_buf(), e.to_string()))?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| McpError::Config(path.to_path_buf(), e.to_string()))?;
        Ok(Self::new(file.mcp_servers))
    }

    pub fn server_names(&self) -> Vec<String> {
        self.configs.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Ensure a client exists for `server`, spawning it on first use.
    async fn ensure_started(
        &self,
        server: &str,
        clients: &mut HashMap<String, McpClient>,
    ) -> Result<()> {
        if clients.contains_key(server) {
            return Ok(());
        }
        let config = self
            .configs
            .get(server)
            .ok_or_else(|| McpError::UnknownServer(server.to_string()))?;
        let client = McpClient::spawn(&config.command, &config.args).await?;
        clients.insert(server.to_string(), client);
        Ok(())
    }

    /// Discover tools across every configured server.
    ///
    /// A server that fails to start is skipped with a warning; one
    /// misbehaving server must not take down the harness.
    pub async fn list_tools(&self) -> Vec<RemoteTool> {
        let mut clients = self.clients.lock().await;
        let mut out = Vec::new();

        for server in self.configs.keys() {
            if let Err(e) = self.ensure_started(server, &mut clients).await {
                tracing::warn!(server = %server, error = %e, "skipping unavailable MCP server");
                continue;
            }
            if let Some(client) = clients.get(server) {
                for descriptor in client.tools() {
                    out.push(RemoteTool {
                        qualified_name: format!("{}{}{}", server, NAME_SEPARATOR, descriptor.name),
                        server: server.clone(),
                        descriptor: descriptor.clone(),
                    });
                }
            }
        }

        out
    }

    /// Call a tool by its qualified `{server}__{tool}` name.
    pub async fn call(&self, qualified_name: &str, arguments: Value) -> Result<CallToolResult> {
        let (server, tool) = split_qualified(qualified_name)?;

        let mut clients = self.clients.lock().await;
        self.ensure_started(server, &mut clients).await?;
        let client = clients
            .get(server)
            .ok_or_else(|| McpError::UnknownServer(server.to_string()))?;

        client.call_tool(tool, arguments).await
    }

    /// Kill every running server. Called on engine shutdown, including the
    /// cancellation path.
    pub async fn shutdown(&self) {
        let mut clients = self.clients.lock().await;
        for (name, client) in clients.drain() {
            tracing::debug!(server = %name, "stopping MCP server");
            client.shutdown().await;
        }
    }
}

fn split_qualified(qualified: &str) -> Result<(&str, &str)> {
    qualified
        .split_once(NAME_SEPARATOR)
        .ok_or_else(|| McpError::UnknownTool(qualified.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_qualified_names() {
        assert_eq!(split_qualified("fs__read").unwrap(), ("fs", "read"));
        assert!(split_qualified("noseparator").is_err());
    }

    #[test]
    fn parse_config_file_shape() {
        let json = r#"{
            "mcpServers": {
                "files": {"command": "mcp-files", "args": ["--root", "/tmp"]},
                "search": {"command": "mcp-search"}
            }
        }"#;
        let file: ConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.mcp_servers.len(), 2);
        assert_eq!(file.mcp_servers["files"].command, "mcp-files");
        assert_eq!(file.mcp_servers["files"].args, vec!["--root", "/tmp"]);
        assert!(file.mcp_servers["search"].args.is_empty());
    }

    #[tokio::test]
    async fn from_config_file_loads_servers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        tokio::fs::write(
            &path,
            r#"{"mcpServers": {"files": {"command": "mcp-files"}}}"#,
        )
        .await
        .unwrap();

        let manager = McpManager::from_config_file(&path).await.unwrap();
        assert_eq!(manager.server_names(), vec!["files".to_string()]);

        tokio::fs::write(&path, "{not json").await.unwrap();
        let err = McpManager::from_config_file(&path).await.unwrap_err();
        assert!(matches!(err, McpError::Config(_, _)));
    }

    #[tokio::test]
    async fn call_unknown_server_fails() {
        let manager = McpManager::new(HashMap::new());
        let err = manager
            .call("ghost__tool", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::UnknownServer(_)));
    }

    #[tokio::test]
    async fn list_tools_skips_unspawnable_server() {
        let mut configs = HashMap::new();
        configs.insert(
            "broken".to_string(),
            ServerConfig {
                command: "/nonexistent/mcp-server-binary".to_string(),
                args: vec![],
            },
        );
        let manager = McpManager::new(configs);
        let tools = manager.list_tools().await;
        assert!(tools.is_empty());
    }
}
