//! Proxies for tools provided by external MCP servers.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use quill_mcp::{McpManager, RemoteTool};

use super::{ToolHandler, ToolRegistry};

/// A registry entry that forwards execution to an MCP server.
///
/// Connection and protocol failures surface as handler errors, which the
/// dispatcher turns into failure tool results. They are not retried; the
/// model sees the error on its next turn and decides what to do.
pub struct RemoteToolProxy {
    manager: Arc<McpManager>,
    tool: RemoteTool,
}

impl RemoteToolProxy {
    pub fn new(manager: Arc<McpManager>, tool: RemoteTool) -> Self {
        Self { manager, tool }
    }
}

#[async_trait]
impl ToolHandler for RemoteToolProxy {
    fn name(&self) -> &str {
        &self.tool.qualified_name
    }
    fn description(&self) -> &str {
        &self.tool.descriptor.description
    }
    fn parameters(&self) -> Value {
        self.tool.descriptor.input_schema.clone()
    }

    async fn execute(
        &self,
        args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let result = self
            .manager
            .call(&self.tool.qualified_name, args)
            .await
            .map_err(|e| format!("{} ({})", e, self.tool.server))?;

        if result.is_error {
            return Err(result.text().into());
        }
        Ok(result.text())
    }
}

/// Discover every remote tool and register a proxy for each.
pub async fn register_remote_tools(registry: &mut ToolRegistry, manager: &Arc<McpManager>) {
    for tool in manager.list_tools().await {
        tracing::info!(tool = %tool.qualified_name, "registering remote tool");
        registry.register(RemoteToolProxy::new(Arc::clone(manager), tool));
    }
}
