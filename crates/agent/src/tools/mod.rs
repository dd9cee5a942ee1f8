//! Tool handlers and the registry that dispatches to them.

pub mod filesystem;
pub mod path_utils;
pub mod remote;
pub mod search;
pub mod shell;
pub mod task;
pub mod web;

pub use filesystem::{EditFileTool, ListDirTool, ReadFileTool, WriteFileTool};
pub use remote::{register_remote_tools, RemoteToolProxy};
pub use search::{GlobTool, GrepTool};
pub use shell::ExecTool;
pub use task::TaskTool;
pub use web::{WebFetchTool, WebSearchTool};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use quill_provider::{Tool, ToolCall};

use crate::permission::{PermissionLevel, PermissionPolicy};

pub const READ_FILE_TOOL: &str = "read_file";
pub const WRITE_FILE_TOOL: &str = "write_file";
pub const EDIT_FILE_TOOL: &str = "edit_file";
pub const LIST_DIR_TOOL: &str = "list_dir";
pub const GLOB_TOOL: &str = "glob";
pub const GREP_TOOL: &str = "grep";
pub const EXEC_TOOL: &str = "exec";
pub const WEB_FETCH_TOOL: &str = "web_fetch";
pub const WEB_SEARCH_TOOL: &str = "web_search";
pub const TASK_TOOL: &str = "task";

type BoxedHandler = Box<dyn ToolHandler + Send + Sync>;

/// The contract every tool satisfies to plug into the loop.
///
/// Handlers report problems through their `Result`; they must not panic.
/// The dispatcher converts an `Err` into a failure `ToolResult` so the
/// model sees the error text and can adapt.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;
    async fn execute(
        &self,
        args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// The outcome of exactly one tool call.
///
/// Produced by the dispatcher, the remote proxy, or the denial path;
/// always paired 1:1 with the call that requested it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn failure(call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }

    /// The fixed denial result for policy-blocked calls.
    pub fn denied(call_id: impl Into<String>) -> Self {
        Self::failure(call_id, "tool call not permitted by the active policy")
    }

    /// The text folded into the transcript for the model to read.
    pub fn render(&self) -> String {
        if self.success {
            self.output.clone().unwrap_or_default()
        } else {
            format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("unknown failure")
            )
        }
    }
}

pub fn to_provider_tool(tool: &dyn ToolHandler) -> Tool {
    Tool::new(tool.name(), tool.description(), tool.parameters())
}

/// Cut at a char boundary at or below `max` bytes.
pub(crate) fn truncate_at_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Maps tool names to handlers and dispatches calls to them.
pub struct ToolRegistry {
    tools: HashMap<String, BoxedHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register<T: ToolHandler + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&(dyn ToolHandler + Send + Sync)> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Schemas for every registered tool.
    pub fn definitions(&self) -> Vec<Tool> {
        self.tools
            .values()
            .map(|t| to_provider_tool(t.as_ref()))
            .collect()
    }

    /// Schemas for the tools a policy doesn't outright deny. Denied tools
    /// are not advertised to the model at all.
    pub fn definitions_for(&self, policy: &PermissionPolicy) -> Vec<Tool> {
        self.tools
            .values()
            .filter(|t| policy.level_for(t.name()) != PermissionLevel::Deny)
            .map(|t| to_provider_tool(t.as_ref()))
            .collect()
    }

    /// Run one permitted tool call.
    ///
    /// Bookkeeping plus error translation only: an unknown name or a
    /// handler error becomes a failure result, never an engine error.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(handler) = self.tools.get(&call.name) else {
            return ToolResult::failure(&call.id, format!("unknown tool: {}", call.name));
        };

        tracing::debug!(tool = %call.name, id = %call.id, "dispatching tool call");
        match handler.execute(call.arguments.clone()).await {
            Ok(output) => ToolResult::ok(&call.id, output),
            Err(e) => ToolResult::failure(&call.id, e.to_string()),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the default local tool set, confined to `workspace`.
pub fn register_default_tools(
    registry: &mut ToolRegistry,
    config: &quill_config::Config,
    workspace: &std::path::Path,
) {
    registry.register(ReadFileTool::new(workspace.to_path_buf()));
    registry.register(WriteFileTool::new(workspace.to_path_buf()));
    registry.register(EditFileTool::new(workspace.to_path_buf()));
    registry.register(ListDirTool::new(workspace.to_path_buf()));

    registry.register(GlobTool::new(workspace.to_path_buf()));
    registry.register(GrepTool::new(workspace.to_path_buf()));

    registry.register(ExecTool::with_workspace(workspace.to_path_buf()));

    registry.register(WebFetchTool::default());
    registry.register(WebSearchTool::new(
        Some(config.tools.web_search.api_key.clone()).filter(|k| !k.is_empty()),
        config.tools.web_search.max_results,
    ));

    registry.register(TaskTool);
}
