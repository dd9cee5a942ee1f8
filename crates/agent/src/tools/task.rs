//! The delegation tool.
//!
//! `TaskTool` only advertises the schema; the engine intercepts `task`
//! calls before registry dispatch and runs them as a nested engine with the
//! subagent profile. The handler body below is the safety net for a call
//! that somehow reaches the registry directly.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::ToolHandler;

/// Schema carrier for the `task` tool.
pub struct TaskTool;

#[derive(Deserialize)]
pub struct TaskArgs {
    pub task: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[async_trait]
impl ToolHandler for TaskTool {
    fn name(&self) -> &str {
        super::TASK_TOOL
    }
    fn description(&self) -> &str {
        "Delegate a self-contained subtask to a subagent and return its summary."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "task": { "type": "string", "description": "Instructions for the subagent" },
                "label": { "type": "string", "description": "Optional short label for the subtask" }
            },
            "required": ["task"]
        })
    }

    async fn execute(
        &self,
        _args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Err("task calls are handled by the engine, not the registry".into())
    }
}
