//! Shell execution tool.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::path_utils::validate_workspace_path;
use super::{truncate_at_boundary, ToolHandler};

const MAX_OUTPUT_LEN: usize = 10000;

/// Run a shell command inside the workspace.
pub struct ExecTool {
    timeout_secs: u64,
    working_dir: Option<String>,
    workspace: PathBuf,
}

impl ExecTool {
    pub fn new(timeout_secs: u64, working_dir: Option<String>, workspace: PathBuf) -> Self {
        Self {
            timeout_secs,
            working_dir,
            workspace,
        }
    }

    pub fn with_workspace(workspace: PathBuf) -> Self {
        Self {
            timeout_secs: 60,
            working_dir: None,
            workspace,
        }
    }
}

#[derive(Deserialize)]
struct ExecArgs {
    command: String,
    working_dir: Option<String>,
}

#[async_trait]
impl ToolHandler for ExecTool {
    fn name(&self) -> &str {
        super::EXEC_TOOL
    }
    fn description(&self) -> &str {
        "Execute a shell command. Use with caution."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "Shell command" },
                "working_dir": { "type": "string", "description": "Optional working directory" }
            },
            "required": ["command"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: ExecArgs = serde_json::from_value(args)?;

        // Working directory priority: args, then tool config, then workspace
        let working_dir = match args.working_dir.or_else(|| self.working_dir.clone()) {
            Some(dir) => validate_workspace_path(&dir, &self.workspace).await?,
            None => self.workspace.clone(),
        };

        debug!("exec: {}", args.command);
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&args.command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(working_dir);

        let output = match tokio::time::timeout(
            tokio::time::Duration::from_secs(self.timeout_secs),
            cmd.output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Ok(format!("Execution failed: {}", e)),
            Err(_) => return Ok(format!("Timed out after {} seconds", self.timeout_secs)),
        };

        let mut parts = Vec::new();
        if !output.stdout.is_empty() {
            parts.push(String::from_utf8_lossy(&output.stdout).to_string());
        }
        if !output.stderr.is_empty() {
            parts.push(format!(
                "stderr:\n{}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }
        if output.status.code() != Some(0) {
            parts.push(format!("exit code: {}", output.status.code().unwrap_or(-1)));
        }

        let result = if parts.is_empty() {
            "(no output)".to_string()
        } else {
            parts.join("\n")
        };

        if result.len() > MAX_OUTPUT_LEN {
            let kept = truncate_at_boundary(&result, MAX_OUTPUT_LEN);
            Ok(format!(
                "{}\n... output truncated, {} bytes remaining",
                kept,
                result.len() - kept.len()
            ))
        } else {
            Ok(result)
        }
    }
}
