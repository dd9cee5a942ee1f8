//! File tools: read, write, edit, list.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;

use tracing::debug;

use super::path_utils::validate_workspace_path;
use super::ToolHandler;

/// Read a file, optionally a line range of it.
pub struct ReadFileTool {
    workspace: PathBuf,
}

impl ReadFileTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct ReadFileArgs {
    path: String,
    start_line: Option<usize>,
    end_line: Option<usize>,
}

#[async_trait]
impl ToolHandler for ReadFileTool {
    fn name(&self) -> &str {
        super::READ_FILE_TOOL
    }
    fn description(&self) -> &str {
        "Read file contents. Supports an optional 1-based line range."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File path" },
                "start_line": { "type": "integer", "description": "First line to read (1-based)", "minimum": 1 },
                "end_line": { "type": "integer", "description": "Last line to read (inclusive)", "minimum": 1 }
            },
            "required": ["path"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: ReadFileArgs = serde_json::from_value(args)?;
        let path = validate_workspace_path(&args.path, &self.workspace).await?;

        debug!("reading {:?}", path);
        if !path.exists() {
            return Ok(format!("No file at: {}", args.path));
        }
        if !path.is_file() {
            return Ok(format!("Not a file: {}", args.path));
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Ok(format!("Permission denied: {}", args.path))
            }
            Err(e) => return Ok(format!("Read error: {}", e)),
        };

        match (args.start_line, args.end_line) {
            (None, None) => Ok(content),
            (start, end) => {
                let start = start.unwrap_or(1).max(1);
                let lines: Vec<&str> = content.lines().collect();
                let end = end.unwrap_or(lines.len()).min(lines.len());
                if start > end {
                    return Ok(format!("Empty range: lines {}-{}", start, end));
                }
                Ok(lines[start - 1..end].join("\n"))
            }
        }
    }
}

/// Write a file, creating parent directories as needed.
pub struct WriteFileTool {
    workspace: PathBuf,
}

impl WriteFileTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct WriteFileArgs {
    path: String,
    content: String,
}

#[async_trait]
impl ToolHandler for WriteFileTool {
    fn name(&self) -> &str {
        super::WRITE_FILE_TOOL
    }
    fn description(&self) -> &str {
        "Write content to a file, creating parent directories if needed."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File path" },
                "content": { "type": "string", "description": "Content to write" }
            },
            "required": ["path", "content"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: WriteFileArgs = serde_json::from_value(args)?;
        let path = validate_workspace_path(&args.path, &self.workspace).await?;

        debug!("writing {:?}", path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        match tokio::fs::write(&path, &args.content).await {
            Ok(_) => Ok(format!(
                "Wrote {} bytes to {}",
                args.content.len(),
                args.path
            )),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Ok(format!("Permission denied: {}", args.path))
            }
            Err(e) => Ok(format!("Write error: {}", e)),
        }
    }
}

/// Search-and-replace edit. The old text must match exactly once.
pub struct EditFileTool {
    workspace: PathBuf,
}

impl EditFileTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct EditFileArgs {
    path: String,
    old_text: String,
    new_text: String,
}

#[async_trait]
impl ToolHandler for EditFileTool {
    fn name(&self) -> &str {
        super::EDIT_FILE_TOOL
    }
    fn description(&self) -> &str {
        "Replace old_text with new_text in a file. old_text must match exactly once."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File path" },
                "old_text": { "type": "string", "description": "Text to replace" },
                "new_text": { "type": "string", "description": "Replacement text" }
            },
            "required": ["path", "old_text", "new_text"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: EditFileArgs = serde_json::from_value(args)?;
        let path = validate_workspace_path(&args.path, &self.workspace).await?;

        debug!("editing {:?}", path);
        if !path.exists() {
            return Ok(format!("No file at: {}", args.path));
        }
        let content = tokio::fs::read_to_string(&path).await?;
        let count = content.matches(&args.old_text).count();
        if count == 0 {
            return Ok("old_text not found in file".to_string());
        }
        if count > 1 {
            return Ok(format!("old_text is ambiguous: {} matches", count));
        }
        let new_content = content.replacen(&args.old_text, &args.new_text, 1);
        match tokio::fs::write(&path, new_content).await {
            Ok(_) => Ok(format!("Edited {}", args.path)),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Ok(format!("Permission denied: {}", args.path))
            }
            Err(e) => Ok(format!("Edit error: {}", e)),
        }
    }
}

/// List directory contents.
pub struct ListDirTool {
    workspace: PathBuf,
}

impl ListDirTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct ListDirArgs {
    path: String,
}

#[async_trait]
impl ToolHandler for ListDirTool {
    fn name(&self) -> &str {
        super::LIST_DIR_TOOL
    }
    fn description(&self) -> &str {
        "List the contents of a directory."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "path": { "type": "string", "description": "Directory path" } },
            "required": ["path"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: ListDirArgs = serde_json::from_value(args)?;
        let path = validate_workspace_path(&args.path, &self.workspace).await?;

        debug!("listing {:?}", path);
        if !path.exists() {
            return Ok(format!("No directory at: {}", args.path));
        }
        if !path.is_dir() {
            return Ok(format!("Not a directory: {}", args.path));
        }
        let mut entries = tokio::fs::read_dir(&path).await?;
        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            let prefix = if entry.file_type().await?.is_dir() {
                "[dir]  "
            } else {
                "[file] "
            };
            items.push(format!("{}{}", prefix, name));
        }
        items.sort();
        if items.is_empty() {
            Ok(format!("Empty directory: {}", args.path))
        } else {
            Ok(items.join("\n"))
        }
    }
}
