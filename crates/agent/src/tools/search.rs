//! Search tools: glob and grep.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::path_utils::validate_workspace_path;
use super::ToolHandler;

const MAX_MATCHES: usize = 200;

/// Directories never worth descending into.
const SKIP_DIRS: &[&str] = &[".git", "target", "node_modules", ".venv", "__pycache__"];

/// Convert a glob pattern to an anchored regex.
///
/// Supports `**` (any path segments), `*` (within a segment), and `?`.
fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    // Swallow a following slash so `**/x` also matches `x`
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        out.push_str("(?:.*/)?");
                    } else {
                        out.push_str(".*");
                    }
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out)
}

/// Collect files under `root`, relative paths, skipping junk directories.
async fn walk_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            let path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                Err(_) => continue,
            };
            if file_type.is_dir() {
                if !name.starts_with('.') && !SKIP_DIRS.contains(&name.as_str()) {
                    stack.push(path);
                }
            } else if file_type.is_file() {
                if let Ok(rel) = path.strip_prefix(root) {
                    out.push(rel.to_path_buf());
                }
            }
        }
    }

    out.sort();
    Ok(out)
}

/// Find files matching a glob pattern.
pub struct GlobTool {
    workspace: PathBuf,
}

impl GlobTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct GlobArgs {
    pattern: String,
    path: Option<String>,
}

#[async_trait]
impl ToolHandler for GlobTool {
    fn name(&self) -> &str {
        super::GLOB_TOOL
    }
    fn description(&self) -> &str {
        "Find files by glob pattern, e.g. **/*.rs or src/*.toml."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Glob pattern" },
                "path": { "type": "string", "description": "Directory to search (default: workspace root)" }
            },
            "required": ["pattern"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: GlobArgs = serde_json::from_value(args)?;
        let root = match &args.path {
            Some(p) => validate_workspace_path(p, &self.workspace).await?,
            None => self.workspace.clone(),
        };

        debug!("glob {} under {:?}", args.pattern, root);
        let regex = glob_to_regex(&args.pattern)?;
        let files = walk_files(&root).await?;

        let matches: Vec<String> = files
            .iter()
            .filter(|p| regex.is_match(&p.to_string_lossy()))
            .take(MAX_MATCHES)
            .map(|p| p.display().to_string())
            .collect();

        if matches.is_empty() {
            Ok(format!("No files match: {}", args.pattern))
        } else {
            Ok(matches.join("\n"))
        }
    }
}

/// Search file contents with a regex.
pub struct GrepTool {
    workspace: PathBuf,
}

impl GrepTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct GrepArgs {
    pattern: String,
    path: Option<String>,
    case_insensitive: Option<bool>,
}

#[async_trait]
impl ToolHandler for GrepTool {
    fn name(&self) -> &str {
        super::GREP_TOOL
    }
    fn description(&self) -> &str {
        "Search file contents with a regular expression. Returns file:line: text."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Regular expression" },
                "path": { "type": "string", "description": "Directory to search (default: workspace root)" },
                "case_insensitive": { "type": "boolean", "default": false }
            },
            "required": ["pattern"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: GrepArgs = serde_json::from_value(args)?;
        let root = match &args.path {
            Some(p) => validate_workspace_path(p, &self.workspace).await?,
            None => self.workspace.clone(),
        };

        let pattern = if args.case_insensitive.unwrap_or(false) {
            format!("(?i){}", args.pattern)
        } else {
            args.pattern.clone()
        };
        let regex = Regex::new(&pattern)?;

        debug!("grep {} under {:?}", args.pattern, root);
        let files = walk_files(&root).await?;

        let mut lines = Vec::new();
        'outer: for rel in &files {
            let path = root.join(rel);
            // Binary and unreadable files are skipped silently
            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                continue;
            };
            for (i, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    lines.push(format!("{}:{}: {}", rel.display(), i + 1, line.trim_end()));
                    if lines.len() >= MAX_MATCHES {
                        lines.push(format!("... truncated at {} matches", MAX_MATCHES));
                        break 'outer;
                    }
                }
            }
        }

        if lines.is_empty() {
            Ok(format!("No matches for: {}", args.pattern))
        } else {
            Ok(lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_translation() {
        let re = glob_to_regex("**/*.rs").unwrap();
        assert!(re.is_match("main.rs"));
        assert!(re.is_match("src/lib.rs"));
        assert!(re.is_match("src/tools/mod.rs"));
        assert!(!re.is_match("src/lib.rs.bak"));

        let re = glob_to_regex("src/*.rs").unwrap();
        assert!(re.is_match("src/lib.rs"));
        assert!(!re.is_match("src/tools/mod.rs"));

        let re = glob_to_regex("file?.txt").unwrap();
        assert!(re.is_match("file1.txt"));
        assert!(!re.is_match("file12.txt"));
    }
}
