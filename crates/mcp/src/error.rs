//! Error types for the MCP client.

use std::path::PathBuf;

/// Errors from talking to external tool servers.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("unknown server: {0}")]
    UnknownServer(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool call timed out after {0}s")]
    Timeout(u64),

    #[error("server unavailable: {0}")]
    ServerUnavailable(String),

    #[error("malformed server config at {0}: {1}")]
    Config(PathBuf, String),
}

pub type Result<T> = std::result::Result<T, McpError>;
