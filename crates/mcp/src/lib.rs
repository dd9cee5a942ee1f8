//! External tool-server client.
//!
//! Speaks JSON-RPC 2.0 over child-process stdio to MCP servers: the
//! `initialize` handshake, `tools/list` discovery, and `tools/call`
//! invocation. Server processes are owned here and killed at shutdown.

pub mod client;
pub mod error;
pub mod manager;
pub mod types;

pub use client::McpClient;
pub use error::{McpError, Result};
pub use manager::{McpManager, RemoteTool, ServerConfig, NAME_SEPARATOR};
pub use types::{CallToolResult, ToolContent, ToolDescriptor};
