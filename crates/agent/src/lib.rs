//! quill agent core.
//!
//! The turn-execution engine and everything it depends on: agent profiles,
//! permission policies, the approval gate, and the tool registry.

use thiserror::Error;

pub mod approval;
pub mod engine;
pub mod permission;
pub mod profile;
pub mod tools;

pub use approval::ApprovalGate;
pub use engine::{Turn, TurnEngine, TurnSequence};
pub use permission::{PermissionLevel, PermissionPolicy};
pub use profile::{AgentMode, AgentProfile, ProfileRegistry};
pub use tools::{ToolHandler, ToolRegistry, ToolResult};

/// Engine-level errors.
///
/// Per-tool failures never appear here; they are folded into the session as
/// failure tool results so the model can react. Only conditions that end the
/// run (or prevent it from starting) surface as `AgentError`.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("unknown agent profile: {0}")]
    UnknownProfile(String),

    #[error("model call failed: {0}")]
    Provider(#[from] quill_provider::ProviderError),

    #[error("run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, AgentError>;
