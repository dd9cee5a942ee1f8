//! Approval gate for Ask-level tools.

use async_trait::async_trait;
use serde_json::Value;

/// A pluggable approval decision for tools the policy marks `Ask`.
///
/// The CLI implements this with a stdin prompt; tests use canned answers.
/// When no gate is wired, the engine falls back to the configured
/// `auto_approve` flag: true approves, false denies.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    /// Decide whether a tool call may run.
    async fn approve(&self, tool_name: &str, call_id: &str, arguments: &Value) -> bool;
}

/// A gate that always answers the same way. Useful in tests and for
/// non-interactive runs that still want an explicit gate.
pub struct StaticGate(pub bool);

#[async_trait]
impl ApprovalGate for StaticGate {
    async fn approve(&self, _tool_name: &str, _call_id: &str, _arguments: &Value) -> bool {
        self.0
    }
}
