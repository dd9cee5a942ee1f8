//! Shared fixtures: a scripted provider stub and counting tools.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use quill_agent::permission::PermissionPolicy;
use quill_agent::profile::{AgentMode, AgentProfile, ProfileRegistry};
use quill_agent::tools::{ToolHandler, TASK_TOOL};
use quill_agent::PermissionLevel;
use quill_provider::{ChatParams, ChatResponse, Provider, ToolCall, Usage};

/// Replays a scripted sequence of responses; falls back to a fixed
/// response (if any) once the script is exhausted.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ChatResponse>>,
    fallback: Option<ChatResponse>,
    pub call_count: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            fallback: None,
            call_count: AtomicUsize::new(0),
        }
    }

    /// A provider that answers every call the same way.
    pub fn looping(response: ChatResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn chat(&self, _params: ChatParams) -> quill_provider::Result<ChatResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next.or_else(|| self.fallback.clone()) {
            Some(response) => Ok(response),
            None => Err(quill_provider::ProviderError::Api(
                "script exhausted".to_string(),
            )),
        }
    }

    fn default_model(&self) -> String {
        "stub-model".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// Build a response that requests a single tool call.
pub fn tool_call_response(id: &str, name: &str, arguments: serde_json::Value) -> ChatResponse {
    ChatResponse {
        content: None,
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }],
        finish_reason: "tool_calls".to_string(),
        usage: Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        },
    }
}

/// A tool that records how often it ran.
pub struct CountingTool {
    name: String,
    pub invocations: Arc<AtomicUsize>,
}

impl CountingTool {
    pub fn new(name: &str) -> (Self, Arc<AtomicUsize>) {
        let invocations = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name: name.to_string(),
                invocations: Arc::clone(&invocations),
            },
            invocations,
        )
    }
}

#[async_trait]
impl ToolHandler for CountingTool {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        "Counts invocations."
    }
    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }
    async fn execute(
        &self,
        _args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok("counted".to_string())
    }
}

/// A tool that stalls long enough for a cancellation to land first.
pub struct SlowTool;

#[async_trait]
impl ToolHandler for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }
    fn description(&self) -> &str {
        "Sleeps."
    }
    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {}})
    }
    async fn execute(
        &self,
        _args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok("done sleeping".to_string())
    }
}

/// A registry with a "main" profile using the given policy and a
/// "subagent" profile that additionally denies delegation.
pub fn test_profiles(policy: PermissionPolicy, max_turns: u32) -> ProfileRegistry {
    ProfileRegistry::new(vec![
        AgentProfile {
            name: "main".to_string(),
            description: "test primary".to_string(),
            mode: AgentMode::Primary,
            system_prompt: "You are a test agent.".to_string(),
            permissions: policy.clone(),
            temperature: 0.0,
            max_tokens: 1024,
            max_turns,
        },
        AgentProfile {
            name: "subagent".to_string(),
            description: "test subagent".to_string(),
            mode: AgentMode::Subagent,
            system_prompt: "You are a test subagent.".to_string(),
            permissions: policy.with_rule(TASK_TOOL, PermissionLevel::Deny),
            temperature: 0.0,
            max_tokens: 1024,
            max_turns,
        },
    ])
}
