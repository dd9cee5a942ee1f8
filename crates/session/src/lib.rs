//! Conversation state for one engine run.
//!
//! A session is an append-only transcript seeded with a system prompt, plus
//! cumulative token accounting. It is owned exclusively by one turn engine
//! at a time; the engine folds messages in, nothing else mutates it.

use chrono::{DateTime, Local};
use tracing::debug;

use quill_provider::{Message, ToolCallDef, Usage};

/// Keep at most this many non-system messages when building model context.
pub const DEFAULT_MAX_CONTEXT_MESSAGES: usize = 100;

/// An ordered transcript plus usage counters.
///
/// Invariant: message order is append-only and causally ordered — a tool
/// result message always follows the assistant message that requested it.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    system_prompt: String,
    messages: Vec<Message>,
    usage: Usage,
    created_at: DateTime<Local>,
    max_context_messages: usize,
}

impl Session {
    /// Create a session seeded with a system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            messages: vec![Message::system(system_prompt.clone())],
            system_prompt,
            usage: Usage::default(),
            created_at: Local::now(),
            max_context_messages: DEFAULT_MAX_CONTEXT_MESSAGES,
        }
    }

    pub fn with_max_context_messages(mut self, max: usize) -> Self {
        self.max_context_messages = max;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Full transcript, system prompt first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages including the system prompt.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.len() <= 1
    }

    /// Cumulative usage across every model call folded so far.
    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn add_usage(&mut self, usage: &Usage) {
        self.usage.add(usage);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append an assistant message, optionally carrying tool calls.
    pub fn push_assistant(&mut self, content: Option<&str>, tool_calls: Option<Vec<ToolCallDef>>) {
        let mut msg = Message::assistant(content.unwrap_or(""));
        if let Some(calls) = tool_calls {
            msg.tool_calls = Some(calls);
        }
        self.messages.push(msg);
    }

    /// Append a tool result paired to the call that requested it.
    pub fn push_tool_result(&mut self, call_id: &str, name: &str, result: &str) {
        self.messages.push(Message::tool(call_id, name, result));
    }

    /// Messages to send to the model: the system prompt plus the most recent
    /// window of the transcript.
    pub fn context(&self) -> Vec<Message> {
        let rest = &self.messages[1..];
        let skip = rest.len().saturating_sub(self.max_context_messages);
        let mut out = Vec::with_capacity(rest.len() - skip + 1);
        out.push(self.messages[0].clone());
        out.extend(rest.iter().skip(skip).cloned());
        out
    }

    /// Truncate back to the system prompt. Usage counters survive.
    pub fn reset(&mut self) {
        debug!(session = %self.id, "resetting session");
        self.messages.truncate(1);
    }

    /// Human-readable summary of transcript size and token spend.
    pub fn context_summary(&self) -> String {
        format!(
            "messages: {} | prompt tokens: {} | completion tokens: {} | total: {}",
            self.messages.len(),
            self.usage.prompt_tokens,
            self.usage.completion_tokens,
            self.usage.total_tokens,
        )
    }
}
