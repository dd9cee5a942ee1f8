//! The turn-execution engine.
//!
//! One engine owns one session and drives the model ↔ tool loop:
//! send transcript → interpret requested tool calls → check each against
//! the active permission policy → dispatch the permitted ones in model
//! order → fold the results back → continue, finish, or abort.
//!
//! A run is a lazy, finite sequence of [`Turn`] values. It ends when the
//! model answers with no tool calls, when the profile's turn budget runs
//! out, or when the run is cancelled; a finished run is never resumed.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use quill_mcp::McpManager;
use quill_provider::{ChatParams, Provider, ToolCall, ToolCallDef, ToolChoice};
use quill_session::Session;

use crate::approval::ApprovalGate;
use crate::permission::PermissionLevel;
use crate::profile::{AgentProfile, ProfileRegistry};
use crate::tools::task::TaskArgs;
use crate::tools::{ToolRegistry, ToolResult, TASK_TOOL};
use crate::{AgentError, Result};

/// Profile used for delegated subtasks.
const SUBAGENT_PROFILE: &str = "subagent";

/// What the caller sees when the turn budget runs out.
const BUDGET_NOTICE: &str = "Stopping: the turn budget for this run is exhausted.";

/// One full cycle of model response, tool dispatch, and fold.
///
/// `tool_results` is always index-aligned with `tool_calls`. The engine
/// does not retain turns; the session already holds what they folded in.
#[derive(Debug, Clone)]
pub struct Turn {
    pub agent_name: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
    pub response: Option<String>,
    pub finished: bool,
}

/// The core engine. Owns its session exclusively; subagents get their own
/// engine and session rather than sharing this one.
pub struct TurnEngine {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    profiles: Arc<ProfileRegistry>,
    profile: Arc<AgentProfile>,
    session: Session,
    gate: Option<Arc<dyn ApprovalGate>>,
    mcp: Option<Arc<McpManager>>,
    model: String,
    auto_approve: bool,
    cancel: CancellationToken,
}

impl TurnEngine {
    /// Build an engine for the named profile. An unknown name is a
    /// configuration error raised before any session exists.
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        profiles: Arc<ProfileRegistry>,
        profile_name: &str,
        model: impl Into<String>,
    ) -> Result<Self> {
        let profile = profiles.get(profile_name)?;
        let session = Session::new(profile.system_prompt.clone());
        Ok(Self {
            provider,
            registry,
            profiles,
            profile,
            session,
            gate: None,
            mcp: None,
            model: model.into(),
            auto_approve: true,
            cancel: CancellationToken::new(),
        })
    }

    /// Wire an approval gate for Ask-level tools.
    pub fn with_approval_gate(mut self, gate: Arc<dyn ApprovalGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Take ownership of the MCP manager so shutdown stops its servers.
    pub fn with_mcp(mut self, mcp: Arc<McpManager>) -> Self {
        self.mcp = Some(mcp);
        self
    }

    /// What Ask means when no gate is wired: true approves, false denies.
    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    /// A token that cancels this engine's in-flight work when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Detach from a cancelled token so the next submission can run.
    pub fn reset_cancellation(&mut self) {
        self.cancel = CancellationToken::new();
    }

    /// Rebind to a different profile. Takes effect for subsequent turns;
    /// already-folded session messages are untouched.
    pub fn switch_profile(&mut self, name: &str) -> Result<()> {
        let profile = self.profiles.get(name)?;
        info!(from = %self.profile.name, to = %profile.name, "switching agent profile");
        self.profile = profile;
        Ok(())
    }

    /// Discard the transcript and start over from the current profile's
    /// system prompt.
    pub fn reset(&mut self) {
        self.session = Session::new(self.profile.system_prompt.clone());
    }

    pub fn context_summary(&self) -> String {
        self.session.context_summary()
    }

    /// Stop owned external tool servers. Runs on normal completion and on
    /// the cancellation path alike.
    pub async fn shutdown(&self) {
        if let Some(mcp) = &self.mcp {
            mcp.shutdown().await;
        }
    }

    /// Start a run for one user submission. The returned sequence yields
    /// turns until the run finishes; it borrows the engine exclusively, so
    /// nothing else can touch the session while a run is in flight.
    pub fn submit(&mut self, input: &str) -> TurnSequence<'_> {
        self.session.push_user(input);
        TurnSequence {
            engine: self,
            turns_taken: 0,
            finished: false,
        }
    }

    /// Drive a run to its final text. Used by subagent delegation and by
    /// callers that don't need per-turn rendering.
    pub async fn run_to_completion(&mut self, input: &str) -> Result<String> {
        let mut run = self.submit(input);
        let mut final_text = String::new();
        while let Some(turn) = run.next_turn().await? {
            if turn.finished {
                if let Some(text) = turn.response {
                    final_text = text;
                }
            }
        }
        Ok(final_text)
    }

    /// Permission check, approval routing, then dispatch.
    async fn resolve_call(&self, call: &ToolCall) -> ToolResult {
        match self.profile.permissions.level_for(&call.name) {
            PermissionLevel::Deny => {
                debug!(tool = %call.name, "denied by policy");
                ToolResult::denied(&call.id)
            }
            PermissionLevel::Allow => self.dispatch_call(call).await,
            PermissionLevel::Ask => {
                let approved = match &self.gate {
                    Some(gate) => gate.approve(&call.name, &call.id, &call.arguments).await,
                    None => self.auto_approve,
                };
                if approved {
                    self.dispatch_call(call).await
                } else {
                    debug!(tool = %call.name, "approval refused");
                    ToolResult::denied(&call.id)
                }
            }
        }
    }

    async fn dispatch_call(&self, call: &ToolCall) -> ToolResult {
        if call.name == TASK_TOOL {
            return self.delegate(call).await;
        }
        self.registry.dispatch(call).await
    }

    /// Run a `task` call as a nested engine with the subagent profile and a
    /// fresh session. Recursion depth is bounded because that profile's
    /// policy denies further delegation.
    async fn delegate(&self, call: &ToolCall) -> ToolResult {
        let args: TaskArgs = match serde_json::from_value(call.arguments.clone()) {
            Ok(args) => args,
            Err(e) => return ToolResult::failure(&call.id, format!("invalid task arguments: {}", e)),
        };

        let profile = match self.profiles.get(SUBAGENT_PROFILE) {
            Ok(profile) => profile,
            Err(e) => return ToolResult::failure(&call.id, e.to_string()),
        };

        let label = args.label.as_deref().unwrap_or(&args.task);
        info!(label = %label, "delegating to subagent");

        let mut sub = TurnEngine {
            provider: Arc::clone(&self.provider),
            registry: Arc::clone(&self.registry),
            profiles: Arc::clone(&self.profiles),
            session: Session::new(profile.system_prompt.clone()),
            profile,
            gate: self.gate.clone(),
            mcp: None,
            model: self.model.clone(),
            auto_approve: self.auto_approve,
            cancel: self.cancel.child_token(),
        };

        // Box::pin breaks the recursive future type
        match Box::pin(sub.run_to_completion(&args.task)).await {
            Ok(text) if text.is_empty() => {
                ToolResult::ok(&call.id, "Subagent finished with no summary.")
            }
            Ok(text) => ToolResult::ok(&call.id, text),
            Err(e) => {
                warn!(error = %e, "subagent run failed");
                ToolResult::failure(&call.id, format!("subagent failed: {}", e))
            }
        }
    }
}

/// A lazy, finite sequence of turns for one submission.
///
/// Restartable only by submitting again; after the finished turn,
/// `next_turn` keeps returning `Ok(None)`.
pub struct TurnSequence<'a> {
    engine: &'a mut TurnEngine,
    turns_taken: u32,
    finished: bool,
}

impl TurnSequence<'_> {
    /// Execute one cycle of the state machine and yield its turn.
    ///
    /// On cancellation the current turn is abandoned: nothing from it is
    /// folded, so the session never holds a tool call without its paired
    /// result.
    pub async fn next_turn(&mut self) -> Result<Option<Turn>> {
        if self.finished {
            return Ok(None);
        }
        if self.engine.cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let profile = Arc::clone(&self.engine.profile);

        // Budget check happens before the model call so a run never makes
        // more than max_turns calls.
        if self.turns_taken >= profile.max_turns {
            warn!(agent = %profile.name, max_turns = profile.max_turns, "turn budget exhausted");
            self.finished = true;
            self.engine.session.push_assistant(Some(BUDGET_NOTICE), None);
            return Ok(Some(Turn {
                agent_name: profile.name.clone(),
                tool_calls: Vec::new(),
                tool_results: Vec::new(),
                response: Some(BUDGET_NOTICE.to_string()),
                finished: true,
            }));
        }

        debug!(agent = %profile.name, turn = self.turns_taken + 1, "requesting model response");

        let params = ChatParams {
            model: self.engine.model.clone(),
            messages: self.engine.session.context(),
            tools: self
                .engine
                .registry
                .definitions_for(&profile.permissions),
            max_tokens: profile.max_tokens,
            temperature: profile.temperature,
            tool_choice: ToolChoice::Auto,
        };

        let cancel = self.engine.cancel.clone();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            result = self.engine.provider.chat(params) => result?,
        };
        self.engine.session.add_usage(&response.usage);

        if !response.has_tool_calls() {
            let text = response
                .content
                .unwrap_or_else(|| "Task completed.".to_string());
            self.engine.session.push_assistant(Some(&text), None);
            self.finished = true;
            return Ok(Some(Turn {
                agent_name: profile.name.clone(),
                tool_calls: Vec::new(),
                tool_results: Vec::new(),
                response: Some(text),
                finished: true,
            }));
        }

        // Sequential dispatch in model order keeps side effects causally
        // ordered. Results are buffered and folded together with the
        // assistant message so cancellation can't leave half a turn behind.
        let mut results = Vec::with_capacity(response.tool_calls.len());
        for call in &response.tool_calls {
            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                result = self.engine.resolve_call(call) => result,
            };
            results.push(result);
        }

        let defs: Vec<ToolCallDef> = response
            .tool_calls
            .iter()
            .map(|tc| ToolCallDef::new(&tc.id, &tc.name, tc.arguments.clone()))
            .collect();
        self.engine
            .session
            .push_assistant(response.content.as_deref(), Some(defs));
        for (call, result) in response.tool_calls.iter().zip(&results) {
            self.engine
                .session
                .push_tool_result(&call.id, &call.name, &result.render());
        }

        self.turns_taken += 1;
        Ok(Some(Turn {
            agent_name: profile.name.clone(),
            tool_calls: response.tool_calls,
            tool_results: results,
            response: response.content,
            finished: false,
        }))
    }
}
