//! Agent profiles and the profile registry.
//!
//! A profile bundles a system prompt, a permission policy, and model
//! parameters into one behavioral mode. Profiles are immutable and shared
//! by reference; the registry is built once at startup and never mutated.

use std::collections::HashMap;
use std::sync::Arc;

use crate::permission::{PermissionLevel, PermissionPolicy};
use crate::tools::{
    EDIT_FILE_TOOL, EXEC_TOOL, GLOB_TOOL, GREP_TOOL, LIST_DIR_TOOL, READ_FILE_TOOL, TASK_TOOL,
    WEB_FETCH_TOOL, WEB_SEARCH_TOOL, WRITE_FILE_TOOL,
};
use crate::{AgentError, Result};

/// Whether a profile fronts the user or handles delegated subtasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMode {
    Primary,
    Subagent,
}

/// Immutable configuration for one agent type.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub name: String,
    pub description: String,
    pub mode: AgentMode,
    pub system_prompt: String,
    pub permissions: PermissionPolicy,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_turns: u32,
}

const BUILD_SYSTEM_PROMPT: &str = "\
You are a coding assistant with full access to read, write, and execute code \
inside the workspace.

When working on tasks:
1. Understand the codebase first; read relevant files before changing them
2. Make changes incrementally and verify they work
3. Run tests when available
4. Delegate independent subtasks to subagents with the task tool
5. Be careful with destructive operations";

const PLAN_SYSTEM_PROMPT: &str = "\
You are a read-only planning and analysis assistant. You can explore the \
codebase and answer questions, but you cannot modify files, execute \
commands, or spawn subagents.

Your role:
1. Explore and understand codebases
2. Design implementation plans with clear steps
3. Identify potential issues and architectural trade-offs
4. Answer questions about code structure and behavior

If the user needs changes made, suggest switching to the build agent.";

const SUBAGENT_SYSTEM_PROMPT: &str = "\
You are a subagent handling a delegated subtask. Complete it autonomously \
and return a clear, concise summary of what you did and what you found. You \
have the same tools as the build agent except you cannot spawn further \
subagents.";

/// Full access: reads run freely, mutating tools go through the gate.
pub fn build_policy() -> PermissionPolicy {
    PermissionPolicy::new(PermissionLevel::Ask)
        .with_rule(READ_FILE_TOOL, PermissionLevel::Allow)
        .with_rule(LIST_DIR_TOOL, PermissionLevel::Allow)
        .with_rule(GLOB_TOOL, PermissionLevel::Allow)
        .with_rule(GREP_TOOL, PermissionLevel::Allow)
        .with_rule(WEB_FETCH_TOOL, PermissionLevel::Allow)
        .with_rule(WEB_SEARCH_TOOL, PermissionLevel::Allow)
        .with_rule(TASK_TOOL, PermissionLevel::Allow)
        .with_rule(WRITE_FILE_TOOL, PermissionLevel::Ask)
        .with_rule(EDIT_FILE_TOOL, PermissionLevel::Ask)
        .with_rule(EXEC_TOOL, PermissionLevel::Ask)
}

/// Read-only: anything that mutates, executes, or delegates is denied,
/// and so is every tool the policy doesn't know about.
pub fn plan_policy() -> PermissionPolicy {
    PermissionPolicy::new(PermissionLevel::Deny)
        .with_rule(READ_FILE_TOOL, PermissionLevel::Allow)
        .with_rule(LIST_DIR_TOOL, PermissionLevel::Allow)
        .with_rule(GLOB_TOOL, PermissionLevel::Allow)
        .with_rule(GREP_TOOL, PermissionLevel::Allow)
        .with_rule(WEB_FETCH_TOOL, PermissionLevel::Allow)
        .with_rule(WEB_SEARCH_TOOL, PermissionLevel::Allow)
}

/// Same as build, minus delegation. Denying `task` here is what bounds
/// recursive spawning.
pub fn subagent_policy() -> PermissionPolicy {
    build_policy().with_rule(TASK_TOOL, PermissionLevel::Deny)
}

impl AgentProfile {
    fn build() -> Self {
        Self {
            name: "build".to_string(),
            description: "Primary agent with full file and command access".to_string(),
            mode: AgentMode::Primary,
            system_prompt: BUILD_SYSTEM_PROMPT.to_string(),
            permissions: build_policy(),
            temperature: 0.0,
            max_tokens: 4096,
            max_turns: 50,
        }
    }

    fn plan() -> Self {
        Self {
            name: "plan".to_string(),
            description: "Read-only agent for exploration and analysis".to_string(),
            mode: AgentMode::Primary,
            system_prompt: PLAN_SYSTEM_PROMPT.to_string(),
            permissions: plan_policy(),
            temperature: 0.0,
            max_tokens: 4096,
            max_turns: 30,
        }
    }

    fn subagent() -> Self {
        Self {
            name: "subagent".to_string(),
            description: "Agent for handling delegated subtasks".to_string(),
            mode: AgentMode::Subagent,
            system_prompt: SUBAGENT_SYSTEM_PROMPT.to_string(),
            permissions: subagent_policy(),
            temperature: 0.0,
            max_tokens: 4096,
            max_turns: 30,
        }
    }
}

/// Read-only lookup from profile name to profile.
pub struct ProfileRegistry {
    profiles: HashMap<String, Arc<AgentProfile>>,
}

impl ProfileRegistry {
    /// The built-in profiles: build, plan, subagent.
    pub fn builtin() -> Self {
        Self::new(vec![
            AgentProfile::build(),
            AgentProfile::plan(),
            AgentProfile::subagent(),
        ])
    }

    pub fn new(profiles: Vec<AgentProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.name.clone(), Arc::new(p)))
                .collect(),
        }
    }

    /// Unknown names are a configuration error, raised before any turn runs.
    pub fn get(&self, name: &str) -> Result<Arc<AgentProfile>> {
        self.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::UnknownProfile(name.to_string()))
    }

    /// Profiles a user can select directly.
    pub fn primary(&self) -> Vec<&AgentProfile> {
        let mut out: Vec<&AgentProfile> = self
            .profiles
            .values()
            .map(|p| p.as_ref())
            .filter(|p| p.mode == AgentMode::Primary)
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}
