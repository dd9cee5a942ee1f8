//! Per-tool permission policies.
//!
//! A policy maps tool names to enforcement levels. It is built once per
//! agent profile and never mutated during a run; switching profiles rebinds
//! the engine to a different policy instance.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Enforcement level for one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionLevel {
    /// Runs without asking.
    Allow,
    /// Routed through the approval gate before running.
    Ask,
    /// Blocked; a fixed "not permitted" result is synthesized instead.
    Deny,
}

/// Maps tool names to permission levels.
///
/// Lookup order: exact rule, then `*`-suffixed prefix patterns, then the
/// default level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionPolicy {
    rules: HashMap<String, PermissionLevel>,
    default: PermissionLevel,
}

impl PermissionPolicy {
    pub fn new(default: PermissionLevel) -> Self {
        Self {
            rules: HashMap::new(),
            default,
        }
    }

    /// Builder-style rule insertion, used by the policy factories.
    pub fn with_rule(mut self, tool: impl Into<String>, level: PermissionLevel) -> Self {
        self.rules.insert(tool.into(), level);
        self
    }

    pub fn default_level(&self) -> PermissionLevel {
        self.default
    }

    /// Decide the level for a tool name. Pure; no side effects.
    pub fn level_for(&self, tool_name: &str) -> PermissionLevel {
        if let Some(&level) = self.rules.get(tool_name) {
            return level;
        }
        for (pattern, &level) in &self.rules {
            if let Some(prefix) = pattern.strip_suffix('*') {
                if tool_name.starts_with(prefix) {
                    return level;
                }
            }
        }
        self.default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_applies_to_unknown_tools() {
        let policy = PermissionPolicy::new(PermissionLevel::Ask);
        assert_eq!(policy.level_for("anything"), PermissionLevel::Ask);
    }

    #[test]
    fn exact_rule_wins() {
        let policy = PermissionPolicy::new(PermissionLevel::Ask)
            .with_rule("read_file", PermissionLevel::Allow)
            .with_rule("exec", PermissionLevel::Deny);

        assert_eq!(policy.level_for("read_file"), PermissionLevel::Allow);
        assert_eq!(policy.level_for("exec"), PermissionLevel::Deny);
        assert_eq!(policy.level_for("other"), PermissionLevel::Ask);
    }

    #[test]
    fn prefix_pattern_matches() {
        let policy = PermissionPolicy::new(PermissionLevel::Deny)
            .with_rule("files__*", PermissionLevel::Allow);

        assert_eq!(policy.level_for("files__read"), PermissionLevel::Allow);
        assert_eq!(policy.level_for("files__write"), PermissionLevel::Allow);
        assert_eq!(policy.level_for("shell__run"), PermissionLevel::Deny);
    }

    #[test]
    fn exact_rule_beats_pattern() {
        let policy = PermissionPolicy::new(PermissionLevel::Ask)
            .with_rule("files__*", PermissionLevel::Allow)
            .with_rule("files__delete", PermissionLevel::Deny);

        assert_eq!(policy.level_for("files__delete"), PermissionLevel::Deny);
        assert_eq!(policy.level_for("files__read"), PermissionLevel::Allow);
    }
}
