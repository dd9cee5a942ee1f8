//! Configuration for quill.
//!
//! Loads and saves settings from `~/.quill/config.json`. A missing file
//! means defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub mod paths;

pub use paths::{config_path, data_dir};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config not found: {0}")]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Model provider credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// Generation defaults applied when an agent profile doesn't override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefaults {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Default agent profile selected at startup.
    #[serde(default = "default_profile")]
    pub profile: String,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            profile: default_profile(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.0
}

fn default_profile() -> String {
    "build".to_string()
}

/// Web search tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_max_results() -> u32 {
    5
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            max_results: default_max_results(),
        }
    }
}

/// Tool-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub web_search: WebSearchConfig,
    /// Ask-level tools run without prompting when no approval gate is wired.
    /// False fails closed.
    #[serde(default = "default_auto_approve")]
    pub auto_approve: bool,
    /// Path to a Claude-style MCP server config file
    /// (`{"mcpServers": {name: {command, args}}}`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_config: Option<String>,
}

fn default_auto_approve() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub agent: AgentDefaults,
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Workspace root the file tools are confined to. `~` expands to home.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
}

impl Config {
    /// Load from the default location.
    pub async fn load() -> Result<Self> {
        Self::load_from(&config_path()).await
    }

    /// Load from a specific location. Missing file yields defaults.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location.
    pub async fn save(&self) -> Result<()> {
        self.save_to(&config_path()).await
    }

    /// Save to a specific location, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("saving config to {:?}", path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// API key, preferring the config file over the environment.
    pub fn api_key(&self) -> Option<String> {
        if !self.provider.api_key.is_empty() {
            return Some(self.provider.api_key.clone());
        }
        std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
    }

    pub fn api_base(&self) -> Option<String> {
        self.provider.api_base.clone()
    }

    pub fn default_model(&self) -> String {
        self.agent.model.clone()
    }

    /// Workspace root with `~` expanded; defaults to the current directory.
    pub fn workspace_path(&self) -> PathBuf {
        match &self.workspace {
            Some(path) => expand_tilde(path),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Resolve the MCP config path relative to the workspace.
    pub fn mcp_config_path(&self) -> Option<PathBuf> {
        self.tools.mcp_config.as_ref().map(|p| {
            let path = PathBuf::from(p);
            if path.is_absolute() {
                path
            } else {
                self.workspace_path().join(path)
            }
        })
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.agent.model, "gpt-4o");
        assert_eq!(config.agent.profile, "build");
        assert_eq!(config.agent.max_tokens, 4096);
        assert!(config.tools.auto_approve);
        assert!(config.tools.mcp_config.is_none());
    }

    #[test]
    fn parse_partial_config() {
        let json = r#"{"provider": {"api_key": "sk-test"}, "tools": {"auto_approve": false}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.provider.api_key, "sk-test");
        assert!(!config.tools.auto_approve);
        // Untouched sections fall back to defaults
        assert_eq!(config.agent.model, "gpt-4o");
    }

    #[test]
    fn mcp_config_path_resolution() {
        let config: Config = serde_json::from_str(
            r#"{"workspace": "/work", "tools": {"mcp_config": "mcp.json"}}"#,
        )
        .unwrap();
        assert_eq!(
            config.mcp_config_path(),
            Some(PathBuf::from("/work/mcp.json"))
        );

        let config: Config =
            serde_json::from_str(r#"{"tools": {"mcp_config": "/etc/quill/mcp.json"}}"#).unwrap();
        assert_eq!(
            config.mcp_config_path(),
            Some(PathBuf::from("/etc/quill/mcp.json"))
        );
    }

    #[test]
    fn expand_tilde_passthrough() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde("rel/path"), PathBuf::from("rel/path"));
    }
}
