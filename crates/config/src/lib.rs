//! Configuration loading, validation, and management for Steward.
//!
//! Loads configuration from `~/.steward/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use steward_core::tool::ToolName;

/// The root configuration structure.
///
/// Maps directly to `~/.steward/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model endpoint settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Orchestration loop budgets
    #[serde(default)]
    pub agent: AgentConfig,

    /// Repetition detection thresholds
    #[serde(default)]
    pub loop_detection: LoopDetectionConfig,

    /// Tool limits and approval policy
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Workspace location
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    4096
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard cap on iterations per session
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Wall-clock budget per session, checked at the top of each iteration
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Consecutive corrective events before the session is abandoned
    #[serde(default = "default_max_consecutive_mistakes")]
    pub max_consecutive_mistakes: u32,

    /// Stop reading a streamed response at the first complete tool call
    #[serde(default)]
    pub stream_early_stop: bool,

    /// Tags the parser leaves alone (e.g. `thinking`)
    #[serde(default = "default_passthrough_tags")]
    pub passthrough_tags: Vec<String>,
}

fn default_max_iterations() -> u32 {
    25
}
fn default_timeout_secs() -> u64 {
    1800
}
fn default_max_consecutive_mistakes() -> u32 {
    3
}
fn default_passthrough_tags() -> Vec<String> {
    vec!["thinking".into()]
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            timeout_secs: default_timeout_secs(),
            max_consecutive_mistakes: default_max_consecutive_mistakes(),
            stream_early_stop: false,
            passthrough_tags: default_passthrough_tags(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopDetectionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Calls to one tool name inside the window before it counts as a loop
    #[serde(default = "default_max_same_tool")]
    pub max_same_tool: usize,

    /// Identical (tool, input) repetitions inside the window that count as a loop
    #[serde(default = "default_max_identical_calls")]
    pub max_identical_calls: usize,
}

fn default_true() -> bool {
    true
}
fn default_window_secs() -> u64 {
    600
}
fn default_max_same_tool() -> usize {
    15
}
fn default_max_identical_calls() -> usize {
    4
}

impl Default for LoopDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: default_window_secs(),
            max_same_tool: default_max_same_tool(),
            max_identical_calls: default_max_identical_calls(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_bash_timeout")]
    pub bash_default_timeout_secs: u64,

    #[serde(default = "default_bash_max_timeout")]
    pub bash_max_timeout_secs: u64,

    #[serde(default = "default_grep_max_results")]
    pub grep_max_results: usize,

    /// Tool output longer than this is cut to a head/tail window
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,

    /// Route `write_file` and `edit_file` through the approval gate
    #[serde(default)]
    pub approve_writes: bool,

    /// Route every `bash_command` through the approval gate, not just flagged ones
    #[serde(default)]
    pub approve_all_commands: bool,

    /// Directory names skipped by recursive listings and searches
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,
}

fn default_bash_timeout() -> u64 {
    30
}
fn default_bash_max_timeout() -> u64 {
    300
}
fn default_grep_max_results() -> usize {
    100
}
fn default_max_output_chars() -> usize {
    50_000
}
fn default_ignored_dirs() -> Vec<String> {
    vec![".git".into(), "node_modules".into(), "target".into()]
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bash_default_timeout_secs: default_bash_timeout(),
            bash_max_timeout_secs: default_bash_max_timeout(),
            grep_max_results: default_grep_max_results(),
            max_output_chars: default_max_output_chars(),
            approve_writes: false,
            approve_all_commands: false,
            ignored_dirs: default_ignored_dirs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Workspace root; defaults to the current directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.steward/config.toml).
    ///
    /// Environment overrides, highest priority first:
    /// - `STEWARD_API_KEY`, then `OPENAI_API_KEY` (only when no key is configured)
    /// - `STEWARD_MODEL`
    /// - `STEWARD_API_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.provider.api_key.is_none() {
            self.provider.api_key =
                lookup("STEWARD_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(model) = lookup("STEWARD_MODEL") {
            self.provider.model = model;
        }

        if let Some(url) = lookup("STEWARD_API_URL") {
            self.provider.api_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".steward")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.agent.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agent.timeout_secs must be at least 1".into(),
            ));
        }

        if self.agent.max_consecutive_mistakes == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_consecutive_mistakes must be at least 1".into(),
            ));
        }

        if self.loop_detection.max_same_tool == 0 || self.loop_detection.max_identical_calls == 0
        {
            return Err(ConfigError::ValidationError(
                "loop_detection thresholds must be at least 1".into(),
            ));
        }

        if self.tools.bash_default_timeout_secs > self.tools.bash_max_timeout_secs {
            return Err(ConfigError::ValidationError(
                "tools.bash_default_timeout_secs exceeds tools.bash_max_timeout_secs".into(),
            ));
        }

        if let Some(tag) = self
            .agent
            .passthrough_tags
            .iter()
            .find(|tag| ToolName::from_name(tag).is_some())
        {
            return Err(ConfigError::ValidationError(format!(
                "agent.passthrough_tags cannot include the tool name '{tag}'"
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// Render the effective configuration with the API key masked.
    pub fn redacted_toml(&self) -> String {
        let mut shown = self.clone();
        if shown.provider.api_key.is_some() {
            shown.provider.api_key = Some("[REDACTED]".into());
        }
        toml::to_string_pretty(&shown).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
