//! Configuration loading and validation for Jarvis.
//!
//! Loads configuration from `$JARVIS_CONFIG`, `./jarvis.toml`, or
//! `~/.jarvis/config.toml` (first match wins) with environment variable
//! overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables consulted for the API key, highest priority first.
pub const API_KEY_VARS: [&str; 4] = [
    "JARVIS_API_KEY",
    "GOOGLE_API_KEY",
    "GEMINI_API_KEY",
    "OPENAI_API_KEY",
];

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the decision engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Engine provider ("gemini", "openai", or "custom" with `base_url`)
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    /// Max tokens per engine response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Overrides the provider's chat-completions base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-1.5-flash".into()
}
fn default_max_tokens() -> u32 {
    2048
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .field("agent", &self.agent)
            .field("storage", &self.storage)
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Name the assistant starts with
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// Engine consultations allowed per turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_assistant_name() -> String {
    "Jarvis".into()
}
fn default_max_iterations() -> usize {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            max_iterations: default_max_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the to-do list
    #[serde(default = "default_todo_file")]
    pub todo_file: PathBuf,

    /// Directory `create_notes_file` writes into
    #[serde(default = "default_notes_dir")]
    pub notes_dir: PathBuf,
}

fn default_todo_file() -> PathBuf {
    PathBuf::from("todo_list.json")
}
fn default_notes_dir() -> PathBuf {
    PathBuf::from("notes")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            todo_file: default_todo_file(),
            notes_dir: default_notes_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Commands `run_shell_command` may run. Empty means unrestricted.
    #[serde(default)]
    pub allowed_commands: Vec<String>,

    #[serde(default = "default_shell_timeout")]
    pub shell_timeout_secs: u64,

    /// Upper bound for `countdown_timer`
    #[serde(default = "default_max_countdown")]
    pub max_countdown_secs: u64,
}

fn default_shell_timeout() -> u64 {
    30
}
fn default_max_countdown() -> u64 {
    300
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            allowed_commands: vec![],
            shell_timeout_secs: default_shell_timeout(),
            max_countdown_secs: default_max_countdown(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the first config file found, then apply
    /// environment overrides:
    /// - `JARVIS_API_KEY`, `GOOGLE_API_KEY`, `GEMINI_API_KEY`,
    ///   `OPENAI_API_KEY` (used when the file sets no key)
    /// - `JARVIS_PROVIDER`
    /// - `JARVIS_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
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

    /// Which file `load()` reads.
    pub fn config_path() -> PathBuf {
        if let Ok(explicit) = std::env::var("JARVIS_CONFIG") {
            return PathBuf::from(explicit);
        }
        let local = PathBuf::from("jarvis.toml");
        if local.exists() {
            return local;
        }
        Self::config_dir().join("config.toml")
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".jarvis")
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = API_KEY_VARS
                .iter()
                .find_map(|var| lookup(var).filter(|v| !v.trim().is_empty()));
        }

        if let Some(provider) = lookup("JARVIS_PROVIDER") {
            self.provider = provider;
        }

        if let Some(model) = lookup("JARVIS_MODEL") {
            self.model = model;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.agent.assistant_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "agent.assistant_name must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            model: default_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            base_url: None,
            agent: AgentConfig::default(),
            storage: StorageConfig::default(),
            tools: ToolsConfig::default(),
        }
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
