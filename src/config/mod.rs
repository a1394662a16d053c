//! Configuration management for TaskPilot.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::agent::{AgentError, LlmProvider, OpenAiProvider};

/// Instruction persona given to the agent on every session.
pub const DEFAULT_INSTRUCTION: &str = "You are a task assistant. Help users track tasks, \
     add new ones, list current ones, and remove completed ones.";

/// Agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model identifier.
    pub model: String,

    /// Maximum tokens per reply.
    pub max_tokens: u32,

    /// Instruction persona for the agent.
    pub instruction: String,

    /// Environment variable holding the provider API key.
    pub api_key_env: String,

    /// Base URL override for OpenAI-compatible endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            max_tokens: 1024,
            instruction: DEFAULT_INSTRUCTION.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: None,
        }
    }
}

impl AgentConfig {
    /// Create the LLM provider for this configuration.
    ///
    /// The API key is read from the configured environment variable. A
    /// custom `base_url` may omit the key (local endpoints).
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] when no key is available and no
    /// base URL override is set.
    pub fn create_provider(&self) -> Result<Arc<dyn LlmProvider>, AgentError> {
        let api_key = std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty());

        if api_key.is_none() && self.base_url.is_none() {
            return Err(AgentError::ApiKeyMissing);
        }

        Ok(Arc::new(OpenAiProvider::with_config(
            api_key,
            self.base_url.clone(),
        )))
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to bind to.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Agent endpoint URL.
    pub endpoint: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:7878/api/agent".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Agent settings.
    pub agent: AgentConfig,

    /// Server settings.
    pub server: ServerConfig,

    /// Client settings.
    pub client: ClientConfig,
}

impl Config {
    /// Load configuration from disk, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the configuration file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the config directory path (`~/.config/taskpilot/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config_home).join("taskpilot"));
        }

        if cfg!(target_os = "macos") {
            if let Ok(home) = std::env::var("HOME") {
                return Ok(PathBuf::from(home).join(".config").join("taskpilot"));
            }
        }

        let base = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

        Ok(base.config_dir().join("taskpilot"))
    }

    /// Get the data directory path.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined.
    pub fn data_dir() -> anyhow::Result<PathBuf> {
        let base = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("could not determine data directory"))?;

        Ok(base.data_dir().join("taskpilot"))
    }
}
