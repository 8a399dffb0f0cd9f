//! Service configuration.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! `FLOWSMITH_*` environment overrides.  API keys are never read from the
//! file; [`AiSection::client_config`] takes them from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AgentError, Result};
use crate::llm::{LlmClientConfig, LlmProvider};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "flowsmith.toml";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerSection,
    pub validation: ValidationSection,
    pub cache: CacheSection,
    pub ai: AiSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

/// Description length limits, in characters after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSection {
    pub min_description_len: usize,
    pub max_description_len: usize,
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            min_description_len: 10,
            max_description_len: 2000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub enabled: bool,
    pub max_capacity: u64,
    pub ttl_seconds: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: 1_000,
            ttl_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSection {
    pub enabled: bool,
    pub provider: LlmProvider,
    pub model: String,
    /// Overrides the provider's public endpoint, e.g. for a local
    /// OpenAI-compatible server.
    pub base_url: Option<String>,
    /// Upper bound on one enhancement attempt.
    pub timeout_seconds: u64,
}

impl Default for AiSection {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: LlmProvider::Anthropic,
            model: "claude-sonnet-4-20250514".into(),
            base_url: None,
            timeout_seconds: 20,
        }
    }
}

impl AiSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Client configuration with the API key read from the process
    /// environment.
    pub fn client_config(&self) -> Result<LlmClientConfig> {
        self.client_config_from(env_non_empty)
    }

    /// [`AiSection::client_config`] with an explicit variable lookup.
    pub fn client_config_from<F>(&self, lookup: F) -> Result<LlmClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_var = self.provider.api_key_env();
        let api_key = non_empty(lookup(key_var)).ok_or_else(|| AgentError::MissingApiKey {
            provider: self.provider.to_string(),
        })?;

        let mut config = LlmClientConfig::for_provider(self.provider, api_key, &self.model);
        config.timeout = self.timeout();
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ServiceConfig {
    /// Parse a TOML document.  Missing keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists, or
    /// fall back to defaults.  Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_path(path)? {
            Some(path) => {
                let text = std::fs::read_to_string(&path)?;
                let config = Self::from_toml(&text)?;
                info!(path = %path.display(), "configuration loaded");
                config
            }
            None => {
                debug!("no configuration file, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(env_non_empty);
    }

    /// Apply `FLOWSMITH_*` overrides using `lookup` to read variables.
    /// Unparseable values are ignored.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        if let Some(port) = get("FLOWSMITH_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(bind) = get("FLOWSMITH_BIND") {
            self.server.bind = bind;
        }
        if let Some(enabled) = get("FLOWSMITH_AI_ENABLED").and_then(|v| parse_flag(&v)) {
            self.ai.enabled = enabled;
        }
        if let Some(model) = get("FLOWSMITH_AI_MODEL") {
            self.ai.model = model;
        }
        if let Some(ttl) = get("FLOWSMITH_CACHE_TTL").and_then(|v| v.parse().ok()) {
            self.cache.ttl_seconds = ttl;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let v = &self.validation;
        if v.min_description_len > v.max_description_len {
            return Err(AgentError::ConfigError {
                reason: format!(
                    "min_description_len ({}) exceeds max_description_len ({})",
                    v.min_description_len, v.max_description_len
                ),
            });
        }
        if self.cache.enabled && self.cache.max_capacity == 0 {
            return Err(AgentError::ConfigError {
                reason: "cache.max_capacity must be positive when the cache is enabled".into(),
            });
        }
        Ok(())
    }

    /// `bind:port` for the HTTP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}

fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(AgentError::ConfigError {
            reason: format!("config file not found: {}", path.display()),
        }),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            Ok(fallback.exists().then_some(fallback))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read an environment variable, treating blank values as unset.
pub fn env_non_empty(key: &str) -> Option<String> {
    non_empty(std::env::var(key).ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
