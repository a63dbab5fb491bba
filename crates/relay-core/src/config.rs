//! Configuration management
//!
//! Settings are resolved in this order of precedence:
//! 1. Environment variables
//! 2. `relay-gateway.toml` (or the file passed with `--config`)
//! 3. Built-in defaults
//!
//! `${VAR_NAME}` references inside the TOML file are expanded from the
//! environment before parsing.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "relay-gateway.toml";

/// Default system prompt applied by the chat service
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a chat assistant. Answer the user's questions.";

/// Model-serving API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key (sent as a bearer token)
    pub api_key: String,

    /// Default chat model
    #[serde(default = "default_model")]
    pub model: String,

    /// Default image model
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// System prompt for the chat-client endpoints (`None` disables it)
    #[serde(default = "default_system_prompt")]
    pub system_prompt: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            image_model: default_image_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            system_prompt: default_system_prompt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address for the HTTP server
    #[serde(default = "default_api_host")]
    pub host: String,

    /// Port for the HTTP server
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Allowed CORS origins. `None` allows any origin.
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            allowed_origins: None,
        }
    }
}

/// Conversation memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of most recent messages fed back into a memory-enabled chat
    #[serde(default = "default_retrieve_size")]
    pub retrieve_size: usize,

    /// Per-conversation retention cap (0 = unlimited)
    #[serde(default)]
    pub max_messages: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            retrieve_size: default_retrieve_size(),
            max_messages: 0,
        }
    }
}

/// Main configuration for relay-gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub memory: MemoryConfig,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_system_prompt() -> Option<String> {
    Some(DEFAULT_SYSTEM_PROMPT.to_string())
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    3000
}

fn default_retrieve_size() -> usize {
    100
}

/// Empty strings count as "unset"
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Expand `${VAR_NAME}` references with environment values.
    ///
    /// Unknown variables expand to an empty string. An unterminated `${`
    /// treats the rest of the input as the variable name.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let (name, remainder) = match after.find('}') {
                Some(end) => (&after[..end], &after[end + 1..]),
                None => (after, ""),
            };

            if !name.is_empty() {
                if let Ok(env_value) = std::env::var(name) {
                    result.push_str(&env_value);
                }
            }
            rest = remainder;
        }

        result.push_str(rest);
        result
    }

    /// Parse a TOML document (after `${VAR}` expansion).
    ///
    /// Environment overrides are not applied here.
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded = Self::expand_env_vars(content);

        let toml: TomlConfig = toml::from_str(&expanded)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        Ok(Self::from_toml_config(toml))
    }

    /// Load settings from a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut cfg = Self::from_toml_str(&content)?;
        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// Load from `./relay-gateway.toml` when present, otherwise from the
    /// environment only.
    pub fn load() -> crate::Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from environment variables.
    ///
    /// `LLM_API_KEY` (or `OPENAI_API_KEY`) is required in this mode.
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();

        if cfg.llm.api_key.is_empty() {
            return Err(Error::Config(
                "LLM_API_KEY or OPENAI_API_KEY not set".to_string(),
            ));
        }

        Ok(cfg)
    }

    fn from_toml_config(toml: TomlConfig) -> Self {
        let llm = toml.llm.unwrap_or_default();
        let api = toml.api.unwrap_or_default();
        let memory = toml.memory.unwrap_or_default();

        // An explicitly empty system prompt disables it
        let system_prompt = match llm.system_prompt {
            Some(prompt) => non_empty(Some(prompt)),
            None => default_system_prompt(),
        };

        Config {
            llm: LlmConfig {
                api_key: llm.api_key.unwrap_or_default(),
                model: non_empty(llm.model).unwrap_or_else(default_model),
                image_model: non_empty(llm.image_model).unwrap_or_else(default_image_model),
                base_url: non_empty(llm.base_url).unwrap_or_else(default_base_url),
                timeout_secs: llm.timeout_secs.unwrap_or_else(default_timeout_secs),
                system_prompt,
            },
            api: ApiConfig {
                host: non_empty(api.host).unwrap_or_else(default_api_host),
                port: api.port.unwrap_or_else(default_api_port),
                allowed_origins: api.allowed_origins,
            },
            memory: MemoryConfig {
                retrieve_size: memory.retrieve_size.unwrap_or_else(default_retrieve_size),
                max_messages: memory.max_messages.unwrap_or(0),
            },
        }
    }

    /// Override settings from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override settings from an arbitrary key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = non_empty(lookup("OPENAI_API_KEY")) {
            self.llm.api_key = key;
        }
        // LLM_API_KEY wins over OPENAI_API_KEY
        if let Some(key) = non_empty(lookup("LLM_API_KEY")) {
            self.llm.api_key = key;
        }
        if let Some(model) = non_empty(lookup("LLM_MODEL")) {
            self.llm.model = model;
        }
        if let Some(model) = non_empty(lookup("LLM_IMAGE_MODEL")) {
            self.llm.image_model = model;
        }
        if let Some(base_url) = non_empty(lookup("LLM_BASE_URL")) {
            self.llm.base_url = base_url;
        }
        if let Some(secs) = lookup("LLM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.llm.timeout_secs = secs;
        }
        if let Some(prompt) = lookup("LLM_SYSTEM_PROMPT") {
            self.llm.system_prompt = non_empty(Some(prompt));
        }

        if let Some(host) = non_empty(lookup("API_HOST")) {
            self.api.host = host;
        }
        if let Some(port) = lookup("API_PORT").and_then(|v| v.parse().ok()) {
            self.api.port = port;
        }
        if let Some(origins) = non_empty(lookup("API_ALLOWED_ORIGINS")) {
            self.api.allowed_origins = Some(split_list(&origins));
        }

        if let Some(size) = lookup("MEMORY_RETRIEVE_SIZE").and_then(|v| v.parse().ok()) {
            self.memory.retrieve_size = size;
        }
        if let Some(max) = lookup("MEMORY_MAX_MESSAGES").and_then(|v| v.parse().ok()) {
            self.memory.max_messages = max;
        }
    }

    /// Get the model-serving API configuration
    pub fn llm_config(&self) -> &LlmConfig {
        &self.llm
    }
}

// ============================================================================
// TOML file structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    llm: Option<TomlLlmConfig>,
    api: Option<TomlApiConfig>,
    memory: Option<TomlMemoryConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlLlmConfig {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    image_model: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    system_prompt: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlApiConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlMemoryConfig {
    #[serde(default)]
    retrieve_size: Option<usize>,
    #[serde(default)]
    max_messages: Option<usize>,
}
