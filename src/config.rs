//! Configuration management for site-chat.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::ServerConfig;
use crate::cli::Args;
use crate::engine::EngineSettings;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Session lifecycle configuration.
    pub session: SessionSection,
    /// Query engine configuration.
    pub engine: EngineSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable graceful shutdown.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            graceful_shutdown: true,
        }
    }
}

/// Session lifecycle section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Sessions idle for longer than this are discarded.
    pub idle_timeout_secs: u64,
    /// How often idle sessions are swept.
    pub reap_interval_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
            reap_interval_secs: 60,
        }
    }
}

/// Query engine section.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Default credential for new sessions. Never serialized back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// OpenAI-compatible API base URL.
    pub api_base: String,
    /// Chat completion model.
    pub chat_model: String,
    /// Embedding model.
    pub embedding_model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Passage size in characters.
    pub chunk_size: usize,
    /// Passage overlap in characters.
    pub chunk_overlap: usize,
    /// Passages retrieved per question.
    pub top_k: usize,
    /// Maximum extracted page text, in characters.
    pub max_page_chars: usize,
    /// Maximum downloaded page body, in bytes.
    pub max_body_bytes: usize,
    /// Allow ingesting loopback, private and link-local addresses.
    pub allow_private_hosts: bool,
    /// Outbound request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        let defaults = EngineSettings::default();
        Self {
            api_key: None,
            api_base: defaults.api_base,
            chat_model: defaults.chat_model,
            embedding_model: defaults.embedding_model,
            temperature: defaults.temperature,
            chunk_size: defaults.chunk_size,
            chunk_overlap: defaults.chunk_overlap,
            top_k: defaults.top_k,
            max_page_chars: defaults.max_page_chars,
            max_body_bytes: defaults.max_body_bytes,
            allow_private_hosts: defaults.allow_private_hosts,
            request_timeout_secs: defaults.request_timeout.as_secs(),
        }
    }
}

impl std::fmt::Debug for EngineSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSection")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("top_k", &self.top_k)
            .field("max_page_chars", &self.max_page_chars)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("allow_private_hosts", &self.allow_private_hosts)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup (for testing).
    pub fn apply_env_from<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("SITE_CHAT_HOST") {
            self.server.host = host;
        }

        if let Some(port) = var("SITE_CHAT_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Some(base) = var("SITE_CHAT_API_BASE") {
            if !base.is_empty() {
                self.engine.api_base = base;
            }
        }

        if let Some(key) = var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.engine.api_key = Some(key);
            }
        }

        if let Some(level) = var("SITE_CHAT_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }

        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port)
            .with_idle_timeout(Duration::from_secs(self.session.idle_timeout_secs))
            .with_reap_interval(Duration::from_secs(self.session.reap_interval_secs.max(1)));

        if !self.server.graceful_shutdown {
            server_config = server_config.without_graceful_shutdown();
        }

        Ok(server_config)
    }

    /// Convert to runtime engine settings.
    pub fn to_engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        let engine = &self.engine;

        if engine.chunk_size == 0 {
            return Err(ConfigError::Invalid("engine.chunk_size must be positive".into()));
        }
        if engine.chunk_overlap >= engine.chunk_size {
            return Err(ConfigError::Invalid(
                "engine.chunk_overlap must be smaller than engine.chunk_size".into(),
            ));
        }
        if engine.top_k == 0 {
            return Err(ConfigError::Invalid("engine.top_k must be positive".into()));
        }
        if engine.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "engine.request_timeout_secs must be positive".into(),
            ));
        }
        if engine.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("engine.max_body_bytes must be positive".into()));
        }

        Ok(EngineSettings {
            api_base: engine.api_base.clone(),
            chat_model: engine.chat_model.clone(),
            embedding_model: engine.embedding_model.clone(),
            temperature: engine.temperature,
            chunk_size: engine.chunk_size,
            chunk_overlap: engine.chunk_overlap,
            top_k: engine.top_k,
            max_page_chars: engine.max_page_chars,
            max_body_bytes: engine.max_body_bytes,
            allow_private_hosts: engine.allow_private_hosts,
            request_timeout: Duration::from_secs(engine.request_timeout_secs),
        })
    }

    /// Default credential for new sessions, if configured.
    pub fn default_credential(&self) -> Option<&str> {
        self.engine.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// Value out of range.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
