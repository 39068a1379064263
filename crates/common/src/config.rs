use crate::error::ChatError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Which model backend answers chat requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted Hugging Face inference API
    HuggingFace,
    /// Local Ollama runtime
    Ollama,
}

impl FromStr for BackendKind {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" | "local" => Ok(Self::Ollama),
            other => Err(ChatError::config(format!("Unknown backend '{}'", other))),
        }
    }
}

/// StudyChat application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hugging Face inference API base URL
    pub hf_api_base_url: String,

    /// Hugging Face API token
    pub hf_api_token: Option<String>,

    /// Active backend
    pub backend: BackendKind,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Model selected when a session starts
    pub default_model: String,

    /// Number of history entries kept per conversation
    pub history_window: usize,

    /// HTTP timeout for backend calls
    pub request_timeout_secs: u64,

    /// Loaded model cache capacity (0 = never evict)
    pub model_cache_capacity: usize,

    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hf_api_base_url: "https://api-inference.huggingface.co".to_string(),
            hf_api_token: None,
            backend: BackendKind::HuggingFace,
            ollama_base_url: "http://localhost:11434".to_string(),
            default_model: "microsoft/DialoGPT-medium".to_string(),
            history_window: 6,
            request_timeout_secs: 120,
            model_cache_capacity: 0,
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, ChatError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();

        let backend = match std::env::var("BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.backend,
        };

        let config = Self {
            hf_api_base_url: std::env::var("HF_API_BASE_URL")
                .unwrap_or(defaults.hf_api_base_url),
            hf_api_token: std::env::var("HF_API_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            backend,
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or(defaults.ollama_base_url),
            default_model: std::env::var("DEFAULT_MODEL")
                .unwrap_or(defaults.default_model),
            history_window: Self::get_env_parsed("HISTORY_WINDOW")
                .unwrap_or(defaults.history_window),
            request_timeout_secs: Self::get_env_parsed("REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            model_cache_capacity: Self::get_env_parsed("MODEL_CACHE_CAPACITY")
                .unwrap_or(defaults.model_cache_capacity),
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or(defaults.server_host),
            server_port: Self::get_env_parsed("SERVER_PORT")
                .unwrap_or(defaults.server_port),
            log_dir: std::env::var("LOG_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL")
                .unwrap_or(defaults.log_level),
        };

        config.validate()?;
        config.ensure_directories()?;

        Ok(config)
    }

    /// Parse an environment variable, ignoring missing or malformed values
    fn get_env_parsed<T: FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
    }

    /// Ensure required directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), ChatError> {
        if !self.log_dir.exists() {
            std::fs::create_dir_all(&self.log_dir).map_err(|e| {
                ChatError::config(format!(
                    "Failed to create directory {}: {}",
                    self.log_dir.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ChatError> {
        for (name, url) in [
            ("Hugging Face", &self.hf_api_base_url),
            ("Ollama", &self.ollama_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ChatError::config(format!(
                    "{} base URL must start with http:// or https://",
                    name
                )));
            }
        }

        if self.default_model.trim().is_empty() {
            return Err(ChatError::config("Default model cannot be empty"));
        }

        if self.history_window == 0 {
            return Err(ChatError::config("History window must be at least 1"));
        }

        if self.request_timeout_secs == 0 {
            return Err(ChatError::config("Request timeout cannot be 0"));
        }

        if self.server_port == 0 {
            return Err(ChatError::config("Server port cannot be 0"));
        }

        Ok(())
    }
}
