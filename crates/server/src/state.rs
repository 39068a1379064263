use std::sync::Arc;
use std::time::Duration;
use studychat_common::{AppConfig, BackendKind, Result};
use studychat_llm::{backend_from_config, HuggingFaceClient, ModelBackend, PromptPipeline};
use tracing::warn;

/// Shared application state
///
/// Holds no conversation data; clients send their own history.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Prompt pipeline over the built-in catalog
    pub pipeline: PromptPipeline,

    /// Configured backend, absent when requests must bring their own token
    backend: Option<Arc<dyn ModelBackend>>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig) -> Result<Self> {
        let backend = if config.backend == BackendKind::HuggingFace && config.hf_api_token.is_none() {
            warn!("HF_API_TOKEN is not set; chat requests must include an API token");
            None
        } else {
            Some(backend_from_config(&config)?)
        };

        Ok(Self::with_backend(config, backend))
    }

    /// Create state around an existing backend
    pub fn with_backend(config: AppConfig, backend: Option<Arc<dyn ModelBackend>>) -> Self {
        Self {
            config,
            pipeline: PromptPipeline::default(),
            backend,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    /// Backend for one request
    ///
    /// A token supplied with the request takes precedence over the configured
    /// one when the Hugging Face backend is active.
    pub fn backend_for(&self, api_token: Option<&str>) -> Result<Option<Arc<dyn ModelBackend>>> {
        match api_token.filter(|t| !t.trim().is_empty()) {
            Some(token) if self.config.backend == BackendKind::HuggingFace => {
                let client = HuggingFaceClient::new(
                    &self.config.hf_api_base_url,
                    token,
                    self.request_timeout(),
                )?;
                Ok(Some(Arc::new(client)))
            }
            _ => Ok(self.backend.clone()),
        }
    }
}
