use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use studychat_common::{AppConfig, BackendKind, ChatError, Result};
use tracing::info;

use crate::huggingface::HuggingFaceClient;
use crate::model_cache::{EvictionPolicy, ModelCache};
use crate::ollama::OllamaBackend;
use crate::types::GenerationRequest;

/// Common trait for model backends
///
/// One call is one attempt; implementations never retry.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Run a generation request and return the raw text
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Short backend name for logs
    fn name(&self) -> &str;
}

/// Build the configured backend
pub fn backend_from_config(config: &AppConfig) -> Result<Arc<dyn ModelBackend>> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let backend: Arc<dyn ModelBackend> = match config.backend {
        BackendKind::HuggingFace => {
            let token = config.hf_api_token.clone().ok_or_else(|| {
                ChatError::config("HF_API_TOKEN must be set to use the Hugging Face backend")
            })?;
            Arc::new(HuggingFaceClient::new(&config.hf_api_base_url, token, timeout)?)
        }
        BackendKind::Ollama => {
            let cache = ModelCache::new(EvictionPolicy::from_capacity(config.model_cache_capacity));
            Arc::new(OllamaBackend::new(&config.ollama_base_url, timeout, cache)?)
        }
    };

    info!("Model backend selected: {}", backend.name());
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huggingface_requires_token() {
        let config = AppConfig::default();
        assert!(matches!(backend_from_config(&config), Err(ChatError::Config(_))));

        let mut config = AppConfig::default();
        config.hf_api_token = Some("hf_test".to_string());
        assert_eq!(backend_from_config(&config).unwrap().name(), "huggingface");
    }

    #[test]
    fn test_ollama_backend() {
        let mut config = AppConfig::default();
        config.backend = BackendKind::Ollama;
        assert_eq!(backend_from_config(&config).unwrap().name(), "ollama");
    }
}
